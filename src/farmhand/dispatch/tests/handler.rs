use std::cell::RefCell;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use anyhow::anyhow;
use chrono::TimeZone;
use farmhand_lib::checkpoint::Checkpoint;
use farmhand_lib::config::DelayOffset;
use farmhand_lib::file_system::FileSystemInteractor;
use tempdir::TempDir;

use super::*;

const FS: FileSystemInteractor = FileSystemInteractor { dry_run: false };

/// Records what it is asked to do, answering like LSF would.
#[derive(Debug, Default)]
struct MockScheduler {
    submissions: RefCell<Vec<String>>,
    executed: RefCell<Vec<String>>,
    answers: RefCell<VecDeque<String>>,
    exit_codes: RefCell<VecDeque<i32>>,
}

impl Scheduler for &MockScheduler {
    fn submit(&self, line: &str) -> Result<String> {
        let mut submissions = self.submissions.borrow_mut();
        submissions.push(line.to_string());

        Ok(self.answers.borrow_mut().pop_front().unwrap_or(format!(
            "Job <{}> is submitted to queue <long>.\n",
            1000 + submissions.len()
        )))
    }

    fn execute(&self, command: &str) -> Result<i32> {
        self.executed.borrow_mut().push(command.to_string());

        self.exit_codes
            .borrow_mut()
            .pop_front()
            .ok_or(anyhow!("no exit code scripted"))
    }
}

fn queues(limits: &[(&str, usize)]) -> Vec<QueueLimit> {
    limits
        .iter()
        .map(|(name, limit)| QueueLimit {
            name: name.to_string(),
            limit: *limit,
        })
        .collect()
}

fn new_dispatcher<'a>(
    scheduler: &'a MockScheduler,
    limits: &[(&str, usize)],
    policy: OverflowPolicy,
) -> Dispatcher<&'a MockScheduler> {
    let mut dispatcher = Dispatcher::new(scheduler, queues(limits), policy);
    dispatcher.now = Local.with_ymd_and_hms(2010, 7, 1, 9, 0, 0).unwrap();
    dispatcher
}

fn independent(n: usize) -> JobBatch {
    JobBatch::from_jobs(
        (0..n).map(|i| Job::builder(format!("work {i}")).name(format!("W{i}")).build().unwrap()),
    )
    .unwrap()
}

#[test]
fn two_parents_one_child_test() {
    let scheduler = MockScheduler::default();
    let mut batch = JobBatch::new();
    let a = batch.push(Job::builder("a").name("A").build().unwrap()).unwrap();
    let b = batch.push(Job::builder("b").name("B").build().unwrap()).unwrap();
    let c = batch
        .push(Job::builder("c").name("C").after(a).after(b).build().unwrap())
        .unwrap();

    let mut dispatcher = new_dispatcher(&scheduler, &[("long", 2)], OverflowPolicy::Fail);
    dispatcher.wildcard_dependencies = false;
    assert!(dispatcher.dispatch_all(&mut batch, &FS).is_err());
    assert!(scheduler.submissions.borrow().is_empty());

    let mut dispatcher = new_dispatcher(
        &scheduler,
        &[("long", 2)],
        OverflowPolicy::Space {
            increment: DelayOffset::new(0, 1, 0),
            initial_delay: DelayOffset::default(),
        },
    );
    dispatcher.wildcard_dependencies = false;

    let report = dispatcher.dispatch_all(&mut batch, &FS).unwrap();

    let order = report.dispatched.iter().map(|d| d.job).collect::<Vec<JobRef>>();
    assert_eq!(
        order[..2].iter().copied().collect::<BTreeSet<JobRef>>(),
        BTreeSet::from([a, b])
    );
    assert_eq!(order[2], c);

    let submissions = scheduler.submissions.borrow();
    assert_eq!(submissions.len(), 3);
    assert!(submissions[0].contains(" -b 2010:7:1:9:0 "));
    assert!(submissions[2].contains(" -b 2010:7:1:10:0 "));
    assert!(submissions[2].contains("-w 'ended(\"A\") && ended(\"B\")'"));

    assert_eq!(batch.get(a).state().assigned_id, Some(1001));
    assert_eq!(batch.get(c).state().assigned_id, Some(1003));
    assert_eq!(dispatcher.state(), DispatchState::Submitted);
}

#[test]
fn queues_are_filled_in_order_test() {
    let scheduler = MockScheduler::default();
    let mut batch = independent(5);

    let mut dispatcher = new_dispatcher(&scheduler, &[("long", 2), ("week", 3)], OverflowPolicy::Fail);
    let report = dispatcher.dispatch_all(&mut batch, &FS).unwrap();

    let queues = report
        .dispatched
        .iter()
        .map(|d| d.queue.clone().unwrap())
        .collect::<Vec<String>>();

    assert_eq!(queues, vec!["long", "long", "week", "week", "week"]);
    assert!(scheduler.submissions.borrow()[4].starts_with("bsub -q week -J W4 "));
    assert_eq!(report.remaining, 0);
}

#[test]
fn resume_dispatches_everything_once_test() {
    let tempdir = TempDir::new("dispatch_test").unwrap();
    let checkpoint = CheckpointFile::new(tempdir.path().join("resume_jobs.txt"));
    let scheduler = MockScheduler::default();

    let n = 7;
    let capacity = 3;

    for run in 0..3 {
        let mut batch = independent(n);
        let mut dispatcher = new_dispatcher(
            &scheduler,
            &[("long", capacity)],
            OverflowPolicy::Resume {
                checkpoint: checkpoint.clone(),
            },
        );

        let report = dispatcher.dispatch_all(&mut batch, &FS).unwrap();

        assert_eq!(report.remaining, n - (capacity * (run + 1)).min(n));
    }

    let commands = scheduler
        .submissions
        .borrow()
        .iter()
        .map(|s| s.rsplit(" -o ").next().unwrap().to_string())
        .collect::<Vec<String>>();
    assert_eq!(commands.len(), n);
    assert_eq!(commands.iter().collect::<BTreeSet<&String>>().len(), n);

    let mut batch = independent(n);
    let mut dispatcher = new_dispatcher(
        &scheduler,
        &[("long", capacity)],
        OverflowPolicy::Resume { checkpoint },
    );

    let err = dispatcher.dispatch_all(&mut batch, &FS).unwrap_err();
    assert!(err.root_cause().to_string().contains("already spawned"));
    assert_eq!(scheduler.submissions.borrow().len(), n);
}

#[test]
fn resume_refuses_a_changed_batch_test() {
    let tempdir = TempDir::new("dispatch_test").unwrap();
    let checkpoint = CheckpointFile::new(tempdir.path().join("resume_jobs.txt"));
    let scheduler = MockScheduler::default();
    let policy = OverflowPolicy::Resume { checkpoint };

    let mut batch = independent(4);
    new_dispatcher(&scheduler, &[("long", 2)], policy.clone())
        .dispatch_all(&mut batch, &FS)
        .unwrap();

    let mut changed = independent(4);
    changed.get_mut(changed.find_by_name("W3").unwrap()).command = "work harder".to_string();

    assert!(new_dispatcher(&scheduler, &[("long", 2)], policy)
        .dispatch_all(&mut changed, &FS)
        .is_err());
    assert_eq!(scheduler.submissions.borrow().len(), 2);
}

#[test]
fn resume_after_a_failed_submission_test() {
    let tempdir = TempDir::new("dispatch_test").unwrap();
    let checkpoint = CheckpointFile::new(tempdir.path().join("resume_jobs.txt"));
    let scheduler = MockScheduler::default();
    scheduler.answers.borrow_mut().extend([
        "Job <1> is submitted to queue <long>.".to_string(),
        "Job <2> is submitted to queue <long>.".to_string(),
        "Request aborted by esub".to_string(),
    ]);
    let policy = OverflowPolicy::Resume {
        checkpoint: checkpoint.clone(),
    };

    let mut batch = independent(5);
    assert!(new_dispatcher(&scheduler, &[("long", 3)], policy.clone())
        .dispatch_all(&mut batch, &FS)
        .is_err());

    assert!(matches!(
        checkpoint.read(&FS).unwrap(),
        Some(Checkpoint::Progress { index: 2, .. })
    ));

    let mut batch = independent(5);
    let report = new_dispatcher(&scheduler, &[("long", 3)], policy)
        .dispatch_all(&mut batch, &FS)
        .unwrap();

    assert_eq!(report.remaining, 0);

    let submissions = scheduler.submissions.borrow();
    let times = |command: &str| submissions.iter().filter(|s| s.ends_with(command)).count();

    assert_eq!(submissions.len(), 6);
    assert_eq!(times("work 0"), 1);
    assert_eq!(times("work 1"), 1);
    assert_eq!(times("work 2"), 2);
    assert_eq!(times("work 4"), 1);
    assert_eq!(checkpoint.read(&FS).unwrap(), Some(Checkpoint::Drained));
}

#[test]
fn dry_run_never_calls_the_farm_test() {
    let scheduler = MockScheduler::default();
    let mut batch = independent(4);

    let mut dispatcher = new_dispatcher(&scheduler, &[("long", 10)], OverflowPolicy::Fail);
    dispatcher.dry_run = true;

    let report = dispatcher.dispatch_all(&mut batch, &FS).unwrap();

    assert!(scheduler.submissions.borrow().is_empty());
    assert_eq!(
        report.dispatched.iter().map(|d| d.id.unwrap()).collect::<Vec<JobId>>(),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn bad_acknowledgement_stops_the_batch_test() {
    let scheduler = MockScheduler::default();
    scheduler
        .answers
        .borrow_mut()
        .extend(["Job <1> is submitted to queue <long>.".to_string(), "Permission denied".to_string()]);
    let mut batch = independent(3);

    let mut dispatcher = new_dispatcher(&scheduler, &[("long", 10)], OverflowPolicy::Fail);

    assert!(dispatcher.dispatch_all(&mut batch, &FS).is_err());
    assert_eq!(scheduler.submissions.borrow().len(), 2);
}

#[test]
fn local_execution_test() {
    let scheduler = MockScheduler::default();
    scheduler.exit_codes.borrow_mut().extend([0, 2, 0]);
    let mut batch = independent(3);

    let mut dispatcher = new_dispatcher(&scheduler, &[], OverflowPolicy::Fail);
    let report = dispatcher.dispatch_all(&mut batch, &FS).unwrap();

    assert_eq!(report.dispatched.len(), 3);
    assert_eq!(scheduler.executed.borrow().len(), 3);
    assert_eq!(
        batch
            .iter()
            .map(|(_, j)| j.state().exit_status)
            .collect::<Vec<Option<i32>>>(),
        vec![Some(0), Some(2), Some(0)]
    );
}

#[test]
fn local_die_on_fail_test() {
    let scheduler = MockScheduler::default();
    scheduler.exit_codes.borrow_mut().extend([0, 2, 0]);
    let mut batch = independent(3);

    let mut dispatcher = new_dispatcher(&scheduler, &[], OverflowPolicy::Fail);
    dispatcher.die_on_fail = true;

    let err = dispatcher.dispatch_all(&mut batch, &FS).unwrap_err();

    assert_eq!(
        err.downcast_ref::<CommandFailed>(),
        Some(&CommandFailed {
            command: "work 1".to_string(),
            code: 2
        })
    );
    assert_eq!(scheduler.executed.borrow().len(), 2);
}

#[test]
fn policy_from_config_test() {
    let mut config = Config::default();
    assert_eq!(OverflowPolicy::from_config(&config).unwrap(), OverflowPolicy::Fail);

    config.overflow = farmhand_lib::config::OverflowKind::Space;
    assert!(OverflowPolicy::from_config(&config).is_err());

    config.spacing_increment = Some(DelayOffset::new(0, 2, 0));
    assert!(matches!(
        OverflowPolicy::from_config(&config).unwrap(),
        OverflowPolicy::Space { .. }
    ));

    config.overflow = farmhand_lib::config::OverflowKind::Resume;
    assert!(OverflowPolicy::from_config(&config).is_err());
}
