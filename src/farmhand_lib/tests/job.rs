use super::*;

#[test]
fn builder_test() {
    let job = Job::builder("echo hi")
        .name("GREET")
        .group("GSA")
        .memory("4g")
        .output("greet.out")
        .delay(DelayOffset::new(0, 1, 0))
        .after_name("SETUP")
        .build()
        .unwrap();

    assert_eq!(job.command, "echo hi");
    assert_eq!(job.memory_mb, Some(4096));
    assert_eq!(job.delay(), Some(DelayOffset::new(0, 1, 0)));
    assert_eq!(
        job.dependencies(),
        &[Dependency::ByName("SETUP".to_string())]
    );
    assert_eq!(job.state(), JobState::default());
}

#[test]
fn mixed_dependency_kinds_test() {
    let mut batch = JobBatch::new();
    let a = batch.push(Job::builder("a").name("A").build().unwrap()).unwrap();

    let mixed = Job::builder("c").after(a).after_name("B").build();

    assert!(mixed.is_err_and(|e| e.to_string().contains("by name and some by job")));
}

#[test]
fn mixed_named_and_unnamed_targets_test() {
    let mut batch = JobBatch::new();
    let a = batch.push(Job::builder("a").name("A").build().unwrap()).unwrap();
    let b = batch.push(Job::builder("b").build().unwrap()).unwrap();

    let c = Job::builder("c").after(a).after(b).build().unwrap();

    assert!(batch.push(c).is_err());

    let d = Job::builder("d").after(b).build().unwrap();
    assert!(batch.push(d).is_ok());
}

#[test]
fn forward_reference_test() {
    let mut batch = JobBatch::new();
    let mut other = JobBatch::new();
    other.push(Job::builder("x").build().unwrap()).unwrap();
    let dangling = other.push(Job::builder("y").build().unwrap()).unwrap();

    let job = Job::builder("z").after(dangling).build().unwrap();

    assert!(batch.push(job).is_err());
}

#[test]
fn duplicate_names_test() {
    let result = JobBatch::from_jobs([
        Job::builder("a").name("SAME").build().unwrap(),
        Job::builder("b").name("SAME").build().unwrap(),
    ]);

    assert!(result.is_err());
}

#[test]
fn memory_parse_test() {
    assert_eq!(parse_memory_mb("4g").unwrap(), 4096);
    assert_eq!(parse_memory_mb("4G").unwrap(), 4096);
    assert_eq!(parse_memory_mb("512m").unwrap(), 512);
    assert_eq!(parse_memory_mb("2048").unwrap(), 2048);
    assert!(parse_memory_mb("-1").is_err());
    assert!(parse_memory_mb("-2g").is_err());
    assert!(parse_memory_mb("lots").is_err());
    assert!(parse_memory_mb("18014398509481984g")
        .is_err_and(|e| e.root_cause().to_string().contains("too large")));

    assert!(Job::builder("a").memory("-5").build().is_err());
}

#[test]
fn submitted_once_test() {
    let mut job = Job::builder("a").build().unwrap();

    job.mark_submitted(7).unwrap();

    assert_eq!(job.state().assigned_id, Some(7));
    assert!(job.state().submitted);
    assert!(job.mark_submitted(8).is_err());
    assert!(job.set_delay(DelayOffset::new(0, 0, 1)).is_err());
}

#[test]
fn id_string_test() {
    let mut job = Job::builder("a").build().unwrap();
    assert_eq!(job.id_string(), "UNNAMED");

    job.mark_submitted(12).unwrap();
    assert_eq!(job.id_string(), "12");

    let named = Job::builder("a").name("NAMED").build().unwrap();
    assert_eq!(named.id_string(), "NAMED");
}

#[test]
fn identity_hash_test() {
    let chr1 = Interval::new("chr1", 0, 100).unwrap();
    let chr2 = Interval::new("chr2", 0, 100).unwrap();

    let job = Job::builder("run -L chunk")
        .intervals(vec![chr1.clone(), chr2.clone()])
        .build()
        .unwrap();
    let reordered = Job::builder("run -L chunk")
        .intervals(vec![chr2, chr1.clone()])
        .build()
        .unwrap();
    let fewer = Job::builder("run -L chunk")
        .intervals(vec![chr1])
        .build()
        .unwrap();
    let other_command = Job::builder("run -L other").build().unwrap();

    assert_eq!(job.identity_hash(), reordered.identity_hash());
    assert_ne!(job.identity_hash(), fewer.identity_hash());
    assert_ne!(fewer.identity_hash(), other_command.identity_hash());
}

#[test]
fn invalid_name_test() {
    assert!(Job::builder("a").name("two words").build().is_err());
    assert!(Job::builder("a").name("").build().is_err());
}
