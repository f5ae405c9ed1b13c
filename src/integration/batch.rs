use crate::farmhand;
use crate::init;

const JOBS: &str = r#"
[[jobs]]
command = "echo second >> order.txt"
name = "SECOND"
after = ["FIRST"]

[[jobs]]
command = "echo first >> order.txt"
name = "FIRST"
"#;

#[test]
fn test_batch_local_runs_in_dependency_order() {
    let env = init();
    env.file("jobs.toml", JOBS);

    farmhand!(env; "batch", "jobs.toml", "--local"; "batch --local");

    let order = std::fs::read_to_string(env.temp_dir.path().join("order.txt")).unwrap();
    assert_eq!(order, "first\nsecond\n");
}

#[test]
fn test_batch_local_die_on_fail_exit_code() {
    let env = init();
    env.file(
        "jobs.toml",
        r#"
        [[jobs]]
        command = "exit 3"

        [[jobs]]
        command = "touch never.txt"
        "#,
    );

    let out = farmhand!(env; "batch", "jobs.toml", "--local", "--die-on-fail");

    assert_eq!(out.status.code(), Some(3));
    assert!(!env.temp_dir.path().join("never.txt").exists());

    let out = farmhand!(env; "batch", "jobs.toml", "--local");

    assert!(out.status.success());
    assert!(env.temp_dir.path().join("never.txt").exists());
}

#[test]
fn test_batch_dry_prints_submissions() {
    let env = init();
    env.file("jobs.toml", JOBS);

    let out = farmhand!(env; "batch", "jobs.toml", "--dry", "-s", "--queue", "short:5"; "batch --dry");
    let log = String::from_utf8(out.stderr).unwrap();

    let first = log.find("bsub -q short -J FIRST -o FIRST.stdout echo first").unwrap();
    let second = log
        .find("bsub -q short -J SECOND -o SECOND.stdout -w 'ended(\"FIRST\")' echo second")
        .unwrap();
    assert!(first < second);

    let report = String::from_utf8(out.stdout).unwrap();
    assert!(report.contains("1 | short  | FIRST"));
    assert!(report.contains("2 | short  | SECOND"));

    assert!(!env.temp_dir.path().join("order.txt").exists());
}

#[test]
fn test_batch_over_capacity_fails() {
    let env = init();
    env.file("jobs.toml", JOBS);

    let out = farmhand!(env; "batch", "jobs.toml", "--dry", "--queue", "short:1");

    assert!(!out.status.success());
    assert!(String::from_utf8(out.stderr).unwrap().contains("exceeds the maximum"));
}

#[test]
fn test_batch_missing_explicit_config_fails() {
    let env = init();
    env.file("jobs.toml", JOBS);

    let out = farmhand!(env; "batch", "jobs.toml", "--dry", "-c", "missing.toml");

    assert!(!out.status.success());
}
