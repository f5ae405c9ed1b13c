use std::fs;
use std::path::PathBuf;

use chrono::Local;
use chrono::TimeZone;
use tempdir::TempDir;

use super::*;
use crate::file_system::FileSystemInteractor;

const REAL_FS: FileSystemInteractor = FileSystemInteractor { dry_run: false };

/// This test will fail if the semantics of the config file are changed.
/// If this is the case, make sure old configuration files still make sense.
#[test]
fn breaking_changes_config_file_all_values() {
    let dir = TempDir::new("config_folder").unwrap();
    let file = dir.path().join("farmhand.toml");

    fs::write(
        &file,
        r#"
        overflow = "resume"
        spacing_increment = "0:12:0"
        initial_delay = "1:0:30"
        checkpoint = "./resume.txt"
        project = "GSA"
        die_on_fail = true
        wildcard_dependencies = false

        [[queues]]
        name = "long"
        limit = 500

        [[queues]]
        name = "short"
        limit = 20
        "#,
    )
    .unwrap();

    assert_eq!(
        Config {
            queues: vec![
                QueueLimit {
                    name: "long".to_string(),
                    limit: 500
                },
                QueueLimit {
                    name: "short".to_string(),
                    limit: 20
                },
            ],
            overflow: OverflowKind::Resume,
            spacing_increment: Some(DelayOffset::new(0, 12, 0)),
            initial_delay: Some(DelayOffset::new(1, 0, 30)),
            checkpoint: Some(PathBuf::from("./resume.txt")),
            project: "GSA".to_string(),
            die_on_fail: true,
            wildcard_dependencies: false,
        },
        Config::from_file(&file, &REAL_FS).unwrap()
    );
}

#[test]
fn config_defaults_test() {
    let dir = TempDir::new("config_folder").unwrap();
    let file = dir.path().join("farmhand.toml");
    fs::write(&file, "").unwrap();

    let config = Config::from_file(&file, &REAL_FS).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.queues, vec![QueueLimit::default()]);
    assert_eq!(config.queues[0].limit, 500);
}

#[test]
fn config_unknown_field_test() {
    let dir = TempDir::new("config_folder").unwrap();
    let file = dir.path().join("farmhand.toml");
    fs::write(&file, "queue = \"long\"").unwrap();

    assert!(Config::from_file(&file, &REAL_FS).is_err());
}

#[test]
fn config_missing_file_test() {
    let dir = TempDir::new("config_folder").unwrap();
    let file = dir.path().join("farmhand.toml");

    assert_eq!(
        Config::load(&file, false, &REAL_FS).unwrap(),
        Config::default()
    );
    assert!(Config::load(&file, true, &REAL_FS).is_err());
}

#[test]
fn queue_limit_parse_test() {
    assert_eq!(
        "long:20".parse::<QueueLimit>().unwrap(),
        QueueLimit {
            name: "long".to_string(),
            limit: 20
        }
    );
    assert_eq!("week".parse::<QueueLimit>().unwrap().limit, 500);
    assert!("long:many".parse::<QueueLimit>().is_err());
    assert!(":5".parse::<QueueLimit>().is_err());
}

#[test]
fn overflow_kind_parse_test() {
    assert_eq!("space".parse::<OverflowKind>().unwrap(), OverflowKind::Space);
    assert!("retry".parse::<OverflowKind>().is_err());
}

#[test]
fn delay_parse_test() {
    assert_eq!(
        "1:2:3".parse::<DelayOffset>().unwrap(),
        DelayOffset::new(1, 2, 3)
    );
    assert!("1:2".parse::<DelayOffset>().is_err());
    assert!("1:-2:3".parse::<DelayOffset>().is_err());
    assert!("a:b:c".parse::<DelayOffset>().is_err());
}

#[test]
fn delay_arithmetic_test() {
    let start = DelayOffset::new(0, 1, 0);
    let increment = DelayOffset::new(0, 0, 45);

    assert_eq!(start + increment.times(3), DelayOffset::new(0, 1, 135));
    assert_eq!((start + increment.times(3)).total_minutes(), 195);
}

#[test]
fn delay_to_absolute_test() {
    let now = Local.with_ymd_and_hms(2010, 7, 14, 22, 50, 0).unwrap();

    assert_eq!(
        DelayOffset::new(0, 0, 0).to_absolute(now).unwrap(),
        "2010:7:14:22:50"
    );
    assert_eq!(
        DelayOffset::new(1, 1, 15).to_absolute(now).unwrap(),
        "2010:7:16:0:5"
    );
}

#[test]
fn delay_overflow_test() {
    let now = Local.with_ymd_and_hms(2010, 7, 14, 22, 50, 0).unwrap();
    let huge = DelayOffset::new(u64::MAX, 0, 0);

    assert_eq!(huge.times(2), huge);
    assert_eq!(huge + DelayOffset::new(1, 0, 0), huge);
    assert!(huge.times(3).to_absolute(now).is_err());
}
