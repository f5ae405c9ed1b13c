use std::fs;

use super::*;
use crate::file_system::FileSystemInteractor;
use crate::job::Dependency;

#[test]
fn job_list_test() {
    let tempdir = tempdir::TempDir::new("job_list_test").unwrap();
    let path = tempdir.path().join("jobs.toml");

    fs::write(
        &path,
        r#"
        [[jobs]]
        command = "samtools index a.bam"
        name = "INDEX_a"

        [[jobs]]
        command = "samtools index b.bam"
        name = "INDEX_b"
        memory = "2g"

        [[jobs]]
        command = "merge a.bam b.bam"
        name = "MERGE"
        group = "GSA"
        delay = "0:1:30"
        after = ["INDEX_*"]
        "#,
    )
    .unwrap();

    let list = JobList::from_file(&path, &FileSystemInteractor { dry_run: false }).unwrap();
    let batch = list.into_batch().unwrap();

    assert_eq!(batch.len(), 3);

    let merge = batch.get(batch.find_by_name("MERGE").unwrap());
    assert_eq!(merge.group.as_deref(), Some("GSA"));
    assert_eq!(merge.delay(), Some(DelayOffset::new(0, 1, 30)));
    assert_eq!(
        merge.dependencies(),
        &[Dependency::ByName("INDEX_*".to_string())]
    );

    let b = batch.get(batch.find_by_name("INDEX_b").unwrap());
    assert_eq!(b.memory_mb, Some(2048));
}

#[test]
fn job_list_rejects_unknown_keys_test() {
    let list = toml::from_str::<JobList>(
        r#"
        [[jobs]]
        command = "true"
        queue = "long"
        "#,
    );

    assert!(list.is_err());
}

#[test]
fn job_list_rejects_duplicate_names_test() {
    let list = toml::from_str::<JobList>(
        r#"
        [[jobs]]
        command = "a"
        name = "SAME"

        [[jobs]]
        command = "b"
        name = "SAME"
        "#,
    )
    .unwrap();

    assert!(list.into_batch().is_err());
}
