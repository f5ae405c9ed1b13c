use crate::farmhand;
use crate::init;

#[test]
fn test_partition_dry() {
    let env = init();
    env.file("GenomeAnalysisTK.jar", "");
    env.file("b36.fasta", "");
    env.file(
        "targets.interval_list",
        "@HD\tVN:1.0\n\
         chr1\t0\t1000000\n\
         chr1\t1000000\t1900000\n\
         chr2\t0\t50000\n",
    );

    let out = farmhand!(env;
        "partition",
        "--dry",
        "--analysis", "UnifiedGenotyper",
        "--jar", "GenomeAnalysisTK.jar",
        "--reference", "b36.fasta",
        "--intervals", "targets.interval_list",
        "--output-dir", "out",
        "--budget", "1500000",
        "--project", "GSA";
        "partition --dry"
    );

    let log = String::from_utf8(out.stderr).unwrap();

    assert!(log.contains("bsub -q long -J GSA_job0 -P GSA -o /"));
    assert!(log.contains("/out/dispatch/dispatch0/bsub_out.txt"));
    assert!(log.contains("-R \"rusage[mem=4096]\" java -Xmx4g -jar GenomeAnalysisTK.jar"));
    assert!(log.contains("-J GSA_job1 "));
    assert!(!log.contains("GSA_job2"));

    assert!(!env.temp_dir.path().join("out").exists());
}

#[test]
fn test_partition_unsorted_intervals_fail() {
    let env = init();
    env.file("GenomeAnalysisTK.jar", "");
    env.file("b36.fasta", "");
    env.file("targets.interval_list", "chr1 500 600\nchr1 100 200\n");

    let out = farmhand!(env;
        "partition",
        "--dry",
        "--analysis", "CountReads",
        "--jar", "GenomeAnalysisTK.jar",
        "--reference", "b36.fasta",
        "--intervals", "targets.interval_list",
        "--output-dir", "out",
        "--budget", "100"
    );

    assert!(!out.status.success());
    assert!(String::from_utf8(out.stderr).unwrap().contains("not sorted"));
}
