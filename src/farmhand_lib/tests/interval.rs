use super::*;

#[test]
fn interval_basics_test() {
    let interval = Interval::new("chr1", 1000, 1900).unwrap();

    assert_eq!(interval.size(), 900);
    assert_eq!(interval.to_string(), "chr1:1000-1900");
    assert_eq!(interval.bed_format(), "chr1\t1000\t1900\t+\ttarget_whatever");
    assert_eq!(
        interval.identity_hash(),
        Interval::new("chr1", 1000, 1900).unwrap().identity_hash()
    );
}

#[test]
fn interval_rejects_inverted_range_test() {
    assert!(Interval::new("chr1", 10, 9).is_err());
    assert!(Interval::new("chr1", 10, 10).is_ok());
}

#[test]
fn parse_interval_list_test() {
    let text = "@HD\tVN:1.0\n@SQ\tSN:chr1\tLN:247249719\nchr1 0 1000000 + target_1\n\nchr2\t5\t10\n";
    let list = IntervalList::parse(text).unwrap();

    assert_eq!(
        list.header,
        vec!["@HD\tVN:1.0".to_string(), "@SQ\tSN:chr1\tLN:247249719".to_string()]
    );
    assert_eq!(
        list.intervals,
        vec![
            Interval::new("chr1", 0, 1000000).unwrap(),
            Interval::new("chr2", 5, 10).unwrap(),
        ]
    );
}

#[test]
fn parse_malformed_line_test() {
    let err = IntervalList::parse("chr1 0 100\nchr1 abc 200\n").unwrap_err();

    assert!(format!("{err:#}").contains("line 2"));
    assert!(IntervalList::parse("chr1 0\n").is_err());
}

#[test]
fn check_sorted_test() {
    let sorted = IntervalList::parse("chr1 0 10\nchr1 10 20\nchr2 0 5\n").unwrap();
    assert!(sorted.check_sorted().is_ok());

    let backwards = IntervalList::parse("chr1 10 20\nchr1 0 10\n").unwrap();
    assert!(backwards.check_sorted().is_err());

    let revisited = IntervalList::parse("chr1 0 10\nchr2 0 10\nchr1 20 30\n").unwrap();
    assert!(revisited.check_sorted().is_err());
}

#[test]
fn render_chunk_test() {
    let header = vec!["@HD\tVN:1.0".to_string()];
    let intervals = vec![Interval::new("chr2", 0, 50000).unwrap()];

    assert_eq!(
        IntervalList::render_chunk(&header, &intervals),
        "@HD\tVN:1.0\nchr2\t0\t50000\t+\ttarget_whatever\n"
    );
}
