use clap::crate_version;

use crate::farmhand;
use crate::init;

#[test]
fn test_farmhand_short_version() {
    let env = init();
    let out = farmhand!(env; "version", "-s"; "version");

    assert_eq!(
        String::from_utf8(out.stdout).unwrap().trim(),
        format!("farmhand {}", crate_version!())
    );
}

#[test]
fn test_farmhand_version() {
    let env = init();
    let out = farmhand!(env; "version"; "version");

    assert!(String::from_utf8(out.stdout)
        .unwrap()
        .contains(crate_version!()));
}
