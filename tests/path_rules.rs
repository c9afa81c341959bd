// tests/path_rules.rs

mod common;
use crate::common::builders::default_rules;

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use maildirlearn::classify::Label;
use maildirlearn::engine::PathRules;

#[test]
fn default_exclusions() {
    let rules = default_rules();

    for path in [
        "mail/.Unsure/cur/1:2,S",
        "mail/INBOX/tmp",
        "mail/INBOX/tmp/1700000000.M1P1.host",
        "mail/INBOX/cur/1700000000.M1P1.host:2,ST",
        "mail/INBOX/cur/1700000000.M1P1.host:2,T",
        "mail/dovecot.index.log",
        "mail/INBOX/dovecot-uidlist",
    ] {
        assert!(rules.is_excluded(Path::new(path)), "{path} should be excluded");
    }

    for path in [
        "mail/",
        "mail/INBOX",
        "mail/INBOX/cur/1700000000.M1P1.host:2,S",
        "mail/INBOX/new/1700000000.M1P1.host",
        "mail/.Junk/cur/1234:2,S",
        // T after the U-Z range is not the trashed flag.
        "mail/INBOX/cur/1:2,ZT",
    ] {
        assert!(!rules.is_excluded(Path::new(path)), "{path} should not be excluded");
    }
}

#[test]
fn junk_folder_means_spam() {
    let rules = default_rules();
    assert_eq!(rules.desired_label(Path::new("mail/.Junk/cur/1234:2,S")), Label::Spam);
    assert_eq!(rules.desired_label(Path::new("mail/.Junk/new/1234")), Label::Spam);
    assert_eq!(rules.desired_label(Path::new("mail/INBOX/new/msg1")), Label::Ham);
    assert_eq!(rules.desired_label(Path::new("mail/.Junk-old/cur/1")), Label::Ham);
}

#[test]
fn patterns_match_non_utf8_names() -> Result<(), Box<dyn std::error::Error>> {
    let rules = PathRules::new(r"(?-u:\xff)", r"mail/\.Junk/")?;
    let name = OsStr::from_bytes(b"mail/.Junk/cur/\xffmsg");

    assert!(rules.is_excluded(Path::new(name)));
    assert_eq!(rules.desired_label(Path::new(name)), Label::Spam);
    Ok(())
}

#[test]
fn invalid_pattern_fails_to_compile() {
    assert!(PathRules::new("(", "x").is_err());
    assert!(PathRules::new("x", "[").is_err());
}
