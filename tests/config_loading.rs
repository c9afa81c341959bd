// tests/config_loading.rs

mod common;
use crate::common::TestResult;
use crate::common::builders::ConfigFileBuilder;

use std::fs;
use std::path::{Path, PathBuf};

use maildirlearn::classify::Label;
use maildirlearn::config::{ConfigFile, RawConfigFile, load_and_validate, load_raw_or_default};
use maildirlearn::engine::PathRules;
use maildirlearn::errors::LearnError;

#[test]
fn built_in_defaults_are_valid() -> TestResult {
    let cfg = ConfigFile::try_from(RawConfigFile::default())?;

    assert_eq!(cfg.watch.root, Path::new("mail/"));
    assert_eq!(cfg.watch.registry_capacity, 128);
    assert_eq!(cfg.watch.max_path_len, 1024);
    assert_eq!(cfg.watch.read_buffer_size, 4096);
    assert_eq!(cfg.rules.spam, r"mail/\.Junk/");
    assert_eq!(cfg.classifier.program, "bogofilter");
    assert!(cfg.classifier.args.is_empty());
    Ok(())
}

#[test]
fn file_values_override_defaults() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("maildirlearn.toml");
    fs::write(
        &path,
        r#"
[watch]
root = "/home/user/Maildir"
max_path_len = 512

[rules]
spam = 'Maildir/\.(Junk|Spam)/'

[classifier]
program = "/usr/local/bin/bogofilter"
args = ["-d", "/var/lib/bogofilter"]
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.watch.root, Path::new("/home/user/Maildir/"));
    assert_eq!(cfg.watch.max_path_len, 512);
    assert_eq!(cfg.watch.registry_capacity, 128, "unset keys keep defaults");
    assert_eq!(cfg.rules.spam, r"Maildir/\.(Junk|Spam)/");
    assert!(cfg.rules.exclude.contains("dovecot"));
    assert_eq!(cfg.classifier.args, ["-d", "/var/lib/bogofilter"]);

    let settings = cfg.watch_settings();
    assert_eq!(settings.root, Path::new("/home/user/Maildir/"));
    assert_eq!(settings.max_path_len, 512);
    Ok(())
}

#[test]
fn root_gets_a_trailing_separator() -> TestResult {
    let cfg = ConfigFileBuilder::new().root("Maildir").build();
    assert_eq!(cfg.watch.root.as_os_str(), "Maildir/");

    let cfg = ConfigFileBuilder::new().root("Maildir/").build();
    assert_eq!(cfg.watch.root.as_os_str(), "Maildir/");
    Ok(())
}

#[test]
fn invalid_pattern_is_rejected() {
    let raw = ConfigFileBuilder::new().spam("mail/(unclosed").raw();
    let err = ConfigFile::try_from(raw).expect_err("pattern must not compile");
    assert!(matches!(err, LearnError::PatternError(_)));
}

#[test]
fn out_of_range_sizes_are_rejected() {
    let zero_capacity = {
        let mut raw = RawConfigFile::default();
        raw.watch.registry_capacity = 0;
        raw
    };
    let tiny_buffer = ConfigFileBuilder::new().read_buffer_size(64).raw();
    let short_limit = ConfigFileBuilder::new().root("/srv/mail").max_path_len(4).raw();
    let empty_root = ConfigFileBuilder::new().root("").raw();
    let no_program = ConfigFileBuilder::new().program("  ").raw();

    for raw in [zero_capacity, tiny_buffer, short_limit, empty_root, no_program] {
        let err = ConfigFile::try_from(raw).expect_err("config must be rejected");
        assert!(matches!(err, LearnError::ConfigError(_)), "got {err:?}");
    }
}

#[test]
fn malformed_toml_is_reported() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("broken.toml");
    fs::write(&path, "[watch\nroot = 1\n")?;

    let err = load_and_validate(&path).expect_err("not valid TOML");
    assert!(matches!(err, LearnError::TomlError(_)));
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let err = load_raw_or_default(Some(tmp.path().join("absent.toml").as_path()))
        .expect_err("explicit path must exist");
    assert!(matches!(err, LearnError::IoError(_)));
    Ok(())
}

#[test]
fn demo_config_loads() -> TestResult {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/maildirlearn.toml");
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.watch.root, Path::new("mail/"));
    assert_eq!(cfg.classifier.args, ["-d", "/var/lib/maildirlearn/bogofilter"]);
    Ok(())
}

#[test]
fn default_rules_follow_an_overridden_root() -> TestResult {
    let mut raw = RawConfigFile::default();
    raw.override_root(PathBuf::from("/home/u/Maildir"));
    let cfg = ConfigFile::try_from(raw)?;
    let rules = PathRules::from_config(&cfg)?;

    assert_eq!(rules.desired_label(Path::new("/home/u/Maildir/.Junk/cur/1:2,S")), Label::Spam);
    assert_eq!(rules.desired_label(Path::new("/home/u/Maildir/INBOX/cur/1:2,S")), Label::Ham);
    assert!(rules.is_excluded(Path::new("/home/u/Maildir/INBOX/tmp/")));
    assert!(rules.is_excluded(Path::new("/home/u/Maildir/.Trash/cur/1:2,ST")));
    assert!(rules.is_excluded(Path::new("/home/u/Maildir/dovecot.index")));
    assert!(!rules.is_excluded(Path::new("/home/u/Maildir/INBOX/cur/1:2,S")));
    Ok(())
}

#[test]
fn overridden_root_is_matched_literally() -> TestResult {
    let cfg = ConfigFileBuilder::new().root("mail.d+").build();
    let rules = PathRules::from_config(&cfg)?;

    assert_eq!(rules.desired_label(Path::new("mail.d+/.Junk/1")), Label::Spam);
    assert_eq!(rules.desired_label(Path::new("mailxdd/.Junk/1")), Label::Ham);
    Ok(())
}

#[test]
fn explicit_rules_ignore_the_root() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .root("/srv/Maildir")
        .spam(r"mail/\.Junk/")
        .build();

    assert_eq!(cfg.rules.spam, r"mail/\.Junk/");
    assert!(cfg.rules.exclude.starts_with("/srv/Maildir/("));
    Ok(())
}
