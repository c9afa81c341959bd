// tests/bogofilter_reconcile.rs

mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::fs;
use std::path::{Path, PathBuf};

use maildirlearn::classify::{
    Bogofilter, Classifier, ClassifyError, Label, Reconciliation, Verdict, relearn_flag,
};

#[test]
fn relearn_flags_cover_every_disagreement() {
    assert_eq!(relearn_flag(Verdict::Spam, Label::Spam), None);
    assert_eq!(relearn_flag(Verdict::Ham, Label::Ham), None);
    assert_eq!(relearn_flag(Verdict::Unsure, Label::Ham), Some("-n"));
    assert_eq!(relearn_flag(Verdict::Unsure, Label::Spam), Some("-s"));
    assert_eq!(relearn_flag(Verdict::Spam, Label::Ham), Some("-Sn"));
    assert_eq!(relearn_flag(Verdict::Ham, Label::Spam), Some("-Ns"));
}

#[test]
fn exit_codes_map_to_verdicts() {
    assert_eq!(Verdict::from_exit_code(Some(0)), Some(Verdict::Spam));
    assert_eq!(Verdict::from_exit_code(Some(1)), Some(Verdict::Ham));
    assert_eq!(Verdict::from_exit_code(Some(2)), Some(Verdict::Unsure));
    assert_eq!(Verdict::from_exit_code(Some(3)), None);
    // Killed by a signal.
    assert_eq!(Verdict::from_exit_code(None), None);
}

/// A stand-in for bogofilter, run through `/bin/sh` so nothing has to be
/// made executable.
///
/// Every invocation appends its arguments to `calls.log`. A query exits with
/// `query_code`; a registration (`-n`, `-s`, `-Sn`, `-Ns`) with
/// `relearn_code`.
struct FakeBogofilter {
    dir: tempfile::TempDir,
}

impl FakeBogofilter {
    fn new(query_code: i32, relearn_code: i32) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("calls.log");
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{log}'\n\
             for a in \"$@\"; do\n\
             case \"$a\" in -n|-s|-Sn|-Ns) exit {relearn_code} ;; esac\n\
             done\n\
             exit {query_code}\n",
            log = log.display(),
        );
        fs::write(dir.path().join("bogofilter.sh"), script)?;
        fs::write(dir.path().join("message"), "From: a@example.org\n\nhello\n")?;
        Ok(Self { dir })
    }

    fn classifier(&self) -> Bogofilter {
        let script = self.dir.path().join("bogofilter.sh");
        Bogofilter::new("/bin/sh", vec![script.display().to_string()])
    }

    fn message(&self) -> PathBuf {
        self.dir.path().join("message")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn query_line(msg: &Path) -> String {
    format!("-I {}", msg.display())
}

#[tokio::test]
async fn agreeing_verdict_is_left_alone() -> TestResult {
    init_tracing();
    let fake = FakeBogofilter::new(0, 0)?;
    let msg = fake.message();

    let outcome = with_timeout(fake.classifier().classify(&msg, Label::Spam)).await?;
    assert_eq!(outcome, Reconciliation::Unchanged(Verdict::Spam));
    assert_eq!(fake.calls(), vec![query_line(&msg)]);
    Ok(())
}

#[tokio::test]
async fn unsure_message_is_registered() -> TestResult {
    let fake = FakeBogofilter::new(2, 0)?;
    let msg = fake.message();

    let outcome = with_timeout(fake.classifier().classify(&msg, Label::Ham)).await?;
    assert_eq!(
        outcome,
        Reconciliation::Relearned {
            from: Verdict::Unsure,
            to: Label::Ham
        }
    );
    assert_eq!(
        fake.calls(),
        vec![query_line(&msg), format!("-n {}", query_line(&msg))]
    );
    Ok(())
}

#[tokio::test]
async fn misclassified_message_is_unlearned_then_relearned() -> TestResult {
    let spam_as_ham = FakeBogofilter::new(1, 0)?;
    let msg = spam_as_ham.message();
    with_timeout(spam_as_ham.classifier().classify(&msg, Label::Spam)).await?;
    assert_eq!(spam_as_ham.calls()[1], format!("-Ns {}", query_line(&msg)));

    let ham_as_spam = FakeBogofilter::new(0, 0)?;
    let msg = ham_as_spam.message();
    with_timeout(ham_as_spam.classifier().classify(&msg, Label::Ham)).await?;
    assert_eq!(ham_as_spam.calls()[1], format!("-Sn {}", query_line(&msg)));
    Ok(())
}

#[tokio::test]
async fn extra_arguments_come_first() -> TestResult {
    let fake = FakeBogofilter::new(1, 0)?;
    let msg = fake.message();
    let script = fake.dir.path().join("bogofilter.sh");
    let mut classifier = Bogofilter::new(
        "/bin/sh",
        vec![script.display().to_string(), "-d".into(), "/var/lib/bogofilter".into()],
    );

    with_timeout(classifier.classify(&msg, Label::Ham)).await?;
    assert_eq!(
        fake.calls(),
        vec![format!("-d /var/lib/bogofilter {}", query_line(&msg))]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_status_is_an_error() -> TestResult {
    let fake = FakeBogofilter::new(3, 0)?;
    let msg = fake.message();

    let err = with_timeout(fake.classifier().classify(&msg, Label::Ham))
        .await
        .expect_err("status 3 is not a verdict");
    assert!(matches!(err, ClassifyError::UnrecognizedStatus { .. }));
    assert_eq!(fake.calls().len(), 1, "no relearn after a failed query");
    Ok(())
}

#[tokio::test]
async fn failed_registration_is_an_error() -> TestResult {
    let fake = FakeBogofilter::new(2, 3)?;
    let msg = fake.message();

    let err = with_timeout(fake.classifier().classify(&msg, Label::Spam))
        .await
        .expect_err("registration fails");
    match err {
        ClassifyError::RelearnFailed { path, label, .. } => {
            assert_eq!(path, msg);
            assert_eq!(label, Label::Spam);
        }
        other => panic!("expected RelearnFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let mut classifier = Bogofilter::new(tmp.path().join("no-such-bogofilter"), Vec::new());

    let err = with_timeout(classifier.classify(&tmp.path().join("msg"), Label::Ham))
        .await
        .expect_err("program does not exist");
    assert!(matches!(err, ClassifyError::Spawn { .. }));
    Ok(())
}
