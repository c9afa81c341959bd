// src/classify/bogofilter.rs

//! Classifier backed by an external `bogofilter`-compatible program.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use super::{ClassifyError, Classifier, Label, Reconciliation, Verdict, relearn_flag};

/// Runs `<program> [args...] -I <path>` to query a message and
/// `<program> [args...] <flag> -I <path>` to relearn it.
#[derive(Debug, Clone)]
pub struct Bogofilter {
    program: PathBuf,
    args: Vec<String>,
}

impl Bogofilter {
    /// `args` are passed before the per-call options, e.g. `["-d", "/var/lib/bogo"]`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Ask the program what it currently thinks of the message at `path`.
    pub async fn query(&self, path: &Path) -> Result<Verdict, ClassifyError> {
        let status = self.run(None, path).await?;
        let verdict = Verdict::from_exit_code(status.code()).ok_or_else(|| {
            ClassifyError::UnrecognizedStatus {
                path: path.to_path_buf(),
                status: status.to_string(),
            }
        })?;
        debug!(?path, %verdict, "current classification");
        Ok(verdict)
    }

    /// Register the message at `path` with the given registration flag.
    pub async fn relearn(&self, path: &Path, flag: &str, label: Label) -> Result<(), ClassifyError> {
        let status = self.run(Some(flag), path).await?;
        if !status.success() {
            return Err(ClassifyError::RelearnFailed {
                path: path.to_path_buf(),
                label,
                status: status.to_string(),
            });
        }
        Ok(())
    }

    async fn run(&self, flag: Option<&str>, path: &Path) -> Result<ExitStatus, ClassifyError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(flag) = flag {
            cmd.arg(flag);
        }
        cmd.arg("-I")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd.output().await.map_err(|source| ClassifyError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(program = ?self.program, "stderr: {}", line);
        }
        Ok(output.status)
    }
}

impl Classifier for Bogofilter {
    fn classify<'a>(
        &'a mut self,
        path: &'a Path,
        desired: Label,
    ) -> Pin<Box<dyn Future<Output = Result<Reconciliation, ClassifyError>> + Send + 'a>> {
        Box::pin(async move {
            let current = self.query(path).await?;
            let Some(flag) = relearn_flag(current, desired) else {
                return Ok(Reconciliation::Unchanged(current));
            };

            info!(?path, from = %current, to = %desired, flag, "relearning message");
            self.relearn(path, flag, desired).await?;
            Ok(Reconciliation::Relearned {
                from: current,
                to: desired,
            })
        })
    }
}
