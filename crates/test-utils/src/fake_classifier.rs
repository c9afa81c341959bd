use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use maildirlearn::classify::{Classifier, ClassifyError, Label, Reconciliation, Verdict};

/// A classifier that:
/// - records every `(path, desired label)` it is asked about
/// - reports the message as already agreeing, or fails if told to.
#[derive(Clone, Default)]
pub struct RecordingClassifier {
    calls: Arc<Mutex<Vec<(PathBuf, Label)>>>,
    failing: bool,
}

impl RecordingClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `UnrecognizedStatus` (still recorded).
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Label)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Classifier for RecordingClassifier {
    fn classify<'a>(
        &'a mut self,
        path: &'a Path,
        desired: Label,
    ) -> Pin<Box<dyn Future<Output = Result<Reconciliation, ClassifyError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_path_buf(), desired));

            if self.failing {
                return Err(ClassifyError::UnrecognizedStatus {
                    path: path.to_path_buf(),
                    status: "exit status: 3".to_string(),
                });
            }
            Ok(Reconciliation::Unchanged(Verdict::from(desired)))
        })
    }
}
