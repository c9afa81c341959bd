// src/classify/mod.rs

//! Spam classification of newly arrived messages.
//!
//! The dispatcher only sees the [`Classifier`] trait: "this message should be
//! labelled X". The production implementation, [`Bogofilter`], asks an
//! external `bogofilter`-compatible program what it currently thinks of the
//! message and, if that disagrees with the desired label, tells it to relearn.
//! Tests can substitute a classifier that only records the calls.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;

pub mod bogofilter;

pub use bogofilter::Bogofilter;

/// Label the user assigned to a message by filing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Spam,
    Ham,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Spam => write!(f, "spam"),
            Label::Ham => write!(f, "ham"),
        }
    }
}

/// What the classifier currently thinks of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Spam,
    Ham,
    Unsure,
}

impl Verdict {
    /// Map a classifier exit code to a verdict.
    ///
    /// `0` is spam, `1` ham, `2` unsure. Anything else, including death by
    /// signal (`None`), is not a verdict.
    pub fn from_exit_code(code: Option<i32>) -> Option<Verdict> {
        match code {
            Some(0) => Some(Verdict::Spam),
            Some(1) => Some(Verdict::Ham),
            Some(2) => Some(Verdict::Unsure),
            _ => None,
        }
    }
}

impl From<Label> for Verdict {
    fn from(label: Label) -> Self {
        match label {
            Label::Spam => Verdict::Spam,
            Label::Ham => Verdict::Ham,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Spam => write!(f, "spam"),
            Verdict::Ham => write!(f, "ham"),
            Verdict::Unsure => write!(f, "unsure"),
        }
    }
}

/// Result of reconciling a message's verdict with its desired label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The classifier already agreed.
    Unchanged(Verdict),
    /// The classifier was told to relearn the message.
    Relearned { from: Verdict, to: Label },
}

/// Registration flag that moves a message from `current` to `desired`.
///
/// `None` when they already agree. Messages the classifier was unsure about
/// are simply registered; messages it had learned the other way round are
/// unregistered first (`-S` / `-N`).
pub fn relearn_flag(current: Verdict, desired: Label) -> Option<&'static str> {
    match (current, desired) {
        (Verdict::Spam, Label::Spam) | (Verdict::Ham, Label::Ham) => None,
        (Verdict::Unsure, Label::Ham) => Some("-n"),
        (Verdict::Unsure, Label::Spam) => Some("-s"),
        (Verdict::Spam, Label::Ham) => Some("-Sn"),
        (Verdict::Ham, Label::Spam) => Some("-Ns"),
    }
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("failed to run classifier {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("classifier returned unrecognized status {status} for {path:?}")]
    UnrecognizedStatus { path: PathBuf, status: String },

    #[error("classifier failed to relearn {path:?} as {label} (status {status})")]
    RelearnFailed {
        path: PathBuf,
        label: Label,
        status: String,
    },
}

/// Something that can bring a message's classification in line with the
/// label it should have.
pub trait Classifier: Send {
    fn classify<'a>(
        &'a mut self,
        path: &'a Path,
        desired: Label,
    ) -> Pin<Box<dyn Future<Output = Result<Reconciliation, ClassifyError>> + Send + 'a>>;
}
