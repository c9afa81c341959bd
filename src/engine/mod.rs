// src/engine/mod.rs

//! Event dispatching for maildirlearn.
//!
//! This module ties together:
//! - the watch manager (where events come from)
//! - the path rules (what is excluded, what counts as spam)
//! - the classifier (what happens to new messages)
//!
//! The loop itself lives in [`dispatcher`]; [`rules`] holds the compiled
//! path patterns.

use crate::classify::Reconciliation;

pub mod dispatcher;
pub mod rules;

pub use dispatcher::Dispatcher;
pub use rules::PathRules;

/// What the dispatcher did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The path matched the exclusion pattern; nothing was done.
    Excluded,
    /// The absolute path could not be built (too long).
    SkippedPath,
    /// The watch was invalidated and dropped from the registry.
    Unwatched { removed: bool },
    /// A new directory; `started` tells whether a watch was created.
    Watched { started: bool },
    /// A new message was passed to the classifier.
    Classified(Reconciliation),
    /// The classifier failed for this message.
    ClassifyFailed,
    /// Not an event this watcher acts on.
    Ignored,
}
