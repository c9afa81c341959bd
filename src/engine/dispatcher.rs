// src/engine/dispatcher.rs

use std::fmt;
use std::future::Future;

use tracing::{debug, info, trace, warn};

use crate::classify::Classifier;
use crate::errors::Result;
use crate::watch::{NotifyChannel, WatchError, WatchEvent, WatchManager};

use super::Action;
use super::rules::PathRules;

/// The main loop: pulls events from the [`WatchManager`], filters them and
/// either watches new directories or hands new messages to the classifier.
pub struct Dispatcher<C: NotifyChannel, K: Classifier> {
    manager: WatchManager<C>,
    rules: PathRules,
    classifier: K,
}

impl<C: NotifyChannel, K: Classifier> fmt::Debug for Dispatcher<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("manager", &self.manager)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<C: NotifyChannel, K: Classifier> Dispatcher<C, K> {
    pub fn new(manager: WatchManager<C>, rules: PathRules, classifier: K) -> Self {
        Self {
            manager,
            rules,
            classifier,
        }
    }

    pub fn manager(&self) -> &WatchManager<C> {
        &self.manager
    }

    /// Handle every pending synthetic event without reading the channel.
    ///
    /// Returns the number of events handled. Used at startup so the whole
    /// pre-existing tree is watched before the first live event.
    pub async fn settle(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.manager.next_discovered() {
            let action = self.handle(event).await;
            trace!(?action, "handled discovered directory");
            handled += 1;
        }
        handled
    }

    /// Fetch and handle a single event.
    ///
    /// Returns `Ok(None)` when the fetch failed for this event only; `Err`
    /// only for failures the watcher cannot recover from.
    pub async fn step(&mut self) -> Result<Option<Action>> {
        let fetched = self.manager.next_event().await;
        self.dispatch(fetched).await
    }

    /// Run until `shutdown` resolves or a fatal error occurs, then close the
    /// watch manager.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.settle().await;
        info!(
            watches = self.manager.registry().len(),
            "initial directory tree watched"
        );

        let outcome = loop {
            // Only the fetch is raced against shutdown; a classification in
            // progress is always allowed to finish.
            let fetched = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                fetched = self.manager.next_event() => Some(fetched),
            };

            let Some(fetched) = fetched else {
                info!("stop requested");
                break Ok(());
            };

            if let Err(err) = self.dispatch(fetched).await {
                break Err(err);
            }
        };

        self.manager.close();
        outcome
    }

    /// Apply exclusion, then watch / unwatch / classify as the event demands.
    pub async fn handle(&mut self, event: WatchEvent) -> Action {
        let entry = &event.entry;
        let path = match self.manager.absolute_path(entry, event.name.as_deref()) {
            Ok(path) => path,
            Err(err) => {
                warn!(dir = %entry.relative_path(), error = %err, "skipping event");
                return Action::SkippedPath;
            }
        };

        if self.rules.is_excluded(&path) {
            trace!(?path, "excluded");
            return Action::Excluded;
        }

        if event.flags.invalidated {
            let removed = self.manager.stop_watching(entry.id());
            return Action::Unwatched { removed };
        }

        // A record without a name concerns the directory itself; only the
        // invalidation above applies to those.
        let Some(name) = event.name.as_deref().filter(|n| !n.is_empty()) else {
            debug!(?path, flags = ?event.flags, "ignoring event without a name");
            return Action::Ignored;
        };

        if !event.flags.created {
            debug!(?path, flags = ?event.flags, "ignoring event");
            return Action::Ignored;
        }

        if event.flags.is_dir {
            let child = entry.relative_path().child_dir(name);
            let started = self.manager.start_watching(&child);
            return Action::Watched { started };
        }

        let desired = self.rules.desired_label(&path);
        debug!(?path, %desired, "new message");
        match self.classifier.classify(&path, desired).await {
            Ok(outcome) => {
                info!(?path, ?outcome, "message classified");
                Action::Classified(outcome)
            }
            Err(err) => {
                warn!(?path, error = %err, "classification failed");
                Action::ClassifyFailed
            }
        }
    }

    async fn dispatch(
        &mut self,
        fetched: std::result::Result<WatchEvent, WatchError>,
    ) -> Result<Option<Action>> {
        match fetched {
            Ok(event) => Ok(Some(self.handle(event).await)),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                warn!(error = %err, "dropping notification");
                Ok(None)
            }
        }
    }
}
