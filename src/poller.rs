use crate::api::SubmissionApi;
use crate::models::Submission;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

/// Where the watcher is in the grading lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No ungraded submission to watch.
    Idle,
    /// A submission exists with no grade and no feedback; polling.
    Watching,
    /// Grade or feedback observed; polling has stopped.
    Settled,
}

pub fn watch_state(submission: Option<&Submission>) -> WatchState {
    match submission {
        None => WatchState::Idle,
        Some(sub) if sub.is_ungraded() => WatchState::Watching,
        Some(_) => WatchState::Settled,
    }
}

/// Requests an immediate re-poll, outside the fixed interval. The CLI uses
/// this where the browser portal re-fetched on window focus.
#[derive(Clone)]
pub struct RefreshHandle(Arc<Notify>);

impl RefreshHandle {
    pub fn refresh(&self) {
        self.0.notify_one();
    }
}

/// Polls `GET /materi/:id/my-submission` at a fixed interval until the
/// grading process has written grade + feedback, then stops.
///
/// There is no backoff and no attempt cap; a failed poll is logged and
/// retried on the next tick. Dropping the watcher (or the future returned by
/// [`run`](Self::run)) cancels polling; watching a different materi means
/// constructing a new watcher, never retargeting a live one.
pub struct SubmissionWatcher<S> {
    api: S,
    materi_id: u64,
    interval: Duration,
    state: WatchState,
    submission: Option<Submission>,
    refresh: Arc<Notify>,
}

impl<S: SubmissionApi> SubmissionWatcher<S> {
    pub fn new(
        api: S,
        materi_id: u64,
        interval: Duration,
        submission: Option<Submission>,
    ) -> Self {
        Self {
            api,
            materi_id,
            interval,
            state: watch_state(submission.as_ref()),
            submission,
            refresh: Arc::new(Notify::new()),
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle(self.refresh.clone())
    }

    /// Fold a poll result into the watcher. Returns true when watching is
    /// over. Every fetch is an idempotent state replacement; a response that
    /// arrives after the watcher already settled is ignored (last write
    /// wins).
    fn absorb(&mut self, fetched: Option<Submission>) -> bool {
        if self.state != WatchState::Watching {
            return true;
        }
        match fetched {
            Some(sub) if sub.is_ungraded() => {
                self.submission = Some(sub);
                false
            }
            Some(sub) => {
                self.submission = Some(sub);
                self.state = WatchState::Settled;
                true
            }
            // The submission disappeared (admin deletion); back to square
            // one, nothing left to watch.
            None => {
                self.submission = None;
                self.state = WatchState::Idle;
                true
            }
        }
    }

    /// Drive the poll loop until the submission settles (or vanishes).
    /// Returns immediately when there is nothing to watch.
    pub async fn run(mut self) -> Self {
        if self.state != WatchState::Watching {
            return self;
        }

        let refresh = self.refresh.clone();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately; consume
        // it so the first poll waits one full interval, like the portal did.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = refresh.notified() => {}
            }

            match self.api.fetch_my_submission(self.materi_id).await {
                Ok(fetched) => {
                    if self.absorb(fetched) {
                        return self;
                    }
                }
                Err(err) => {
                    // Best-effort background refresh: never surfaces to the
                    // user, never changes state.
                    tracing::warn!(
                        materi_id = self.materi_id,
                        error = %err,
                        "grading poll failed, retrying next tick"
                    );
                }
            }
        }
    }
}
