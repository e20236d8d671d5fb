//! Waiting for an author's next post
//!
//! The service only answers "what is this author's newest post", so the
//! protocol re-fetches that on every attempt and compares ids against a
//! baseline taken when the poll starts. Ids are strictly increasing, so
//! `id > baseline` means the post was appended after the poll began.
//!
//! If the author posts twice between two attempts only the newer post is
//! observed. Callers get "there is something new", not a replay.

use crate::error::Result;
use crate::models::PostRecord;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Where the poller reads an author's newest post from.
#[async_trait]
pub trait LatestPostSource: Send + Sync {
    async fn latest_by_author(&self, author: &str) -> Result<Option<PostRecord>>;
}

#[async_trait]
impl<T: LatestPostSource + ?Sized> LatestPostSource for &T {
    async fn latest_by_author(&self, author: &str) -> Result<Option<PostRecord>> {
        (**self).latest_by_author(author).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// First post observed with an id above the baseline
    Delivered(PostRecord),
    TimedOut,
    Cancelled,
}

impl PollOutcome {
    pub fn into_post(self) -> Option<PostRecord> {
        match self {
            PollOutcome::Delivered(post) => Some(post),
            PollOutcome::TimedOut | PollOutcome::Cancelled => None,
        }
    }
}

pub struct Poller<S> {
    source: S,
    interval: Duration,
}

impl<S: LatestPostSource> Poller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Wait for `author` to publish a post newer than the one visible now.
    ///
    /// Makes `timeout_secs - 1` attempts (none for 0 or 1) after capturing the
    /// baseline, sleeping `interval` between attempts but not after the last
    /// one. Any error from the source ends the poll immediately. Setting
    /// `cancel` to `true` stops the poll before or during a sleep; a dropped
    /// sender never cancels.
    pub async fn wait_for_new_post(
        &self,
        author: &str,
        timeout_secs: u64,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<PollOutcome> {
        let baseline = self
            .source
            .latest_by_author(author)
            .await?
            .map_or(0, |post| post.id);
        let attempts = timeout_secs.saturating_sub(1);
        debug!(author, baseline, attempts, "poll started");

        for attempt in 1..=attempts {
            if let Some(post) = self.source.latest_by_author(author).await? {
                if post.id > baseline {
                    debug!(author, attempt, post_id = post.id, "new post observed");
                    return Ok(PollOutcome::Delivered(post));
                }
            }

            if attempt < attempts && self.pause(&mut cancel).await {
                debug!(author, attempt, "poll cancelled");
                return Ok(PollOutcome::Cancelled);
            }
        }

        debug!(author, baseline, "poll timed out");
        Ok(PollOutcome::TimedOut)
    }

    /// Sleep one interval. Returns `true` if cancelled first.
    async fn pause(&self, cancel: &mut watch::Receiver<bool>) -> bool {
        if *cancel.borrow_and_update() {
            return true;
        }

        let sleep = tokio::time::sleep(self.interval);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = cancel.changed() => match changed {
                    Ok(()) => {
                        if *cancel.borrow_and_update() {
                            return true;
                        }
                    }
                    Err(_) => {
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn post(id: i64, body: &str) -> PostRecord {
        PostRecord {
            id,
            author_id: 1,
            author: "foo".into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Replays scripted answers; the last one repeats once the script runs out.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Option<PostRecord>>>>,
        fallback: Option<PostRecord>,
        calls: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<PostRecord>>>, fallback: Option<PostRecord>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LatestPostSource for ScriptedSource {
        async fn latest_by_author(&self, _author: &str) -> Result<Option<PostRecord>> {
            *self.calls.lock().unwrap() += 1;
            match self.script.lock().unwrap().pop_front() {
                Some(answer) => answer,
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn never_cancelled() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_post_appended_after_baseline() {
        let source = ScriptedSource::new(
            vec![
                Ok(Some(post(2, "foosecond post"))),
                Ok(Some(post(2, "foosecond post"))),
            ],
            Some(post(3, "foothird post")),
        );
        let poller = Poller::new(&source, Duration::from_secs(1));

        let outcome = poller
            .wait_for_new_post("foo", 5, never_cancelled())
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Delivered(post(3, "foothird post")));
        // baseline + two attempts
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn newest_post_wins_when_two_land_between_attempts() {
        let source = ScriptedSource::new(
            vec![
                Ok(Some(post(2, "foosecond post"))),
                Ok(Some(post(2, "foosecond post"))),
            ],
            // P1 (id 3) and P2 (id 4) both land during the first sleep
            Some(post(4, "P2")),
        );
        let poller = Poller::new(&source, Duration::from_secs(1));

        let delivered = poller
            .wait_for_new_post("foo", 5, never_cancelled())
            .await
            .unwrap()
            .into_post()
            .unwrap();

        assert_eq!(delivered.body, "P2");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_timeout_minus_one_attempts() {
        let source = ScriptedSource::new(vec![], Some(post(2, "foosecond post")));
        let poller = Poller::new(&source, Duration::from_secs(1));
        let started = Instant::now();

        let outcome = poller
            .wait_for_new_post("foo", 5, never_cancelled())
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(source.calls(), 1 + 4);
        // no sleep after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn tiny_timeouts_only_capture_baseline() {
        for timeout in [0, 1] {
            let source = ScriptedSource::new(vec![Ok(None)], Some(post(1, "late")));
            let poller = Poller::new(&source, Duration::from_secs(1));

            let outcome = poller
                .wait_for_new_post("foo", timeout, never_cancelled())
                .await
                .unwrap();

            assert_eq!(outcome, PollOutcome::TimedOut);
            assert_eq!(source.calls(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_post_ever_beats_zero_baseline() {
        let source = ScriptedSource::new(vec![Ok(None), Ok(None)], Some(post(1, "hello")));
        let poller = Poller::new(&source, Duration::from_secs(1));

        let outcome = poller
            .wait_for_new_post("foo", 5, never_cancelled())
            .await
            .unwrap();

        assert_eq!(outcome.into_post().map(|p| p.id), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_aborts_the_poll() {
        let source = ScriptedSource::new(
            vec![
                Ok(Some(post(2, "foosecond post"))),
                Ok(Some(post(2, "foosecond post"))),
                Err(ClientError::Transport("connection refused".into())),
            ],
            Some(post(3, "foothird post")),
        );
        let poller = Poller::new(&source, Duration::from_secs(1));

        let err = poller
            .wait_for_new_post("foo", 10, never_cancelled())
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_error_is_surfaced() {
        let source = ScriptedSource::new(
            vec![Err(ClientError::Unauthorized("Login failed".into()))],
            None,
        );
        let poller = Poller::new(&source, Duration::from_secs(1));

        let err = poller
            .wait_for_new_post("foo", 5, never_cancelled())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Unauthorized(_)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_sleep() {
        let source = ScriptedSource::new(vec![], Some(post(2, "foosecond post")));
        let poller = Poller::new(&source, Duration::from_secs(1));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let outcome = poller.wait_for_new_post("foo", 5, rx).await.unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_sleep() {
        let source = ScriptedSource::new(vec![], Some(post(2, "foosecond post")));
        let poller = Poller::new(&source, Duration::from_secs(3600));
        let (tx, rx) = watch::channel(false);
        let started = Instant::now();

        let (outcome, _) = tokio::join!(poller.wait_for_new_post("foo", 5, rx), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(true).unwrap();
        });

        assert_eq!(outcome.unwrap(), PollOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_never_cancels() {
        let source = ScriptedSource::new(vec![], Some(post(2, "foosecond post")));
        let poller = Poller::new(&source, Duration::from_secs(1));
        let started = Instant::now();

        let outcome = poller
            .wait_for_new_post("foo", 3, never_cancelled())
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }
}
