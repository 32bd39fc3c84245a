use std::{sync::Arc, time::Duration};

use crate::core::{
    cancel::Cancellation,
    domain::{JobError, SubmissionSnapshot, Token},
    traits::{judge::JudgeClient, sleeper::Sleeper},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Lifecycle of one submission token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollState {
    Created,
    Polling { attempt: u32 },
    Terminal(SubmissionSnapshot),
    TimedOut { attempts: u32 },
    Failed(JobError),
}

/// Drives a token to a terminal snapshot with fixed-interval polling.
///
/// The attempt cap is hard: after `max_attempts` fetches without a terminal
/// status the job is timed out. A failed fetch ends the job right away.
#[derive(Clone, Debug)]
pub struct Poller {
    client: Arc<dyn JudgeClient>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(client: Arc<dyn JudgeClient>, sleeper: Arc<dyn Sleeper>, policy: PollPolicy) -> Self {
        Self {
            client,
            sleeper,
            policy,
        }
    }

    #[tracing::instrument(skip(self, cancellation))]
    pub async fn await_terminal(
        &self,
        token: &Token,
        mut cancellation: Cancellation,
    ) -> Result<SubmissionSnapshot, JobError> {
        let mut state = PollState::Created;

        loop {
            state = match state {
                PollState::Terminal(snapshot) => return Ok(snapshot),
                PollState::TimedOut { attempts } => return Err(JobError::TimedOut { attempts }),
                PollState::Failed(err) => return Err(err),
                pending => self.step(pending, token, &mut cancellation).await?,
            };
            tracing::debug!("Poll state for {}: {:?}", token, state);
        }
    }

    /// One transition. Only cancellation escapes as `Err`; every other
    /// outcome is a state.
    async fn step(
        &self,
        state: PollState,
        token: &Token,
        cancellation: &mut Cancellation,
    ) -> Result<PollState, JobError> {
        let attempt = match state {
            PollState::Created => return Ok(PollState::Polling { attempt: 0 }),
            PollState::Polling { attempt } => attempt,
            done => return Ok(done),
        };

        // The cap counts fetches, not wall-clock time.
        if attempt >= self.policy.max_attempts {
            return Ok(PollState::TimedOut { attempts: attempt });
        }

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                tracing::debug!("Polling {} abandoned by caller", token);
                return Err(JobError::Cancelled);
            }
            _ = self.sleeper.sleep(self.policy.interval) => {}
        }

        let next = match self.client.fetch(token).await {
            Ok(snapshot) if snapshot.status.is_terminal() => PollState::Terminal(snapshot),
            Ok(snapshot) => {
                tracing::debug!(
                    "Submission {} still {} ({})",
                    token,
                    snapshot.status.description,
                    snapshot.status.id
                );
                PollState::Polling {
                    attempt: attempt + 1,
                }
            }
            Err(err) => PollState::Failed(JobError::Fetch(err)),
        };

        Ok(next)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        core::{
            cancel::cancellation,
            domain::{JudgeStatus, LanguageId, SubmissionRequest},
            traits::judge::{JudgeError, MockJudgeClient},
        },
        stubs::judge::JudgeStub,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns immediately and counts how often it was asked to sleep.
    #[derive(Debug, Default)]
    pub(crate) struct InstantSleeper {
        pub calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Sleeper for InstantSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
    }

    #[derive(Debug)]
    struct ForeverSleeper;

    #[async_trait::async_trait]
    impl Sleeper for ForeverSleeper {
        async fn sleep(&self, _duration: Duration) {
            std::future::pending::<()>().await;
        }
    }

    fn policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1000),
            max_attempts: 10,
        }
    }

    fn statuses(ids: &[u32]) -> Vec<JudgeStatus> {
        ids.iter()
            .map(|&id| JudgeStatus::new(id, "scripted"))
            .collect()
    }

    async fn submit(stub: &JudgeStub) -> Token {
        stub.submit(&SubmissionRequest {
            code: "int main() {}".to_string(),
            language_id: LanguageId(52),
            stdin: "1 2 3".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_terminates_on_first_terminal_status() {
        let stub = Arc::new(JudgeStub::new(statuses(&[1, 1, 2, 3]), Duration::ZERO).with_stdout("6"));
        let sleeper = Arc::new(InstantSleeper::default());
        let poller = Poller::new(stub.clone(), sleeper.clone(), policy());

        let token = submit(&stub).await;
        let snapshot = poller
            .await_terminal(&token, Cancellation::never())
            .await
            .unwrap();

        assert_eq!(snapshot.status.id, 3);
        assert_eq!(snapshot.stdout.as_deref(), Some("6"));
        assert_eq!(stub.fetch_count(&token), 4);
        assert_eq!(sleeper.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_times_out_after_attempt_cap() {
        let stub = Arc::new(JudgeStub::new(statuses(&[1, 2]), Duration::ZERO));
        let poller = Poller::new(stub.clone(), Arc::new(InstantSleeper::default()), policy());

        let token = submit(&stub).await;
        let err = poller
            .await_terminal(&token, Cancellation::never())
            .await
            .unwrap_err();

        assert_eq!(err, JobError::TimedOut { attempts: 10 });
        assert_eq!(stub.fetch_count(&token), 10);
    }

    #[tokio::test]
    async fn test_terminal_on_last_allowed_attempt() {
        let stub = Arc::new(JudgeStub::new(
            statuses(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 4]),
            Duration::ZERO,
        ));
        let poller = Poller::new(stub.clone(), Arc::new(InstantSleeper::default()), policy());

        let token = submit(&stub).await;
        let snapshot = poller
            .await_terminal(&token, Cancellation::never())
            .await
            .unwrap();
        assert_eq!(snapshot.status.id, 4);
        assert_eq!(stub.fetch_count(&token), 10);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_retried() {
        let mut client = MockJudgeClient::new();
        client.expect_fetch().times(1).returning(|_| {
            Err(JudgeError::Transport {
                msg: "connection reset".to_string(),
            })
        });
        let poller = Poller::new(Arc::new(client), Arc::new(InstantSleeper::default()), policy());

        let err = poller
            .await_terminal(&Token::new("abc"), Cancellation::never())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Fetch(JudgeError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_token_fails_job() {
        let stub = Arc::new(JudgeStub::echo(Duration::ZERO));
        let poller = Poller::new(stub, Arc::new(InstantSleeper::default()), policy());

        let err = poller
            .await_terminal(&Token::new("nope"), Cancellation::never())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Fetch(JudgeError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let mut client = MockJudgeClient::new();
        client.expect_fetch().never();
        let poller = Poller::new(Arc::new(client), Arc::new(ForeverSleeper), policy());

        let (canceller, cancellation) = cancellation();
        let handle = tokio::spawn(async move {
            poller
                .await_terminal(&Token::new("abc"), cancellation)
                .await
        });
        canceller.cancel();

        assert_eq!(handle.await.unwrap(), Err(JobError::Cancelled));
    }

    #[tokio::test]
    async fn test_zero_attempts_times_out_without_fetching() {
        let mut client = MockJudgeClient::new();
        client.expect_fetch().never();
        let poller = Poller::new(
            Arc::new(client),
            Arc::new(InstantSleeper::default()),
            PollPolicy {
                interval: Duration::ZERO,
                max_attempts: 0,
            },
        );

        let err = poller
            .await_terminal(&Token::new("abc"), Cancellation::never())
            .await
            .unwrap_err();
        assert_eq!(err, JobError::TimedOut { attempts: 0 });
    }
}
