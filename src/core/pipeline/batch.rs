use std::{collections::HashMap, sync::Arc};

use futures::{StreamExt, stream::FuturesUnordered};
use tokio::{
    sync::mpsc::{UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::{
    config::RunnerConfig,
    core::{
        cancel::Cancellation,
        domain::{
            BatchOutcome, JobError, LanguageId, LanguageTable, RunStatus, SingleRun, StatusUpdate,
            SubmissionRequest, TestCase, TestCaseId, TestResult,
        },
        pipeline::{
            classifying::classify,
            polling::{PollPolicy, Poller},
        },
        traits::{judge::JudgeClient, sleeper::Sleeper},
        validation::{BatchError, validate_submission},
    },
};

/// Submits one job per test case, polls each to completion and gathers the
/// results.
///
/// Jobs are isolated: a failed or timed-out job only shows up in its own
/// entry. The only error that aborts a batch is validation, which runs
/// before anything is sent to the judge.
#[derive(Clone, Debug)]
pub struct BatchRunner {
    client: Arc<dyn JudgeClient>,
    poller: Poller,
    languages: LanguageTable,
}

impl BatchRunner {
    pub fn new(
        client: Arc<dyn JudgeClient>,
        sleeper: Arc<dyn Sleeper>,
        config: &RunnerConfig,
    ) -> Self {
        let policy = PollPolicy {
            interval: config.poll_interval,
            max_attempts: config.max_attempts,
        };

        Self {
            poller: Poller::new(client.clone(), sleeper, policy),
            client,
            languages: config.languages.clone(),
        }
    }

    #[tracing::instrument(skip(self, code, test_cases, cancellation))]
    pub async fn run(
        &self,
        code: &str,
        language_id: LanguageId,
        test_cases: &[TestCase],
        cancellation: Cancellation,
    ) -> Result<BatchOutcome, BatchError> {
        self.run_with_updates(code, language_id, test_cases, cancellation, None)
            .await
    }

    /// Runs the batch in the background and streams display statuses while
    /// it progresses. Every update is delivered, ending with the batch
    /// status. A dropped receiver never holds the batch back.
    pub fn run_streaming(
        &self,
        code: String,
        language_id: LanguageId,
        test_cases: Vec<TestCase>,
        cancellation: Cancellation,
    ) -> (
        UnboundedReceiverStream<StatusUpdate>,
        JoinHandle<Result<BatchOutcome, BatchError>>,
    ) {
        let (updates_tx, updates_rx) = unbounded_channel();
        let runner = self.clone();

        let handle = tokio::spawn(async move {
            runner
                .run_with_updates(
                    &code,
                    language_id,
                    &test_cases,
                    cancellation,
                    Some(&updates_tx),
                )
                .await
        });

        (UnboundedReceiverStream::new(updates_rx), handle)
    }

    /// Ad-hoc run of one stdin, reported as a single status line and output.
    #[tracing::instrument(skip(self, code, stdin, cancellation))]
    pub async fn run_single(
        &self,
        code: &str,
        language_id: LanguageId,
        stdin: &str,
        cancellation: Cancellation,
    ) -> SingleRun {
        let test_case = TestCase::new(1, stdin);
        if let Err(err) = validate_submission(
            code,
            language_id,
            &self.languages,
            std::slice::from_ref(&test_case),
        ) {
            return SingleRun {
                status: RunStatus::Error(err.to_string()),
                output: String::new(),
            };
        }

        let request = SubmissionRequest {
            code: code.to_string(),
            language_id,
            stdin: test_case.input,
        };

        match self.run_job(request, test_case.id, cancellation, None).await {
            TestResult::Judged { verdict, .. } => SingleRun {
                status: RunStatus::Finished(verdict.category),
                output: verdict.output,
            },
            TestResult::Failed {
                error: JobError::Cancelled,
            } => SingleRun {
                status: RunStatus::Cancelled,
                output: String::new(),
            },
            TestResult::Failed { error } => SingleRun {
                status: RunStatus::Error(error.to_string()),
                output: String::new(),
            },
        }
    }

    async fn run_with_updates(
        &self,
        code: &str,
        language_id: LanguageId,
        test_cases: &[TestCase],
        cancellation: Cancellation,
        updates: Option<&UnboundedSender<StatusUpdate>>,
    ) -> Result<BatchOutcome, BatchError> {
        let id = Uuid::new_v4();
        let started_at = chrono::Utc::now();

        if let Err(err) = validate_submission(code, language_id, &self.languages, test_cases) {
            tracing::info!("Batch {} rejected: {}", id, err);
            notify(updates, None, RunStatus::Error(err.to_string()));
            return Err(err);
        }

        tracing::info!("Batch {} started with {} test cases", id, test_cases.len());
        notify(updates, None, RunStatus::RunningTestCases);

        let mut jobs: FuturesUnordered<_> = test_cases
            .iter()
            .map(|test_case| {
                let test_case_id = test_case.id;
                let request = SubmissionRequest {
                    code: code.to_string(),
                    language_id,
                    stdin: test_case.input.clone(),
                };
                let cancellation = cancellation.clone();
                async move {
                    let result = self
                        .run_job(request, test_case_id, cancellation, updates)
                        .await;
                    (test_case_id, result)
                }
            })
            .collect();

        let mut results = HashMap::with_capacity(test_cases.len());
        while let Some((test_case_id, result)) = jobs.next().await {
            notify(updates, Some(test_case_id), result.status());
            results.insert(test_case_id, result);
        }

        let status = if cancellation.is_cancelled() {
            RunStatus::Cancelled
        } else {
            RunStatus::AllTestsCompleted
        };
        tracing::info!("Batch {} finished: {}", id, status);
        notify(updates, None, status.clone());

        Ok(BatchOutcome {
            id,
            started_at,
            finished_at: chrono::Utc::now(),
            results,
            status,
        })
    }

    /// Submit, poll and classify one test case. Never fails: every error
    /// becomes this test case's result.
    async fn run_job(
        &self,
        request: SubmissionRequest,
        test_case_id: TestCaseId,
        cancellation: Cancellation,
        updates: Option<&UnboundedSender<StatusUpdate>>,
    ) -> TestResult {
        if cancellation.is_cancelled() {
            return TestResult::Failed {
                error: JobError::Cancelled,
            };
        }

        notify(updates, Some(test_case_id), RunStatus::Compiling);
        let token = match self.client.submit(&request).await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("Test case {} was not submitted: {}", test_case_id, err);
                return TestResult::Failed {
                    error: JobError::Submit(err),
                };
            }
        };
        tracing::debug!("Test case {} submitted as {}", test_case_id, token);

        notify(updates, Some(test_case_id), RunStatus::Running);
        match self.poller.await_terminal(&token, cancellation).await {
            Ok(snapshot) => {
                let verdict = classify(&snapshot);
                tracing::debug!("Test case {} finished: {:?}", test_case_id, verdict);
                TestResult::Judged { snapshot, verdict }
            }
            Err(error) => {
                tracing::warn!("Test case {} failed: {}", test_case_id, error);
                TestResult::Failed { error }
            }
        }
    }
}

fn notify(
    updates: Option<&UnboundedSender<StatusUpdate>>,
    test_case: Option<TestCaseId>,
    status: RunStatus,
) {
    let Some(updates) = updates else {
        return;
    };
    if updates.send(StatusUpdate { test_case, status }).is_err() {
        tracing::debug!("Status receiver dropped, update discarded");
    }
}
