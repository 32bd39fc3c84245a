use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;

use crate::core::{
    domain::{JudgeStatus, SubmissionRequest, SubmissionSnapshot, Token},
    traits::judge::{JudgeClient, JudgeError},
};

/// In-process judge that walks every submission through a fixed status
/// script. The last status repeats once the script runs out.
///
/// With no `stdout` configured the stub echoes the submitted stdin back.
#[derive(Debug)]
pub struct JudgeStub {
    statuses: Vec<JudgeStatus>,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    delay: Duration,
    jobs: DashMap<Token, StubJob>,
}

#[derive(Debug, Clone)]
struct StubJob {
    stdin: String,
    fetches: usize,
}

impl JudgeStub {
    pub fn new(statuses: Vec<JudgeStatus>, delay: Duration) -> Self {
        Self {
            statuses,
            stdout: None,
            stderr: None,
            compile_output: None,
            delay,
            jobs: DashMap::new(),
        }
    }

    /// Queued, processing, then accepted.
    pub fn echo(delay: Duration) -> Self {
        Self::new(
            vec![
                JudgeStatus::new(1, "In Queue"),
                JudgeStatus::new(2, "Processing"),
                JudgeStatus::new(3, "Accepted"),
            ],
            delay,
        )
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = Some(stdout.to_string());
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = Some(stderr.to_string());
        self
    }

    pub fn with_compile_output(mut self, compile_output: &str) -> Self {
        self.compile_output = Some(compile_output.to_string());
        self
    }

    pub fn fetch_count(&self, token: &Token) -> usize {
        self.jobs.get(token).map(|job| job.fetches).unwrap_or(0)
    }

    pub fn submission_count(&self) -> usize {
        self.jobs.len()
    }
}

#[async_trait::async_trait]
impl JudgeClient for JudgeStub {
    #[tracing::instrument(skip(self, request))]
    async fn submit(&self, request: &SubmissionRequest) -> Result<Token, JudgeError> {
        tokio::time::sleep(self.delay).await;

        let token = Token::new(Uuid::new_v4().to_string());
        self.jobs.insert(
            token.clone(),
            StubJob {
                stdin: request.stdin.clone(),
                fetches: 0,
            },
        );
        tracing::debug!("Stub accepted submission: {}", token);
        Ok(token)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch(&self, token: &Token) -> Result<SubmissionSnapshot, JudgeError> {
        tokio::time::sleep(self.delay).await;

        let mut job = self.jobs.get_mut(token).ok_or_else(|| JudgeError::NotFound {
            token: token.to_string(),
        })?;
        let status = self
            .statuses
            .get(job.fetches)
            .or_else(|| self.statuses.last())
            .cloned()
            .ok_or_else(|| JudgeError::MalformedResponse {
                msg: "stub has no statuses".to_string(),
            })?;
        job.fetches += 1;

        if !status.is_terminal() {
            return Ok(SubmissionSnapshot {
                status,
                stdout: None,
                stderr: None,
                compile_output: None,
            });
        }

        Ok(SubmissionSnapshot {
            status,
            stdout: Some(self.stdout.clone().unwrap_or_else(|| job.stdin.clone())),
            stderr: self.stderr.clone(),
            compile_output: self.compile_output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::LanguageId;
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tracing_subscriber::fmt::format::FmtSpan;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn request(stdin: &str) -> SubmissionRequest {
        SubmissionRequest {
            code: "print(input())".to_string(),
            language_id: LanguageId(71),
            stdin: stdin.to_string(),
        }
    }

    #[tokio::test]
    async fn test_walks_status_script() {
        let stub = JudgeStub::echo(Duration::ZERO);
        let token = stub.submit(&request("1 2 3")).await.unwrap();

        let ids: Vec<u32> = {
            let mut ids = Vec::new();
            for _ in 0..4 {
                ids.push(stub.fetch(&token).await.unwrap().status.id);
            }
            ids
        };
        assert_eq!(ids, vec![1, 2, 3, 3]);
        assert_eq!(stub.fetch_count(&token), 4);

        let last = stub.fetch(&token).await.unwrap();
        assert_eq!(last.stdout.as_deref(), Some("1 2 3"));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let stub = JudgeStub::echo(Duration::ZERO);
        let err = stub.fetch(&Token::new("missing")).await.unwrap_err();
        assert_eq!(
            err,
            JudgeError::NotFound {
                token: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_spans_leave_out_job_table() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_span_events(FmtSpan::NEW)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let stub = JudgeStub::echo(Duration::ZERO);
        let token = stub.submit(&request("1 2 3")).await.unwrap();
        stub.fetch(&token).await.unwrap();

        let logs = logs.contents();
        assert!(logs.contains("fetch"));
        assert!(logs.contains(token.as_str()));
        assert!(!logs.contains("statuses"));
        assert!(!logs.contains("jobs"));
    }
}
