use reqwest::StatusCode;
use url::Url;

use crate::{
    config::RunnerConfig,
    core::{
        domain::{SubmissionRequest, SubmissionSnapshot, Token},
        traits::judge::{JudgeClient, JudgeError},
    },
    http::{mappers::ConversionError, models},
};

/// Judge reached over HTTP.
///
/// - `POST {judge_url}/submission` creates a job and returns its token.
/// - `GET {judge_url}/submission/{token}` returns the job's current state.
#[derive(Clone, Debug)]
pub struct HttpJudgeClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpJudgeClient {
    pub fn new(config: &RunnerConfig) -> Result<Self, JudgeError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base: config.judge_url.clone(),
        })
    }

    fn submission_url(&self, token: Option<&Token>) -> Result<Url, JudgeError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| JudgeError::Transport {
                    msg: format!("{} cannot be a base url", self.base),
                })?;
            segments.pop_if_empty().push("submission");
            if let Some(token) = token {
                segments.push(token.as_str());
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl JudgeClient for HttpJudgeClient {
    #[tracing::instrument(skip(self, request), fields(language_id = %request.language_id))]
    async fn submit(&self, request: &SubmissionRequest) -> Result<Token, JudgeError> {
        let url = self.submission_url(None)?;
        let response = self
            .http
            .post(url)
            .json(&models::CreateSubmission::from(request))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let msg = response.text().await.unwrap_or_default();
            return Err(JudgeError::InvalidLanguage {
                language_id: request.language_id.0,
                msg,
            });
        }
        if !status.is_success() {
            return Err(JudgeError::Transport {
                msg: format!("judge answered {}", status),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let created: models::CreatedSubmission =
            serde_json::from_slice(&body).map_err(malformed)?;
        let token: Token = created.try_into().map_err(|e: ConversionError| {
            JudgeError::MalformedResponse { msg: e.to_string() }
        })?;

        tracing::debug!("Judge issued token {}", token);
        Ok(token)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch(&self, token: &Token) -> Result<SubmissionSnapshot, JudgeError> {
        let url = self.submission_url(Some(token))?;
        let response = self.http.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(JudgeError::NotFound {
                token: token.to_string(),
            });
        }
        if !status.is_success() {
            return Err(JudgeError::Transport {
                msg: format!("judge answered {}", status),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let submission: models::Submission = serde_json::from_slice(&body).map_err(malformed)?;
        Ok(submission.into())
    }
}

fn transport(err: reqwest::Error) -> JudgeError {
    JudgeError::Transport {
        msg: err.to_string(),
    }
}

fn malformed(err: serde_json::Error) -> JudgeError {
    JudgeError::MalformedResponse {
        msg: err.to_string(),
    }
}
