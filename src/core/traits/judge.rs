use crate::core::domain::{SubmissionRequest, SubmissionSnapshot, Token};

/// Access to the external judge. Implementations never retry; the poller
/// decides what happens after a failure.
#[mockall::automock]
#[async_trait::async_trait]
pub trait JudgeClient: std::fmt::Debug + Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<Token, JudgeError>;

    async fn fetch(&self, token: &Token) -> Result<SubmissionSnapshot, JudgeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgeError {
    #[error("judge unreachable: {msg}")]
    Transport { msg: String },
    #[error("language {language_id} rejected by judge: {msg}")]
    InvalidLanguage { language_id: u32, msg: String },
    #[error("submission {token} not found")]
    NotFound { token: String },
    #[error("malformed judge response: {msg}")]
    MalformedResponse { msg: String },
}
