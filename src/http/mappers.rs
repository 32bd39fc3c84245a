use crate::core::domain::{JudgeStatus, SubmissionRequest, SubmissionSnapshot, Token};
use crate::http::models;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl From<&SubmissionRequest> for models::CreateSubmission {
    fn from(req: &SubmissionRequest) -> Self {
        Self {
            code: req.code.clone(),
            language_id: req.language_id.0,
            input: req.stdin.clone(),
        }
    }
}

impl TryFrom<models::CreatedSubmission> for Token {
    type Error = ConversionError;

    fn try_from(created: models::CreatedSubmission) -> Result<Self, ConversionError> {
        created
            .token
            .filter(|token| !token.trim().is_empty())
            .map(Token::new)
            .ok_or_else(|| ConversionError::MissingField {
                field: "token".to_string(),
            })
    }
}

impl From<models::Status> for JudgeStatus {
    fn from(status: models::Status) -> Self {
        Self {
            id: status.id,
            description: status.description,
        }
    }
}

impl From<models::Submission> for SubmissionSnapshot {
    fn from(submission: models::Submission) -> Self {
        Self {
            status: submission.status.into(),
            stdout: submission.stdout,
            stderr: submission.stderr,
            compile_output: submission.compile_output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::LanguageId;

    #[test]
    fn test_request_body_uses_judge_field_names() {
        let req = SubmissionRequest {
            code: "print(1)".to_string(),
            language_id: LanguageId(71),
            stdin: "1 2".to_string(),
        };
        let body = serde_json::to_value(models::CreateSubmission::from(&req)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "code": "print(1)", "language_id": 71, "input": "1 2" })
        );
    }

    #[test]
    fn test_missing_or_blank_token() {
        let missing: Result<Token, _> = models::CreatedSubmission { token: None }.try_into();
        assert!(matches!(missing, Err(ConversionError::MissingField { .. })));

        let blank: Result<Token, _> = models::CreatedSubmission {
            token: Some("  ".to_string()),
        }
        .try_into();
        assert!(blank.is_err());

        let token: Token = models::CreatedSubmission {
            token: Some("d85cd024".to_string()),
        }
        .try_into()
        .unwrap();
        assert_eq!(token.as_str(), "d85cd024");
    }

    #[test]
    fn test_snapshot_from_partial_payload() {
        let submission: models::Submission = serde_json::from_str(
            r#"{"status": {"id": 2, "description": "Processing"}, "stdout": null}"#,
        )
        .unwrap();
        let snapshot: SubmissionSnapshot = submission.into();

        assert_eq!(snapshot.status, JudgeStatus::new(2, "Processing"));
        assert!(!snapshot.status.is_terminal());
        assert_eq!(snapshot.stdout, None);
        assert_eq!(snapshot.compile_output, None);
    }
}
