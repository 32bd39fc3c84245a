use std::collections::HashSet;

use crate::core::domain::{LanguageId, LanguageTable, TestCase};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid test cases. Please check your input. {reason}")]
    InvalidInput { reason: String },
    #[error("unrecognized language id {language_id}")]
    InvalidLanguage { language_id: u32 },
    #[error("Please enter some code")]
    EmptySource,
}

/// A test input must be a non-empty, whitespace-separated list of numbers.
pub fn is_numeric_input(input: &str) -> bool {
    let mut tokens = input.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return false;
    }
    tokens.all(|token| token.parse::<f64>().is_ok_and(|n| !n.is_nan()))
}

/// Rejects the whole submission up front. Nothing may reach the judge if
/// this fails.
pub fn validate_submission(
    code: &str,
    language_id: LanguageId,
    languages: &LanguageTable,
    test_cases: &[TestCase],
) -> Result<(), BatchError> {
    if code.trim().is_empty() {
        return Err(BatchError::EmptySource);
    }
    if !languages.contains(language_id) {
        return Err(BatchError::InvalidLanguage {
            language_id: language_id.0,
        });
    }

    let mut seen = HashSet::new();
    for test_case in test_cases {
        if !seen.insert(test_case.id) {
            return Err(BatchError::InvalidInput {
                reason: format!("Duplicate test case id {}", test_case.id),
            });
        }
        if !is_numeric_input(&test_case.input) {
            return Err(BatchError::InvalidInput {
                reason: format!("Test case {} must contain valid numbers", test_case.id),
            });
        }
    }

    Ok(())
}
