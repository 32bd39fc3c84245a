use std::{collections::HashMap, fmt};

use uuid::Uuid;

use crate::constants::{
    ALL_TESTS_COMPLETED, CANCELLED, COMPILATION_ERROR, COMPILING, COMPLETED, RUNNING,
    RUNNING_TEST_CASES, RUNTIME_ERROR, TIMEOUT,
};
use crate::core::traits::judge::JudgeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageId(pub u32);

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Language {
    pub key: String,
    pub label: String,
    pub id: LanguageId,
}

impl Language {
    pub fn new(key: &str, label: &str, id: u32) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            id: LanguageId(id),
        }
    }
}

/// Runtimes the judge is known to accept.
///
/// The table belongs to the surrounding application; the runner only asks
/// whether an id is in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageTable {
    languages: Vec<Language>,
}

impl LanguageTable {
    pub fn new(languages: Vec<Language>) -> Self {
        Self { languages }
    }

    pub fn contains(&self, id: LanguageId) -> bool {
        self.languages.iter().any(|lang| lang.id == id)
    }

    pub fn by_key(&self, key: &str) -> Option<&Language> {
        self.languages.iter().find(|lang| lang.key == key)
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new(vec![
            Language::new("cpp", "C++", 52),
            Language::new("javascript", "JavaScript", 63),
            Language::new("java", "Java", 62),
            Language::new("python", "Python", 71),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub code: String,
    pub language_id: LanguageId,
    pub stdin: String,
}

/// Opaque handle the judge hands out for one in-flight job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status code reported by the judge. Codes 1 and 2 mean queued and
/// processing; every code from 3 upwards is final.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JudgeStatus {
    pub id: u32,
    pub description: String,
}

impl JudgeStatus {
    pub const FIRST_TERMINAL: u32 = 3;

    pub fn new(id: u32, description: &str) -> Self {
        Self {
            id,
            description: description.to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.id >= Self::FIRST_TERMINAL
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionSnapshot {
    pub status: JudgeStatus,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
}

pub type TestCaseId = u32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub id: TestCaseId,
    pub input: String,
}

impl TestCase {
    pub fn new(id: TestCaseId, input: &str) -> Self {
        Self {
            id,
            input: input.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Completed,
    CompilationError,
    RuntimeError,
    Timeout,
    Error,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Completed => COMPLETED,
            Category::CompilationError => COMPILATION_ERROR,
            Category::RuntimeError => RUNTIME_ERROR,
            Category::Timeout => TIMEOUT,
            Category::Error => "Error",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub category: Category,
    pub output: String,
}

/// Why a single job produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("submission failed: {0}")]
    Submit(JudgeError),
    #[error("polling failed: {0}")]
    Fetch(JudgeError),
    #[error("Submission processing timeout after {attempts} attempts")]
    TimedOut { attempts: u32 },
    #[error("cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestResult {
    Judged {
        snapshot: SubmissionSnapshot,
        verdict: Verdict,
    },
    Failed {
        error: JobError,
    },
}

impl TestResult {
    pub fn category(&self) -> Category {
        match self {
            TestResult::Judged { verdict, .. } => verdict.category,
            TestResult::Failed {
                error: JobError::TimedOut { .. },
            } => Category::Timeout,
            TestResult::Failed { .. } => Category::Error,
        }
    }

    /// Text shown next to the test case: the verdict output, or the error.
    pub fn output(&self) -> String {
        match self {
            TestResult::Judged { verdict, .. } => verdict.output.clone(),
            TestResult::Failed { error } => error.to_string(),
        }
    }

    pub fn status(&self) -> RunStatus {
        match self {
            TestResult::Judged { verdict, .. } => RunStatus::Finished(verdict.category),
            TestResult::Failed {
                error: JobError::TimedOut { .. },
            } => RunStatus::Finished(Category::Timeout),
            TestResult::Failed {
                error: JobError::Cancelled,
            } => RunStatus::Cancelled,
            TestResult::Failed { error } => RunStatus::Error(error.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BatchOutcome {
    pub id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub results: HashMap<TestCaseId, TestResult>,
    pub status: RunStatus,
}

/// Human-readable progress shown by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Compiling,
    Running,
    RunningTestCases,
    Finished(Category),
    AllTestsCompleted,
    Cancelled,
    Error(String),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Compiling => f.write_str(COMPILING),
            RunStatus::Running => f.write_str(RUNNING),
            RunStatus::RunningTestCases => f.write_str(RUNNING_TEST_CASES),
            RunStatus::Finished(category) => write!(f, "{}", category),
            RunStatus::AllTestsCompleted => f.write_str(ALL_TESTS_COMPLETED),
            RunStatus::Cancelled => f.write_str(CANCELLED),
            RunStatus::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub test_case: Option<TestCaseId>,
    pub status: RunStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleRun {
    pub status: RunStatus,
    pub output: String,
}
