use crate::{
    constants::NO_OUTPUT,
    core::domain::{Category, SubmissionSnapshot, Verdict},
};

/// Maps a terminal snapshot to what the user sees. Compile output wins over
/// stderr, stderr wins over stdout.
pub fn classify(snapshot: &SubmissionSnapshot) -> Verdict {
    if let Some(compile_output) = non_empty(&snapshot.compile_output) {
        return Verdict {
            category: Category::CompilationError,
            output: compile_output.to_string(),
        };
    }

    if let Some(stderr) = non_empty(&snapshot.stderr) {
        return Verdict {
            category: Category::RuntimeError,
            output: stderr.to_string(),
        };
    }

    Verdict {
        category: Category::Completed,
        output: non_empty(&snapshot.stdout).unwrap_or(NO_OUTPUT).to_string(),
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::JudgeStatus;

    fn snapshot(
        stdout: Option<&str>,
        stderr: Option<&str>,
        compile_output: Option<&str>,
    ) -> SubmissionSnapshot {
        SubmissionSnapshot {
            status: JudgeStatus::new(3, "Accepted"),
            stdout: stdout.map(String::from),
            stderr: stderr.map(String::from),
            compile_output: compile_output.map(String::from),
        }
    }

    #[test]
    fn test_compile_output_takes_precedence() {
        let verdict = classify(&snapshot(
            Some("partial"),
            Some("segfault"),
            Some("main.cpp:1: error"),
        ));
        assert_eq!(verdict.category, Category::CompilationError);
        assert_eq!(verdict.output, "main.cpp:1: error");
    }

    #[test]
    fn test_stderr_is_runtime_error() {
        let verdict = classify(&snapshot(Some("6\n"), Some("Traceback"), Some("")));
        assert_eq!(verdict.category, Category::RuntimeError);
        assert_eq!(verdict.output, "Traceback");
    }

    #[test]
    fn test_completed_with_and_without_stdout() {
        let verdict = classify(&snapshot(Some("6\n"), None, None));
        assert_eq!(verdict.category, Category::Completed);
        assert_eq!(verdict.output, "6\n");

        let verdict = classify(&snapshot(Some(""), Some(""), None));
        assert_eq!(verdict.category, Category::Completed);
        assert_eq!(verdict.output, NO_OUTPUT);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let snap = snapshot(Some("1"), Some("warn"), None);
        assert_eq!(classify(&snap), classify(&snap));
    }
}
