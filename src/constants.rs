use std::time::Duration;

pub const DEFAULT_JUDGE_URL: &str = "http://localhost:3000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const NO_OUTPUT: &str = "No output";

pub const COMPILING: &str = "Compiling...";
pub const RUNNING: &str = "Running...";
pub const RUNNING_TEST_CASES: &str = "Running test cases...";
pub const ALL_TESTS_COMPLETED: &str = "All test cases completed";
pub const COMPLETED: &str = "Completed";
pub const COMPILATION_ERROR: &str = "Compilation Error";
pub const RUNTIME_ERROR: &str = "Runtime Error";
pub const TIMEOUT: &str = "Timeout";
pub const CANCELLED: &str = "Cancelled";
