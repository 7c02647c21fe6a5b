//! Exit-code mapping for calculation outcomes.

use fibseq_core::StatusCode;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ERROR_GENERIC: i32 = 1;
    pub const ERROR_TIMEOUT: i32 = 2;
    pub const ERROR_MEMORY: i32 = 3;
    pub const ERROR_VALIDATION: i32 = 4;
}

/// Map a calculation status to the process exit code.
#[must_use]
pub fn status_exit_code(status: StatusCode) -> i32 {
    match status {
        StatusCode::Completed => exit_codes::SUCCESS,
        StatusCode::TimedOut => exit_codes::ERROR_TIMEOUT,
        StatusCode::MemoryLimitExceeded => exit_codes::ERROR_MEMORY,
    }
}
