use std::env;

/// Environment variable marking a run started by a scheduler rather than an operator.
pub const SCHEDULED_ENV_VAR: &str = "BISYNC_SCHEDULED";

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// An operator running commands from a terminal.
    Interactive,
    /// Cron or CI runs where only the log file is read.
    Scheduled,
}

impl ExecutionContext {
    /// Returns `true` when console sinks are off unless configured otherwise.
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::Scheduled)
    }
}

/// Derive the active execution context from the environment.
pub fn detect_context() -> ExecutionContext {
    if scheduled_run() {
        ExecutionContext::Scheduled
    } else {
        ExecutionContext::Interactive
    }
}

fn scheduled_run() -> bool {
    env::var(SCHEDULED_ENV_VAR)
        .map(|value| value.trim() == "1")
        .unwrap_or(false)
}
