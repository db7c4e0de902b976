use std::fmt::{Display, Formatter};

/// Invalid or unreadable configuration (config file, prompt template, CLI combination).
#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}

/// A persisted document (ground truth, batch file) exists but cannot be trusted.
#[derive(Debug)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreError: {}", self.0)
    }
}
impl std::error::Error for StoreError {}

/// Returns true when the error chain carries a [`ConfigError`] or [`StoreError`],
/// i.e. the failure is in the inputs rather than in the run itself.
pub fn is_input_error(e: &anyhow::Error) -> bool {
    e.chain()
        .any(|c| c.is::<ConfigError>() || c.is::<StoreError>())
}
