//! Shared primitives used across docpolish crates.

use core::fmt;

/// Result alias used across the workspace.
pub type DpResult<T> = Result<T, DpError>;

/// Error raised at the fallible edges of the enhancer (config, selectors, URLs, IO).
///
/// `code` is a stable dotted identifier such as `dom.selector.unsupported`;
/// `message` carries the human readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpError {
    pub code: &'static str,
    pub message: String,
}

impl DpError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for DpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for DpError {}
