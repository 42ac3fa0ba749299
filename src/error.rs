//! Process-level error type.
//!
//! Every fallible setup path funnels into [`CalError`], which carries the
//! exit code the binary should terminate with. Per-trial numerical failures
//! never surface here; they are absorbed into the penalty score instead.

#[derive(Clone)]
pub struct CalError {
    exit_code: u8,
    message: String,
}

impl CalError {
    fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Configuration rejected during setup: bad bounds, empty channel sets,
    /// malformed grids.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Missing or unusable observation data.
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Numerical failure outside the contained per-trial evaluation path.
    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for CalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for CalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for CalError {}
