//! Model initialization status

use serde::{Deserialize, Serialize};

/// Progress of the speech model initialization
///
/// Within one initialization attempt `progress` only moves forward. A failed
/// attempt resets it to zero with an `Error: ...` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub loading: bool,
    /// Percent complete, 0-100
    pub progress: u8,
    pub message: String,
}

impl ModelStatus {
    /// Status before any initialization attempt
    pub fn not_initialized() -> Self {
        Self {
            loading: false,
            progress: 0,
            message: "Not initialized".to_string(),
        }
    }

    /// Status at the start of an initialization attempt
    pub fn starting() -> Self {
        Self {
            loading: true,
            progress: 0,
            message: "Starting model initialization...".to_string(),
        }
    }

    /// Status after a successful load
    pub fn ready() -> Self {
        Self {
            loading: false,
            progress: 100,
            message: "Model loaded successfully!".to_string(),
        }
    }

    /// Status after a failed load
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            loading: false,
            progress: 0,
            message: format!("Error: {}", reason),
        }
    }

    /// Move an in-flight attempt forward
    ///
    /// Returns false (and changes nothing) if the attempt is not loading or
    /// the new progress is behind the current one.
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) -> bool {
        let progress = progress.min(100);
        if !self.loading || progress < self.progress {
            return false;
        }
        self.progress = progress;
        self.message = message.into();
        true
    }

    pub fn is_ready(&self) -> bool {
        !self.loading && self.progress == 100
    }
}

impl Default for ModelStatus {
    fn default() -> Self {
        Self::not_initialized()
    }
}
