//! Structured errors for the worker host.

/// Errors surfaced to the host as error replies.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A host line was not a valid event.
    #[error("INVALID_EVENT: {0}")]
    InvalidEvent(String),

    /// A lifecycle event arrived in the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Core(#[from] folio_core::Error),
}

impl WorkerError {
    /// Whether the error means the request never reached a server.
    pub fn is_offline(&self) -> bool {
        matches!(self, WorkerError::Core(e) if e.is_network_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkerError::InvalidEvent("missing field `event`".into());
        assert_eq!(err.to_string(), "INVALID_EVENT: missing field `event`");

        let err = WorkerError::from(folio_core::Error::Network("offline".into()));
        assert_eq!(err.to_string(), "NETWORK_ERROR: offline");
        assert!(err.is_offline());
    }
}
