//! Errors raised by the stdio host.
//!
//! Handler failures never surface here; they are reported per event as a
//! `failed` outcome line.

/// Failures of the transport itself.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Reading events or writing outcomes failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// An outcome could not be encoded.
    #[error("ENCODING_ERROR: {0}")]
    Encoding(#[from] serde_json::Error),

    /// An event task panicked or was cancelled.
    #[error("WORKER_ERROR: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let io = HostError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        assert!(io.to_string().starts_with("IO_ERROR: "));

        let worker = HostError::Worker("task panicked".into());
        assert_eq!(worker.to_string(), "WORKER_ERROR: task panicked");
    }
}
