use thiserror::Error;

/// Errors from the probe subsystem.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to start counter dispatcher: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("counter dispatcher has shut down")]
    DispatcherClosed,
}

/// Convenience type alias for probe results.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ProbeError::DispatcherClosed;
        assert_eq!(e.to_string(), "counter dispatcher has shut down");

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        let e: ProbeError = io_err.into();
        assert!(e.to_string().contains("no threads left"));
    }
}
