//! The `utils` module holds the pieces shared by every other module:
//! the crate-wide error type and logging setup.

pub mod error;
pub mod logging;

pub use error::{BrokerError, Result};

#[cfg(test)]
mod tests {
    use super::error::BrokerError;
    use super::logging;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
        logging::init("nonsense");
        assert!(tracing::dispatcher::has_been_set());
    }

    #[test]
    fn io_errors_convert_into_broker_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: BrokerError = io.into();
        assert!(matches!(err, BrokerError::Io(_)));
        assert!(err.to_string().contains("pipe"));
    }

    #[test]
    fn frame_too_large_message_names_both_sizes() {
        let err = BrokerError::FrameTooLarge {
            length: 10,
            max: 4,
        };
        assert_eq!(err.to_string(), "frame length 10 exceeds maximum 4");
    }
}
