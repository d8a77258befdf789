//! Custom error types for the application

use thiserror::Error;

/// Application-specific error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid command line configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The frame source failed to deliver a frame
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// The frame source has no more frames
    #[error("Sensor reached end of stream")]
    EndOfStream,

    /// The system volume command could not be run
    #[error("Volume actuator error: {0}")]
    Actuator(String),

    /// The display surface could not be set up or drawn
    #[error("Display error: {0}")]
    Display(String),

    /// The acquisition worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether this error means the sensor is gone for the rest of the session
    pub fn is_sensor_loss(&self) -> bool {
        matches!(self, AppError::Sensor(_) | AppError::EndOfStream)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
