use gesture_core::ConfigError;
use thiserror::Error;

/// Failures at the host boundary.  The frame loop itself never fails.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("window: {0}")]
    Window(String),

    #[error("interpreter configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("command line: {0}")]
    Args(String),

    #[error("recording: {0}")]
    Io(#[from] std::io::Error),
}
