use applybot_common::ApplyError;

/// Errors raised by browser drivers.
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[error("failed to launch browser session: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("network did not settle: {0}")]
    Network(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timeout waiting for {0}")]
    Timeout(String),

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("browser session is closed")]
    SessionClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

impl From<DriverError> for ApplyError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Launch(_) | DriverError::Navigation(_) | DriverError::SessionClosed => {
                ApplyError::Browser(err.to_string())
            }
            DriverError::Network(_) => ApplyError::Network(err.to_string()),
            DriverError::ElementNotFound(_)
            | DriverError::Timeout(_)
            | DriverError::Interaction(_) => ApplyError::Application(err.to_string()),
            DriverError::Other(e) => ApplyError::Unknown(format!("{e:#}")),
        }
    }
}
