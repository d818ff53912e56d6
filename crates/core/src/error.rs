use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertgenError {
    #[error("invalid setting {key}={value}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),
}

pub type Result<T> = std::result::Result<T, AlertgenError>;
