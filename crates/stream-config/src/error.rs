use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: &'static str,
    },

    #[error("credentials are empty or unset")]
    MissingCredentials,
}
