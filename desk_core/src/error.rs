use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DeskError {
    /// Malformed telemetry payload; fatal to that single sample only.
    #[error("position payload too short: got {0} bytes, need 4")]
    Decode(usize),
    #[error("link error: {0}")]
    Link(String),
    #[error("link timeout")]
    Timeout,
    #[error("not connected to a desk")]
    NotConnected,
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing position source")]
    MissingSource,
    #[error("missing move sink")]
    MissingSink,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
