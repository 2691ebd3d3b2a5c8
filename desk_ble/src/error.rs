use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("ble error: {0}")]
    Ble(String),
    #[error("link timeout")]
    Timeout,
    #[error("not connected")]
    NotConnected,
    #[error("no bluetooth adapter available")]
    NoAdapter,
    #[error("no matching desk peripheral found")]
    DeskNotFound,
    #[error("characteristic missing: {0}")]
    CharacteristicMissing(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
