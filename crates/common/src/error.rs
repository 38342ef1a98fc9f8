use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("Malformed tick message: {0}")]
    MalformedTick(String),

    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    #[error("Gateway rejected order (HTTP {status}): {body}")]
    Gateway { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
