use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to decode descriptors: {0}")]
    Decode(#[from] protobuf::Error),

    #[error("unknown syntax: {0}")]
    UnknownSyntax(String),

    #[error("invalid value {value:?} for option {key}")]
    InvalidOption { key: String, value: String },

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid http option: {0}")]
    InvalidHttpOption(String),

    #[error("no service named {0}")]
    UnknownService(String),

    #[error("no file named {0}")]
    UnknownFile(String),

    #[error("failed to serialize json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
