use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvpageError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("archive file is empty: {path}")]
    EmptyArchive { path: PathBuf },

    #[error("archive is not valid UTF-8: {path}")]
    NonUtf8Archive { path: PathBuf },

    #[error("node not found in conversation={conversation}: node_id={node_id}")]
    NodeNotFound {
        conversation: String,
        node_id: String,
    },

    #[error("parent chain does not terminate in conversation={conversation} after {limit} steps")]
    CyclicGraph { conversation: String, limit: usize },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConvpageError>;
