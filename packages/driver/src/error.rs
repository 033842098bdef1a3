use thiserror::Error;
use wavez_core::definitions::{FunctionType, InvalidNodeId, NodeId};
use wavez_core::parse::ParseError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("controller does not implement {0:?}")]
    NotImplemented(FunctionType),
    #[error(transparent)]
    InvalidNodeId(#[from] InvalidNodeId),
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("node does not support multi channel")]
    MultiChannelNotSupported,
    #[error(transparent)]
    Serial(#[from] wavez_serial::error::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unexpected response of class {0:?}")]
    UnexpectedResponse(FunctionType),
    #[error("transmission failed after {0} attempts")]
    TransmitFailed(u8),
    #[error("transmission cancelled")]
    Cancelled,
    #[error("timed out")]
    Timeout,
    #[error("controller shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, Error>;
