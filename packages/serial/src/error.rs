use crate::frame::ControlByte;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Port(#[from] tokio_serial::Error),
    #[error("end of stream")]
    EndOfStream,
    #[error("timeout waiting for {0}")]
    Timeout(&'static str),
    #[error("frame rejected with {0:?}")]
    Rejected(ControlByte),
    #[error("collision with an incoming frame")]
    Collision,
    #[error("payload of {0} bytes does not fit a frame")]
    PayloadTooLarge(usize),
    #[error("send job cancelled")]
    Cancelled,
    #[error("serial protocol shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
