pub use crate::binding::{open_serial_binding, SerialBinding};
pub use crate::command::*;
pub use crate::error::{Error, Result};
pub use crate::frame::{checksum, frame, ControlByte};
pub use crate::protocol::{SendHandle, SerialProtocol};
