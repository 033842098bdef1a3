pub mod controller;
pub mod error;
pub mod events;
pub mod func_id;
pub mod node;
pub mod transmission;

pub use controller::{Controller, ControllerOptions};
pub use error::{Error, Result};
pub use events::{ControllerEvent, NodeUpdate, ReceivedCommand};
pub use transmission::Priority;
