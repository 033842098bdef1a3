mod command_class_id;
mod function_type;
mod library_type;
mod message_type;
mod node_id;
mod protocol_info;
mod transmit_options;
mod transmit_status;
mod update_state;

pub use command_class_id::*;
pub use function_type::*;
pub use library_type::*;
pub use message_type::*;
pub use node_id::*;
pub use protocol_info::*;
pub use transmit_options::*;
pub use transmit_status::*;
pub use update_state::*;
