pub use crate::commandclass::*;
