pub use crate::definitions::*;
pub use crate::parse::{
    self, Parsable, ParseError, ParseResult, Parser, fail_validation, validate,
};
pub use crate::serialize::{self, Serializable};
