use crate::parse::{self, Parsable, ParseError, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use std::fmt::{self, Display};
use thiserror::Error;

/// Z-Wave node ids live in 1..=232. Anything outside is rejected at the
/// boundary.
pub const MAX_NODE_ID: u8 = 232;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("node id {0} is outside 1..=232")]
pub struct InvalidNodeId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u8);

impl NodeId {
    pub fn new(id: u8) -> Result<Self, InvalidNodeId> {
        if (1..=MAX_NODE_ID).contains(&id) {
            Ok(Self(id))
        } else {
            Err(InvalidNodeId(id))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for NodeId {
    type Error = InvalidNodeId;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<NodeId> for u8 {
    fn from(id: NodeId) -> u8 {
        id.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Parsable for NodeId {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let id = parse::bytes::be_u8(i)?;
        NodeId::new(id).map_err(|e| ParseError::recoverable(e.to_string()))
    }
}

impl Serializable for NodeId {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(self.0).serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_range() {
        assert!(NodeId::new(0).is_err());
        assert!(NodeId::new(1).is_ok());
        assert!(NodeId::new(232).is_ok());
        assert!(NodeId::new(233).is_err());
    }
}
