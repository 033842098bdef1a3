use crate::parse::{bytes::be_u8, Parsable, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;

const ACK: u8 = 0x01;
const LOW_POWER: u8 = 0x02;
const AUTO_ROUTE: u8 = 0x04;
const NO_ROUTE: u8 = 0x10;
const EXPLORE: u8 = 0x20;

/// Per-transmission radio options of SEND_DATA and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransmitOptions {
    ack: bool,
    low_power: bool,
    auto_route: bool,
    no_route: bool,
    explore: bool,
}

impl TransmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ack(mut self, ack: bool) -> Self {
        self.ack = ack;
        self
    }

    pub fn low_power(mut self, low_power: bool) -> Self {
        self.low_power = low_power;
        self
    }

    pub fn auto_route(mut self, auto_route: bool) -> Self {
        self.auto_route = auto_route;
        self
    }

    pub fn no_route(mut self, no_route: bool) -> Self {
        self.no_route = no_route;
        self
    }

    pub fn explore(mut self, explore: bool) -> Self {
        self.explore = explore;
        self
    }

    pub fn as_byte(&self) -> u8 {
        let mut byte = 0;
        if self.ack {
            byte |= ACK;
        }
        if self.low_power {
            byte |= LOW_POWER;
        }
        if self.auto_route {
            byte |= AUTO_ROUTE;
        }
        if self.no_route {
            byte |= NO_ROUTE;
        }
        if self.explore {
            byte |= EXPLORE;
        }
        byte
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            ack: byte & ACK != 0,
            low_power: byte & LOW_POWER != 0,
            auto_route: byte & AUTO_ROUTE != 0,
            no_route: byte & NO_ROUTE != 0,
            explore: byte & EXPLORE != 0,
        }
    }
}

impl Parsable for TransmitOptions {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self::from_byte(be_u8(i)?))
    }
}

impl Serializable for TransmitOptions {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(self.as_byte()).serialize(output);
    }
}
