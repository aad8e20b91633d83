//! Preamble configuration properties
//!
//! PREAMBLE group (0x10). Only the TX length is driven by this crate;
//! the detection threshold and pattern options keep their chip defaults
//! unless written through the generic property path.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// TX preamble length property (address: 0x1000)
///
/// Number of preamble bytes (or nibbles, per PREAMBLE_CONFIG) sent ahead
/// of the sync word.
#[register(0x1000u16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PreambleTxLength {
    /// Preamble length; 0 disables the preamble entirely
    pub length: u8,
}

impl ToByteArray for PreambleTxLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.length])
    }
}

impl FromByteArray for PreambleTxLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { length: bytes[0] })
    }
}
