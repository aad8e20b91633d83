//! Power amplifier configuration properties
//!
//! PA group (0x22). Output power is deliberately a raw level: the
//! dBm-per-step curve depends on the part, the match network and the
//! supply voltage, so the mapping belongs in board support code.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// PA mode property (address: 0x2200)
#[register(0x2200u16)]
#[derive(Debug, Clone, Copy, WritableRegister)]
pub struct PaMode {
    /// PA architecture selector (0-15), part specific
    pub pa_sel: u8,
    /// PA operating mode (0-3); 0 is class-E switching
    pub pa_mode: u8,
}

impl ToByteArray for PaMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.pa_sel & 0x0F) << 2 | (self.pa_mode & 0x03)])
    }
}

/// PA power level property (address: 0x2201)
///
/// 7-bit output level; 0x7F is maximum power for the fitted PA.
#[register(0x2201u16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PaPwrLvl {
    /// Raw output level (0x00-0x7F)
    pub level: u8,
}

impl ToByteArray for PaPwrLvl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.level & 0x7F])
    }
}

impl FromByteArray for PaPwrLvl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            level: bytes[0] & 0x7F,
        })
    }
}
