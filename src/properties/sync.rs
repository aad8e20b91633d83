//! Sync word configuration properties
//!
//! SYNC group (0x11). The sync word itself lives at offsets 0x01-0x04
//! and is written through the generic property path when it needs to
//! change from the chip default.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Sync word configuration property (address: 0x1100)
#[register(0x1100u16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct SyncConfig {
    /// Transmit without a sync word; reception still requires one
    pub skip_tx: bool,
    /// Sync word bit errors tolerated during detection (0-7)
    pub rx_errors: u8,
    /// Sync word is 4FSK encoded
    pub four_fsk: bool,
    /// Sync word is Manchester coded
    pub manchester: bool,
    /// Sync word length in bytes minus one (0-3)
    pub length: u8,
}

impl SyncConfig {
    /// Standard two byte sync word, no coding, no error tolerance.
    pub fn two_byte() -> Self {
        Self {
            skip_tx: false,
            rx_errors: 0,
            four_fsk: false,
            manchester: false,
            length: 1,
        }
    }
}

impl ToByteArray for SyncConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.skip_tx as u8) << 7
            | (self.rx_errors & 0x07) << 4
            | (self.four_fsk as u8) << 3
            | (self.manchester as u8) << 2
            | (self.length & 0x03)])
    }
}

impl FromByteArray for SyncConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            skip_tx: bytes[0] & 0x80 != 0,
            rx_errors: (bytes[0] >> 4) & 0x07,
            four_fsk: bytes[0] & 0x08 != 0,
            manchester: bytes[0] & 0x04 != 0,
            length: bytes[0] & 0x03,
        })
    }
}
