//! Packet TX/RX commands
//!
//! This module contains the commands that move packet data on and off the
//! air:
//! - Start transmission with an optional completion state
//! - Start reception with per-outcome next states
//! - Inspect and reset the TX/RX FIFOs
//!
//! The FIFOs themselves are filled and drained through the dedicated
//! WRITE_TX_FIFO / READ_RX_FIFO opcodes exposed as
//! [`Device::write_tx_fifo`](crate::Device::write_tx_fifo) and
//! [`Device::read_rx_fifo`](crate::Device::read_rx_fifo), since their
//! payload length is decided by the caller at runtime.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::FromByteArray;

use crate::{commands::State, Command, NoParameters, ToByteArray};

fn state_nibble(state: Option<State>) -> u8 {
    state.map_or(0, |s| s as u8)
}

/// Transmission parameters for [`StartTx`]
#[derive(Debug, Clone, Copy)]
pub struct TxConfig {
    /// Channel number; the carrier is the tuned base frequency plus
    /// channel times the configured step size
    pub channel: u8,
    /// State to enter once the packet has been sent; `None` remains in TX
    pub complete_state: Option<State>,
    /// Packet length in bytes; 0 uses the packet handler's configured
    /// field lengths
    pub length: u16,
}

impl ToByteArray for TxConfig {
    type Error = Infallible;
    type Array = [u8; 4];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let length = self.length.to_be_bytes();
        Ok([
            self.channel,
            state_nibble(self.complete_state) << 4,
            length[0],
            length[1],
        ])
    }
}

/// StartTx command (0x31)
///
/// Tunes the synthesizer to the selected channel and begins transmitting
/// from the TX FIFO.
///
/// # Important Notes
/// - The TX FIFO should be loaded before issuing this command
/// - With `length == 0` the packet handler's field configuration decides
///   when the packet ends
/// - CTS stays deasserted until the state transition has been accepted,
///   not until the packet is on the air
#[derive(Debug, Clone)]
pub struct StartTx {
    /// Transmission parameters
    pub config: TxConfig,
}

impl Command for StartTx {
    type IdType = u8;
    type CommandParameters = TxConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x31
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

/// Reception parameters for [`StartRx`]
#[derive(Debug, Clone, Copy)]
pub struct RxConfig {
    /// Channel number
    pub channel: u8,
    /// Expected packet length in bytes; 0 uses the packet handler's
    /// configured field lengths
    pub length: u16,
    /// State to enter on preamble timeout; `None` keeps listening
    pub timeout_state: Option<State>,
    /// State to enter after a valid packet
    pub valid_state: Option<State>,
    /// State to enter after an invalid packet (CRC failure)
    pub invalid_state: Option<State>,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            length: 0,
            timeout_state: None,
            valid_state: Some(State::Ready),
            invalid_state: Some(State::Ready),
        }
    }
}

impl ToByteArray for RxConfig {
    type Error = Infallible;
    type Array = [u8; 7];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let length = self.length.to_be_bytes();
        Ok([
            self.channel,
            0x00,
            length[0],
            length[1],
            state_nibble(self.timeout_state),
            state_nibble(self.valid_state),
            state_nibble(self.invalid_state),
        ])
    }
}

/// StartRx command (0x32)
///
/// Tunes the synthesizer to the selected channel and begins listening.
///
/// # Important Notes
/// - The per-outcome next states decide whether reception is one-shot or
///   continuous; all-`None` re-arms RX after every packet
/// - Received payload bytes accumulate in the RX FIFO and survive the
///   state transition
#[derive(Debug, Clone)]
pub struct StartRx {
    /// Reception parameters
    pub config: RxConfig,
}

impl Command for StartRx {
    type IdType = u8;
    type CommandParameters = RxConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x32
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

bitflags! {
    /// FIFO reset selection for [`FifoInfo`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FifoReset: u8 {
        /// Discard any bytes pending in the TX FIFO
        const TX = 1 << 0;
        /// Discard any bytes pending in the RX FIFO
        const RX = 1 << 1;
    }
}

impl ToByteArray for FifoReset {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.bits()])
    }
}

/// FifoInfo response
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoCounts {
    /// Bytes currently queued in the RX FIFO
    pub rx_count: u8,
    /// Free space remaining in the TX FIFO, in bytes
    pub tx_space: u8,
}

impl FromByteArray for FifoCounts {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            rx_count: bytes[0],
            tx_space: bytes[1],
        })
    }
}

/// FifoInfo command (0x15)
///
/// Reports FIFO fill levels and optionally resets either FIFO.
///
/// # Important Notes
/// - The counts reported are those *after* any requested reset
/// - Resetting the TX FIFO mid-transmission corrupts the packet on the
///   air; change state first
#[derive(Debug, Clone)]
pub struct FifoInfo {
    /// FIFOs to reset; empty leaves both untouched
    pub reset: FifoReset,
}

impl Command for FifoInfo {
    type IdType = u8;
    type CommandParameters = FifoReset;
    type ResponseParameters = FifoCounts;

    fn id() -> Self::IdType {
        0x15
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.reset
    }
}
