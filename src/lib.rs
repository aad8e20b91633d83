#![cfg_attr(not(test), no_std)]
//! Si4x6x Radio Driver
//!
//! This crate provides a type-safe interface for the Silicon Labs Si4x6x
//! (Si4460/1/2/3/4) sub-GHz radio transceivers. The Si4x6x are highly
//! integrated, low power transceivers covering the 119-1050 MHz ISM bands.
//!
//! # Features
//! - Frequency range: 119-1050 MHz (PLL fractional-N synthesis)
//! - Modulation support: CW, OOK, 2(G)FSK, 4(G)FSK
//! - FIFO based packet transmission and reception
//! - Programmable GPIO pins for interrupts and control
//! - Both chip CTS handshake styles
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Main device interface for hardware interaction
//!   - Implements the command transaction engine and CTS handshake
//!   - Provides the high-level radio API (tuning, TX/RX, status)
//!
//! - [`transport`]: SPI transport capability
//!   - [`Transport`] abstracts chip-select and byte transfer
//!   - [`SpiTransport`] adapts an `embedded-hal` bus and pin
//!
//! - [`commands`]: Command interface for radio control
//!   - [`commands::operational`]: Boot and chip state control
//!   - [`commands::rf`]: Packet TX/RX start commands
//!   - [`commands::status`]: Part information and status queries
//!   - [`commands::dio`]: GPIO and pin routing configuration
//!
//! - [`properties`]: Property definitions for the 16-bit group:offset space
//!   - [`properties::modem`]: Modulation, data rate, deviation, clock band
//!   - [`properties::pa`]: Power amplifier configuration
//!   - [`properties::preamble`] / [`properties::sync`]: Framing configuration
//!   - [`properties::freq_control`]: PLL fractional-N tuning words
//!
//! - [`synth`]: Frequency plan arithmetic (output divider, PFD, INTE/FRAC)
//!
//! # Usage
//! The driver uses the `regiface` crate to provide a type-safe interface
//! for command execution and property access. The main entry point is the
//! [`Device`] struct, which owns a [`Transport`] capability and a delay
//! provider and performs every exchange through the chip's CTS handshake.
//!
//! Configuration follows a specific sequence:
//!
//! 1. Create a [`Device`] with your transport, delay, and crystal frequency
//! 2. Issue POWER_UP and wait for the chip to boot
//! 3. Configure modulation, data rate, and deviation
//! 4. Tune with [`Device::set_frequency`]
//! 5. Load the TX FIFO and start transmission, or start reception
//!
//! # Important Notes
//! - Every command is gated on the chip's CTS (Clear-To-Send) status byte;
//!   a chip that never reports ready surfaces [`Error::ReadinessTimeout`]
//! - A timed-out reply phase means the command may still have executed;
//!   only the reply is lost
//! - The chip offers no interrupt-driven alternative to CTS polling over
//!   SPI; the poll interval and budget are configurable via [`PollConfig`]
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};
//! use si4x6x::{Device, Error, SpiTransport, State};
//!
//! fn bring_up<BUS, CS, D>(bus: BUS, cs: CS, delay: D) -> Result<(), Error>
//! where
//!     BUS: SpiBus,
//!     CS: OutputPin,
//!     D: DelayNs,
//! {
//!     let mut radio = Device::new(SpiTransport::new(bus, cs), delay, 30_000_000, false);
//!
//!     radio.power_up(0x01)?;
//!     radio.set_frequency(433_920_000)?;
//!     radio.change_state(State::Ready)?;
//!
//!     Ok(())
//! }
//! ```

use regiface::*;

pub mod commands;
pub mod device;
pub mod properties;
pub mod synth;
pub mod transport;

pub use commands::*;
pub use device::{Device, Handshake, PollConfig};
pub use properties::*;
pub use transport::{SpiTransport, Transport};

/// Driver error type.
///
/// The transaction engine knows a single protocol-level failure: the chip
/// did not assert CTS within the polling budget. Transport and decode
/// failures are surfaced separately so callers can distinguish a wedged
/// chip from a broken bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The chip never asserted CTS within the configured polling budget.
    ///
    /// For a reply-phase timeout the command has already been delivered;
    /// treat this as "reply unavailable", not "command not executed".
    ReadinessTimeout,
    /// The SPI transport reported a failure.
    Bus,
    /// A reply payload could not be decoded.
    Deserialization,
}
