//! Radio command implementations
//!
//! This module contains the implementation of all Si4x6x radio commands.
//! Commands are organized into functional categories:
//!
//! # Command Categories
//! - [`operational`]: Boot and chip state commands
//!   - Power-up configuration
//!   - Explicit device state changes
//!   - Device state queries
//!
//! - [`rf`]: Packet TX/RX commands
//!   - Start transmission and reception
//!   - TX/RX FIFO inspection and reset
//!
//! - [`status`]: Status and monitoring commands
//!   - Part and firmware identification
//!   - Interrupt, packet handler, modem and chip status
//!   - ADC readings (temperature, battery, GPIO)
//!
//! - [`dio`]: GPIO configuration commands
//!   - Pin function routing for GPIO0-3, NIRQ and SDO
//!
//! # Command Execution
//! Every command is delivered through the CTS handshake implemented by
//! [`Device`](crate::Device):
//!
//! 1. The chip is polled for readiness via the read-command-buffer opcode
//! 2. The command opcode and parameters are written in one chip-select
//!    session
//! 3. When the command produces a reply, the chip is polled again and the
//!    reply bytes are clocked out in the same session as the successful
//!    readiness probe
//!
//! # Important Notes
//! - Commands cannot be interleaved; the chip processes one at a time
//! - A readiness timeout after the command write means delivery is
//!   unknown, not that the command was dropped
//! - Reply payloads are only valid after a fully successful exchange

pub mod dio;
pub mod operational;
pub mod rf;
pub mod status;

pub use dio::*;
pub use operational::*;
pub use rf::*;
pub use status::*;
