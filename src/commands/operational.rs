//! Boot and chip state commands
//!
//! This module contains commands for bringing the chip out of reset and
//! moving it through its state machine:
//! - POWER_UP boot configuration
//! - Explicit state transitions via CHANGE_STATE
//! - Device state queries via REQUEST_DEVICE_STATE
//!
//! After reset the chip only accepts POWER_UP; the first CTS assertion
//! after boot can take several milliseconds while the firmware patches
//! and calibrates, which is why the transaction engine's polling budget
//! is configurable.

use core::convert::Infallible;

use regiface::FromByteArray;

use crate::{Command, NoParameters, ToByteArray};

/// Error type for invalid device state values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidState(pub u8);

/// Chip lifecycle state
///
/// The driver never infers the current state; it only changes via an
/// explicit [`ChangeState`], [`StartTx`](crate::StartTx) or
/// [`StartRx`](crate::StartRx) command, or reads it back via
/// [`RequestDeviceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Lowest power state; SPI access wakes the chip
    Sleep = 1,
    /// SPI interface active, radio circuits off
    SpiActive = 2,
    /// Crystal running, fast transition to TX/RX tune
    Ready = 3,
    /// Synthesizer locked for transmit
    TxTune = 5,
    /// Synthesizer locked for receive
    RxTune = 6,
    /// Actively transmitting
    Tx = 7,
    /// Actively receiving
    Rx = 8,
}

impl TryFrom<u8> for State {
    type Error = InvalidState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Sleep),
            2 => Ok(Self::SpiActive),
            3 => Ok(Self::Ready),
            5 => Ok(Self::TxTune),
            6 => Ok(Self::RxTune),
            7 => Ok(Self::Tx),
            8 => Ok(Self::Rx),
            invalid => Err(InvalidState(invalid)),
        }
    }
}

impl ToByteArray for State {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self as u8])
    }
}

/// Nop command (0x00)
///
/// Does nothing on the chip but still runs the full CTS handshake, which
/// makes it useful as a cheap liveness probe after power-up.
#[derive(Debug, Clone)]
pub struct Nop;

impl Command for Nop {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x00
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// Boot configuration parameters for [`PowerUp`]
#[derive(Debug, Clone, Copy)]
pub struct PowerUpConfig {
    /// Boot options byte; 0x01 boots the EZRadio PRO firmware image
    pub boot_options: u8,
    /// Reference is a TCXO rather than a crystal
    pub tcxo: bool,
    /// Reference frequency in Hz
    pub xtal_freq: u32,
}

impl ToByteArray for PowerUpConfig {
    type Error = Infallible;
    type Array = [u8; 6];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let xtal = self.xtal_freq.to_be_bytes();
        Ok([
            self.boot_options,
            self.tcxo as u8,
            xtal[0],
            xtal[1],
            xtal[2],
            xtal[3],
        ])
    }
}

/// PowerUp command (0x02)
///
/// Boots the chip firmware and declares the reference frequency.
///
/// # Important Notes
/// - Must be the first command after reset
/// - CTS can take several milliseconds to assert while the firmware boots
/// - The declared reference frequency feeds all later synthesis and NCO
///   arithmetic on the chip
#[derive(Debug, Clone)]
pub struct PowerUp {
    /// Boot configuration
    pub config: PowerUpConfig,
}

impl Command for PowerUp {
    type IdType = u8;
    type CommandParameters = PowerUpConfig;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x02
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}

/// ChangeState command (0x34)
///
/// Forces an immediate transition of the chip state machine.
///
/// # Important Notes
/// - TX and RX can also be entered through [`StartTx`](crate::StartTx) /
///   [`StartRx`](crate::StartRx), which tune the synthesizer first
/// - Moving to [`State::Sleep`] stops the SPI clock domain; the next
///   chip-select assertion wakes the chip
#[derive(Debug, Clone)]
pub struct ChangeState {
    /// Target state
    pub state: State,
}

impl Command for ChangeState {
    type IdType = u8;
    type CommandParameters = State;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x34
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.state
    }
}

/// RequestDeviceState response
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    /// Current state machine state
    pub state: State,
    /// Channel the synthesizer is currently tuned to
    pub channel: u8,
}

impl FromByteArray for DeviceState {
    type Error = InvalidState;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            // TX and RX report as tune states on some firmware revisions;
            // the low three bits always carry the state number.
            state: State::try_from(bytes[0] & 0x0F)?,
            channel: bytes[1],
        })
    }
}

/// RequestDeviceState command (0x33)
///
/// Reads back the current state machine state and tuned channel.
#[derive(Debug, Clone)]
pub struct RequestDeviceState;

impl Command for RequestDeviceState {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = DeviceState;

    fn id() -> Self::IdType {
        0x33
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_up_parameter_layout() {
        let config = PowerUpConfig {
            boot_options: 0x01,
            tcxo: true,
            xtal_freq: 30_000_000,
        };

        assert_eq!(
            config.to_bytes().unwrap(),
            [0x01, 0x01, 0x01, 0xC9, 0xC3, 0x80]
        );
    }

    #[test]
    fn state_round_trip() {
        for value in [1u8, 2, 3, 5, 6, 7, 8] {
            let state = State::try_from(value).unwrap();
            assert_eq!(state.to_bytes().unwrap(), [value]);
        }
        assert_eq!(State::try_from(4), Err(InvalidState(4)));
        assert_eq!(State::try_from(9), Err(InvalidState(9)));
    }

    #[test]
    fn device_state_reply_decode() {
        let reply = DeviceState::from_bytes([0x08, 0x14]).unwrap();
        assert_eq!(reply.state, State::Rx);
        assert_eq!(reply.channel, 0x14);
    }
}
