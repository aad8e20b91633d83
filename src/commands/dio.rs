//! GPIO configuration commands
//!
//! The Si4x6x routes internal signals (TX/RX data, clocks, interrupt
//! flags, RF switch control) to its four GPIO pins plus the NIRQ and SDO
//! pins through GPIO_PIN_CFG. Pin functions are the raw datasheet
//! function numbers; the chip echoes the resulting configuration back in
//! the reply.

use core::convert::Infallible;

use regiface::FromByteArray;

use crate::{Command, ToByteArray};

/// Pin routing configuration for [`GpioPinCfg`]
///
/// A function number of 0 leaves the pin unchanged; 1 tristates it. The
/// remaining function numbers are chip specific and documented with the
/// GPIO_PIN_CFG command in the datasheet.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioConfig {
    /// Function numbers for GPIO0-GPIO3
    pub gpio: [u8; 4],
    /// Function number for the NIRQ pin
    pub nirq: u8,
    /// Function number for the SDO pin
    pub sdo: u8,
    /// Drive strength and global pull-up configuration
    pub gen_config: u8,
}

impl ToByteArray for GpioConfig {
    type Error = Infallible;
    type Array = [u8; 7];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([
            self.gpio[0],
            self.gpio[1],
            self.gpio[2],
            self.gpio[3],
            self.nirq,
            self.sdo,
            self.gen_config,
        ])
    }
}

impl FromByteArray for GpioConfig {
    type Error = Infallible;
    type Array = [u8; 7];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            gpio: [bytes[0], bytes[1], bytes[2], bytes[3]],
            nirq: bytes[4],
            sdo: bytes[5],
            gen_config: bytes[6],
        })
    }
}

/// GpioPinCfg command (0x13)
///
/// Routes internal signals to the GPIO, NIRQ and SDO pins.
///
/// # Important Notes
/// - The reply echoes the configuration actually applied, including pin
///   state bits, and can be used to read pins configured as inputs
/// - Reconfiguring SDO affects SPI readback; keep it on its default
///   function unless the bus is otherwise unused
#[derive(Debug, Clone)]
pub struct GpioPinCfg {
    /// Requested pin routing
    pub config: GpioConfig,
}

impl Command for GpioPinCfg {
    type IdType = u8;
    type CommandParameters = GpioConfig;
    type ResponseParameters = GpioConfig;

    fn id() -> Self::IdType {
        0x13
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.config
    }
}
