//! Modem configuration properties
//!
//! This module contains the MODEM group (0x20) properties the driver
//! touches:
//! - Modulation type and source selection
//! - TX data rate and NCO oversampling
//! - Frequency deviation
//! - RSSI measurement control
//! - Clock generator band selection for the PLL output divider

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Error type for invalid modulation field values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidModulation(pub u8);

/// Carrier modulation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModulationType {
    /// Unmodulated carrier, for test and measurement
    Cw = 0,
    /// On-off keying
    Ook = 1,
    /// Binary frequency shift keying
    Fsk2 = 2,
    /// Gaussian filtered 2FSK
    Gfsk2 = 3,
    /// Four level FSK
    Fsk4 = 4,
    /// Gaussian filtered 4FSK
    Gfsk4 = 5,
}

impl TryFrom<u8> for ModulationType {
    type Error = InvalidModulation;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Cw),
            1 => Ok(Self::Ook),
            2 => Ok(Self::Fsk2),
            3 => Ok(Self::Gfsk2),
            4 => Ok(Self::Fsk4),
            5 => Ok(Self::Gfsk4),
            invalid => Err(InvalidModulation(invalid)),
        }
    }
}

/// Source of the modulating bit stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModulationSource {
    /// Packet handler FIFO
    Fifo = 0,
    /// Real-time bits on a GPIO pin (direct mode)
    Direct = 1,
    /// Internal PN9 pseudo-random generator, for test transmissions
    Pn9 = 2,
}

/// Modulation type property (address: 0x2000)
///
/// Selects the modulation scheme and where the modulating bits come
/// from. For direct mode the GPIO pin carrying the TX data and its
/// clocking style are selected here as well.
#[register(0x2000u16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct ModemModType {
    /// Modulation scheme
    pub mod_type: ModulationType,
    /// Bit stream source
    pub source: ModulationSource,
    /// GPIO pin number carrying TX data in direct mode (0-3)
    pub tx_direct_gpio: u8,
    /// Direct mode clocking: false = synchronous, true = asynchronous
    pub tx_direct_async: bool,
}

impl ModemModType {
    /// FIFO-sourced modulation with no direct mode routing.
    pub fn fifo(mod_type: ModulationType) -> Self {
        Self {
            mod_type,
            source: ModulationSource::Fifo,
            tx_direct_gpio: 0,
            tx_direct_async: false,
        }
    }
}

impl ToByteArray for ModemModType {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.tx_direct_async as u8) << 7
            | (self.tx_direct_gpio & 0x03) << 5
            | (self.source as u8 & 0x03) << 3
            | (self.mod_type as u8 & 0x07)])
    }
}

impl FromByteArray for ModemModType {
    type Error = InvalidModulation;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        let source = match (bytes[0] >> 3) & 0x03 {
            0 => ModulationSource::Fifo,
            1 => ModulationSource::Direct,
            2 => ModulationSource::Pn9,
            invalid => return Err(InvalidModulation(invalid)),
        };

        Ok(Self {
            mod_type: ModulationType::try_from(bytes[0] & 0x07)?,
            source,
            tx_direct_gpio: (bytes[0] >> 5) & 0x03,
            tx_direct_async: bytes[0] & 0x80 != 0,
        })
    }
}

/// TX data rate property (address: 0x2003)
///
/// 24-bit data rate value. Together with the NCO modulo this sets the
/// on-air bit rate: `bitrate = rate * nco_freq / nco_modulo`, which for
/// the standard 10x oversampling configuration reduces to bits per
/// second.
#[register(0x2003u16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct ModemDataRate {
    /// Raw 24-bit data rate value
    pub rate: u32,
}

impl ToByteArray for ModemDataRate {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let bytes = self.rate.to_be_bytes();
        Ok([bytes[1], bytes[2], bytes[3]])
    }
}

impl FromByteArray for ModemDataRate {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            rate: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

/// TX NCO oversampling ratio
///
/// The discriminants are the raw TXOSR field values, which do not follow
/// the oversampling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NcoModulo {
    /// 10x oversampling
    Ten = 0,
    /// 40x oversampling
    Forty = 1,
    /// 20x oversampling
    Twenty = 2,
}

impl NcoModulo {
    /// The divisor applied to the crystal frequency for this ratio.
    pub fn divisor(self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Forty => 40,
        }
    }
}

/// TX NCO mode property (address: 0x2006, 4 bytes)
///
/// Carries the TXOSR field and the 26-bit NCO frequency, normally the
/// crystal frequency divided by the oversampling ratio.
#[register(0x2006u16)]
#[derive(Debug, Clone, Copy, WritableRegister)]
pub struct ModemTxNcoMode {
    /// Oversampling ratio
    pub txosr: NcoModulo,
    /// 26-bit NCO frequency in Hz
    pub nco_freq: u32,
}

impl ToByteArray for ModemTxNcoMode {
    type Error = Infallible;
    type Array = [u8; 4];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let freq = self.nco_freq.to_be_bytes();
        Ok([
            (freq[0] & 0x03) | (self.txosr as u8) << 2,
            freq[1],
            freq[2],
            freq[3],
        ])
    }
}

/// Frequency deviation property (address: 0x200A, 3 bytes)
///
/// 17-bit peak deviation value in synthesizer units; see
/// [`Device::set_deviation`](crate::Device::set_deviation) for the
/// conversion from Hz.
#[register(0x200Au16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct ModemFreqDev {
    /// Raw 17-bit deviation value
    pub deviation: u32,
}

impl ToByteArray for ModemFreqDev {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let bytes = self.deviation.to_be_bytes();
        Ok([bytes[1], bytes[2], bytes[3]])
    }
}

impl FromByteArray for ModemFreqDev {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            deviation: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

/// RSSI control property (address: 0x204C)
///
/// Selects when RSSI is latched and over how many bit periods it is
/// averaged.
#[register(0x204Cu16)]
#[derive(Debug, Clone, Copy, WritableRegister)]
pub struct ModemRssiControl {
    /// Compare the latched value against the RSSI threshold
    pub check_thresh_at_latch: bool,
    /// Averaging window selector (0-3)
    pub average: u8,
    /// Latch event selector (0-7); 1 latches on preamble, 2 on sync
    pub latch: u8,
}

impl ToByteArray for ModemRssiControl {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.check_thresh_at_latch as u8) << 5
            | (self.average & 0x03) << 3
            | (self.latch & 0x07)])
    }
}

/// Clock generator band property (address: 0x2051)
///
/// Selects the PLL output divider band computed by
/// [`FrequencyPlan`](crate::synth::FrequencyPlan). `sy_sel` forces the
/// high performance divider chain and is set for every plan this driver
/// writes.
#[register(0x2051u16)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct ModemClkgenBand {
    /// Band code (0-5) matching the output divider
    pub band: u8,
    /// High performance synthesizer divider chain
    pub sy_sel: bool,
}

impl ToByteArray for ModemClkgenBand {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.sy_sel as u8) << 3 | (self.band & 0x07)])
    }
}

impl FromByteArray for ModemClkgenBand {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            band: bytes[0] & 0x07,
            sy_sel: bytes[0] & 0x08 != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_type_packing() {
        let gfsk = ModemModType::fifo(ModulationType::Gfsk2);
        assert_eq!(gfsk.to_bytes().unwrap(), [0x03]);

        let direct_ook = ModemModType {
            mod_type: ModulationType::Ook,
            source: ModulationSource::Direct,
            tx_direct_gpio: 2,
            tx_direct_async: true,
        };
        // async(1) | gpio 2 | source direct(01) | type ook(001)
        assert_eq!(direct_ook.to_bytes().unwrap(), [0b1100_1001]);
    }

    #[test]
    fn mod_type_round_trip() {
        let original = ModemModType {
            mod_type: ModulationType::Fsk4,
            source: ModulationSource::Pn9,
            tx_direct_gpio: 1,
            tx_direct_async: false,
        };
        let decoded = ModemModType::from_bytes(original.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.mod_type, ModulationType::Fsk4);
        assert_eq!(decoded.source, ModulationSource::Pn9);
        assert_eq!(decoded.tx_direct_gpio, 1);
        assert!(!decoded.tx_direct_async);
    }

    #[test]
    fn data_rate_is_24_bits_big_endian() {
        let rate = ModemDataRate { rate: 0x01_86A0 };
        assert_eq!(rate.to_bytes().unwrap(), [0x01, 0x86, 0xA0]);
        assert_eq!(
            ModemDataRate::from_bytes([0x01, 0x86, 0xA0]).unwrap().rate,
            100_000
        );
    }

    #[test]
    fn nco_mode_packs_txosr_above_the_frequency() {
        // 30 MHz / 10 = 3 MHz NCO, 10x oversampling
        let nco = ModemTxNcoMode {
            txosr: NcoModulo::Ten,
            nco_freq: 3_000_000,
        };
        assert_eq!(nco.to_bytes().unwrap(), [0x00, 0x2D, 0xC6, 0xC0]);

        // 40x ratio sets TXOSR = 1 in bits 3:2
        let nco40 = ModemTxNcoMode {
            txosr: NcoModulo::Forty,
            nco_freq: 750_000,
        };
        assert_eq!(nco40.to_bytes().unwrap(), [0x04, 0x0B, 0x71, 0xB0]);
    }

    #[test]
    fn clkgen_band_sets_high_performance_bit() {
        let band = ModemClkgenBand {
            band: 2,
            sy_sel: true,
        };
        assert_eq!(band.to_bytes().unwrap(), [0x0A]);

        let decoded = ModemClkgenBand::from_bytes([0x0A]).unwrap();
        assert_eq!(decoded.band, 2);
        assert!(decoded.sy_sel);
    }
}
