//! Status commands
//!
//! This module contains commands for identifying the part and monitoring
//! its operation:
//! - Part number and firmware revision queries
//! - Interrupt, packet handler, modem and chip status
//! - ADC readings (die temperature, battery voltage, GPIO)
//!
//! Status replies are captured verbatim into fixed-size raw byte arrays;
//! accessor methods decode the documented bits and bytes. A status value
//! is only meaningful after the transaction that populated it completed
//! successfully.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::FromByteArray;

use crate::{Command, NoParameters, ToByteArray};

/// PartInfo reply (8 bytes)
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartInfo {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 8],
}

impl PartInfo {
    /// Chip mask revision
    pub fn revision(&self) -> u8 {
        self.raw[0]
    }

    /// 16-bit part number, e.g. 0x4463 for the Si4463
    pub fn part_id(&self) -> u16 {
        u16::from(self.raw[1]) << 8 | u16::from(self.raw[2])
    }

    /// Part build number
    pub fn part_build(&self) -> u8 {
        self.raw[3]
    }

    /// 16-bit ID field
    pub fn id(&self) -> u16 {
        u16::from(self.raw[4]) << 8 | u16::from(self.raw[5])
    }

    /// Customer code
    pub fn customer(&self) -> u8 {
        self.raw[6]
    }

    /// ROM identifier
    pub fn rom_id(&self) -> u8 {
        self.raw[7]
    }
}

impl FromByteArray for PartInfo {
    type Error = Infallible;
    type Array = [u8; 8];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetPartInfo command (0x01)
///
/// Reads the part number, mask revision and ROM identification.
#[derive(Debug, Clone)]
pub struct GetPartInfo;

impl Command for GetPartInfo {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = PartInfo;

    fn id() -> Self::IdType {
        0x01
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// FuncInfo reply (6 bytes)
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FuncInfo {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 6],
}

impl FuncInfo {
    /// External firmware revision
    pub fn rev_ext(&self) -> u8 {
        self.raw[0]
    }

    /// Branch firmware revision
    pub fn rev_branch(&self) -> u8 {
        self.raw[1]
    }

    /// Internal firmware revision
    pub fn rev_int(&self) -> u8 {
        self.raw[2]
    }

    /// Applied patch ID, 0 when no patch is active
    pub fn patch(&self) -> u16 {
        u16::from(self.raw[3]) << 8 | u16::from(self.raw[4])
    }

    /// Current functional mode
    pub fn func(&self) -> u8 {
        self.raw[5]
    }
}

impl FromByteArray for FuncInfo {
    type Error = Infallible;
    type Array = [u8; 6];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetFuncInfo command (0x10)
///
/// Reads the booted firmware function revision and patch level.
#[derive(Debug, Clone)]
pub struct GetFuncInfo;

impl Command for GetFuncInfo {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = FuncInfo;

    fn id() -> Self::IdType {
        0x10
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

bitflags! {
    /// Packet handler interrupt bits (PH_PEND / PH_STATUS)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhInterrupts: u8 {
        /// RX FIFO crossed the almost-full watermark
        const RX_FIFO_ALMOST_FULL = 1 << 0;
        /// TX FIFO crossed the almost-empty watermark
        const TX_FIFO_ALMOST_EMPTY = 1 << 1;
        /// Received packet failed its CRC check
        const CRC_ERROR = 1 << 3;
        /// A packet was received completely
        const PACKET_RX = 1 << 4;
        /// A packet was transmitted completely
        const PACKET_SENT = 1 << 5;
        /// Match filter missed
        const FILTER_MISS = 1 << 6;
        /// Match filter hit
        const FILTER_MATCH = 1 << 7;
    }
}

bitflags! {
    /// Modem interrupt bits (MODEM_PEND / MODEM_STATUS)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModemInterrupts: u8 {
        /// Sync word detected
        const SYNC_DETECT = 1 << 0;
        /// Preamble detected
        const PREAMBLE_DETECT = 1 << 1;
        /// Preamble lost before sync
        const INVALID_PREAMBLE = 1 << 2;
        /// RSSI crossed the configured threshold
        const RSSI = 1 << 3;
        /// RSSI jumped by more than the configured margin
        const RSSI_JUMP = 1 << 4;
        /// Sync word errored out
        const INVALID_SYNC = 1 << 5;
    }
}

bitflags! {
    /// Chip interrupt bits (CHIP_PEND / CHIP_STATUS)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChipInterrupts: u8 {
        /// Wake-up timer expired
        const WUT = 1 << 0;
        /// Battery voltage below threshold
        const LOW_BATT = 1 << 1;
        /// Chip ready after POWER_UP or wake
        const CHIP_READY = 1 << 2;
        /// A command was rejected; see CMD_ERR_STATUS
        const CMD_ERROR = 1 << 3;
        /// A state transition completed
        const STATE_CHANGE = 1 << 4;
        /// A FIFO underflowed or overflowed
        const FIFO_UNDERFLOW_OVERFLOW = 1 << 5;
        /// A calibration finished
        const CAL = 1 << 6;
    }
}

/// Pending-interrupt preservation masks for [`GetIntStatus`]
///
/// GET_INT_STATUS clears every pending bit whose mask bit is zero. The
/// default preserves nothing, i.e. clears all pending interrupts, which
/// matches the common interrupt-service pattern.
#[derive(Debug, Clone, Copy)]
pub struct InterruptClearControl {
    /// Packet handler pending bits to keep
    pub keep_ph: PhInterrupts,
    /// Modem pending bits to keep
    pub keep_modem: ModemInterrupts,
    /// Chip pending bits to keep
    pub keep_chip: ChipInterrupts,
}

impl Default for InterruptClearControl {
    fn default() -> Self {
        Self {
            keep_ph: PhInterrupts::empty(),
            keep_modem: ModemInterrupts::empty(),
            keep_chip: ChipInterrupts::empty(),
        }
    }
}

impl ToByteArray for InterruptClearControl {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([
            self.keep_ph.bits(),
            self.keep_modem.bits(),
            self.keep_chip.bits(),
        ])
    }
}

/// GetIntStatus reply (8 bytes)
///
/// Byte layout: INT_PEND, INT_STATUS, PH_PEND, PH_STATUS, MODEM_PEND,
/// MODEM_STATUS, CHIP_PEND, CHIP_STATUS.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqStatus {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 8],
}

impl IrqStatus {
    /// Packet handler interrupts latched since the last clear
    pub fn ph_pending(&self) -> PhInterrupts {
        PhInterrupts::from_bits_truncate(self.raw[2])
    }

    /// Packet handler status as currently observed
    pub fn ph_status(&self) -> PhInterrupts {
        PhInterrupts::from_bits_truncate(self.raw[3])
    }

    /// Modem interrupts latched since the last clear
    pub fn modem_pending(&self) -> ModemInterrupts {
        ModemInterrupts::from_bits_truncate(self.raw[4])
    }

    /// Modem status as currently observed
    pub fn modem_status(&self) -> ModemInterrupts {
        ModemInterrupts::from_bits_truncate(self.raw[5])
    }

    /// Chip interrupts latched since the last clear
    pub fn chip_pending(&self) -> ChipInterrupts {
        ChipInterrupts::from_bits_truncate(self.raw[6])
    }

    /// Chip status as currently observed
    pub fn chip_status(&self) -> ChipInterrupts {
        ChipInterrupts::from_bits_truncate(self.raw[7])
    }

    /// A packet arrived and its reception interrupt is still pending
    pub fn is_packet_rx_pending(&self) -> bool {
        self.ph_pending().contains(PhInterrupts::PACKET_RX)
    }

    /// A packet transmission completed and is still pending
    pub fn is_packet_sent_pending(&self) -> bool {
        self.ph_pending().contains(PhInterrupts::PACKET_SENT)
    }

    /// A CRC failure is still pending
    pub fn is_crc_error_pending(&self) -> bool {
        self.ph_pending().contains(PhInterrupts::CRC_ERROR)
    }
}

impl FromByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 8];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetIntStatus command (0x20)
///
/// Reads all interrupt state and clears the pending bits selected by the
/// clear control masks.
///
/// # Important Notes
/// - Pending bits accumulate until cleared here; the status bytes always
///   reflect the live condition
/// - With the default control every pending bit is cleared, releasing the
///   NIRQ line
#[derive(Debug, Clone, Default)]
pub struct GetIntStatus {
    /// Pending bits to preserve across the read
    pub clear: InterruptClearControl,
}

impl Command for GetIntStatus {
    type IdType = u8;
    type CommandParameters = InterruptClearControl;
    type ResponseParameters = IrqStatus;

    fn id() -> Self::IdType {
        0x20
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.clear
    }
}

/// GetPhStatus reply (2 bytes: PH_PEND, PH_STATUS)
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhStatus {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 2],
}

impl PhStatus {
    /// Packet handler interrupts latched since the last clear
    pub fn pending(&self) -> PhInterrupts {
        PhInterrupts::from_bits_truncate(self.raw[0])
    }

    /// Packet handler status as currently observed
    pub fn status(&self) -> PhInterrupts {
        PhInterrupts::from_bits_truncate(self.raw[1])
    }
}

impl FromByteArray for PhStatus {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetPhStatus command (0x21)
///
/// Reads the packet handler interrupt state without touching the modem or
/// chip groups. Pending bits are cleared by the read.
#[derive(Debug, Clone)]
pub struct GetPhStatus;

impl Command for GetPhStatus {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = PhStatus;

    fn id() -> Self::IdType {
        0x21
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// GetModemStatus reply (8 bytes)
///
/// Byte layout: MODEM_PEND, MODEM_STATUS, CURR_RSSI, LATCH_RSSI,
/// ANT1_RSSI, ANT2_RSSI, AFC_FREQ_OFFSET (2 bytes).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemStatus {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 8],
}

impl ModemStatus {
    /// Modem interrupts latched since the last clear
    pub fn pending(&self) -> ModemInterrupts {
        ModemInterrupts::from_bits_truncate(self.raw[0])
    }

    /// Modem status as currently observed
    pub fn status(&self) -> ModemInterrupts {
        ModemInterrupts::from_bits_truncate(self.raw[1])
    }

    /// Instantaneous RSSI, in curve units per the datasheet
    pub fn current_rssi(&self) -> u8 {
        self.raw[2]
    }

    /// RSSI latched at the configured event (sync word by default)
    pub fn latched_rssi(&self) -> u8 {
        self.raw[3]
    }

    /// RSSI sampled on antenna 1 during diversity selection
    pub fn ant1_rssi(&self) -> u8 {
        self.raw[4]
    }

    /// RSSI sampled on antenna 2 during diversity selection
    pub fn ant2_rssi(&self) -> u8 {
        self.raw[5]
    }

    /// AFC frequency offset as a signed synthesizer correction
    pub fn afc_freq_offset(&self) -> i16 {
        i16::from_be_bytes([self.raw[6], self.raw[7]])
    }
}

impl FromByteArray for ModemStatus {
    type Error = Infallible;
    type Array = [u8; 8];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetModemStatus command (0x22)
///
/// Reads modem interrupt state and signal quality measurements. Pending
/// bits are cleared by the read.
#[derive(Debug, Clone)]
pub struct GetModemStatus;

impl Command for GetModemStatus {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = ModemStatus;

    fn id() -> Self::IdType {
        0x22
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

/// GetChipStatus reply (3 bytes: CHIP_PEND, CHIP_STATUS, CMD_ERR_STATUS)
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipStatus {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 3],
}

impl ChipStatus {
    /// Chip interrupts latched since the last clear
    pub fn pending(&self) -> ChipInterrupts {
        ChipInterrupts::from_bits_truncate(self.raw[0])
    }

    /// Chip status as currently observed
    pub fn status(&self) -> ChipInterrupts {
        ChipInterrupts::from_bits_truncate(self.raw[1])
    }

    /// Cause code of the last rejected command
    pub fn cmd_err_status(&self) -> u8 {
        self.raw[2]
    }

    /// The last command was rejected and the error is still pending
    pub fn is_cmd_error_pending(&self) -> bool {
        self.pending().contains(ChipInterrupts::CMD_ERROR)
    }
}

impl FromByteArray for ChipStatus {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetChipStatus command (0x23)
///
/// Reads chip-level interrupt state and the last command error cause.
/// Pending bits are cleared by the read.
#[derive(Debug, Clone)]
pub struct GetChipStatus;

impl Command for GetChipStatus {
    type IdType = u8;
    type CommandParameters = NoParameters;
    type ResponseParameters = ChipStatus;

    fn id() -> Self::IdType {
        0x23
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        NoParameters::default()
    }
}

bitflags! {
    /// ADC input selection for [`GetAdcReading`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdcInputs: u8 {
        /// Sample the selected GPIO pin voltage
        const GPIO = 1 << 2;
        /// Sample the battery voltage
        const BATTERY = 1 << 3;
        /// Sample the die temperature sensor
        const TEMPERATURE = 1 << 4;
    }
}

impl ToByteArray for AdcInputs {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.bits()])
    }
}

/// GetAdcReading reply (6 bytes)
///
/// Inputs that were not selected read back as zero.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcReadings {
    /// Raw reply bytes as clocked off the chip
    pub raw: [u8; 6],
}

impl AdcReadings {
    /// 11-bit GPIO pin voltage reading
    pub fn gpio(&self) -> u16 {
        u16::from(self.raw[0]) << 8 | u16::from(self.raw[1])
    }

    /// 11-bit battery voltage reading
    pub fn battery(&self) -> u16 {
        u16::from(self.raw[2]) << 8 | u16::from(self.raw[3])
    }

    /// 11-bit raw die temperature reading
    pub fn temperature_raw(&self) -> u16 {
        u16::from(self.raw[4]) << 8 | u16::from(self.raw[5])
    }

    /// Die temperature in tenths of a degree Celsius
    pub fn temperature_decicelsius(&self) -> i16 {
        let raw = i32::from(self.temperature_raw());
        (raw * 568 / 256 - 2970) as i16
    }
}

impl FromByteArray for AdcReadings {
    type Error = Infallible;
    type Array = [u8; 6];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes })
    }
}

/// GetAdcReading command (0x14)
///
/// Runs a conversion on the selected ADC inputs and returns the raw
/// readings.
///
/// # Important Notes
/// - Conversions take on the order of 100 µs per selected input; the CTS
///   reply wait absorbs this latency
/// - The temperature conversion formula is
///   `°C * 10 = raw * 568 / 256 - 2970`
#[derive(Debug, Clone)]
pub struct GetAdcReading {
    /// Inputs to convert
    pub inputs: AdcInputs,
}

impl Command for GetAdcReading {
    type IdType = u8;
    type CommandParameters = AdcInputs;
    type ResponseParameters = AdcReadings;

    fn id() -> Self::IdType {
        0x14
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_info_accessors() {
        let info = PartInfo {
            raw: [0x02, 0x44, 0x63, 0x00, 0x0F, 0x00, 0x00, 0x03],
        };
        assert_eq!(info.revision(), 0x02);
        assert_eq!(info.part_id(), 0x4463);
        assert_eq!(info.part_build(), 0x00);
        assert_eq!(info.rom_id(), 0x03);
    }

    #[test]
    fn irq_status_packet_bits() {
        let status = IrqStatus {
            raw: [0x05, 0x01, 0x18, 0x10, 0x00, 0x00, 0x00, 0x00],
        };
        assert!(status.is_packet_rx_pending());
        assert!(status.is_crc_error_pending());
        assert!(!status.is_packet_sent_pending());
        assert!(status.ph_status().contains(PhInterrupts::PACKET_RX));
    }

    #[test]
    fn modem_status_rssi_and_afc() {
        let status = ModemStatus {
            raw: [0x03, 0x01, 0x5A, 0x62, 0x00, 0x00, 0xFF, 0xF8],
        };
        assert!(status.pending().contains(ModemInterrupts::SYNC_DETECT));
        assert!(status.pending().contains(ModemInterrupts::PREAMBLE_DETECT));
        assert!(status.status().contains(ModemInterrupts::SYNC_DETECT));
        assert_eq!(status.current_rssi(), 0x5A);
        assert_eq!(status.latched_rssi(), 0x62);
        assert_eq!(status.afc_freq_offset(), -8);
    }

    #[test]
    fn interrupt_clear_control_default_clears_everything() {
        let control = InterruptClearControl::default();
        assert_eq!(control.to_bytes().unwrap(), [0x00, 0x00, 0x00]);
    }

    #[test]
    fn temperature_conversion() {
        // Worked example: raw 0x0640 (1600) -> 1600 * 568 / 256 - 2970
        // = 3550 - 2970 = 580, i.e. 58.0 C
        let readings = AdcReadings {
            raw: [0x00, 0x00, 0x00, 0x00, 0x06, 0x40],
        };
        assert_eq!(readings.temperature_decicelsius(), 580);

        // Sub-zero result
        let cold = AdcReadings {
            raw: [0x00, 0x00, 0x00, 0x00, 0x04, 0x00],
        };
        assert_eq!(cold.temperature_decicelsius(), 2272 - 2970);
    }
}
