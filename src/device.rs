//! Si4x6x Radio Device Interface
//!
//! This module provides the transaction engine at the heart of the
//! driver: the mechanism that delivers a command to the chip and reads
//! its reply across the CTS (Clear-To-Send) handshake.
//!
//! The chip processes commands asynchronously with an unpredictable
//! latency and offers exactly one synchronization primitive: probing the
//! reserved READ_CMD_BUFF opcode returns a status byte, and `0xFF` means
//! the chip is ready to accept a command or has a reply waiting. The
//! engine polls that byte with a bounded budget around every exchange.
//!
//! The interface is built around the `Device<SPI, D>` struct, which owns
//! a [`Transport`] capability and a delay provider and exposes:
//! - The raw engine: [`Device::send_command`] and [`Device::wait_for_ready`]
//! - Typed command execution via regiface [`Command`] implementations
//! - Typed and raw property access over the group:offset space
//! - The high-level radio API (tuning, modulation, TX/RX, status)
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};
//! use si4x6x::{Device, Error, SpiTransport};
//!
//! fn identify<BUS, CS, D>(bus: BUS, cs: CS, delay: D) -> Result<u16, Error>
//! where
//!     BUS: SpiBus,
//!     CS: OutputPin,
//!     D: DelayNs,
//! {
//!     let mut radio = Device::new(SpiTransport::new(bus, cs), delay, 30_000_000, false);
//!     radio.power_up(0x01)?;
//!     Ok(radio.part_info()?.part_id())
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use regiface::{ByteArray, Command, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::commands::{
    AdcInputs, AdcReadings, ChangeState, ChipStatus, DeviceState, FifoCounts, FifoInfo, FifoReset,
    FuncInfo, GetAdcReading, GetChipStatus, GetFuncInfo, GetIntStatus, GetModemStatus, GetPartInfo,
    GetPhStatus, GpioConfig, GpioPinCfg, InterruptClearControl, IrqStatus, ModemStatus, PartInfo,
    PhStatus, PowerUp, PowerUpConfig, RequestDeviceState, RxConfig, StartRx, StartTx, State,
    TxConfig,
};
use crate::properties::{
    FreqControl, ModemClkgenBand, ModemDataRate, ModemFreqDev, ModemModType, ModemRssiControl,
    ModemTxNcoMode, NcoModulo, PaPwrLvl, PreambleTxLength, SyncConfig,
};
use crate::synth::FrequencyPlan;
use crate::transport::Transport;
use crate::Error;

/// Reserved opcode exposing the command reply buffer and the CTS byte.
const READ_CMD_BUFF: u8 = 0x44;
/// CTS status value signalling ready.
const CTS_READY: u8 = 0xFF;
/// Filler clocked out while sampling reply bytes.
const FILLER: u8 = 0xFF;

const SET_PROPERTY: u8 = 0x11;
const GET_PROPERTY: u8 = 0x12;
const WRITE_TX_FIFO: u8 = 0x66;
const READ_RX_FIFO: u8 = 0x77;

/// SET_PROPERTY accepts at most this many value bytes per command.
const MAX_PROPERTY_COUNT: usize = 12;

/// CTS polling policy.
///
/// The defaults match the chip's typical command latency: up to ten
/// probes spaced a millisecond apart. POWER_UP can take longer on some
/// firmware images; widen the budget for bring-up if needed. Tests
/// inject a zero-interval configuration together with a no-op delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfig {
    /// Maximum number of CTS probes per readiness wait.
    pub max_polls: u16,
    /// Sleep between unsuccessful probes, in milliseconds.
    pub interval_ms: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_polls: 10,
            interval_ms: 1,
        }
    }
}

/// CTS handshake style, matching the two chip families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handshake {
    /// The readiness probe and the reply share one chip-select session;
    /// the reply-phase wait runs after every command, even ones without
    /// a reply, confirming the command was consumed.
    #[default]
    InlineCtsRead,
    /// Readiness is confirmed by a dedicated probe before the command
    /// and, only when a reply is expected, by a second independent
    /// wait-and-read transaction afterwards.
    SeparateCtsProbe,
}

/// Main device interface for the Si4x6x radio.
///
/// Wraps a [`Transport`] capability and a delay provider. Exclusive bus
/// ownership for the duration of a transaction is enforced by `&mut
/// self`; the chip's protocol supports exactly one in-flight command.
pub struct Device<SPI, D> {
    spi: SPI,
    delay: D,
    handshake: Handshake,
    poll: PollConfig,
    xtal_freq: u32,
    tcxo: bool,
    // Output divider from the last frequency plan, needed by the
    // deviation arithmetic.
    outdiv: u8,
}

impl<SPI, D> Device<SPI, D> {
    /// Creates a new device over the given transport and delay provider.
    ///
    /// # Arguments
    /// * `spi` - Bus transport capability
    /// * `delay` - Sleep provider for the CTS poll loop and hold times
    /// * `xtal_freq` - Reference frequency in Hz
    /// * `tcxo` - Reference is a TCXO rather than a crystal
    pub fn new(spi: SPI, delay: D, xtal_freq: u32, tcxo: bool) -> Self {
        Self {
            spi,
            delay,
            handshake: Handshake::default(),
            poll: PollConfig::default(),
            xtal_freq,
            tcxo,
            outdiv: 4,
        }
    }

    /// Selects the CTS handshake style for this chip family.
    pub fn with_handshake(mut self, handshake: Handshake) -> Self {
        self.handshake = handshake;
        self
    }

    /// Overrides the CTS polling policy.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Releases the underlying transport and delay provider.
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }
}

impl<SPI, D> Device<SPI, D>
where
    SPI: Transport,
    D: DelayNs,
{
    /// One CTS probe. On ready the chip-select session is left asserted
    /// so the caller can clock a reply out of the same session; on busy
    /// the session is closed.
    fn probe_cts(&mut self) -> Result<bool, Error> {
        self.spi.select().map_err(|_| Error::Bus)?;
        self.spi.transfer_byte(READ_CMD_BUFF).map_err(|_| Error::Bus)?;
        let status = self.spi.transfer_byte(FILLER).map_err(|_| Error::Bus)?;

        if status == CTS_READY {
            Ok(true)
        } else {
            self.spi.release().map_err(|_| Error::Bus)?;
            Ok(false)
        }
    }

    /// Polls CTS until ready or the budget is exhausted. Exactly
    /// `max_polls` probes are issued before giving up. On success the
    /// probing chip-select session is still asserted.
    fn poll_cts_open(&mut self) -> Result<(), Error> {
        let mut budget = self.poll.max_polls;

        while budget > 0 {
            if self.probe_cts()? {
                return Ok(());
            }
            budget -= 1;
            if budget > 0 {
                self.delay.delay_ms(self.poll.interval_ms);
            }
        }

        Err(Error::ReadinessTimeout)
    }

    /// Waits until the chip reports ready, without issuing a command.
    ///
    /// Useful before raw FIFO access. Timing out here is not retried;
    /// callers that want another budget simply call again.
    pub fn wait_for_ready(&mut self) -> Result<(), Error> {
        self.poll_cts_open()?;
        self.spi.release().map_err(|_| Error::Bus)?;
        self.delay.delay_us(1);
        Ok(())
    }

    /// Waits until the chip reports ready, then clocks `reply` out of the
    /// same chip-select session that saw the successful probe. No select
    /// toggle separates the probe from the payload; a toggle would make
    /// the chip restart the reply from its first byte.
    fn wait_and_read(&mut self, reply: &mut [u8]) -> Result<(), Error> {
        self.poll_cts_open()?;

        for slot in reply.iter_mut() {
            *slot = self.spi.transfer_byte(FILLER).map_err(|_| Error::Bus)?;
        }

        self.spi.release().map_err(|_| Error::Bus)?;
        self.delay.delay_us(1);
        Ok(())
    }

    /// Writes the opcode and parameters in one chip-select session,
    /// honoring the minimum select hold time either side of the release
    /// edge.
    fn write_frame(&mut self, opcode: u8, params: &[u8]) -> Result<(), Error> {
        self.spi.select().map_err(|_| Error::Bus)?;
        self.spi.transfer_byte(opcode).map_err(|_| Error::Bus)?;
        for &byte in params {
            self.spi.transfer_byte(byte).map_err(|_| Error::Bus)?;
        }

        // Select hold time, min 50 ns either side of the edge.
        self.delay.delay_us(1);
        self.spi.release().map_err(|_| Error::Bus)?;
        self.delay.delay_us(1);
        Ok(())
    }

    /// Executes one raw command exchange against the chip.
    ///
    /// The command is only written once the chip signals ready, and the
    /// reply is only read once the chip signals ready for it. A
    /// readiness timeout in either phase aborts with
    /// [`Error::ReadinessTimeout`]; a timeout in the reply phase means
    /// the command has already been delivered and may have taken effect.
    /// On failure the contents of `reply` are unspecified.
    pub fn send_command(
        &mut self,
        opcode: u8,
        params: &[u8],
        reply: &mut [u8],
    ) -> Result<(), Error> {
        match self.handshake {
            Handshake::InlineCtsRead => {
                self.wait_for_ready()?;
                self.write_frame(opcode, params)?;
                self.wait_and_read(reply)
            }
            Handshake::SeparateCtsProbe => {
                self.wait_for_ready()?;
                self.write_frame(opcode, params)?;
                if reply.is_empty() {
                    Ok(())
                } else {
                    self.wait_and_read(reply)
                }
            }
        }
    }

    /// Executes a typed command on the device.
    ///
    /// # Type Parameters
    /// * `C` - Command type implementing the Command trait with u8 ID
    ///
    /// # Errors
    /// * [`Error::ReadinessTimeout`] - chip never reported ready
    /// * [`Error::Bus`] - SPI transport failed
    /// * [`Error::Deserialization`] - reply failed to parse
    pub fn execute_command<C>(&mut self, command: C) -> Result<C::ResponseParameters, Error>
    where
        C: Command<IdType = u8>,
        C::CommandParameters: ToByteArray<Error = Infallible>,
    {
        let request = command.invoking_parameters().to_bytes().unwrap();
        let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();

        self.send_command(C::id(), request.as_ref(), raw_response.as_mut())?;

        C::ResponseParameters::from_bytes(raw_response).map_err(|_| Error::Deserialization)
    }

    /// Writes raw property bytes at a group:offset address.
    ///
    /// This is the generic SET_PROPERTY path every typed setter funnels
    /// through; the payload is `{group, count, offset, values...}`.
    pub fn set_property(&mut self, group: u8, offset: u8, values: &[u8]) -> Result<(), Error> {
        debug_assert!(values.len() <= MAX_PROPERTY_COUNT);

        let mut params = [0u8; 3 + MAX_PROPERTY_COUNT];
        params[0] = group;
        params[1] = values.len() as u8;
        params[2] = offset;
        params[3..3 + values.len()].copy_from_slice(values);

        self.send_command(SET_PROPERTY, &params[..3 + values.len()], &mut [])
    }

    /// Writes a 16-bit property value, big-endian, at a group:offset
    /// address.
    pub fn set_property16(&mut self, group: u8, offset: u8, value: u16) -> Result<(), Error> {
        self.set_property(group, offset, &value.to_be_bytes())
    }

    /// Reads raw property bytes from a group:offset address.
    pub fn get_property(&mut self, group: u8, offset: u8, values: &mut [u8]) -> Result<(), Error> {
        let params = [group, values.len() as u8, offset];
        self.send_command(GET_PROPERTY, &params, values)
    }

    /// Writes a typed property.
    ///
    /// # Type Parameters
    /// * `P` - Property type implementing WritableRegister with u16 ID
    ///   (`group << 8 | offset`)
    pub fn write_property<P>(&mut self, property: P) -> Result<(), Error>
    where
        P: WritableRegister<IdType = u16, Error = Infallible>,
    {
        let address = P::id().to_be_bytes();
        let value = property.to_bytes().unwrap();
        self.set_property(address[0], address[1], value.as_ref())
    }

    /// Reads a typed property.
    ///
    /// # Type Parameters
    /// * `P` - Property type implementing ReadableRegister with u16 ID
    pub fn read_property<P>(&mut self) -> Result<P, Error>
    where
        P: ReadableRegister<IdType = u16>,
    {
        let address = P::id().to_be_bytes();
        let mut raw = P::Array::new();
        self.get_property(address[0], address[1], raw.as_mut())?;
        P::from_bytes(raw).map_err(|_| Error::Deserialization)
    }

    /// Loads bytes into the TX FIFO.
    ///
    /// FIFO data rides directly behind the opcode; there is no reply
    /// phase. Readiness is still confirmed first so the write cannot
    /// race a command the chip is processing.
    pub fn write_tx_fifo(&mut self, data: &[u8]) -> Result<(), Error> {
        self.wait_for_ready()?;
        self.write_frame(WRITE_TX_FIFO, data)
    }

    /// Drains bytes from the RX FIFO into `data`.
    ///
    /// The payload follows the opcode in the same chip-select session;
    /// the CTS reply protocol is not involved beyond the initial
    /// readiness check.
    pub fn read_rx_fifo(&mut self, data: &mut [u8]) -> Result<(), Error> {
        self.wait_for_ready()?;

        self.spi.select().map_err(|_| Error::Bus)?;
        self.spi.transfer_byte(READ_RX_FIFO).map_err(|_| Error::Bus)?;
        for slot in data.iter_mut() {
            *slot = self.spi.transfer_byte(FILLER).map_err(|_| Error::Bus)?;
        }

        self.delay.delay_us(1);
        self.spi.release().map_err(|_| Error::Bus)?;
        self.delay.delay_us(1);
        Ok(())
    }

    /// Boots the chip firmware, declaring the reference configured at
    /// construction.
    pub fn power_up(&mut self, boot_options: u8) -> Result<(), Error> {
        self.execute_command(PowerUp {
            config: PowerUpConfig {
                boot_options,
                tcxo: self.tcxo,
                xtal_freq: self.xtal_freq,
            },
        })?;
        Ok(())
    }

    /// Reads the part number and revision information.
    pub fn part_info(&mut self) -> Result<PartInfo, Error> {
        self.execute_command(GetPartInfo)
    }

    /// Reads the booted firmware revision and patch level.
    pub fn func_info(&mut self) -> Result<FuncInfo, Error> {
        self.execute_command(GetFuncInfo)
    }

    /// Routes internal signals to the GPIO, NIRQ and SDO pins, returning
    /// the configuration the chip actually applied.
    pub fn configure_gpio(&mut self, config: GpioConfig) -> Result<GpioConfig, Error> {
        self.execute_command(GpioPinCfg { config })
    }

    /// Tunes the synthesizer to `freq` Hz.
    ///
    /// Computes a [`FrequencyPlan`], selects the matching clock generator
    /// band and writes the PLL tuning words. The plan's output divider is
    /// retained for subsequent [`set_deviation`](Device::set_deviation)
    /// calls.
    pub fn set_frequency(&mut self, freq: u32) -> Result<(), Error> {
        let plan = FrequencyPlan::new(freq, self.xtal_freq);
        self.outdiv = plan.outdiv;

        self.write_property(ModemClkgenBand {
            band: plan.band,
            sy_sel: true,
        })?;
        self.write_property(FreqControl::from(plan))
    }

    /// Selects the modulation scheme and bit stream source.
    pub fn set_modulation(&mut self, config: ModemModType) -> Result<(), Error> {
        self.write_property(config)
    }

    /// Sets the raw 24-bit TX data rate value.
    pub fn set_data_rate(&mut self, rate: u32) -> Result<(), Error> {
        self.write_property(ModemDataRate { rate })
    }

    /// Configures the TX NCO for the given oversampling ratio, deriving
    /// the NCO frequency from the reference.
    pub fn set_nco_modulo(&mut self, osr: NcoModulo) -> Result<(), Error> {
        self.write_property(ModemTxNcoMode {
            txosr: osr,
            nco_freq: self.xtal_freq / osr.divisor(),
        })
    }

    /// Sets the peak frequency deviation in Hz.
    ///
    /// Converts to synthesizer units using the output divider selected by
    /// the last [`set_frequency`](Device::set_frequency) call:
    /// `units = 2^18 * outdiv * deviation / xtal`.
    pub fn set_deviation(&mut self, deviation_hz: u32) -> Result<(), Error> {
        let units = (1u64 << 18) * u64::from(self.outdiv) * u64::from(deviation_hz)
            / u64::from(self.xtal_freq);

        self.write_property(ModemFreqDev {
            deviation: units as u32,
        })
    }

    /// Sets the TX preamble length.
    pub fn set_preamble_length(&mut self, length: u8) -> Result<(), Error> {
        self.write_property(PreambleTxLength { length })
    }

    /// Configures the sync word framing.
    pub fn set_sync_config(&mut self, config: SyncConfig) -> Result<(), Error> {
        self.write_property(config)
    }

    /// Sets the raw PA output level (0x00-0x7F).
    pub fn set_power_level(&mut self, level: u8) -> Result<(), Error> {
        self.write_property(PaPwrLvl { level })
    }

    /// Configures RSSI averaging and latching.
    pub fn set_rssi_control(&mut self, control: ModemRssiControl) -> Result<(), Error> {
        self.write_property(control)
    }

    /// Starts transmitting from the TX FIFO.
    pub fn start_tx(&mut self, config: TxConfig) -> Result<(), Error> {
        self.execute_command(StartTx { config })?;
        Ok(())
    }

    /// Starts listening on the configured frequency.
    pub fn start_rx(&mut self, config: RxConfig) -> Result<(), Error> {
        self.execute_command(StartRx { config })?;
        Ok(())
    }

    /// Forces a state machine transition.
    pub fn change_state(&mut self, state: State) -> Result<(), Error> {
        self.execute_command(ChangeState { state })?;
        Ok(())
    }

    /// Reads back the current state and tuned channel.
    pub fn device_state(&mut self) -> Result<DeviceState, Error> {
        self.execute_command(RequestDeviceState)
    }

    /// Discards any bytes pending in the TX FIFO.
    pub fn flush_tx(&mut self) -> Result<FifoCounts, Error> {
        self.execute_command(FifoInfo {
            reset: FifoReset::TX,
        })
    }

    /// Discards any bytes pending in the RX FIFO.
    pub fn flush_rx(&mut self) -> Result<FifoCounts, Error> {
        self.execute_command(FifoInfo {
            reset: FifoReset::RX,
        })
    }

    /// Reads the FIFO fill levels without resetting anything.
    pub fn fifo_counts(&mut self) -> Result<FifoCounts, Error> {
        self.execute_command(FifoInfo {
            reset: FifoReset::empty(),
        })
    }

    /// Number of bytes waiting in the RX FIFO.
    pub fn rx_fifo_count(&mut self) -> Result<u8, Error> {
        Ok(self.fifo_counts()?.rx_count)
    }

    /// Reads all interrupt state, clearing every pending bit.
    pub fn clear_interrupts(&mut self) -> Result<IrqStatus, Error> {
        self.execute_command(GetIntStatus::default())
    }

    /// Reads all interrupt state, preserving the pending bits selected
    /// by `clear`.
    pub fn interrupt_status(&mut self, clear: InterruptClearControl) -> Result<IrqStatus, Error> {
        self.execute_command(GetIntStatus { clear })
    }

    /// Reads the packet handler interrupt state.
    pub fn ph_status(&mut self) -> Result<PhStatus, Error> {
        self.execute_command(GetPhStatus)
    }

    /// Reads modem interrupt state and signal quality measurements.
    pub fn modem_status(&mut self) -> Result<ModemStatus, Error> {
        self.execute_command(GetModemStatus)
    }

    /// Reads chip-level interrupt state and the last command error.
    pub fn chip_status(&mut self) -> Result<ChipStatus, Error> {
        self.execute_command(GetChipStatus)
    }

    /// Runs an ADC conversion on the selected inputs.
    pub fn adc_reading(&mut self, inputs: AdcInputs) -> Result<AdcReadings, Error> {
        self.execute_command(GetAdcReading { inputs })
    }

    /// Reads the die temperature in tenths of a degree Celsius.
    pub fn temperature(&mut self) -> Result<i16, Error> {
        Ok(self
            .adc_reading(AdcInputs::TEMPERATURE)?
            .temperature_decicelsius())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Select,
        Byte(u8),
        Release,
    }

    /// Scripted transport: records every bus operation and answers each
    /// transfer with the next scripted byte, falling back to a default.
    struct ScriptedTransport {
        responses: VecDeque<u8>,
        default_response: u8,
        ops: Vec<Op>,
        selected: bool,
    }

    impl ScriptedTransport {
        fn new(responses: &[u8], default_response: u8) -> Self {
            Self {
                responses: responses.iter().copied().collect(),
                default_response,
                ops: Vec::new(),
                selected: false,
            }
        }

        /// Chip that answers every probe with ready and every read with
        /// the default byte.
        fn always_ready() -> Self {
            Self::new(&[], 0xFF)
        }

        /// Chip that never asserts CTS.
        fn never_ready() -> Self {
            Self::new(&[], 0x00)
        }
    }

    impl Transport for ScriptedTransport {
        type Error = Infallible;

        fn select(&mut self) -> Result<(), Self::Error> {
            assert!(!self.selected, "nested chip-select session");
            self.selected = true;
            self.ops.push(Op::Select);
            Ok(())
        }

        fn release(&mut self) -> Result<(), Self::Error> {
            assert!(self.selected, "release without select");
            self.selected = false;
            self.ops.push(Op::Release);
            Ok(())
        }

        fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
            assert!(self.selected, "transfer outside chip-select session");
            self.ops.push(Op::Byte(byte));
            Ok(self.responses.pop_front().unwrap_or(self.default_response))
        }
    }

    fn device(transport: ScriptedTransport) -> Device<ScriptedTransport, NoopDelay> {
        Device::new(transport, NoopDelay::new(), 30_000_000, false)
    }

    /// Splits the recorded operations into chip-select sessions, each
    /// the sequence of bytes written while selected.
    fn sessions(ops: &[Op]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut current: Option<Vec<u8>> = None;

        for op in ops {
            match op {
                Op::Select => {
                    assert!(current.is_none());
                    current = Some(Vec::new());
                }
                Op::Byte(byte) => current.as_mut().expect("byte outside session").push(*byte),
                Op::Release => out.push(current.take().expect("release outside session")),
            }
        }

        assert!(current.is_none(), "unreleased chip-select session");
        out
    }

    /// Sessions that carry a command frame rather than a CTS probe.
    fn command_sessions(ops: &[Op]) -> Vec<Vec<u8>> {
        sessions(ops)
            .into_iter()
            .filter(|s| s.first() != Some(&READ_CMD_BUFF))
            .collect()
    }

    #[test]
    fn timeout_issues_exactly_the_polling_budget() {
        let mut radio = device(ScriptedTransport::never_ready());

        assert_eq!(
            radio.send_command(0x01, &[], &mut []),
            Err(Error::ReadinessTimeout)
        );

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        assert_eq!(all.len(), 10);
        for probe in &all {
            assert_eq!(probe.as_slice(), [READ_CMD_BUFF, FILLER]);
        }
        // No command byte ever hit the wire.
        assert!(command_sessions(&transport.ops).is_empty());
    }

    #[test]
    fn shrunk_budget_is_honored() {
        let mut radio = device(ScriptedTransport::never_ready()).with_poll_config(PollConfig {
            max_polls: 3,
            interval_ms: 0,
        });

        assert_eq!(radio.wait_for_ready(), Err(Error::ReadinessTimeout));

        let (transport, _) = radio.release();
        assert_eq!(sessions(&transport.ops).len(), 3);
    }

    #[test]
    fn command_frame_is_a_single_session() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio.send_command(0x31, &[0x00, 0x30, 0x00, 0x10], &mut []).unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(frames.len(), 1);
        // Exactly 1 + len(params) bytes in one select/release pair.
        assert_eq!(frames[0].as_slice(), [0x31, 0x00, 0x30, 0x00, 0x10]);
    }

    #[test]
    fn busy_probes_are_retried_until_ready() {
        // Two busy probes, then ready, then the frame, then reply-ready.
        let mut radio = device(ScriptedTransport::new(
            &[0x00, 0x00, 0x00, 0x00, 0x00, 0xFF],
            0xFF,
        ));

        radio.send_command(0x34, &[0x03], &mut []).unwrap();

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        // probe(busy), probe(busy), probe(ready), frame, reply probe
        assert_eq!(all.len(), 5);
        assert_eq!(all[3].as_slice(), [0x34, 0x03]);
    }

    #[test]
    fn reply_is_read_in_the_probing_session() {
        let part_info: [u8; 8] = [0x02, 0x44, 0x63, 0x00, 0x0F, 0x00, 0x00, 0x03];
        let mut responses = vec![0x00, 0xFF]; // pre-command probe
        responses.push(0x00); // frame byte
        responses.extend([0x00, 0xFF]); // reply probe
        responses.extend(part_info); // reply payload
        let mut radio = device(ScriptedTransport::new(&responses, 0x00));

        let mut reply = [0u8; 8];
        radio.send_command(0x01, &[], &mut reply).unwrap();
        assert_eq!(reply, part_info);

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        assert_eq!(all.len(), 3);
        // The reply session holds the probe and eight filler bytes with
        // no chip-select toggle in between.
        assert_eq!(all[2].len(), 2 + 8);
        assert_eq!(&all[2][..2], [READ_CMD_BUFF, FILLER]);
    }

    #[test]
    fn reply_timeout_still_delivers_the_command() {
        // Ready for the command, never ready for the reply.
        let mut radio = device(ScriptedTransport::new(&[0x00, 0xFF, 0x00], 0x00));

        let mut reply = [0u8; 2];
        assert_eq!(
            radio.send_command(0x33, &[], &mut reply),
            Err(Error::ReadinessTimeout)
        );

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        // The opcode hit the wire even though the exchange failed.
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_slice(), [0x33]);
    }

    #[test]
    fn separate_probe_style_skips_the_reply_wait_without_a_reply() {
        let mut radio =
            device(ScriptedTransport::always_ready()).with_handshake(Handshake::SeparateCtsProbe);

        radio.send_command(0x34, &[0x03], &mut []).unwrap();

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        // Pre-command probe and the frame; no trailing probe session.
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].as_slice(), [0x34, 0x03]);
    }

    #[test]
    fn separate_probe_style_still_fetches_replies() {
        let mut radio =
            device(ScriptedTransport::always_ready()).with_handshake(Handshake::SeparateCtsProbe);

        let mut reply = [0u8; 2];
        radio.send_command(0x15, &[0x00], &mut reply).unwrap();

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        // probe, frame, wait-and-read
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].len(), 2 + 2);
    }

    #[test]
    fn property_writes_are_idempotent_on_the_wire() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio.set_property(0x20, 0x51, &[0x0A]).unwrap();
        radio.set_property(0x20, 0x51, &[0x0A]).unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
        assert_eq!(frames[0].as_slice(), [SET_PROPERTY, 0x20, 0x01, 0x51, 0x0A]);
    }

    #[test]
    fn sixteen_bit_property_helper_is_big_endian() {
        let mut radio = device(ScriptedTransport::always_ready());

        // Channel step size: two value bytes starting at 0x40:0x04.
        radio.set_property16(0x40, 0x04, 0x0002).unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(
            frames[0].as_slice(),
            [SET_PROPERTY, 0x40, 0x02, 0x04, 0x00, 0x02]
        );
    }

    #[test]
    fn set_frequency_writes_band_then_tuning_words() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio.set_frequency(433_920_000).unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(frames.len(), 2);
        // CLKGEN band 2 with the high performance divider chain.
        assert_eq!(frames[0].as_slice(), [SET_PROPERTY, 0x20, 0x01, 0x51, 0x0A]);
        // FREQ_CONTROL INTE + 20-bit FRAC for 433.92 MHz at 30 MHz xtal.
        assert_eq!(
            frames[1].as_slice(),
            [SET_PROPERTY, 0x40, 0x04, 0x00, 0x38, 0x0E, 0xD9, 0x17]
        );
    }

    #[test]
    fn deviation_uses_the_divider_from_the_last_plan() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio.set_frequency(433_920_000).unwrap(); // outdiv 8
        radio.set_deviation(10_000).unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        // 2^18 * 8 * 10000 / 30e6 = 699.05 -> 699
        assert_eq!(
            frames[2].as_slice(),
            [SET_PROPERTY, 0x20, 0x03, 0x0A, 0x00, 0x02, 0xBB]
        );
    }

    #[test]
    fn part_info_reads_eight_reply_bytes() {
        let mut responses = vec![0x00, 0xFF, 0x00, 0x00, 0xFF];
        responses.extend([0x02, 0x44, 0x63, 0x00, 0x0F, 0x00, 0x00, 0x03]);
        let mut radio = device(ScriptedTransport::new(&responses, 0x00));

        let info = radio.part_info().unwrap();
        assert_eq!(info.part_id(), 0x4463);
        assert_eq!(info.revision(), 0x02);

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        // PART_INFO carries no parameters.
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_slice(), [0x01]);
    }

    #[test]
    fn power_up_declares_the_reference() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio.power_up(0x01).unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(
            frames[0].as_slice(),
            [0x02, 0x01, 0x00, 0x01, 0xC9, 0xC3, 0x80]
        );
    }

    #[test]
    fn temperature_conversion_end_to_end() {
        let mut responses = vec![0x00, 0xFF]; // pre-command probe
        responses.extend([0x00, 0x00]); // frame: opcode + ADC_EN
        responses.extend([0x00, 0xFF]); // reply probe
        responses.extend([0x00, 0x00, 0x00, 0x00, 0x06, 0x40]);
        let mut radio = device(ScriptedTransport::new(&responses, 0x00));

        assert_eq!(radio.temperature().unwrap(), 580);

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(frames[0].as_slice(), [0x14, 0x10]);
    }

    #[test]
    fn rx_fifo_read_streams_data_behind_the_opcode() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut responses = vec![0x00, 0xFF]; // readiness check
        responses.push(0x00); // opcode transfer
        responses.extend(payload);
        let mut radio = device(ScriptedTransport::new(&responses, 0x00));

        let mut data = [0u8; 4];
        radio.read_rx_fifo(&mut data).unwrap();
        assert_eq!(data, payload);

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        // Readiness probe, then one session: opcode + four filler bytes.
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].len(), 1 + 4);
        assert_eq!(all[1][0], READ_RX_FIFO);
    }

    #[test]
    fn tx_fifo_write_has_no_reply_phase() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio.write_tx_fifo(&[0x11, 0x22, 0x33]).unwrap();

        let (transport, _) = radio.release();
        let all = sessions(&transport.ops);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].as_slice(), [WRITE_TX_FIFO, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn typed_property_write_frames_the_address() {
        let mut radio = device(ScriptedTransport::always_ready());

        radio
            .write_property(PaPwrLvl { level: 0x7F })
            .unwrap();

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(frames[0].as_slice(), [SET_PROPERTY, 0x22, 0x01, 0x01, 0x7F]);
    }

    #[test]
    fn typed_property_read_requests_the_full_width() {
        let mut responses = vec![0x00, 0xFF]; // pre-command probe
        responses.extend([0x00, 0x00, 0x00, 0x00]); // frame: opcode + 3 params
        responses.extend([0x00, 0xFF]); // reply probe
        responses.extend([0x38, 0x0E, 0xD9, 0x17]); // FREQ_CONTROL bytes
        let mut radio = device(ScriptedTransport::new(&responses, 0x00));

        let control: FreqControl = radio.read_property().unwrap();
        assert_eq!(control.inte, 0x38);
        assert_eq!(control.frac, 0xED917);

        let (transport, _) = radio.release();
        let frames = command_sessions(&transport.ops);
        assert_eq!(frames[0].as_slice(), [GET_PROPERTY, 0x40, 0x04, 0x00]);
    }
}
