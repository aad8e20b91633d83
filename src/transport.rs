//! SPI transport capability
//!
//! The Si4x6x exposes a half-duplex command protocol over a full-duplex
//! SPI bus. The transaction engine in [`device`](crate::device) does not
//! talk to `embedded-hal` directly; it consumes the small [`Transport`]
//! capability below, which models exactly what the chip protocol needs:
//! a chip-select session and full-duplex single-byte transfers within it.
//!
//! Keeping the capability this narrow lets the CTS handshake branch in
//! the middle of a chip-select session (the probe byte decides whether
//! reply bytes follow), which the `SpiDevice` operation-list API cannot
//! express, and makes the engine trivially testable against a scripted
//! transport.
//!
//! [`SpiTransport`] adapts any `embedded-hal` [`SpiBus`] plus chip-select
//! [`OutputPin`] pair into a [`Transport`].

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Bus transport capability consumed by the transaction engine.
///
/// One `select`/`release` pair brackets one chip-select session; every
/// [`transfer_byte`](Transport::transfer_byte) in between belongs to that
/// session. The engine is the only caller and never nests sessions.
pub trait Transport {
    /// Transport failure type. Collapsed to [`Error::Bus`](crate::Error::Bus)
    /// at the engine boundary.
    type Error;

    /// Assert chip-select and begin a bus session.
    fn select(&mut self) -> Result<(), Self::Error>;

    /// Deassert chip-select and end the current bus session.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Clock one byte out while sampling the byte clocked back in.
    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error>;
}

/// [`Transport`] implementation over an `embedded-hal` SPI bus and a
/// dedicated chip-select pin.
///
/// The bus must be exclusively owned: the Si4x6x CTS handshake requires
/// chip-select to stay asserted across a readiness probe and the reply
/// read that follows it, so a shared-bus `SpiDevice` cannot be used here.
pub struct SpiTransport<BUS, CS> {
    bus: BUS,
    cs: CS,
}

impl<BUS, CS> SpiTransport<BUS, CS> {
    /// Creates a new transport from a bus and chip-select pin.
    ///
    /// The pin is expected to start deasserted (high); the transport only
    /// drives it around sessions.
    pub fn new(bus: BUS, cs: CS) -> Self {
        Self { bus, cs }
    }

    /// Consumes the transport and returns the underlying bus and
    /// chip-select pin.
    pub fn into_parts(self) -> (BUS, CS) {
        (self.bus, self.cs)
    }
}

/// Error type for [`SpiTransport`] sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiTransportError {
    /// The chip-select pin could not be driven.
    ChipSelect,
    /// The SPI bus transfer failed.
    Transfer,
}

impl<BUS, CS> Transport for SpiTransport<BUS, CS>
where
    BUS: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = SpiTransportError;

    fn select(&mut self) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(|_| SpiTransportError::ChipSelect)
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        // Flush before raising chip-select so the final byte is fully
        // clocked out while the chip is still selected.
        self.bus.flush().map_err(|_| SpiTransportError::Transfer)?;
        self.cs.set_high().map_err(|_| SpiTransportError::ChipSelect)
    }

    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let mut read = [0u8; 1];
        self.bus
            .transfer(&mut read, &[byte])
            .map_err(|_| SpiTransportError::Transfer)?;
        Ok(read[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn session_drives_chip_select_around_transfers() {
        let spi = SpiMock::new(&[
            SpiTransaction::transfer(vec![0x44], vec![0x00]),
            SpiTransaction::transfer(vec![0xFF], vec![0xFF]),
            SpiTransaction::flush(),
        ]);
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut transport = SpiTransport::new(spi, cs);

        transport.select().unwrap();
        assert_eq!(transport.transfer_byte(0x44).unwrap(), 0x00);
        assert_eq!(transport.transfer_byte(0xFF).unwrap(), 0xFF);
        transport.release().unwrap();

        let (mut spi, mut cs) = transport.into_parts();
        spi.done();
        cs.done();
    }

    #[test]
    fn transfer_samples_the_returned_byte() {
        let spi = SpiMock::new(&[SpiTransaction::transfer(vec![0xAB], vec![0x5A])]);
        let cs = PinMock::new(&[]);

        let mut transport = SpiTransport::new(spi, cs);
        assert_eq!(transport.transfer_byte(0xAB).unwrap(), 0x5A);

        let (mut spi, mut cs) = transport.into_parts();
        spi.done();
        cs.done();
    }
}
