#![no_std]

#[cfg(test)]
extern crate std;

use embedded_hal::digital::v2 as hal_digital;
use pov::{LedBus, TierSet, HEIGHT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Error while setting one of the data lines
    DataError,
    /// Error while pulsing the shift clock
    ClockError,
    /// Error while pulsing the latch
    LatchError,
}

/// Driver for the blade's shift register chain.
///
/// Each tier has its own data line into a chain of shift registers, all
/// chains share one shift clock and one latch.  Data line `i` carries tier
/// `i`, active high.
pub struct BladeBus<D, CLK, LAT> {
    data_pins: [D; HEIGHT],
    clock_pin: CLK,
    latch_pin: LAT,
}

impl<D, CLK, LAT> BladeBus<D, CLK, LAT>
where
    D: hal_digital::OutputPin,
    CLK: hal_digital::OutputPin,
    LAT: hal_digital::OutputPin,
{
    pub fn new(data_pins: [D; HEIGHT], clock_pin: CLK, latch_pin: LAT) -> Self {
        Self {
            data_pins,
            clock_pin,
            latch_pin,
        }
    }

    /// Pull all control lines low.
    pub fn reset(&mut self) -> Result<(), BusError> {
        self.clock_pin
            .set_low()
            .map_err(|_| BusError::ClockError)?;
        self.latch_pin
            .set_low()
            .map_err(|_| BusError::LatchError)?;
        self.set_data(TierSet::EMPTY)
    }

    /// Shift a dark cell through the whole chain and latch it.
    pub fn blank(&mut self, cells: usize) -> Result<(), BusError> {
        for _ in 0..cells {
            self.shift(TierSet::EMPTY)?;
        }
        self.latch()
    }

    fn set_data(&mut self, cell: TierSet) -> Result<(), BusError> {
        for (tier, pin) in self.data_pins.iter_mut().enumerate() {
            if cell.contains(tier) {
                pin.set_high().map_err(|_| BusError::DataError)?;
            } else {
                pin.set_low().map_err(|_| BusError::DataError)?;
            }
        }
        Ok(())
    }
}

impl<D, CLK, LAT> LedBus for BladeBus<D, CLK, LAT>
where
    D: hal_digital::OutputPin,
    CLK: hal_digital::OutputPin,
    LAT: hal_digital::OutputPin,
{
    type Error = BusError;

    fn shift(&mut self, cell: TierSet) -> Result<(), BusError> {
        self.set_data(cell)?;
        self.clock_pin
            .set_high()
            .map_err(|_| BusError::ClockError)?;
        self.clock_pin
            .set_low()
            .map_err(|_| BusError::ClockError)
    }

    fn latch(&mut self) -> Result<(), BusError> {
        self.latch_pin
            .set_high()
            .map_err(|_| BusError::LatchError)?;
        self.latch_pin
            .set_low()
            .map_err(|_| BusError::LatchError)
    }
}
