//! # DYP-R01CW / DFRobot SEN0590 Laser Ranging Sensor Driver
//!
//! This crate provides a `no_std` driver for the DYP-R01CW (sold by DFRobot as
//! SEN0590) I2C laser ranging sensor. The sensor measures distances of up to
//! several meters and reports them in millimeters through a small fixed
//! register map.
//!
//! The driver works with any [`embedded-hal`](embedded_hal) I2C and delay
//! implementation. Enable the `async` feature to get an `embedded-hal-async`
//! based interface with the same API surface.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use dyp_r01cw::DypR01cw;
//!
//! let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let delay = embedded_hal_mock::eh1::delay::NoopDelay;
//! let mut sensor = DypR01cw::new(i2c, delay);
//!
//! sensor.init().unwrap();
//!
//! let distance = sensor.read_distance().unwrap();
//! println!("Distance: {} mm", distance);
//! ```
//!
//! ## Sharing the bus
//!
//! The driver takes the I2C implementation by value. To keep using the bus for
//! other peripherals, hand the driver a `&mut` reference instead; `embedded-hal`
//! implements its traits for mutable references.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod fmt; // <-- must be first module!

#[cfg(not(feature = "async"))]
use embedded_hal::{delay::DelayNs, i2c::I2c};
#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

/// Factory default device address, in the vendor's 8-bit notation.
///
/// The vendor documents addresses with the read/write bit included; the
/// driver converts to the 7-bit form used on the bus (0xE8 becomes 0x74).
pub const DEFAULT_ADDRESS_8BIT: u8 = 0xE8;

/// Command byte that triggers a single ranging cycle.
pub const CMD_MEASURE: u8 = 0xB0;

/// Command sequence that reboots the sensor.
///
/// Both bytes are written to [`Register::Command`] back-to-back in a single
/// transaction.
pub const CMD_RESTART: [u8; 2] = [0x5A, 0xA5];

/// Raw distance value echoed by the sensor when no valid target was found.
pub const OUT_OF_RANGE: u16 = 0xFFFF;

/// Settling delay between the measure command and the data read, in
/// milliseconds.
///
/// The sensor needs this long to complete its internal ranging cycle before
/// the data register holds a valid result. The value is empirical; the vendor
/// does not document it.
pub const MEASUREMENT_DELAY_MS: u32 = 50;

/// Recommended wait after [`restart`](DypR01cw::restart) before resuming
/// communication, in milliseconds.
///
/// The driver does not wait itself; callers impose this delay. Observed
/// empirically, like the measurement delay.
pub const RESTART_DELAY_MS: u32 = 500;

// Programmable address window, in 8-bit notation. The device accepts even
// addresses in 0xD0..=0xFE and reserves 0xF0..=0xF6 for itself.
const ADDRESS_MIN: u8 = 0xD0;
const ADDRESS_MAX: u8 = 0xFE;
const RESERVED_MIN: u8 = 0xF0;
const RESERVED_MAX: u8 = 0xF6;

fn is_valid_address(address: u8) -> bool {
    address % 2 == 0
        && (ADDRESS_MIN..=ADDRESS_MAX).contains(&address)
        && !(RESERVED_MIN..=RESERVED_MAX).contains(&address)
}

/// Register addresses for the DYP-R01CW sensor.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Software version register (0x00), 2 bytes big-endian, read-only
    Version = 0x00,
    /// Measurement data register (0x02), 2 bytes big-endian, read-only
    Data = 0x02,
    /// Slave address register (0x05), takes one 8-bit address byte
    SlaveAddress = 0x05,
    /// Command register (0x10), write target for action bytes
    Command = 0x10,
}

impl From<Register> for u8 {
    fn from(r: Register) -> Self {
        r as u8
    }
}

/// DYP-R01CW laser ranging sensor driver.
///
/// This struct wraps the sensor's register protocol: triggering a measurement,
/// waiting out the settling delay, reading the 16-bit distance, changing the
/// device address, and restarting the sensor.
///
/// The driver is generic over the I2C and delay implementations, allowing it
/// to work with any embedded-hal compatible hardware. It assumes exclusive,
/// serialized access to the bus handle it is given; it performs no locking
/// and no retries of its own.
pub struct DypR01cw<I2C, D> {
    /// I2C interface for communication with the sensor
    i2c: I2C,
    /// Current 7-bit I2C address of the sensor
    address: u8,
    /// Signed correction added to every distance reading, in millimeters
    distance_offset: i16,
    /// Delay implementation for the measurement settling wait
    delay: D,
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self),
    async(feature = "async", keep_self)
)]
impl<I2C, E, D> DypR01cw<I2C, D>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
    D: DelayNs,
{
    /// Creates a new driver instance using the factory default address.
    ///
    /// The sensor is probed lazily; call [`init`](Self::init) before the first
    /// measurement to verify it is present and responding.
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C interface implementation for sensor communication
    /// * `delay` - Delay implementation for the measurement settling wait
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    ///
    /// let mut sensor = DypR01cw::new(i2c, delay);
    /// ```
    #[must_use]
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::new_with_address(i2c, delay, DEFAULT_ADDRESS_8BIT)
    }

    /// Creates a new driver instance for a sensor at a non-default address.
    ///
    /// The address is given in the vendor's 8-bit notation, as printed in the
    /// device documentation and as accepted by [`set_address`](Self::set_address).
    /// It is stored in 7-bit form internally.
    ///
    /// # Arguments
    ///
    /// * `i2c` - I2C interface implementation for sensor communication
    /// * `delay` - Delay implementation for the measurement settling wait
    /// * `address_8bit` - Device address in 8-bit notation (e.g. 0xE8)
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    ///
    /// // Sensor previously moved to 0xD4
    /// let mut sensor = DypR01cw::new_with_address(i2c, delay, 0xD4);
    /// ```
    #[must_use]
    pub fn new_with_address(i2c: I2C, delay: D, address_8bit: u8) -> Self {
        Self {
            i2c,
            address: address_8bit >> 1,
            distance_offset: 0,
            delay,
        }
    }

    /// Probes the sensor and verifies that it responds.
    ///
    /// Reads the software version register as a liveness check. The sensor is
    /// considered present when the version reads as a non-zero 16-bit value.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The sensor answered with a non-zero version
    ///
    /// # Errors
    ///
    /// * `Err(Error::NotDetected)` - The version register read as exactly 0
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let mut sensor = DypR01cw::new(i2c, delay);
    ///
    /// sensor.init().unwrap();
    /// ```
    pub async fn init(&mut self) -> Result<(), Error<E>> {
        info!("Probing sensor");
        let version = self.read_word(Register::Version).await?;
        if version == 0 {
            error!("Sensor not detected");
            return Err(Error::NotDetected);
        }
        info!("Sensor software version: {}", version);
        Ok(())
    }

    /// Performs a single distance measurement.
    ///
    /// Writes the measure command, blocks for [`MEASUREMENT_DELAY_MS`] while
    /// the sensor completes its ranging cycle, then reads the 16-bit result
    /// from the data register. The configured distance offset is added to the
    /// raw value; the addition wraps on overflow.
    ///
    /// # Returns
    ///
    /// * `Ok(i16)` - Measured distance in millimeters, offset applied
    ///
    /// # Errors
    ///
    /// * `Err(Error::OutOfRange)` - The sensor found no valid target
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let mut sensor = DypR01cw::new(i2c, delay);
    ///
    /// sensor.init().unwrap();
    /// let distance = sensor.read_distance().unwrap();
    /// println!("Distance: {} mm", distance);
    /// ```
    pub async fn read_distance(&mut self) -> Result<i16, Error<E>> {
        self.write_byte(Register::Command, CMD_MEASURE).await?;
        self.delay.delay_ms(MEASUREMENT_DELAY_MS).await;
        let raw = self.read_word(Register::Data).await?;
        if raw == OUT_OF_RANGE {
            return Err(Error::OutOfRange);
        }
        #[allow(clippy::cast_possible_wrap)]
        let distance = (raw as i16).wrapping_add(self.distance_offset);
        Ok(distance)
    }

    /// Checks whether a device acknowledges on the configured address.
    ///
    /// Issues an address-only transaction with no payload. The result depends
    /// purely on the bus acknowledgement, not on any register content, so this
    /// also returns `true` for a different device sitting on the same address.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let mut sensor = DypR01cw::new(i2c, delay);
    ///
    /// if sensor.is_connected() {
    ///     println!("Sensor answered");
    /// }
    /// ```
    pub async fn is_connected(&mut self) -> bool {
        self.i2c.write(self.address, &[]).await.is_ok()
    }

    /// Reads the sensor's software version.
    ///
    /// # Returns
    ///
    /// * `Ok(u16)` - The 16-bit version value, high byte first on the wire
    ///
    /// # Errors
    ///
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let mut sensor = DypR01cw::new(i2c, delay);
    ///
    /// let version = sensor.read_software_version().unwrap();
    /// println!("Version: {:#06x}", version);
    /// ```
    pub async fn read_software_version(&mut self) -> Result<u16, Error<E>> {
        self.read_word(Register::Version).await
    }

    /// Moves the sensor to a new I2C address.
    ///
    /// The candidate is given in the vendor's 8-bit notation and is validated
    /// locally before any bus traffic: it must be even, within 0xD0..=0xFE,
    /// and outside the reserved range 0xF0..=0xF6 (20 valid values in total).
    /// The sensor stores the address in non-volatile memory, so it survives
    /// power cycles.
    ///
    /// On success the driver switches to the new address as well, so
    /// subsequent operations reach the sensor without a new driver instance.
    /// On failure the driver keeps using the previous address.
    ///
    /// # Arguments
    ///
    /// * `address_8bit` - New device address in 8-bit notation
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The address was written and the driver updated
    ///
    /// # Errors
    ///
    /// * `Err(Error::InvalidAddress)` - The candidate is outside the supported
    ///   set; nothing was sent on the bus
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::DypR01cw;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let delay = embedded_hal_mock::eh1::delay::NoopDelay;
    /// let mut sensor = DypR01cw::new(i2c, delay);
    ///
    /// // Move the sensor from the default 0xE8 to 0xD4
    /// sensor.set_address(0xD4).unwrap();
    /// ```
    pub async fn set_address(&mut self, address_8bit: u8) -> Result<(), Error<E>> {
        if !is_valid_address(address_8bit) {
            error!("Invalid I2C address: {}", address_8bit);
            return Err(Error::InvalidAddress);
        }
        self.write_byte(Register::SlaveAddress, address_8bit).await?;
        self.address = address_8bit >> 1;
        Ok(())
    }

    /// Returns the current device address in 7-bit form.
    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Sets the signed correction added to every distance reading.
    ///
    /// Purely an in-memory setting; nothing is sent to the sensor. Use this to
    /// compensate for a mounting offset, e.g. a sensor recessed behind a front
    /// panel.
    ///
    /// # Arguments
    ///
    /// * `offset` - Correction in millimeters, may be negative
    pub fn set_distance_offset(&mut self, offset: i16) {
        self.distance_offset = offset;
    }

    /// Returns the currently configured distance offset in millimeters.
    #[must_use]
    pub fn distance_offset(&self) -> i16 {
        self.distance_offset
    }

    /// Restarts the sensor.
    ///
    /// Writes the two-byte restart sequence to the command register in a
    /// single transaction. The sensor drops off the bus while it reboots;
    /// wait [`RESTART_DELAY_MS`] before the next operation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The restart command was acknowledged
    ///
    /// # Errors
    ///
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dyp_r01cw::{DypR01cw, RESTART_DELAY_MS};
    /// use embedded_hal::delay::DelayNs;
    /// use embedded_hal_mock::eh1::delay::NoopDelay;
    ///
    /// let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
    /// let mut sensor = DypR01cw::new(i2c, NoopDelay);
    ///
    /// sensor.restart().unwrap();
    /// NoopDelay.delay_ms(RESTART_DELAY_MS);
    /// sensor.init().unwrap();
    /// ```
    pub async fn restart(&mut self) -> Result<(), Error<E>> {
        let buffer = [Register::Command.into(), CMD_RESTART[0], CMD_RESTART[1]];
        self.i2c.write(self.address, &buffer).await?;
        Ok(())
    }

    /// Writes a single byte to a sensor register.
    ///
    /// This is a low-level function; most applications should use the
    /// higher-level operations instead.
    ///
    /// # Arguments
    ///
    /// * `register` - The register address to write to (implements `Into<u8>`)
    /// * `value` - The byte to write
    ///
    /// # Errors
    ///
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    pub async fn write_byte<R>(&mut self, register: R, value: u8) -> Result<(), Error<E>>
    where
        R: Into<u8>,
    {
        let buffer = [register.into(), value];
        self.i2c.write(self.address, &buffer).await?;
        Ok(())
    }

    /// Reads a big-endian 16-bit word from a sensor register.
    ///
    /// Selects the register and reads two bytes in a combined transaction.
    /// This is a low-level function; most applications should use the
    /// higher-level operations instead.
    ///
    /// # Arguments
    ///
    /// * `register` - The register address to read from (implements `Into<u8>`)
    ///
    /// # Errors
    ///
    /// * `Err(Error::I2cError(E))` - If there was an I2C communication error
    pub async fn read_word<R>(&mut self, register: R) -> Result<u16, Error<E>>
    where
        R: Into<u8>,
    {
        let write_buffer = [register.into()];
        let mut read_buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &write_buffer, &mut read_buffer)
            .await?;
        Ok(u16::from_be_bytes(read_buffer))
    }
}

/// Error type for DYP-R01CW sensor operations.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: core::fmt::Debug> {
    /// I2C communication error from the underlying hardware
    I2cError(E),
    /// The liveness probe read a version of 0; no sensor is answering
    NotDetected,
    /// The sensor found no valid target within its measuring range
    OutOfRange,
    /// Address candidate outside the supported set
    InvalidAddress,
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl<E: core::fmt::Debug> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::I2cError(error)
    }
}
