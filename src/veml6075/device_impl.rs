use embedded_hal::i2c::{ErrorType, I2c, SevenBitAddress};
use crate::veml6075::{
    Coefficients, Error, InitSettings, IntegrationTime, RawSample, UvReading, Veml6075,
    DEFAULT_ADDRESS, DEVICE_ID,
};

struct Register;
impl Register {
    const CONFIG: u8 = 0x00;
    const UVA_DATA: u8 = 0x07;
    const DARK_DATA: u8 = 0x08;
    const UVB_DATA: u8 = 0x09;
    const UVCOMP1_DATA: u8 = 0x0A;
    const UVCOMP2_DATA: u8 = 0x0B;
    const ID: u8 = 0x0C;
}

/// Content of the UV_CONF register.
///
/// Bit 7 is SD, bit 6 UV_AF, bit 5 UV_TRIG, bit 4 UV_HD and bits 0..=2 UV_IT.
/// Bit 3 and the high byte always stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    bits: u16,
}

impl Config {
    const SHUTDOWN: u16 = 1 << 7;
    const FORCED: u16 = 1 << 6;
    const TRIGGER: u16 = 1 << 5;
    const HIGH_DYNAMIC: u16 = 1 << 4;
    const INTEGRATION_TIME: u16 = 0b111;

    pub fn new() -> Self {
        Config { bits: 0x0000 }
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    fn with_high(self, mask: u16) -> Self {
        Config {
            bits: self.bits | mask,
        }
    }

    fn with_low(self, mask: u16) -> Self {
        Config {
            bits: self.bits & !mask,
        }
    }

    fn with_flag(self, mask: u16, set: bool) -> Self {
        if set {
            self.with_high(mask)
        } else {
            self.with_low(mask)
        }
    }

    pub fn with_shutdown(self, shutdown: bool) -> Self {
        self.with_flag(Self::SHUTDOWN, shutdown)
    }

    pub fn with_forced(self, forced: bool) -> Self {
        self.with_flag(Self::FORCED, forced)
    }

    pub fn with_trigger(self, trigger: bool) -> Self {
        self.with_flag(Self::TRIGGER, trigger)
    }

    pub fn with_high_dynamic(self, high_dynamic: bool) -> Self {
        self.with_flag(Self::HIGH_DYNAMIC, high_dynamic)
    }

    pub fn with_integration_time(self, it: IntegrationTime) -> Self {
        self.with_low(Self::INTEGRATION_TIME)
            .with_high(u16::from(it.code()))
    }

    pub fn shutdown(&self) -> bool {
        self.bits & Self::SHUTDOWN != 0
    }

    pub fn forced(&self) -> bool {
        self.bits & Self::FORCED != 0
    }

    pub fn trigger(&self) -> bool {
        self.bits & Self::TRIGGER != 0
    }

    pub fn high_dynamic(&self) -> bool {
        self.bits & Self::HIGH_DYNAMIC != 0
    }

    pub fn integration_time(&self) -> IntegrationTime {
        // only codes 0..=4 are ever packed
        IntegrationTime::try_from((self.bits & Self::INTEGRATION_TIME) as u8).unwrap_or_default()
    }
}

impl<I2C> Veml6075<I2C>
where
    I2C: I2c<SevenBitAddress>,
    I2C::Error: Into<Error<I2C::Error>>,
{
    pub fn new(i2c: I2C) -> Self {
        Veml6075 {
            i2c,
            address: DEFAULT_ADDRESS,
            config: Config::new(),
            coefficients: Coefficients::default(),
            read_delay_ms: IntegrationTime::_50ms.as_ms(),
            last_reading: None,
        }
    }

    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Select the device address, verify the manufacturer ID and apply `settings`.
    ///
    /// Returns `Ok(false)` when something other than a VEML6075 answered. In that
    /// case the configuration register is left untouched.
    pub fn begin(&mut self, address: u8, settings: InitSettings) -> Result<bool, Error<I2C::Error>> {
        if address > 0x7F {
            return Err(Error::InvalidAddress(address));
        }
        self.address = address;
        let id = self.read_device_id()?;
        self.coefficients = Coefficients::default();
        self.last_reading = None;
        if id != DEVICE_ID {
            log::warn!("Unexpected device id 0x{id:04X} at 0x{address:02X}, expected 0x{DEVICE_ID:04X}");
            return Ok(false);
        }

        let config = Config::new()
            .with_integration_time(settings.integration_time)
            .with_high_dynamic(settings.high_dynamic)
            .with_forced(settings.forced);
        self.set_config(config)?;
        self.read_delay_ms = settings.integration_time.as_ms();
        log::info!(
            "VEML6075 ready at 0x{address:02X} ({} ms, high dynamic: {}, forced: {})",
            self.read_delay_ms,
            settings.high_dynamic,
            settings.forced
        );
        Ok(true)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read_device_id(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.read_register(Register::ID)
    }

    /// Packed value last written to the configuration register.
    pub fn config_word(&self) -> u16 {
        self.config.bits()
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn set_integration_time(&mut self, it: IntegrationTime) -> Result<(), Error<I2C::Error>> {
        let config = self.config.with_integration_time(it);
        self.set_config(config)?;
        self.read_delay_ms = it.as_ms();
        Ok(())
    }

    pub fn set_integration_time_at_least(&mut self, min_ms: u16) -> Result<(), Error<I2C::Error>> {
        self.set_integration_time(IntegrationTime::at_least(min_ms))
    }

    pub fn integration_time(&self) -> IntegrationTime {
        self.config.integration_time()
    }

    /// Nominal time one measurement takes with the current integration time.
    pub fn read_delay_ms(&self) -> u16 {
        self.read_delay_ms
    }

    pub fn set_high_dynamic(&mut self, high_dynamic: bool) -> Result<(), Error<I2C::Error>> {
        let config = self.config.with_high_dynamic(high_dynamic);
        self.set_config(config)
    }

    pub fn high_dynamic(&self) -> bool {
        self.config.high_dynamic()
    }

    pub fn set_forced_mode(&mut self, forced: bool) -> Result<(), Error<I2C::Error>> {
        let config = self.config.with_forced(forced);
        self.set_config(config)
    }

    pub fn forced_mode(&self) -> bool {
        self.config.forced()
    }

    /// Request a single measurement while in forced mode.
    ///
    /// The device clears UV_TRIG on its own once the sample is taken, so the
    /// bit is dropped from the cached word after the write.
    pub fn trigger_measurement(&mut self) -> Result<(), Error<I2C::Error>> {
        if !self.config.forced() {
            log::warn!("Trigger requested outside of forced mode, the device ignores it");
        }
        let config = self.config.with_trigger(true);
        self.set_config(config)?;
        self.config = config.with_trigger(false);
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<(), Error<I2C::Error>> {
        let config = self.config.with_shutdown(true);
        self.set_config(config)
    }

    pub fn power_on(&mut self) -> Result<(), Error<I2C::Error>> {
        let config = self.config.with_shutdown(false);
        self.set_config(config)
    }

    pub fn is_shut_down(&self) -> bool {
        self.config.shutdown()
    }

    /// Replace all six calibration coefficients at once.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    /// Compensated (UVA, UVB) of the latest sample, if any was taken.
    pub fn last_reading(&self) -> Option<(f32, f32)> {
        self.last_reading
    }

    pub fn read_raw(&mut self) -> Result<RawSample, Error<I2C::Error>> {
        let raw = RawSample {
            uva: self.read_register(Register::UVA_DATA)?,
            uvb: self.read_register(Register::UVB_DATA)?,
            comp1: self.read_register(Register::UVCOMP1_DATA)?,
            comp2: self.read_register(Register::UVCOMP2_DATA)?,
        };
        log::debug!(
            "Raw sample: UVA={}, UVB={}, COMP1={}, COMP2={}",
            raw.uva,
            raw.uvb,
            raw.comp1,
            raw.comp2
        );
        Ok(raw)
    }

    pub fn read_dark(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.read_register(Register::DARK_DATA)
    }

    pub fn read_uva(&mut self) -> Result<f32, Error<I2C::Error>> {
        Ok(self.take_reading()?.0)
    }

    pub fn read_uvb(&mut self) -> Result<f32, Error<I2C::Error>> {
        Ok(self.take_reading()?.1)
    }

    pub fn read_uv_index(&mut self) -> Result<f32, Error<I2C::Error>> {
        Ok(self.read_all()?.index)
    }

    /// UVA, UVB and UV index computed from the same bus sample.
    pub fn read_all(&mut self) -> Result<UvReading, Error<I2C::Error>> {
        let (uva, uvb) = self.take_reading()?;
        Ok(UvReading::new(uva, uvb, &self.coefficients))
    }

    fn take_reading(&mut self) -> Result<(f32, f32), Error<I2C::Error>> {
        let raw = self.read_raw()?;
        let compensated = raw.compensate(&self.coefficients);
        self.last_reading = Some(compensated);
        Ok(compensated)
    }

    fn set_config(&mut self, config: Config) -> Result<(), Error<I2C::Error>> {
        log::debug!("Writing UV_CONF 0x{:04X}", config.bits());
        self.write_register(Register::CONFIG, config.bits())?;
        self.config = config;
        Ok(())
    }

    fn write_register(
        &mut self,
        register: u8,
        value: u16,
    ) -> Result<(), <I2C as ErrorType>::Error> {
        self.i2c
            .write(self.address, &[register, value as u8, (value >> 8) as u8])
    }

    fn read_register(&mut self, register: u8) -> Result<u16, Error<I2C::Error>> {
        let mut data = [0; 2];
        self.i2c
            .write_read(self.address, &[register], &mut data)
            .map_err(Error::I2C)
            .and(Ok(u16::from_le_bytes(data)))
    }
}
