use core::convert::Infallible;

mod device_impl;
mod selector;

pub use device_impl::Config;
pub use selector::{BoolSelector, NumberSelector, SetSelector};

/// All possible errors in this crate
#[derive(Debug)]
pub enum Error<E> {
    /// I²C bus error
    I2C(E),
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
    /// Integration time code outside of 0..=4
    InvalidIntegrationTime(u8),
}
impl<E> From<E> for Error<E> {
    fn from(other: E) -> Self {
        Error::I2C(other)
    }
}

/// Factory default I²C address.
pub const DEFAULT_ADDRESS: u8 = 0x10;

/// Content of the manufacturer ID register for a VEML6075.
pub const DEVICE_ID: u16 = 0x0026;

/// VEML6075 device driver.
#[derive(Debug)]
pub struct Veml6075<I2C> {
    /// The concrete I²C device implementation.
    i2c: I2C,
    address: u8,
    config: Config,
    coefficients: Coefficients,
    read_delay_ms: u16,
    last_reading: Option<(f32, f32)>,
}

/// Integration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationTime {
    /// 50 ms (default)
    #[default]
    _50ms,
    /// 100 ms
    _100ms,
    /// 200 ms
    _200ms,
    /// 400 ms
    _400ms,
    /// 800 ms
    _800ms,
}

impl IntegrationTime {
    pub const ALL: [IntegrationTime; 5] = [
        IntegrationTime::_50ms,
        IntegrationTime::_100ms,
        IntegrationTime::_200ms,
        IntegrationTime::_400ms,
        IntegrationTime::_800ms,
    ];

    /// 3-bit code stored in UV_IT.
    pub fn code(&self) -> u8 {
        match self {
            IntegrationTime::_50ms => 0,
            IntegrationTime::_100ms => 1,
            IntegrationTime::_200ms => 2,
            IntegrationTime::_400ms => 3,
            IntegrationTime::_800ms => 4,
        }
    }

    /// Return the integration time in milliseconds
    pub fn as_ms(&self) -> u16 {
        25 * (2 << self.code())
    }

    /// Return the integration time in microseconds
    pub fn as_us(&self) -> u32 {
        (self.as_ms() as u32) * 1000
    }

    /// Shortest integration time lasting at least `min_ms`, saturating at 800 ms.
    pub fn at_least(min_ms: u16) -> Self {
        Self::ALL
            .into_iter()
            .find(|it| it.as_ms() >= min_ms)
            .unwrap_or(IntegrationTime::_800ms)
    }
}

impl TryFrom<u8> for IntegrationTime {
    type Error = Error<Infallible>;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(Error::InvalidIntegrationTime(code))
    }
}

/// Calibration coefficients used to turn raw counts into UVA, UVB and UV index.
///
/// The defaults are the values for an open sensor without coverglass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// UVA visible compensation (COMP1)
    pub uva_a: f32,
    /// UVA infrared compensation (COMP2)
    pub uva_b: f32,
    /// UVB visible compensation (COMP1)
    pub uvb_c: f32,
    /// UVB infrared compensation (COMP2)
    pub uvb_d: f32,
    /// UVA responsivity in UVI per count
    pub uva_response: f32,
    /// UVB responsivity in UVI per count
    pub uvb_response: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            uva_a: 2.22,
            uva_b: 1.33,
            uvb_c: 2.95,
            uvb_d: 1.74,
            uva_response: 0.001461,
            uvb_response: 0.002591,
        }
    }
}

/// Settings applied by [`Veml6075::begin`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitSettings {
    pub integration_time: IntegrationTime,
    pub high_dynamic: bool,
    /// Forced (single shot) mode instead of continuous measurements.
    pub forced: bool,
}

impl Default for InitSettings {
    fn default() -> Self {
        Self {
            integration_time: IntegrationTime::_100ms,
            high_dynamic: false,
            forced: false,
        }
    }
}

/// Raw register contents of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub uva: u16,
    pub uvb: u16,
    pub comp1: u16,
    pub comp2: u16,
}

impl RawSample {
    /// Remove the visible and infrared leakage from the UVA and UVB channels.
    ///
    /// No clamping is applied, dark scenes may yield negative values.
    pub fn compensate(&self, coefficients: &Coefficients) -> (f32, f32) {
        let comp1 = self.comp1 as f32;
        let comp2 = self.comp2 as f32;
        let uva = self.uva as f32 - coefficients.uva_a * comp1 - coefficients.uva_b * comp2;
        let uvb = self.uvb as f32 - coefficients.uvb_c * comp1 - coefficients.uvb_d * comp2;
        (uva, uvb)
    }
}

/// Compensated UVA, UVB and the UV index derived from one bus sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvReading {
    pub uva: f32,
    pub uvb: f32,
    pub index: f32,
}

impl UvReading {
    pub fn new(uva: f32, uvb: f32, coefficients: &Coefficients) -> Self {
        Self {
            uva,
            uvb,
            index: uv_index(uva, uvb, coefficients),
        }
    }
}

/// Vishay's UV index approximation: mean of the weighted UVA and UVB responses.
pub fn uv_index(uva: f32, uvb: f32, coefficients: &Coefficients) -> f32 {
    (uva * coefficients.uva_response + uvb * coefficients.uvb_response) / 2.0
}
