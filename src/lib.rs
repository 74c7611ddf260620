//! Driver for the Vishay VEML6075 UVA/UVB light sensor on top of `embedded-hal` 1.0.
//!
//! ```rust,no_run
//! use veml6075::{InitSettings, Veml6075, DEFAULT_ADDRESS};
//!
//! let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut sensor = Veml6075::new(i2c);
//! if sensor.begin(DEFAULT_ADDRESS, InitSettings::default()).unwrap() {
//!     let reading = sensor.read_all().unwrap();
//!     println!("UVA {} UVB {} UVI {}", reading.uva, reading.uvb, reading.index);
//! }
//! ```

pub mod helpers;
pub mod veml6075;

pub use helpers::events::{poll_event, Comparator, EventWatch, PollHandle, Trigger};
pub use veml6075::{
    uv_index, BoolSelector, Coefficients, Config, Error, InitSettings, IntegrationTime,
    NumberSelector, RawSample, SetSelector, UvReading, Veml6075, DEFAULT_ADDRESS, DEVICE_ID,
};
