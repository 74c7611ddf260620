use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::veml6075::{Coefficients, Error, Veml6075};

/// Numeric values that can be queried by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSelector {
    Uva,
    Uvb,
    UvIndex,
    UvaACoefficient,
    UvaBCoefficient,
    UvbCCoefficient,
    UvbDCoefficient,
    UvaResponse,
    UvbResponse,
    /// Nominal measurement delay in milliseconds
    IntegrationTime,
}

impl NumberSelector {
    /// Whether reading this value triggers a bus transaction.
    pub fn needs_sample(&self) -> bool {
        matches!(
            self,
            NumberSelector::Uva | NumberSelector::Uvb | NumberSelector::UvIndex
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolSelector {
    HighDynamic,
    ForcedMode,
}

/// Settings that can be changed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSelector {
    UvaACoefficient,
    UvaBCoefficient,
    UvbCCoefficient,
    UvbDCoefficient,
    UvaResponse,
    UvbResponse,
    /// Any non-zero value enables it
    HighDynamic,
    /// Any non-zero value enables it
    ForcedMode,
    /// Minimum integration time in milliseconds
    IntegrationTime,
}

impl<I2C> Veml6075<I2C>
where
    I2C: I2c<SevenBitAddress>,
    I2C::Error: Into<Error<I2C::Error>>,
{
    pub fn get_number(&mut self, selector: NumberSelector) -> Result<f32, Error<I2C::Error>> {
        let c = self.coefficients();
        let value = match selector {
            NumberSelector::Uva => self.read_uva()?,
            NumberSelector::Uvb => self.read_uvb()?,
            NumberSelector::UvIndex => self.read_uv_index()?,
            NumberSelector::UvaACoefficient => c.uva_a,
            NumberSelector::UvaBCoefficient => c.uva_b,
            NumberSelector::UvbCCoefficient => c.uvb_c,
            NumberSelector::UvbDCoefficient => c.uvb_d,
            NumberSelector::UvaResponse => c.uva_response,
            NumberSelector::UvbResponse => c.uvb_response,
            NumberSelector::IntegrationTime => f32::from(self.read_delay_ms()),
        };
        Ok(value)
    }

    pub fn get_bool(&self, selector: BoolSelector) -> bool {
        match selector {
            BoolSelector::HighDynamic => self.high_dynamic(),
            BoolSelector::ForcedMode => self.forced_mode(),
        }
    }

    pub fn set(&mut self, selector: SetSelector, value: f32) -> Result<(), Error<I2C::Error>> {
        let c = self.coefficients();
        let coefficients = match selector {
            SetSelector::UvaACoefficient => Coefficients { uva_a: value, ..c },
            SetSelector::UvaBCoefficient => Coefficients { uva_b: value, ..c },
            SetSelector::UvbCCoefficient => Coefficients { uvb_c: value, ..c },
            SetSelector::UvbDCoefficient => Coefficients { uvb_d: value, ..c },
            SetSelector::UvaResponse => Coefficients {
                uva_response: value,
                ..c
            },
            SetSelector::UvbResponse => Coefficients {
                uvb_response: value,
                ..c
            },
            SetSelector::HighDynamic => return self.set_high_dynamic(value.abs() > 0.0),
            SetSelector::ForcedMode => return self.set_forced_mode(value.abs() > 0.0),
            // `as` saturates, negative and NaN end up as 0
            SetSelector::IntegrationTime => return self.set_integration_time_at_least(value as u16),
        };
        self.set_coefficients(coefficients);
        Ok(())
    }
}
