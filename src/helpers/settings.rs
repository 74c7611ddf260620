use log::warn;

use crate::helpers::events::Trigger;
use crate::veml6075::{Coefficients, InitSettings, IntegrationTime, DEFAULT_ADDRESS};

pub const DEFAULT_BUS: &str = "/dev/i2c-1";
pub const DEFAULT_UVI_ALERT: f32 = 6.0;
pub const DEFAULT_POLL_MS: u64 = 200;

/// Runtime settings of the monitor, read from `VEML6075_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub bus: String,
    pub address: u8,
    pub init: InitSettings,
    pub coefficients: Coefficients,
    pub uvi_alert: f32,
    pub poll_ms: u64,
    pub trigger: Trigger,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            bus: DEFAULT_BUS.to_string(),
            address: DEFAULT_ADDRESS,
            init: InitSettings::default(),
            coefficients: Coefficients::default(),
            uvi_alert: DEFAULT_UVI_ALERT,
            poll_ms: DEFAULT_POLL_MS,
            trigger: Trigger::Level,
        }
    }
}

impl MonitorSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the settings from `lookup`, falling back to the default for
    /// every missing or unparseable key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let bus = get("VEML6075_I2C_BUS").unwrap_or(defaults.bus);
        let address = parse_or("VEML6075_ADDRESS", get("VEML6075_ADDRESS"), parse_address, defaults.address);
        let integration_time = parse_or(
            "VEML6075_INTEGRATION_MS",
            get("VEML6075_INTEGRATION_MS"),
            |s| s.parse::<u16>().ok().map(IntegrationTime::at_least),
            defaults.init.integration_time,
        );
        let high_dynamic = parse_or(
            "VEML6075_HIGH_DYNAMIC",
            get("VEML6075_HIGH_DYNAMIC"),
            parse_bool,
            defaults.init.high_dynamic,
        );
        let forced = parse_or("VEML6075_FORCED", get("VEML6075_FORCED"), parse_bool, defaults.init.forced);
        let coefficients = parse_or(
            "VEML6075_COEFFICIENTS",
            get("VEML6075_COEFFICIENTS"),
            parse_coefficients,
            defaults.coefficients,
        );
        let uvi_alert = parse_or(
            "VEML6075_UVI_ALERT",
            get("VEML6075_UVI_ALERT"),
            |s| s.parse::<f32>().ok().filter(|v| v.is_finite()),
            defaults.uvi_alert,
        );
        let poll_ms = parse_or(
            "VEML6075_POLL_MS",
            get("VEML6075_POLL_MS"),
            |s| s.parse::<u64>().ok().filter(|v| *v > 0),
            defaults.poll_ms,
        );
        let edge = parse_or("VEML6075_EDGE_TRIGGER", get("VEML6075_EDGE_TRIGGER"), parse_bool, false);

        MonitorSettings {
            bus,
            address,
            init: InitSettings {
                integration_time,
                high_dynamic,
                forced,
            },
            coefficients,
            uvi_alert,
            poll_ms,
            trigger: if edge { Trigger::Edge } else { Trigger::Level },
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, parse: impl Fn(&str) -> Option<T>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            warn!("Ignoring invalid {key}={raw:?}, using default");
            default
        }
    }
}

fn parse_address(s: &str) -> Option<u8> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok()?,
        None => s.parse::<u8>().ok()?,
    };
    (value <= 0x7F).then_some(value)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Six comma separated values in the order a, b, c, d, UVA response, UVB response.
fn parse_coefficients(s: &str) -> Option<Coefficients> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().ok())
        .collect::<Option<Vec<f32>>>()?;
    let [uva_a, uva_b, uvb_c, uvb_d, uva_response, uvb_response] = values.as_slice() else {
        return None;
    };
    Some(Coefficients {
        uva_a: *uva_a,
        uva_b: *uva_b,
        uvb_c: *uvb_c,
        uvb_d: *uvb_d,
        uva_response: *uva_response,
        uvb_response: *uvb_response,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> MonitorSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(settings(&[]), MonitorSettings::default());
        assert_eq!(settings(&[]).init.integration_time, IntegrationTime::_100ms);
    }

    #[test]
    fn values_are_parsed() {
        let s = settings(&[
            ("VEML6075_I2C_BUS", "/dev/i2c-3"),
            ("VEML6075_ADDRESS", "0x11"),
            ("VEML6075_INTEGRATION_MS", "150"),
            ("VEML6075_HIGH_DYNAMIC", "yes"),
            ("VEML6075_FORCED", "1"),
            ("VEML6075_COEFFICIENTS", "1, 2, 3, 4, 0.5, 0.25"),
            ("VEML6075_UVI_ALERT", "3.5"),
            ("VEML6075_POLL_MS", "1000"),
            ("VEML6075_EDGE_TRIGGER", "true"),
        ]);
        assert_eq!(s.bus, "/dev/i2c-3");
        assert_eq!(s.address, 0x11);
        assert_eq!(s.init.integration_time, IntegrationTime::_200ms);
        assert!(s.init.high_dynamic);
        assert!(s.init.forced);
        assert_eq!(s.coefficients.uvb_d, 4.0);
        assert_eq!(s.coefficients.uvb_response, 0.25);
        assert_eq!(s.uvi_alert, 3.5);
        assert_eq!(s.poll_ms, 1000);
        assert_eq!(s.trigger, Trigger::Edge);
    }

    #[test]
    fn invalid_values_fall_back() {
        let s = settings(&[
            ("VEML6075_ADDRESS", "0x80"),
            ("VEML6075_HIGH_DYNAMIC", "maybe"),
            ("VEML6075_COEFFICIENTS", "1,2,3"),
            ("VEML6075_POLL_MS", "0"),
            ("VEML6075_UVI_ALERT", "NaN"),
        ]);
        assert_eq!(s, MonitorSettings::default());
    }

    #[test]
    fn decimal_address_is_accepted() {
        assert_eq!(settings(&[("VEML6075_ADDRESS", "16")]).address, 0x10);
        assert_eq!(parse_address("0X7f"), Some(0x7F));
        assert_eq!(parse_address("200"), None);
    }
}
