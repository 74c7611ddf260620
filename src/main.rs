use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail};
use embassy_time::{Duration, Timer};
use linux_embedded_hal::I2cdev;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veml6075::helpers::settings::MonitorSettings;
use veml6075::{poll_event, Comparator, EventWatch, NumberSelector, PollHandle, Veml6075};

static BUILD_TIMESTAMP: Option<&str> = option_env!("VERGEN_BUILD_TIMESTAMP");
static RUSTC_VERSION: Option<&str> = option_env!("VERGEN_RUSTC_SEMVER");
static GIT_COMMIT_HASH: Option<&str> = option_env!("VERGEN_GIT_SHA");
static GIT_DESCRIBE: Option<&str> = option_env!("VERGEN_GIT_DESCRIBE");

/// Give up after this many failed samples in a row.
const MAX_CONSECUTIVE_ERRORS: u32 = 5;
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    log::info!(
        "uv-monitor built on {} with Rustc {} from commit {}, described as \"{}\"",
        BUILD_TIMESTAMP.unwrap_or("unknown"),
        RUSTC_VERSION.unwrap_or("unknown"),
        GIT_COMMIT_HASH.unwrap_or("unknown"),
        GIT_DESCRIBE.unwrap_or("unknown"),
    );

    let settings = MonitorSettings::from_env();
    log::info!("Using {settings:?}");

    let i2c = I2cdev::new(&settings.bus)?;
    let mut sensor = Veml6075::new(i2c);
    let found = sensor
        .begin(settings.address, settings.init)
        .map_err(|e| anyhow!("VEML6075 init on {} failed: {e:?}", settings.bus))?;
    if !found {
        bail!(
            "No VEML6075 at 0x{:02X} on {}",
            settings.address,
            settings.bus
        );
    }
    sensor.set_coefficients(settings.coefficients);
    let sensor = Arc::new(Mutex::new(sensor));

    let handle = PollHandle::new();
    let watch = EventWatch::new(NumberSelector::UvIndex, Comparator::Exceeds, settings.uvi_alert)
        .with_interval(Duration::from_millis(settings.poll_ms))
        .with_trigger(settings.trigger);
    let alert_future = poll_event(sensor.clone(), watch, handle.clone(), |index| {
        log::warn!("UV index {index:.2} above {:.2}", settings.uvi_alert);
    });
    let report_future = report_loop(sensor, handle, settings.init.forced);

    let (fired, report) = futures_lite::future::block_on(embassy_futures::join::join(
        alert_future,
        report_future,
    ));
    log::info!("UV alert fired {fired} times");
    report
}

/// Log one full reading per [`REPORT_INTERVAL`] until the sensor stops answering.
async fn report_loop(
    sensor: Arc<Mutex<Veml6075<I2cdev>>>,
    handle: PollHandle,
    forced: bool,
) -> anyhow::Result<()> {
    let mut failures = 0;
    loop {
        if forced {
            let delay_ms = {
                let mut locked = sensor.lock().map_err(|_| anyhow!("sensor mutex poisoned"))?;
                match locked.trigger_measurement() {
                    Ok(()) => u64::from(locked.read_delay_ms()),
                    Err(e) => {
                        log::error!("Failed to trigger measurement: {e:?}");
                        0
                    }
                }
            };
            // wait for the forced sample to be integrated
            Timer::after_millis(delay_ms).await;
        }

        let reading = {
            let mut locked = sensor.lock().map_err(|_| anyhow!("sensor mutex poisoned"))?;
            locked.read_all()
        };
        match reading {
            Ok(reading) => {
                failures = 0;
                log::info!(
                    "UVA: {:.1}, UVB: {:.1}, UV index: {:.2}",
                    reading.uva,
                    reading.uvb,
                    reading.index
                );
            }
            Err(e) => {
                failures += 1;
                log::error!("Failed to read sensor (attempt {failures}): {e:?}");
                if failures >= MAX_CONSECUTIVE_ERRORS {
                    handle.cancel();
                    bail!("VEML6075 stopped responding");
                }
            }
        }
        Timer::after(REPORT_INTERVAL).await;
    }
}
