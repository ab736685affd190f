mod config;
mod screen;

use crate::config::{Backend, Config};
use crate::screen::Screen;
use dotenv::dotenv;
use log::{debug, info};
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::System;
use time::OffsetDateTime;
use ttlcd::transmitter::LogTransmitter;
use ttlcd::{ByteTransmitter, DisplayController};
use ttlcd_gpio::gpiod::GpiodDriver;
use ttlcd_gpio::lcd::hd44780::GpioHD44780Transmitter;
use ttlcd_gpio::raw::RawGpioDriver;

/// How often the shown text is rebuilt.
const REFRESH_PERIOD: Duration = Duration::from_secs(1);

fn status_lines() -> Vec<String> {
    const UNKNOWN_STR: &str = "???";

    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    vec![
        System::host_name().unwrap_or_else(|| UNKNOWN_STR.to_string()),
        format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second()),
        format!("up {}s", System::uptime()),
        System::kernel_version().unwrap_or_else(|| UNKNOWN_STR.to_string()),
    ]
}

/// The tick loop. Never returns unless something fails.
fn run<T: ByteTransmitter>(config: &Config, transmitter: T) -> eyre::Result<()> {
    let mut storage = vec![0u8; config.queue_capacity * config.displays.len()];
    let mut lcd = DisplayController::new(&config.displays, &mut storage, transmitter)?;
    debug!("{:?} initialized.", lcd);

    let mut screens = (0..lcd.display_count())
        .map(|display| Screen::new(&lcd, display))
        .collect::<Result<Vec<_>, _>>()?;

    let tick = Duration::from_millis(config.tick_ms);
    let mut last_refresh: Option<Instant> = None;

    info!("Starting main loop...");

    loop {
        let now = Instant::now();

        if last_refresh.is_none_or(|last| now.duration_since(last) >= REFRESH_PERIOD) {
            let lines = status_lines();
            for screen in &mut screens {
                screen.show(&lines);
            }
            last_refresh = Some(now);
        }

        for screen in &mut screens {
            screen.poll(&mut lcd)?;
        }

        for fault in lcd.update() {
            // Whatever was on the display may be garbled now, redraw it all.
            screens[fault.display].invalidate();
        }

        thread::sleep(tick.saturating_sub(now.elapsed()));
    }
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("ttlcd demo starting...");

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Building one from the environment.");
        let config = Config::from_env()?;
        config.save()?;
        info!("Config saved.");
        config
    };

    for (display, lcd) in config.displays.iter().enumerate() {
        info!(
            "LCD {} ({}x{}) @ RS: {}, E: {}, Data: {:?}",
            display, lcd.width, lcd.height, lcd.pins.rs, lcd.pins.e, lcd.pins.data
        );
    }
    info!(
        "Backend {:?}, tick {} ms, {} queue bytes per display",
        config.backend, config.tick_ms, config.queue_capacity
    );

    match config.backend {
        Backend::Raw => {
            debug!("Initializing GPIO driver...");
            let gpio = RawGpioDriver::new_gpiomem()?;
            debug!("{:?} initialized.", gpio);
            let transmitter = GpioHD44780Transmitter::from_configs(&gpio, &config.displays)?;
            run(&config, transmitter)
        }
        Backend::RawMem => {
            debug!("Initializing GPIO driver...");
            let gpio = RawGpioDriver::new_mem()?;
            debug!("{:?} initialized.", gpio);
            let transmitter = GpioHD44780Transmitter::from_configs(&gpio, &config.displays)?;
            run(&config, transmitter)
        }
        Backend::Gpiod => {
            debug!("Initializing GPIO driver...");
            let gpio = GpiodDriver::open(&config.gpio_chip)?;
            debug!("{:?} initialized.", gpio);
            let transmitter = GpioHD44780Transmitter::from_configs(&gpio, &config.displays)?;
            run(&config, transmitter)
        }
        Backend::DryRun => run(&config, LogTransmitter),
    }
}
