use dotenv::var;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use ttlcd::{DisplayConfig, PinAssignment, DEFAULT_QUEUE_CAPACITY};

const DEFAULT_CONFIG_FILE: &str = "ttlcd.json";

/// Where the bytes for the displays end up.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Raspberry Pi GPIO registers through `/dev/gpiomem`.
    #[default]
    Raw,
    /// Raspberry Pi GPIO registers through `/dev/mem`. Needs root.
    RawMem,
    /// Linux GPIO character device.
    Gpiod,
    /// No hardware, every byte is logged.
    DryRun,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub displays: Vec<DisplayConfig>,
    /// Period of the dispatch tick. The slowest instructions need 2 ms.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Queue bytes per display.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub backend: Backend,
    /// GPIO chip used by the gpiod backend.
    #[serde(default = "default_gpio_chip")]
    pub gpio_chip: String,
}

fn default_tick_ms() -> u64 {
    2
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_gpio_chip() -> String {
    "/dev/gpiochip0".to_string()
}

pub fn parse_pin_bus(pin_str: &str) -> eyre::Result<[usize; 4]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Invalid number of data pins"))
}

impl Config {
    fn path() -> String {
        var_os("CONFIG_FILE")
            .as_deref()
            .unwrap_or(OsStr::new(DEFAULT_CONFIG_FILE))
            .to_string_lossy()
            .into_owned()
    }

    pub fn try_load() -> Option<Self> {
        let config_str = Self::path();
        let config_path = Path::new(&config_str);
        if !config_path.exists() {
            return None;
        }
        let file = std::fs::File::open(config_path).ok()?;
        let reader = std::io::BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!("Ignoring {}: {}", config_str, err);
                None
            }
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = Self::path();
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// A single 20x2 display wired as described by the `TTLCD_LCD_*` variables.
    pub fn from_env() -> eyre::Result<Self> {
        let pins = PinAssignment {
            rs: var("TTLCD_LCD_PIN_RS")?.parse()?,
            e: var("TTLCD_LCD_PIN_E")?.parse()?,
            data: parse_pin_bus(&var("TTLCD_LCD_PINS_DATA")?)?,
        };
        let backend = match var("TTLCD_BACKEND").as_deref() {
            Ok("raw-mem") => Backend::RawMem,
            Ok("gpiod") => Backend::Gpiod,
            Ok("dry-run") => Backend::DryRun,
            _ => Backend::Raw,
        };

        Ok(Config {
            displays: vec![DisplayConfig {
                width: 20,
                height: 2,
                pins,
            }],
            tick_ms: default_tick_ms(),
            queue_capacity: default_queue_capacity(),
            backend,
            gpio_chip: default_gpio_chip(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_bus_accepts_mixed_separators() {
        assert_eq!(parse_pin_bus("26, 16;20 21").unwrap(), [26, 16, 20, 21]);
        assert!(parse_pin_bus("26,16,20").is_err());
        assert!(parse_pin_bus("26,16,x,21").is_err());
    }

    #[test]
    fn optional_fields_fall_back_to_defaults() {
        let json = r#"{
            "displays": [
                { "width": 16, "height": 2, "pins": { "rs": 22, "e": 17, "data": [26, 16, 20, 21] } }
            ],
            "backend": "dry-run"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.displays.len(), 1);
        assert_eq!(config.backend, Backend::DryRun);
        assert_eq!(config.tick_ms, 2);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.gpio_chip, "/dev/gpiochip0");
    }

    #[test]
    fn backend_names_are_kebab_case() {
        for (name, backend) in [
            ("raw", Backend::Raw),
            ("raw-mem", Backend::RawMem),
            ("gpiod", Backend::Gpiod),
            ("dry-run", Backend::DryRun),
        ] {
            let json = format!("\"{}\"", name);
            assert_eq!(serde_json::from_str::<Backend>(&json).unwrap(), backend);
        }
    }
}
