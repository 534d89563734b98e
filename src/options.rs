//! Device option strings
//!
//! Devices are described on the command line as comma separated `key=value`
//! pairs, for example `ch=2,cs=PA10,bits=16,framing=frame,speed=1000`.
//!
//! | Key       | Value |
//! |-----------|-------|
//! | `ch`      | Channel 0..=3 |
//! | `cs`      | Chip-select pin (`PA10`), or `none` |
//! | `bits`    | Word width 8..=16 |
//! | `mode`    | SPI mode 0..=3 |
//! | `div`     | Clock divisor 1..=255 |
//! | `speed`   | Clock in kHz, turned into a divisor from MCK |
//! | `framing` | `toggle`, `frame` or `always-high` |
//! | `dlybs`   | Delay before the first clock, in MCK cycles |
//! | `dlybct`  | Delay between words, in MCK cycles |
//! | `auto`    | `false` forces a bit-banged chip select |

use spimux_core::{Channel, CsMode, DeviceConfig, SpiMode};

use crate::error::{CliError, Result};

/// Settings parsed from an option string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Settings applied at creation
    pub config: DeviceConfig,
    /// Requested clock in Hz, applied after creation
    pub speed_hz: Option<u32>,
    /// Let the controller drive chip select when the pin allows it
    pub cs_auto: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            config: DeviceConfig::default(),
            speed_hz: None,
            cs_auto: true,
        }
    }
}

/// Split an option string into key-value pairs
///
/// Format: "key1=value1,key2=value2". Entries without `=` are ignored.
pub fn split_options(s: &str) -> Vec<(&str, &str)> {
    s.split(',')
        .map(str::trim)
        .filter_map(|opt| opt.split_once('='))
        .collect()
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number<T: TryFrom<u32>>(key: &str, value: &str) -> Result<T> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    let n = parsed.map_err(|e| CliError::option(key, value, e.to_string()))?;

    T::try_from(n).map_err(|_| CliError::option(key, value, "out of range"))
}

/// Parse device options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<DeviceOptions> {
    let mut opts = DeviceOptions::default();

    for &(key, value) in options {
        match key {
            "ch" | "channel" => {
                let n: u8 = parse_number(key, value)?;
                opts.config.channel = Channel::try_from(n)?;
            }
            "cs" => {
                opts.config.cs = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.parse()?)
                };
            }
            "bits" => {
                opts.config.bits = parse_number(key, value)?;
            }
            "mode" => {
                let n: u8 = parse_number(key, value)?;
                opts.config.mode = SpiMode::try_from(n)?;
            }
            "div" | "divisor" => {
                opts.config.divisor = parse_number(key, value)?;
                if opts.config.divisor == 0 {
                    return Err(CliError::option(key, value, "divisor must be 1-255"));
                }
            }
            "speed" => {
                // Parse speed in kHz
                let khz: u32 = parse_number(key, value)?;
                let hz = khz
                    .checked_mul(1000)
                    .ok_or_else(|| CliError::option(key, value, "too fast"))?;
                opts.speed_hz = Some(hz);
            }
            "framing" => {
                opts.config.cs_mode = match value {
                    "toggle" => CsMode::Toggle,
                    "frame" => CsMode::Frame,
                    "always-high" | "none" => CsMode::AlwaysHigh,
                    _ => {
                        return Err(CliError::option(
                            key,
                            value,
                            "expected toggle, frame or always-high",
                        ))
                    }
                };
            }
            "dlybs" => {
                opts.config.cs_assert_delay = parse_number(key, value)?;
            }
            "dlybct" => {
                opts.config.cs_negate_delay = parse_number(key, value)?;
            }
            "auto" => {
                opts.cs_auto = value
                    .parse()
                    .map_err(|_| CliError::option(key, value, "expected true or false"))?;
            }
            _ => {
                log::warn!("spimux: Unknown device option: {}={}", key, value);
            }
        }
    }

    opts.config.validate()?;
    Ok(opts)
}

/// Parse hex bytes such as `9f 00 00`, `9f0000` or `0x9f,0x00`
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();

    for token in s.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if token.is_empty() {
            continue;
        }
        if token.len() % 2 != 0 {
            return Err(CliError::InvalidHex(token.to_string()));
        }

        for pair in token.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).map_err(|_| CliError::InvalidHex(token.to_string()))?;
            let byte =
                u8::from_str_radix(pair, 16).map_err(|_| CliError::InvalidHex(token.to_string()))?;
            bytes.push(byte);
        }
    }

    Ok(bytes)
}

/// Format bytes as space separated hex
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
