use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ASSETS: &str = "assets";

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Waypoint map console with an embedded map renderer")]
pub struct Args {
    /// Listen address for the map page and bridge (env: VIEWER_ADDR)
    #[arg(long)]
    pub addr: Option<String>,

    /// Directory holding optional assets such as drone.png (env: VIEWER_ASSETS)
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Draw a route line through the markers after every resync
    #[arg(long)]
    pub route: bool,

    /// Ask the renderer to acknowledge every applied command
    #[arg(long)]
    pub ack: bool,

    /// Drone link port (env: DRONE_PORT)
    #[arg(long)]
    pub drone_port: Option<String>,

    /// Drone link host (env: DRONE_HOST)
    #[arg(long)]
    pub drone_host: Option<String>,

    /// Waypoint spacing in meters (env: DRONE_SPACING)
    #[arg(long)]
    pub drone_spacing: Option<String>,

    /// Altitude step in meters (env: DRONE_ALT_STEP)
    #[arg(long)]
    pub drone_alt_step: Option<String>,

    /// Return-to-launch height in meters (env: DRONE_RTL_HEIGHT)
    #[arg(long)]
    pub drone_rtl_height: Option<String>,

    /// Cruise speed in m/s (env: DRONE_SPEED)
    #[arg(long)]
    pub drone_speed: Option<String>,
}

impl Args {
    pub fn listen_addr(&self) -> Result<SocketAddr, SettingsError> {
        let text = self
            .addr
            .clone()
            .or_else(|| env::var("VIEWER_ADDR").ok())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        text.parse().map_err(|_| SettingsError::Invalid {
            field: "addr",
            value: text,
            expected: "a socket address such as 127.0.0.1:8080",
        })
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.assets
            .clone()
            .or_else(|| env::var("VIEWER_ASSETS").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS))
    }

    /// Drone fields as typed, with environment fallbacks.
    pub fn raw_settings(&self) -> RawSettings {
        RawSettings {
            port: flag_or_env(&self.drone_port, "DRONE_PORT"),
            host: flag_or_env(&self.drone_host, "DRONE_HOST"),
            spacing: flag_or_env(&self.drone_spacing, "DRONE_SPACING"),
            altitude_step: flag_or_env(&self.drone_alt_step, "DRONE_ALT_STEP"),
            rtl_height: flag_or_env(&self.drone_rtl_height, "DRONE_RTL_HEIGHT"),
            speed: flag_or_env(&self.drone_speed, "DRONE_SPEED"),
        }
    }
}

fn flag_or_env(flag: &Option<String>, key: &str) -> String {
    flag.clone()
        .or_else(|| env::var(key).ok())
        .unwrap_or_default()
}

/// Drone settings record as free text. Empty fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSettings {
    pub port: String,
    pub host: String,
    pub spacing: String,
    pub altitude_step: String,
    pub rtl_height: String,
    pub speed: String,
}

/// Accepted once at startup. Exposed read-only; the map core never reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroneSettings {
    pub port: u16,
    pub host: String,
    pub spacing_m: f64,
    pub altitude_step_m: f64,
    pub rtl_height_m: f64,
    pub speed_mps: f64,
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self {
            port: 14550,
            host: "127.0.0.1".to_string(),
            spacing_m: 5.0,
            altitude_step_m: 1.0,
            rtl_height_m: 30.0,
            speed_mps: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Invalid {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Invalid {
                field,
                value,
                expected,
            } => write!(f, "invalid {field} {value:?}: expected {expected}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl RawSettings {
    pub fn parse(&self) -> Result<DroneSettings, SettingsError> {
        let defaults = DroneSettings::default();

        let port = match self.port.trim() {
            "" => defaults.port,
            text => text.parse().map_err(|_| SettingsError::Invalid {
                field: "port",
                value: text.to_string(),
                expected: "an integer in 0..=65535",
            })?,
        };

        let host = match self.host.trim() {
            "" => defaults.host,
            text if text.chars().any(char::is_whitespace) => {
                return Err(SettingsError::Invalid {
                    field: "host",
                    value: text.to_string(),
                    expected: "a host name without whitespace",
                });
            }
            text => text.to_string(),
        };

        Ok(DroneSettings {
            port,
            host,
            spacing_m: parse_meters("spacing", &self.spacing, defaults.spacing_m, false)?,
            altitude_step_m: parse_meters(
                "altitude_step",
                &self.altitude_step,
                defaults.altitude_step_m,
                false,
            )?,
            rtl_height_m: parse_meters("rtl_height", &self.rtl_height, defaults.rtl_height_m, true)?,
            speed_mps: parse_meters("speed", &self.speed, defaults.speed_mps, false)?,
        })
    }
}

fn parse_meters(
    field: &'static str,
    text: &str,
    default: f64,
    allow_zero: bool,
) -> Result<f64, SettingsError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(default);
    }
    let expected = if allow_zero {
        "a finite number >= 0"
    } else {
        "a finite number > 0"
    };
    let invalid = || SettingsError::Invalid {
        field,
        value: text.to_string(),
        expected,
    };
    let value: f64 = text.parse().map_err(|_| invalid())?;
    let in_range = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if !in_range {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{Args, DroneSettings, RawSettings, SettingsError};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_record_uses_defaults() {
        assert_eq!(RawSettings::default().parse(), Ok(DroneSettings::default()));
    }

    #[test]
    fn parses_typed_fields() {
        let raw = RawSettings {
            port: " 14551 ".to_string(),
            host: "192.168.1.20".to_string(),
            spacing: "2.5".to_string(),
            altitude_step: "0.5".to_string(),
            rtl_height: "0".to_string(),
            speed: "12".to_string(),
        };
        assert_eq!(
            raw.parse(),
            Ok(DroneSettings {
                port: 14551,
                host: "192.168.1.20".to_string(),
                spacing_m: 2.5,
                altitude_step_m: 0.5,
                rtl_height_m: 0.0,
                speed_mps: 12.0,
            })
        );
    }

    #[test]
    fn errors_name_the_field() {
        let raw = RawSettings {
            port: "70000".to_string(),
            ..RawSettings::default()
        };
        let err = raw.parse().unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "port", .. }));
        assert!(err.to_string().contains("port"));

        let raw = RawSettings {
            speed: "0".to_string(),
            ..RawSettings::default()
        };
        assert!(matches!(
            raw.parse(),
            Err(SettingsError::Invalid { field: "speed", .. })
        ));

        let raw = RawSettings {
            rtl_height: "-1".to_string(),
            ..RawSettings::default()
        };
        assert!(matches!(
            raw.parse(),
            Err(SettingsError::Invalid {
                field: "rtl_height",
                ..
            })
        ));

        let raw = RawSettings {
            spacing: "inf".to_string(),
            ..RawSettings::default()
        };
        assert!(matches!(
            raw.parse(),
            Err(SettingsError::Invalid {
                field: "spacing",
                ..
            })
        ));
    }

    #[test]
    fn host_must_not_contain_whitespace() {
        let raw = RawSettings {
            host: "drone one".to_string(),
            ..RawSettings::default()
        };
        assert!(matches!(
            raw.parse(),
            Err(SettingsError::Invalid { field: "host", .. })
        ));
    }

    #[test]
    fn flags_win_over_environment() {
        let args = Args {
            addr: Some("0.0.0.0:9000".to_string()),
            drone_port: Some("15000".to_string()),
            ..Args::default()
        };
        assert_eq!(args.listen_addr().unwrap().port(), 9000);
        assert_eq!(args.raw_settings().port, "15000");
    }

    #[test]
    fn bad_listen_address_is_reported() {
        let args = Args {
            addr: Some("not-an-addr".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            args.listen_addr(),
            Err(SettingsError::Invalid { field: "addr", .. })
        ));
    }
}
