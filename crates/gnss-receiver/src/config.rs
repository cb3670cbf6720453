//! Receiver Configuration

use crate::error::GnssError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Receiver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Serial port device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub port: String,
    /// Baud rate the module is talking at (default: 9600)
    pub baud_rate: u32,
    /// Sentence terminator, CR or LF (default: LF)
    pub terminator: char,
    /// Raw byte queue capacity (default: 256)
    pub ring_capacity: usize,
    /// Longest accepted sentence, excluding the terminator (default: 128)
    pub max_sentence_len: usize,
    /// Reject sentences with a missing or wrong `*hh` checksum
    pub verify_checksum: bool,
    /// Log level for the monitor binary
    pub log_level: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            terminator: '\n',
            ring_capacity: ring_buffer::DEFAULT_CAPACITY,
            max_sentence_len: 128,
            verify_checksum: false,
            log_level: "info".to_string(),
        }
    }
}

impl ReceiverConfig {
    /// Load from an optional file, overridden by `GNSS_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, GnssError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("GNSS").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), GnssError> {
        if self.baud_rate == 0 {
            return Err(GnssError::InvalidConfig("baud_rate must be non-zero".into()));
        }
        if self.ring_capacity == 0 {
            return Err(GnssError::InvalidConfig("ring_capacity must be non-zero".into()));
        }
        if self.max_sentence_len == 0 {
            return Err(GnssError::InvalidConfig(
                "max_sentence_len must be non-zero".into(),
            ));
        }
        if self.terminator != '\n' && self.terminator != '\r' {
            return Err(GnssError::InvalidConfig(format!(
                "terminator must be CR or LF, got {:?}",
                self.terminator
            )));
        }
        Ok(())
    }

    /// Terminator as the byte seen on the wire
    pub fn terminator_byte(&self) -> u8 {
        if self.terminator == '\r' {
            b'\r'
        } else {
            b'\n'
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ReceiverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.terminator_byte(), b'\n');
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            ReceiverConfig {
                ring_capacity: 0,
                ..Default::default()
            },
            ReceiverConfig {
                max_sentence_len: 0,
                ..Default::default()
            },
            ReceiverConfig {
                terminator: ';',
                ..Default::default()
            },
            ReceiverConfig {
                baud_rate: 0,
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(GnssError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gnss-receiver-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "port = \"/dev/ttyS1\"\nbaud_rate = 115200\nterminator = \"\\r\"\nverify_checksum = true\n",
        )
        .unwrap();

        let config = ReceiverConfig::load(Some(&path));
        std::fs::remove_file(&path).ok();
        let config = config.unwrap();

        assert_eq!(config.port, "/dev/ttyS1");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.terminator_byte(), b'\r');
        assert!(config.verify_checksum);
        // Unset keys keep their defaults
        assert_eq!(config.ring_capacity, 256);
        assert_eq!(config.max_sentence_len, 128);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("gnss-receiver-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "ring_capacity = 0\n").unwrap();

        let result = ReceiverConfig::load(Some(&path));
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(GnssError::InvalidConfig(_))));
    }
}
