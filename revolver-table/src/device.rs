//! Storage location of tables.
use crate::TableError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Where the arrays of a table physically reside.
///
/// Tables are backed by `ndarray`, so host memory is the only location.
/// The value is kept in the tables so that minibatches report the location
/// of the buffer they were drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host memory.
    Cpu,
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            _ => Err(TableError::UnsupportedDevice(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device() {
        assert_eq!("cpu".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!(" CPU ".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!(
            "cuda:0".parse::<Device>(),
            Err(TableError::UnsupportedDevice("cuda:0".to_string()))
        );
        assert_eq!(Device::Cpu.to_string(), "cpu");
    }

    #[test]
    fn test_serde_device() {
        let yaml = serde_yaml::to_string(&Device::Cpu).unwrap();
        assert!(yaml.contains("cpu"));
        let device: Device = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(device, Device::Cpu);
    }
}
