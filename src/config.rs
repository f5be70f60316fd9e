use crate::{error::ConfigError, inst::FuType};
use std::{fmt, str::FromStr};

/// Reservation station counts per functional unit and the size of the
/// floating point register file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HardwareConfig {
    pub load_stations: usize,
    pub store_stations: usize,
    pub add_stations: usize,
    pub mult_stations: usize,
    pub fp_registers: usize,
}

const FIELDS: [&str; 5] = [
    "load stations",
    "store stations",
    "add stations",
    "mult stations",
    "fp registers",
];

impl HardwareConfig {
    pub fn stations_for(&self, fu: FuType) -> usize {
        match fu {
            FuType::Load => self.load_stations,
            FuType::Store => self.store_stations,
            FuType::AddSub => self.add_stations,
            FuType::MultDiv => self.mult_stations,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            load_stations: 2,
            store_stations: 2,
            add_stations: 3,
            mult_stations: 2,
            fp_registers: 16,
        }
    }
}

impl FromStr for HardwareConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut values = s.split_whitespace();
        let mut counts = [0usize; 5];

        for (field, count) in FIELDS.into_iter().zip(counts.iter_mut()) {
            let raw = values.next().ok_or(ConfigError::Missing(field))?;
            let value = raw.parse::<i64>().map_err(|_| ConfigError::NotAnInteger {
                field,
                value: raw.to_owned(),
            })?;

            *count = usize::try_from(value)
                .ok()
                .filter(|&c| c > 0)
                .ok_or(ConfigError::NotPositive { field, value })?;
        }

        if let Some(extra) = values.next() {
            return Err(ConfigError::Trailing(extra.to_owned()));
        }

        let [load_stations, store_stations, add_stations, mult_stations, fp_registers] = counts;
        Ok(Self {
            load_stations,
            store_stations,
            add_stations,
            mult_stations,
            fp_registers,
        })
    }
}

impl fmt::Display for HardwareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Load : {} RS", self.load_stations)?;
        writeln!(f, "Store: {} RS", self.store_stations)?;
        writeln!(f, "Add  : {} RS", self.add_stations)?;
        writeln!(f, "Mult : {} RS", self.mult_stations)?;
        write!(f, "Float: {} Reg", self.fp_registers)
    }
}
