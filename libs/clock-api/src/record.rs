use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ════════════════════════════════════════════════════════════════
//  HashEntry
// ════════════════════════════════════════════════════════════════

/// One named sub-field of a store hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashEntry {
    pub name: String,
    pub value: String,
}

impl HashEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

impl From<(String, String)> for HashEntry {
    fn from((name, value): (String, String)) -> Self {
        Self { name, value }
    }
}

impl From<(&str, &str)> for HashEntry {
    fn from((name, value): (&str, &str)) -> Self {
        Self::new(name, value)
    }
}

impl PartialEq<(&str, &str)> for HashEntry {
    fn eq(&self, other: &(&str, &str)) -> bool {
        self.name == other.0 && self.value == other.1
    }
}

// ════════════════════════════════════════════════════════════════
//  ClockRecord
// ════════════════════════════════════════════════════════════════

/// A time clock device as cached by the benchmark.
///
/// `device_id` doubles as the partition sub-field / row key. The JSON
/// property names match the hash field names of the codec so both
/// layouts describe a record with the same vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockRecord {
    #[serde(rename = "DeviceId")]
    pub device_id: String,
    /// Always `device_id` lower-cased.
    #[serde(rename = "SerialNumber")]
    pub serial_number: String,
    #[serde(rename = "ClientId")]
    pub client_id: i32,
    #[serde(rename = "ClockGroupId")]
    pub group_id: Uuid,
}

impl ClockRecord {
    /// Build a record, deriving the serial number from `device_id`.
    pub fn new(device_id: impl Into<String>, client_id: i32, group_id: Uuid) -> Self {
        let device_id = device_id.into();
        let serial_number = device_id.to_lowercase();
        Self { device_id, serial_number, client_id, group_id }
    }
}
