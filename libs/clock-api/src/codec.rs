//! Record codec: `ClockRecord` ⇄ flat list of hash fields.
//!
//! Field names are fixed: `DeviceId`, `SerialNumber`, `ClientId`,
//! `ClockGroupId`. Decoding is lenient: unknown names are skipped and
//! missing names keep the default value. An empty input decodes to
//! `ClockRecord::default()`; deciding that this means "not found" is up
//! to the caller.

use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{ClockRecord, HashEntry};

pub const DEVICE_ID: &str = "DeviceId";
pub const SERIAL_NUMBER: &str = "SerialNumber";
pub const CLIENT_ID: &str = "ClientId";
pub const CLOCK_GROUP_ID: &str = "ClockGroupId";

type Setter = fn(&mut ClockRecord, &str) -> Result<(), StoreError>;

/// Field name → typed setter. Matching is case-sensitive.
const FIELDS: [(&str, Setter); 4] = [
    (DEVICE_ID, set_device_id),
    (SERIAL_NUMBER, set_serial_number),
    (CLIENT_ID, set_client_id),
    (CLOCK_GROUP_ID, set_group_id),
];

fn set_device_id(clock: &mut ClockRecord, value: &str) -> Result<(), StoreError> {
    clock.device_id = value.to_string();
    Ok(())
}

fn set_serial_number(clock: &mut ClockRecord, value: &str) -> Result<(), StoreError> {
    clock.serial_number = value.to_string();
    Ok(())
}

fn set_client_id(clock: &mut ClockRecord, value: &str) -> Result<(), StoreError> {
    clock.client_id = value
        .parse::<i32>()
        .map_err(|e| StoreError::from(e).with_context(format!("{CLIENT_ID} '{value}'")))?;
    Ok(())
}

fn set_group_id(clock: &mut ClockRecord, value: &str) -> Result<(), StoreError> {
    clock.group_id = Uuid::parse_str(value)
        .map_err(|e| StoreError::from(e).with_context(format!("{CLOCK_GROUP_ID} '{value}'")))?;
    Ok(())
}

/// Encode a record into exactly four hash fields.
pub fn encode(clock: &ClockRecord) -> Vec<HashEntry> {
    vec![
        HashEntry::new(DEVICE_ID, clock.device_id.as_str()),
        HashEntry::new(SERIAL_NUMBER, clock.serial_number.as_str()),
        HashEntry::new(CLIENT_ID, clock.client_id.to_string()),
        HashEntry::new(CLOCK_GROUP_ID, clock.group_id.hyphenated().to_string()),
    ]
}

/// Decode hash fields (any order) back into a record.
///
/// Fails with a `Format` error on a malformed `ClientId` or
/// `ClockGroupId`; in that case nothing of the partial record escapes.
pub fn decode(entries: &[HashEntry]) -> Result<ClockRecord, StoreError> {
    let mut clock = ClockRecord::default();
    for entry in entries {
        let setter = FIELDS
            .iter()
            .find(|(name, _)| *name == entry.name)
            .map(|(_, setter)| *setter);
        if let Some(set) = setter {
            set(&mut clock, &entry.value)?;
        }
    }
    Ok(clock)
}
