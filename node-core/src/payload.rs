//! MQTT payload formatting.
//!
//! Status-channel lines are free-form text; the temperature/humidity state
//! channels carry a fixed JSON record shape. Records are written with
//! `core::fmt` so the one-decimal `value` encoding is exact.

use core::fmt::{self, Write};

use heapless::String;

use crate::sampler::Reading;

/// Capacity of a formatted state record.
pub const RECORD_MAX: usize = 192;
/// Capacity of a status-channel reading line.
pub const LINE_MAX: usize = 48;

pub const TEMPERATURE_UNIT: &str = "°C";
pub const HUMIDITY_UNIT: &str = "%";

/// Marker published on the status channel every heartbeat interval.
pub const HEARTBEAT: &str = "heartbeat";

/// Human-readable status-channel line, e.g. `T=23.5C,H=45%`.
pub fn reading_line(reading: &Reading) -> Result<String<LINE_MAX>, fmt::Error> {
    let mut line = String::new();
    write!(
        line,
        "T={:.1}C,H={:.0}%",
        reading.temperature_c, reading.humidity_pct
    )?;
    Ok(line)
}

/// Structured state record for the temperature/humidity channels.
///
/// `timestamp` may be empty when no time source is available; publication is
/// never withheld because of that. `status` is always `"ok"` on this path,
/// since failed reads never produce a record at all.
pub fn state_record(
    timestamp: &str,
    sensor_id: &str,
    value: f32,
    unit: &str,
) -> Result<String<RECORD_MAX>, fmt::Error> {
    let mut record = String::new();
    write!(
        record,
        "{{\"timestamp\":\"{}\",\"sensor_id\":\"{}\",\"value\":{:.1},\
         \"unit\":\"{}\",\"status\":\"ok\"}}",
        timestamp, sensor_id, value, unit
    )?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_line_rounds_to_the_published_precision() {
        let line = reading_line(&Reading {
            temperature_c: 23.46,
            humidity_pct: 44.7,
        })
        .unwrap();
        assert_eq!(line.as_str(), "T=23.5C,H=45%");
    }

    #[test]
    fn state_record_has_the_fixed_field_set() {
        let record = state_record("2026-08-31T10:00:00Z", "temp-1", 21.04, TEMPERATURE_UNIT).unwrap();
        assert_eq!(
            record.as_str(),
            "{\"timestamp\":\"2026-08-31T10:00:00Z\",\"sensor_id\":\"temp-1\",\
             \"value\":21.0,\"unit\":\"°C\",\"status\":\"ok\"}"
        );
    }

    #[test]
    fn empty_timestamp_is_allowed() {
        let record = state_record("", "hum-1", 40.0, HUMIDITY_UNIT).unwrap();
        assert!(record.starts_with("{\"timestamp\":\"\","));
    }
}
