//! REST semantics of the configuration endpoint.
//!
//! The HTTP transport is a collaborator: it hands over the method and the
//! raw request body and writes back whatever status code and JSON body
//! [`handle_request`] produces. Everything observable about the endpoint
//! (snapshot shape, patch validation, status codes) lives here so it can be
//! exercised on the host.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::config::{RuntimeConfig, SENSOR_ID_MAX, STATUS_MAX};

/// Capacity of a rendered response body.
pub const RESPONSE_MAX: usize = 384;

#[derive(Debug, PartialEq, Eq)]
pub enum RestError {
    /// Request body missing or not parseable as a partial config record.
    BadRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Options,
    Get,
    Post,
}

/// Status code and body the transport writes back verbatim.
pub struct HttpReply {
    pub status: u16,
    pub body: String<RESPONSE_MAX>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigSnapshot<'a> {
    status: &'a str,
    send_interval_ms: u32,
    publish_temperature: bool,
    publish_humidity: bool,
    temp_sensor_id: &'a str,
    hum_sensor_id: &'a str,
}

/// Gate for POST bodies: deserializing this skips every field, so it
/// succeeds on any JSON object and fails on everything else.
#[derive(Deserialize)]
struct PatchProbe {}

// Each recognized field is parsed through its own one-field record, so a
// wrong-typed value fails only that field's parse and is skipped exactly
// like an unknown field. The streaming deserializer cannot recover from a
// type mismatch mid-body, which rules out one shared patch record.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusField {
    status: Option<String<STATUS_MAX>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendIntervalField {
    send_interval_ms: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishTemperatureField {
    publish_temperature: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishHumidityField {
    publish_humidity: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TempSensorIdField {
    temp_sensor_id: Option<String<SENSOR_ID_MAX>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HumSensorIdField {
    hum_sensor_id: Option<String<SENSOR_ID_MAX>>,
}

fn parse_field<'de, T: Deserialize<'de>>(body: &'de [u8]) -> Option<T> {
    serde_json_core::from_slice(body).ok().map(|(value, _)| value)
}

/// Renders the full configuration snapshot as a flat JSON record.
pub fn snapshot_json(cfg: &RuntimeConfig) -> Result<String<RESPONSE_MAX>, RestError> {
    let snapshot = ConfigSnapshot {
        status: cfg.status(),
        send_interval_ms: cfg.send_interval_ms(),
        publish_temperature: cfg.publish_temperature(),
        publish_humidity: cfg.publish_humidity(),
        temp_sensor_id: cfg.temp_sensor_id(),
        hum_sensor_id: cfg.hum_sensor_id(),
    };
    serde_json_core::to_string(&snapshot).map_err(|_| RestError::BadRequest)
}

/// Parses a partial record and applies every recognized, well-typed field.
///
/// Fields are validated and assigned independently; there is no rollback.
/// Unknown and wrong-typed fields are skipped. Only a body that does not
/// parse as a JSON object is rejected, before any field is touched.
pub fn apply_patch(cfg: &mut RuntimeConfig, body: &[u8]) -> Result<(), RestError> {
    serde_json_core::from_slice::<PatchProbe>(body).map_err(|_| RestError::BadRequest)?;

    if let Some(StatusField {
        status: Some(status),
    }) = parse_field(body)
    {
        cfg.set_status(&status);
    }
    if let Some(SendIntervalField {
        send_interval_ms: Some(interval_ms),
    }) = parse_field(body)
    {
        cfg.set_send_interval_ms(interval_ms);
    }
    if let Some(PublishTemperatureField {
        publish_temperature: Some(enabled),
    }) = parse_field(body)
    {
        cfg.set_publish_temperature(enabled);
    }
    if let Some(PublishHumidityField {
        publish_humidity: Some(enabled),
    }) = parse_field(body)
    {
        cfg.set_publish_humidity(enabled);
    }
    if let Some(TempSensorIdField {
        temp_sensor_id: Some(id),
    }) = parse_field(body)
    {
        cfg.set_temp_sensor_id(&id);
    }
    if let Some(HumSensorIdField {
        hum_sensor_id: Some(id),
    }) = parse_field(body)
    {
        cfg.set_hum_sensor_id(&id);
    }
    Ok(())
}

/// Full endpoint behavior for the configuration path.
pub fn handle_request(cfg: &mut RuntimeConfig, method: Method, body: Option<&[u8]>) -> HttpReply {
    match method {
        Method::Options => HttpReply {
            status: 204,
            body: String::new(),
        },
        Method::Get => snapshot_reply(cfg),
        Method::Post => {
            let Some(body) = body else {
                return error_reply("missing body");
            };
            match apply_patch(cfg, body) {
                Ok(()) => snapshot_reply(cfg),
                Err(RestError::BadRequest) => error_reply("invalid json"),
            }
        }
    }
}

fn snapshot_reply(cfg: &RuntimeConfig) -> HttpReply {
    match snapshot_json(cfg) {
        Ok(body) => HttpReply { status: 200, body },
        Err(_) => HttpReply {
            status: 500,
            body: String::new(),
        },
    }
}

fn error_reply(reason: &str) -> HttpReply {
    use core::fmt::Write;
    let mut body = String::new();
    write!(body, "{{\"error\":\"{}\"}}", reason).ok();
    HttpReply { status: 400, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_renders_full_snapshot() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(&mut cfg, Method::Get, None);
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body.as_str(),
            "{\"status\":\"online\",\"sendIntervalMs\":2000,\
             \"publishTemperature\":true,\"publishHumidity\":true,\
             \"tempSensorId\":\"temp-1\",\"humSensorId\":\"hum-1\"}"
        );
    }

    #[test]
    fn options_is_no_content() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(&mut cfg, Method::Options, None);
        assert_eq!(reply.status, 204);
        assert!(reply.body.is_empty());
    }

    #[test]
    fn interval_floor_applies_on_patch_round_trip() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(&mut cfg, Method::Post, Some(b"{\"sendIntervalMs\":500}"));
        assert_eq!(reply.status, 200);
        let get = handle_request(&mut cfg, Method::Get, None);
        assert!(get.body.contains("\"sendIntervalMs\":1000"));
    }

    #[test]
    fn unparseable_body_is_rejected_without_mutation() {
        let mut cfg = RuntimeConfig::default();
        let before = handle_request(&mut cfg, Method::Get, None).body;

        let reply = handle_request(&mut cfg, Method::Post, Some(b"{not json"));
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("error"));

        let after = handle_request(&mut cfg, Method::Get, None).body;
        assert_eq!(before, after);
    }

    #[test]
    fn missing_body_is_rejected() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(&mut cfg, Method::Post, None);
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn empty_sensor_id_is_silently_ignored() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(&mut cfg, Method::Post, Some(b"{\"tempSensorId\":\"\"}"));
        assert_eq!(reply.status, 200);
        assert_eq!(cfg.temp_sensor_id(), "temp-1");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut cfg = RuntimeConfig::default();
        let before = snapshot_json(&cfg).unwrap();
        let reply = handle_request(&mut cfg, Method::Post, Some(b"{\"bogus\":1}"));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, before);
    }

    #[test]
    fn wrong_typed_field_is_skipped_not_rejected() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(
            &mut cfg,
            Method::Post,
            Some(b"{\"publishTemperature\":\"yes\"}"),
        );
        assert_eq!(reply.status, 200);
        assert!(cfg.publish_temperature(), "mismatched value must not apply");
    }

    #[test]
    fn well_typed_fields_apply_beside_a_wrong_typed_one() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(
            &mut cfg,
            Method::Post,
            Some(b"{\"publishTemperature\":\"yes\",\"publishHumidity\":false}"),
        );
        assert_eq!(reply.status, 200);
        assert!(cfg.publish_temperature());
        assert!(!cfg.publish_humidity());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let mut cfg = RuntimeConfig::default();
        let reply = handle_request(&mut cfg, Method::Post, Some(b"[1,2,3]"));
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn no_recognized_fields_is_an_accepted_no_op() {
        let mut cfg = RuntimeConfig::default();
        let before = snapshot_json(&cfg).unwrap();
        let reply = handle_request(&mut cfg, Method::Post, Some(b"{}"));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, before);
    }

    #[test]
    fn status_patch_raises_dirty_flag_only_on_change() {
        let mut cfg = RuntimeConfig::default();
        apply_patch(&mut cfg, b"{\"status\":\"online\"}").unwrap();
        assert!(!cfg.status_dirty());
        apply_patch(&mut cfg, b"{\"status\":\"degraded\"}").unwrap();
        assert!(cfg.status_dirty());
        assert_eq!(cfg.status(), "degraded");
    }

    #[test]
    fn independent_fields_apply_together() {
        let mut cfg = RuntimeConfig::default();
        apply_patch(
            &mut cfg,
            b"{\"publishTemperature\":false,\"publishHumidity\":false,\
               \"humSensorId\":\"hum-42\"}",
        )
        .unwrap();
        assert!(!cfg.publish_temperature());
        assert!(!cfg.publish_humidity());
        assert_eq!(cfg.hum_sensor_id(), "hum-42");
    }
}
