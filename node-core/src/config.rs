use heapless::String;

/// Capacity of the free-form status string.
pub const STATUS_MAX: usize = 64;
/// Capacity of a sensor identifier.
pub const SENSOR_ID_MAX: usize = 32;

/// Floor for the publish interval, matching the ~1s refresh limit of the
/// DHT11 sensor hardware.
pub const MIN_SEND_INTERVAL_MS: u32 = 1_000;

/// Compile-time defaults the runtime configuration is seeded from.
pub struct ConfigDefaults {
    pub status: &'static str,
    pub send_interval_ms: u32,
    pub publish_temperature: bool,
    pub publish_humidity: bool,
    pub temp_sensor_id: &'static str,
    pub hum_sensor_id: &'static str,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            status: "online",
            send_interval_ms: 2_000,
            publish_temperature: true,
            publish_humidity: true,
            temp_sensor_id: "temp-1",
            hum_sensor_id: "hum-1",
        }
    }
}

/// Mutable, process-wide runtime configuration.
///
/// Mutated by the config endpoint, read by the telemetry coordinator each
/// tick. All mutation goes through the setters so the interval floor and the
/// dirty-flag discipline hold on every path.
pub struct RuntimeConfig {
    status: String<STATUS_MAX>,
    send_interval_ms: u32,
    publish_temperature: bool,
    publish_humidity: bool,
    temp_sensor_id: String<SENSOR_ID_MAX>,
    hum_sensor_id: String<SENSOR_ID_MAX>,
    status_dirty: bool,
}

impl RuntimeConfig {
    pub fn new(defaults: &ConfigDefaults) -> Self {
        let mut cfg = Self {
            status: String::new(),
            send_interval_ms: defaults.send_interval_ms.max(MIN_SEND_INTERVAL_MS),
            publish_temperature: defaults.publish_temperature,
            publish_humidity: defaults.publish_humidity,
            temp_sensor_id: String::new(),
            hum_sensor_id: String::new(),
            status_dirty: false,
        };
        cfg.status.push_str(defaults.status).ok();
        cfg.temp_sensor_id.push_str(defaults.temp_sensor_id).ok();
        cfg.hum_sensor_id.push_str(defaults.hum_sensor_id).ok();
        cfg
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Assigns a new status string. The dirty flag is raised only when the
    /// value actually changes; re-setting the current value is a no-op for
    /// the flag. Empty or oversized values are ignored.
    pub fn set_status(&mut self, status: &str) {
        if status.is_empty() || status.len() > STATUS_MAX {
            return;
        }
        if self.status.as_str() != status {
            self.status.clear();
            self.status.push_str(status).ok();
            self.status_dirty = true;
        }
    }

    pub fn send_interval_ms(&self) -> u32 {
        self.send_interval_ms
    }

    /// Assigns the publish interval, clamped to the sensor refresh floor.
    /// Negative encodings clamp like any other under-floor value.
    pub fn set_send_interval_ms(&mut self, interval_ms: i64) {
        self.send_interval_ms = if interval_ms < MIN_SEND_INTERVAL_MS as i64 {
            MIN_SEND_INTERVAL_MS
        } else if interval_ms > u32::MAX as i64 {
            u32::MAX
        } else {
            interval_ms as u32
        };
    }

    pub fn publish_temperature(&self) -> bool {
        self.publish_temperature
    }

    pub fn set_publish_temperature(&mut self, enabled: bool) {
        self.publish_temperature = enabled;
    }

    pub fn publish_humidity(&self) -> bool {
        self.publish_humidity
    }

    pub fn set_publish_humidity(&mut self, enabled: bool) {
        self.publish_humidity = enabled;
    }

    pub fn temp_sensor_id(&self) -> &str {
        &self.temp_sensor_id
    }

    /// Assigns the temperature sensor id; empty or oversized ids are
    /// silently ignored.
    pub fn set_temp_sensor_id(&mut self, id: &str) {
        if id.is_empty() || id.len() > SENSOR_ID_MAX {
            return;
        }
        self.temp_sensor_id.clear();
        self.temp_sensor_id.push_str(id).ok();
    }

    pub fn hum_sensor_id(&self) -> &str {
        &self.hum_sensor_id
    }

    pub fn set_hum_sensor_id(&mut self, id: &str) {
        if id.is_empty() || id.len() > SENSOR_ID_MAX {
            return;
        }
        self.hum_sensor_id.clear();
        self.hum_sensor_id.push_str(id).ok();
    }

    /// True iff the current status value has not been transmitted on the
    /// status channel since it was last set.
    pub fn status_dirty(&self) -> bool {
        self.status_dirty
    }

    /// Cleared by the publishing step that consumes the pending status.
    pub fn clear_status_dirty(&mut self) {
        self.status_dirty = false;
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(&ConfigDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.status(), "online");
        assert_eq!(cfg.send_interval_ms(), 2_000);
        assert!(cfg.publish_temperature());
        assert!(cfg.publish_humidity());
        assert_eq!(cfg.temp_sensor_id(), "temp-1");
        assert_eq!(cfg.hum_sensor_id(), "hum-1");
        assert!(!cfg.status_dirty());
    }

    #[test]
    fn interval_floor_holds_on_every_path() {
        let mut cfg = RuntimeConfig::default();
        cfg.set_send_interval_ms(0);
        assert_eq!(cfg.send_interval_ms(), MIN_SEND_INTERVAL_MS);
        cfg.set_send_interval_ms(-500);
        assert_eq!(cfg.send_interval_ms(), MIN_SEND_INTERVAL_MS);
        cfg.set_send_interval_ms(999);
        assert_eq!(cfg.send_interval_ms(), MIN_SEND_INTERVAL_MS);
        cfg.set_send_interval_ms(1_000);
        assert_eq!(cfg.send_interval_ms(), 1_000);
        cfg.set_send_interval_ms(60_000);
        assert_eq!(cfg.send_interval_ms(), 60_000);

        let low = RuntimeConfig::new(&ConfigDefaults {
            send_interval_ms: 10,
            ..ConfigDefaults::default()
        });
        assert_eq!(low.send_interval_ms(), MIN_SEND_INTERVAL_MS);
    }

    #[test]
    fn status_dirty_tracks_changes_only() {
        let mut cfg = RuntimeConfig::default();
        cfg.set_status("online");
        assert!(!cfg.status_dirty(), "idempotent set must not raise the flag");
        cfg.set_status("maintenance");
        assert!(cfg.status_dirty());
        cfg.clear_status_dirty();
        cfg.set_status("maintenance");
        assert!(!cfg.status_dirty());
    }

    #[test]
    fn empty_identifiers_are_ignored() {
        let mut cfg = RuntimeConfig::default();
        cfg.set_temp_sensor_id("");
        cfg.set_hum_sensor_id("");
        cfg.set_status("");
        assert_eq!(cfg.temp_sensor_id(), "temp-1");
        assert_eq!(cfg.hum_sensor_id(), "hum-1");
        assert_eq!(cfg.status(), "online");
        assert!(!cfg.status_dirty());
    }
}
