//! Per-tick orchestration of link, session, sampler and config.
//!
//! One `tick` runs the fixed sequence: link maintenance, session
//! maintenance, inbound drain, heartbeat, sampling/publication, deferred
//! status publication. Every step can fail without halting the tick.

use heapless::String;
use log::{debug, info};

use crate::config::RuntimeConfig;
use crate::link::{LinkManager, NetworkLink};
use crate::payload::{self, HEARTBEAT, HUMIDITY_UNIT, TEMPERATURE_UNIT};
use crate::sampler::{SensorProbe, SensorSampler};
use crate::session::{Credentials, MessageTransport, SessionManager};
use crate::topics::Topics;

/// Spacing of the status-channel heartbeat marker. Independent of the
/// sampling timer; simultaneous firing publishes both messages.
pub const HEARTBEAT_INTERVAL_MS: u64 = 5_000;

/// Capacity of a rendered wall-clock timestamp.
pub const TIMESTAMP_MAX: usize = 32;

/// Monotonic tick time plus an optional wall clock for record timestamps.
pub trait Clock {
    fn now_ms(&self) -> u64;
    /// UTC timestamp (ISO-8601-like), or `None` when no time source is
    /// available. Records are published either way.
    fn timestamp(&self) -> Option<String<TIMESTAMP_MAX>>;
}

pub struct TelemetryCoordinator<L, T, P, C> {
    link: LinkManager<L>,
    session: SessionManager<T>,
    sampler: SensorSampler<P>,
    clock: C,
    topics: Topics,
    client_id: &'static str,
    credentials: Option<Credentials<'static>>,
    last_heartbeat_ms: u64,
    last_sample_ms: u64,
}

impl<L, T, P, C> TelemetryCoordinator<L, T, P, C>
where
    L: NetworkLink,
    T: MessageTransport,
    P: SensorProbe,
    C: Clock,
{
    pub fn new(
        link: LinkManager<L>,
        session: SessionManager<T>,
        sampler: SensorSampler<P>,
        clock: C,
        topics: Topics,
        client_id: &'static str,
        credentials: Option<Credentials<'static>>,
    ) -> Self {
        Self {
            link,
            session,
            sampler,
            clock,
            topics,
            client_id,
            credentials,
            last_heartbeat_ms: 0,
            last_sample_ms: 0,
        }
    }

    /// One scheduler pass. Inbound messages are handed to `on_command`
    /// during the drain step.
    pub async fn tick(&mut self, cfg: &mut RuntimeConfig, on_command: &mut dyn FnMut(&str, &[u8])) {
        let now = self.clock.now_ms();

        // 1. Keep the link alive.
        let link_up = self.link.ensure_connected().await;

        // 2. Keep the session alive. A freshly established session gets the
        // command subscription back and announces the current status.
        let newly_connected = self
            .session
            .maintain(link_up, now, self.client_id, self.credentials)
            .await;
        if newly_connected {
            if let Err(e) = self.session.subscribe(link_up, &self.topics.command).await {
                debug!("coordinator: command subscribe failed: {:?}", e);
            }
            self.session
                .publish(link_up, &self.topics.status, cfg.status().as_bytes())
                .await;
            cfg.clear_status_dirty();
        }

        // 3. Deliver inbound work before any outbound publication.
        self.session.drain(link_up, on_command).await;

        let connected = self.session.connected(link_up);

        // 4. Heartbeat.
        if connected && now.wrapping_sub(self.last_heartbeat_ms) >= HEARTBEAT_INTERVAL_MS {
            self.session
                .publish(link_up, &self.topics.status, HEARTBEAT.as_bytes())
                .await;
            self.last_heartbeat_ms = now;
        }

        // 5. Sampling and publication. The timer resets even when the read
        // fails or the session is down; there is no catch-up behavior.
        if now.wrapping_sub(self.last_sample_ms) >= cfg.send_interval_ms() as u64 {
            self.last_sample_ms = now;
            if let Ok(reading) = self.sampler.read(now).await {
                if connected {
                    self.publish_reading(cfg, link_up, &reading).await;
                }
            }
        }

        // 6. Deferred status publication, every tick rather than on the
        // sampling interval, so config-triggered changes go out promptly.
        if connected && cfg.status_dirty() {
            info!("coordinator: publishing changed status \"{}\"", cfg.status());
            self.session
                .publish(link_up, &self.topics.status, cfg.status().as_bytes())
                .await;
            cfg.clear_status_dirty();
        }
    }

    async fn publish_reading(
        &mut self,
        cfg: &RuntimeConfig,
        link_up: bool,
        reading: &crate::sampler::Reading,
    ) {
        // Status-channel line goes out unconditionally.
        if let Ok(line) = payload::reading_line(reading) {
            self.session
                .publish(link_up, &self.topics.status, line.as_bytes())
                .await;
        }

        let timestamp = self.clock.timestamp().unwrap_or_default();

        if cfg.publish_temperature() {
            if let Ok(record) = payload::state_record(
                &timestamp,
                cfg.temp_sensor_id(),
                reading.temperature_c,
                TEMPERATURE_UNIT,
            ) {
                self.session
                    .publish(link_up, &self.topics.temperature_state, record.as_bytes())
                    .await;
            }
        }

        if cfg.publish_humidity() {
            if let Ok(record) = payload::state_record(
                &timestamp,
                cfg.hum_sensor_id(),
                reading.humidity_pct,
                HUMIDITY_UNIT,
            ) {
                self.session
                    .publish(link_up, &self.topics.humidity_state, record.as_bytes())
                    .await;
            }
        }
    }
}
