use heapless::String;
use log::{info, warn};

/// Capacity of the broker hostname.
pub const BROKER_HOST_MAX: usize = 64;

/// Fixed delay between failed reconnect attempts. Deliberately not
/// exponential.
pub const RECONNECT_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Network link is down; no session work is possible.
    LinkDown,
    /// `configure` has not been called yet.
    NotConfigured,
    /// The link is up but no broker session is established.
    NotConnected,
    /// Transport-level or protocol-level connection failure.
    BrokerRejected,
}

/// Optional username/password pair for the broker.
pub type Credentials<'a> = (&'a str, &'a str);

/// Publish/subscribe transport beneath the session manager.
///
/// `connect` performs exactly one establishment attempt. `drain` hands every
/// queued inbound message to the handler and returns without blocking on new
/// traffic.
pub trait MessageTransport {
    async fn connect(
        &mut self,
        host: &str,
        port: u16,
        client_id: &str,
        credentials: Option<Credentials<'_>>,
    ) -> Result<(), SessionError>;
    fn is_connected(&self) -> bool;
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError>;
    async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;
    async fn drain(&mut self, handler: &mut dyn FnMut(&str, &[u8]));
}

/// Owns the messaging-broker session lifecycle: fail-fast connect, fixed
/// backoff reconnects, inbound dispatch and fire-and-forget publishes.
///
/// The session holds no mid-attempt state across ticks; transitions are
/// driven solely by `connect` outcomes and the externally observed link
/// state. When the link drops, the session counts as disconnected no matter
/// what the transport last reported.
pub struct SessionManager<T> {
    transport: T,
    broker: Option<(String<BROKER_HOST_MAX>, u16)>,
    next_retry_ms: Option<u64>,
}

impl<T: MessageTransport> SessionManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            broker: None,
            next_retry_ms: None,
        }
    }

    /// Sets the broker destination. Idempotent; callable once before the
    /// first connect.
    pub fn configure(&mut self, host: &str, port: u16) {
        let mut stored = String::new();
        stored.push_str(host).ok();
        self.broker = Some((stored, port));
    }

    pub fn connected(&self, link_up: bool) -> bool {
        link_up && self.transport.is_connected()
    }

    /// One session establishment attempt. Fails fast with a typed error if
    /// the link is down or no broker is configured; never retries
    /// internally.
    pub async fn connect(
        &mut self,
        link_up: bool,
        client_id: &str,
        credentials: Option<Credentials<'_>>,
    ) -> Result<(), SessionError> {
        let (host, port) = self.broker.as_ref().ok_or(SessionError::NotConfigured)?;
        if !link_up {
            return Err(SessionError::LinkDown);
        }
        info!("session: connecting to {}:{}", host, port);
        self.transport
            .connect(host, *port, client_id, credentials)
            .await
    }

    /// Non-blocking per-tick reconnection driver. Returns `true` when this
    /// call established a fresh session.
    ///
    /// No-op while the link is down or the session is connected. Otherwise a
    /// single attempt is made once the scheduled retry timestamp (if any)
    /// has passed; on failure the next attempt is scheduled at
    /// `now + RECONNECT_INTERVAL_MS`, on success the schedule is cleared so
    /// a later disconnect retries on the next eligible tick.
    pub async fn maintain(
        &mut self,
        link_up: bool,
        now_ms: u64,
        client_id: &str,
        credentials: Option<Credentials<'_>>,
    ) -> bool {
        if !link_up || self.transport.is_connected() {
            return false;
        }
        if let Some(at) = self.next_retry_ms {
            if now_ms < at {
                return false;
            }
        }
        match self.connect(link_up, client_id, credentials).await {
            Ok(()) => {
                info!("session: connected");
                self.next_retry_ms = None;
                true
            }
            Err(e) => {
                warn!(
                    "session: connect failed ({:?}), retrying in {}ms",
                    e, RECONNECT_INTERVAL_MS
                );
                self.next_retry_ms = Some(now_ms + RECONNECT_INTERVAL_MS);
                false
            }
        }
    }

    /// Services the inbound queue, invoking the handler once per delivered
    /// message. A no-op when not connected.
    pub async fn drain(&mut self, link_up: bool, handler: &mut dyn FnMut(&str, &[u8])) {
        if !self.connected(link_up) {
            return;
        }
        self.transport.drain(handler).await;
    }

    /// Fire-and-forget publish: no delivery confirmation, no retry, and a
    /// silent no-op when not connected.
    pub async fn publish(&mut self, link_up: bool, topic: &str, payload: &[u8]) {
        if !self.connected(link_up) {
            return;
        }
        if let Err(e) = self.transport.publish(topic, payload).await {
            warn!("session: publish to {} failed: {:?}", topic, e);
        }
    }

    /// Registers interest in a topic; valid only while connected.
    pub async fn subscribe(&mut self, link_up: bool, topic: &str) -> Result<(), SessionError> {
        if !link_up {
            return Err(SessionError::LinkDown);
        }
        if !self.transport.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.transport.subscribe(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_futures::block_on;

    struct FlakyTransport {
        connected: bool,
        accept_connects: bool,
        attempts: Cell<u32>,
        published: u32,
    }

    impl FlakyTransport {
        fn new(accept_connects: bool) -> Self {
            Self {
                connected: false,
                accept_connects,
                attempts: Cell::new(0),
                published: 0,
            }
        }
    }

    impl MessageTransport for FlakyTransport {
        async fn connect(
            &mut self,
            _host: &str,
            _port: u16,
            _client_id: &str,
            _credentials: Option<Credentials<'_>>,
        ) -> Result<(), SessionError> {
            self.attempts.set(self.attempts.get() + 1);
            if self.accept_connects {
                self.connected = true;
                Ok(())
            } else {
                Err(SessionError::BrokerRejected)
            }
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), SessionError> {
            self.published += 1;
            Ok(())
        }

        async fn subscribe(&mut self, _topic: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn drain(&mut self, _handler: &mut dyn FnMut(&str, &[u8])) {}
    }

    #[test]
    fn connect_fails_fast_when_not_configured() {
        let mut session = SessionManager::new(FlakyTransport::new(true));
        let err = block_on(session.connect(true, "node", None)).unwrap_err();
        assert_eq!(err, SessionError::NotConfigured);
    }

    #[test]
    fn connect_fails_fast_when_link_is_down() {
        let mut session = SessionManager::new(FlakyTransport::new(true));
        session.configure("broker.local", 1883);
        let err = block_on(session.connect(false, "node", None)).unwrap_err();
        assert_eq!(err, SessionError::LinkDown);
        assert_eq!(session.transport.attempts.get(), 0);
    }

    #[test]
    fn maintain_honors_the_backoff_schedule() {
        let mut session = SessionManager::new(FlakyTransport::new(false));
        session.configure("broker.local", 1883);

        assert!(!block_on(session.maintain(true, 0, "node", None)));
        assert_eq!(session.transport.attempts.get(), 1);

        // Before the scheduled timestamp: no attempt at all.
        assert!(!block_on(session.maintain(true, 4_999, "node", None)));
        assert_eq!(session.transport.attempts.get(), 1);

        // At the timestamp: exactly one more attempt.
        assert!(!block_on(session.maintain(true, 5_000, "node", None)));
        assert_eq!(session.transport.attempts.get(), 2);
    }

    #[test]
    fn maintain_clears_the_schedule_on_success() {
        let mut session = SessionManager::new(FlakyTransport::new(false));
        session.configure("broker.local", 1883);
        assert!(!block_on(session.maintain(true, 0, "node", None)));

        session.transport.accept_connects = true;
        assert!(block_on(session.maintain(true, 5_000, "node", None)));
        assert!(session.next_retry_ms.is_none());

        // A later disconnect may retry immediately on the next tick.
        session.transport.connected = false;
        session.transport.accept_connects = false;
        assert!(!block_on(session.maintain(true, 5_100, "node", None)));
        assert_eq!(session.transport.attempts.get(), 3);
    }

    #[test]
    fn maintain_is_a_no_op_when_link_down_or_connected() {
        let mut session = SessionManager::new(FlakyTransport::new(true));
        session.configure("broker.local", 1883);

        assert!(!block_on(session.maintain(false, 0, "node", None)));
        assert_eq!(session.transport.attempts.get(), 0);

        assert!(block_on(session.maintain(true, 0, "node", None)));
        assert!(!block_on(session.maintain(true, 10, "node", None)));
        assert_eq!(session.transport.attempts.get(), 1);
    }

    #[test]
    fn subscribe_errors_name_the_failing_layer() {
        let mut session = SessionManager::new(FlakyTransport::new(true));
        session.configure("broker.local", 1883);

        let err = block_on(session.subscribe(false, "t")).unwrap_err();
        assert_eq!(err, SessionError::LinkDown);

        let err = block_on(session.subscribe(true, "t")).unwrap_err();
        assert_eq!(err, SessionError::NotConnected);

        block_on(session.connect(true, "node", None)).unwrap();
        assert!(block_on(session.subscribe(true, "t")).is_ok());
    }

    #[test]
    fn publish_is_a_silent_no_op_when_disconnected() {
        let mut session = SessionManager::new(FlakyTransport::new(true));
        session.configure("broker.local", 1883);
        block_on(session.publish(true, "t", b"x"));
        assert_eq!(session.transport.published, 0);

        block_on(session.connect(true, "node", None)).unwrap();
        block_on(session.publish(true, "t", b"x"));
        assert_eq!(session.transport.published, 1);

        // Link drop makes the session count as disconnected.
        block_on(session.publish(false, "t", b"x"));
        assert_eq!(session.transport.published, 1);
    }
}
