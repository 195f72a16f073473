use log::warn;

#[derive(Debug, PartialEq, Eq)]
pub enum LinkError {
    /// The bounded association attempt ran out of time.
    Timeout,
    /// The driver refused the association outright.
    Failed,
}

/// Wireless network link as seen by the coordinator.
///
/// `connect` must block only up to a bounded timeout (<=10s) and must not
/// retry internally; re-attempting is the caller's job on a later tick.
pub trait NetworkLink {
    fn is_up(&self) -> bool;
    async fn connect(&mut self) -> Result<(), LinkError>;
}

/// Owns the link lifecycle: connect-with-timeout, loss detection,
/// reconnect-on-loss. Failure is never fatal.
pub struct LinkManager<L> {
    link: L,
}

impl<L: NetworkLink> LinkManager<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    /// Returns whether the link is up after this tick's maintenance. A no-op
    /// when already up; otherwise triggers one bounded connect attempt and
    /// logs the outcome.
    pub async fn ensure_connected(&mut self) -> bool {
        if self.link.is_up() {
            return true;
        }
        match self.link.connect().await {
            Ok(()) => true,
            Err(e) => {
                warn!("link: connect attempt failed: {:?}", e);
                false
            }
        }
    }
}
