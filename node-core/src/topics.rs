use core::fmt::{self, Write};

use heapless::String;

/// Capacity of a full topic name.
pub const TOPIC_MAX: usize = 96;

/// The fixed channel set of one node, derived from the compile-time topic
/// roots: device status/heartbeat, inbound commands, and the structured
/// temperature/humidity state channels.
pub struct Topics {
    pub status: String<TOPIC_MAX>,
    pub command: String<TOPIC_MAX>,
    pub temperature_state: String<TOPIC_MAX>,
    pub humidity_state: String<TOPIC_MAX>,
}

impl Topics {
    /// `base` roots the status/command channels; `state_prefix` roots the
    /// sensor state channels (e.g. `iiot/group/doe-smith`).
    pub fn new(base: &str, state_prefix: &str) -> Result<Self, fmt::Error> {
        let mut status = String::new();
        write!(status, "{}/status", base)?;
        let mut command = String::new();
        write!(command, "{}/cmd", base)?;
        let mut temperature_state = String::new();
        write!(temperature_state, "{}/sensor/temperature/state", state_prefix)?;
        let mut humidity_state = String::new();
        write!(humidity_state, "{}/sensor/humidity/state", state_prefix)?;
        Ok(Self {
            status,
            command,
            temperature_state,
            humidity_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_derive_from_the_roots() {
        let topics = Topics::new("iiot/node/test", "iiot/group/doe-smith").unwrap();
        assert_eq!(topics.status.as_str(), "iiot/node/test/status");
        assert_eq!(topics.command.as_str(), "iiot/node/test/cmd");
        assert_eq!(
            topics.temperature_state.as_str(),
            "iiot/group/doe-smith/sensor/temperature/state"
        );
        assert_eq!(
            topics.humidity_state.as_str(),
            "iiot/group/doe-smith/sensor/humidity/state"
        );
    }

    #[test]
    fn oversized_roots_are_rejected() {
        let long = [b'x'; TOPIC_MAX];
        let long = core::str::from_utf8(&long).unwrap();
        assert!(Topics::new(long, "p").is_err());
    }
}
