/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM (internal memory)
pub const HEAP_SIZE: usize = 72 * 1024;

/// Pause between coordinator ticks
pub const TICK_INTERVAL_MS: u64 = 100;

/// Upper bound for one Wi-Fi association attempt
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Delay before the supervisor re-arms after an association loss
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;

/// Size of the TCP socket buffers for the MQTT session
pub const MQTT_TCP_BUFFER_SIZE: usize = 1024;
/// Size of the MQTT client packet buffers
pub const MQTT_BUFFER_SIZE: usize = 1024;
/// Upper bound for broker TCP connection establishment
pub const MQTT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// MQTT keep-alive advertised to the broker (seconds)
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;
/// Spacing of client-initiated keep-alive pings (seconds)
pub const MQTT_PING_INTERVAL_SECS: u64 = 15;

/// Size of the TCP socket buffers for the HTTP endpoint
pub const HTTP_TCP_BUFFER_SIZE: usize = 1024;
/// Size of the HTTP request buffer (request line + headers + body)
pub const HTTP_REQUEST_MAX: usize = 1024;
/// Inactivity timeout on accepted HTTP connections
pub const HTTP_SOCKET_TIMEOUT_SECS: u64 = 10;
