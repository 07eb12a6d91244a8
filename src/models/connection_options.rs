use serde::{Deserialize, Serialize};

/// Connection-level options for the order feed client.
///
/// These options control connection behavior:
/// - Automatic reconnection on connection loss
/// - Reconnection timing and retry limits
/// - Handshake timeout and keepalive pings
///
/// # Example
///
/// ```rust
/// use comanda_link::ConnectionOptions;
///
/// let options = ConnectionOptions::default()
///     .with_auto_reconnect(true)
///     .with_reconnect_delay_ms(2000)
///     .with_max_reconnect_attempts(Some(10));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Enable automatic reconnection on connection loss.
    /// Default: true.
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Initial delay in milliseconds between reconnection attempts.
    /// Default: 1000ms. Doubles per scheduled attempt up to
    /// `max_reconnect_delay_ms`.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Ceiling on the delay between reconnection attempts.
    /// Default: 30000ms.
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Maximum number of reconnection attempts before giving up.
    /// Default: None (retry indefinitely, matching the server's own
    /// expectation that idle staff terminals stay subscribed overnight).
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,

    /// Timeout for the TCP/TLS/WebSocket handshake in milliseconds.
    /// Set to `0` to wait indefinitely. Default: 10000ms.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Keepalive Ping interval in milliseconds, applied while the
    /// connection is idle. Set to `0` to disable. Default: 30000ms.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    /// Maximum time to wait for any frame after sending a keepalive Ping.
    /// When nothing arrives within this window the connection is treated
    /// as dead and torn down. Set to `0` to disable. Default: 5000ms.
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30000
}

fn default_connect_timeout_ms() -> u64 {
    10000
}

fn default_ping_interval_ms() -> u64 {
    30000
}

fn default_pong_timeout_ms() -> u64 {
    5000
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 30000,
            max_reconnect_attempts: None,
            connect_timeout_ms: 10000,
            ping_interval_ms: 30000,
            pong_timeout_ms: 5000,
        }
    }
}

impl ConnectionOptions {
    /// Create connection options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to automatically reconnect on connection loss.
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Set the initial delay between reconnection attempts (in milliseconds).
    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Set the maximum delay between reconnection attempts (in milliseconds).
    pub fn with_max_reconnect_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_reconnect_delay_ms = max_delay_ms;
        self
    }

    /// Set the maximum number of reconnection attempts.
    /// Pass `None` for indefinite retries.
    pub fn with_max_reconnect_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }

    /// Set the handshake timeout in milliseconds. `0` waits indefinitely.
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the keepalive Ping interval in milliseconds. `0` disables pings.
    pub fn with_ping_interval_ms(mut self, ms: u64) -> Self {
        self.ping_interval_ms = ms;
        self
    }

    /// Set the pong timeout in milliseconds. `0` disables the check.
    pub fn with_pong_timeout_ms(mut self, ms: u64) -> Self {
        self.pong_timeout_ms = ms;
        self
    }
}
