//! Connectivity status reported to the host.

/// Connectivity status of the device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// A connection attempt is in progress
    Connecting,
    /// The session is established and live
    Online,
    /// The session is down, with the reason it went down
    Offline(OfflineReason),
}

/// Why a session is offline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineReason {
    /// Orderly shutdown, no error
    None,
    /// Bad host or port; the client will not retry until reconfigured
    ConfigurationError(String),
    /// Transient I/O failure; the client retries after the reconnect interval
    CommunicationError(String),
    /// A blocking operation was cancelled during teardown
    Interrupted,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Online => write!(f, "online"),
            ConnectionStatus::Offline(reason) => write!(f, "offline ({reason})"),
        }
    }
}

impl std::fmt::Display for OfflineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfflineReason::None => write!(f, "none"),
            OfflineReason::ConfigurationError(msg) => {
                write!(f, "configuration error: {msg}")
            }
            OfflineReason::CommunicationError(msg) => {
                write!(f, "communication error: {msg}")
            }
            OfflineReason::Interrupted => write!(f, "interrupted"),
        }
    }
}
