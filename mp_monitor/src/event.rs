//! ABOUTME: Command and connection pool events delivered by the MongoDB driver
//! ABOUTME: Immutable records, each handled once and never retained

use std::{convert::Infallible, fmt, str::FromStr, time::Duration};

/// Fields shared by succeeded and failed command events
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFinishedEvent {
    pub command_name: String,
    pub duration: Duration,
    pub request_id: i32,
}

impl CommandFinishedEvent {
    pub fn new(command_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            command_name: command_name.into(),
            duration,
            request_id: 0,
        }
    }

    pub fn with_request_id(mut self, request_id: i32) -> Self {
        self.request_id = request_id;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSucceededEvent {
    pub finished: CommandFinishedEvent,
}

impl CommandSucceededEvent {
    pub fn new(command_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            finished: CommandFinishedEvent::new(command_name, duration),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailedEvent {
    pub finished: CommandFinishedEvent,
    /// Server or network error as reported by the driver
    pub failure: String,
}

impl CommandFailedEvent {
    pub fn new(
        command_name: impl Into<String>,
        duration: Duration,
        failure: impl Into<String>,
    ) -> Self {
        Self {
            finished: CommandFinishedEvent::new(command_name, duration),
            failure: failure.into(),
        }
    }
}

/// Pool lifecycle transitions reported by the driver
///
/// Kinds this crate does not know about are kept as [`PoolEventKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolEventKind {
    PoolCreated,
    PoolReady,
    PoolCleared,
    PoolClosed,
    ConnectionCreated,
    ConnectionReady,
    ConnectionClosed,
    GetStarted,
    GetFailed,
    GetSucceeded,
    ConnectionReturned,
    Other(String),
}

impl PoolEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            PoolEventKind::PoolCreated => "ConnectionPoolCreated",
            PoolEventKind::PoolReady => "ConnectionPoolReady",
            PoolEventKind::PoolCleared => "ConnectionPoolCleared",
            PoolEventKind::PoolClosed => "ConnectionPoolClosed",
            PoolEventKind::ConnectionCreated => "ConnectionCreated",
            PoolEventKind::ConnectionReady => "ConnectionReady",
            PoolEventKind::ConnectionClosed => "ConnectionClosed",
            PoolEventKind::GetStarted => "ConnectionCheckOutStarted",
            PoolEventKind::GetFailed => "ConnectionCheckOutFailed",
            PoolEventKind::GetSucceeded => "ConnectionCheckedOut",
            PoolEventKind::ConnectionReturned => "ConnectionCheckedIn",
            PoolEventKind::Other(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for PoolEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses driver type strings; never fails, unknown names become `Other`
impl FromStr for PoolEventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ConnectionPoolCreated" => PoolEventKind::PoolCreated,
            "ConnectionPoolReady" => PoolEventKind::PoolReady,
            "ConnectionPoolCleared" => PoolEventKind::PoolCleared,
            "ConnectionPoolClosed" => PoolEventKind::PoolClosed,
            "ConnectionCreated" => PoolEventKind::ConnectionCreated,
            "ConnectionReady" => PoolEventKind::ConnectionReady,
            "ConnectionClosed" => PoolEventKind::ConnectionClosed,
            "ConnectionCheckOutStarted" => PoolEventKind::GetStarted,
            "ConnectionCheckOutFailed" => PoolEventKind::GetFailed,
            "ConnectionCheckedOut" => PoolEventKind::GetSucceeded,
            "ConnectionCheckedIn" => PoolEventKind::ConnectionReturned,
            other => PoolEventKind::Other(other.to_string()),
        })
    }
}

/// Configured pool bounds carried by some pool events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSizeOptions {
    pub min_pool_size: u64,
    pub max_pool_size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolEvent {
    pub kind: PoolEventKind,
    /// Server address the pool belongs to
    pub address: String,
    pub pool_options: Option<PoolSizeOptions>,
}

impl PoolEvent {
    pub fn new(kind: PoolEventKind) -> Self {
        Self {
            kind,
            address: String::new(),
            pool_options: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_pool_size(mut self, min_pool_size: u64, max_pool_size: u64) -> Self {
        self.pool_options = Some(PoolSizeOptions {
            min_pool_size,
            max_pool_size,
        });
        self
    }
}
