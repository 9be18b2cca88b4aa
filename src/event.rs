//! Skiller status events as recorded by the blackboard logger
//!
//! Each document of the source log describes one status transition of a
//! skill invocation:
//!
//! ```json
//! {"thread": 3, "timestamp": 1590000000123, "status": 2,
//!  "skill_string": "goto{place=\"M-BS-I\"}", "error": ""}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Skill status, numbered as in the skiller interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    Inactive = 0,
    Final = 1,
    Running = 2,
    Failed = 3,
}

impl Status {
    /// Whether this status ends an invocation
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Final | Status::Failed)
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Inactive),
            1 => Ok(Status::Final),
            2 => Ok(Status::Running),
            3 => Ok(Status::Failed),
            other => Err(format!("unknown skill status {}", other)),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Inactive => "inactive",
            Status::Final => "final",
            Status::Running => "running",
            Status::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Opaque execution lane identifier
///
/// Loggers write either a numeric id or a thread name; both are kept as-is
/// and only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThreadId {
    Number(i64),
    Name(String),
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadId::Number(n) => write!(f, "{}", n),
            ThreadId::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ThreadId {
    fn from(n: i64) -> Self {
        ThreadId::Number(n)
    }
}

impl From<&str> for ThreadId {
    fn from(name: &str) -> Self {
        ThreadId::Name(name.to_string())
    }
}

/// One status transition from the skiller log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEvent {
    pub thread: ThreadId,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub status: Status,
    pub skill_string: String,
    #[serde(default)]
    pub error: String,
}

impl SkillEvent {
    pub fn new(
        thread: impl Into<ThreadId>,
        timestamp: i64,
        status: Status,
        skill_string: impl Into<String>,
    ) -> Self {
        Self {
            thread: thread.into(),
            timestamp,
            status,
            skill_string: skill_string.into(),
            error: String::new(),
        }
    }

    /// Attach an error message (failed invocations)
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }
}
