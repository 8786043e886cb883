//! Command definitions
//!
//! Represents commands from clients. Every command except `Ping` names the
//! database handle it applies to.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Set = 0x02,
    Delete = 0x03,
    Ping = 0x04,
    Open = 0x05,
    Close = 0x06,
    Compact = 0x07,
}

impl CommandType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Get),
            0x02 => Some(CommandType::Set),
            0x03 => Some(CommandType::Delete),
            0x04 => Some(CommandType::Ping),
            0x05 => Some(CommandType::Open),
            0x06 => Some(CommandType::Close),
            0x07 => Some(CommandType::Compact),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open (or create) a database
    Open { db: String },

    /// Get a value by key
    Get { db: String, key: Vec<u8> },

    /// Set a key-value pair
    Set { db: String, key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { db: String, key: Vec<u8> },

    /// Compact a database's log
    Compact { db: String },

    /// Close a database
    Close { db: String },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Open { .. } => CommandType::Open,
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Delete { .. } => CommandType::Delete,
            Command::Compact { .. } => CommandType::Compact,
            Command::Close { .. } => CommandType::Close,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Whether the command changes the log
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Set { .. } | Command::Delete { .. } | Command::Compact { .. }
        )
    }
}
