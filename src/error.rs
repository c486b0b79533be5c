use crate::resp::RespValue;

/// Errors a command can surface to its client. The `Display` text is the
/// exact wire message, prefix included.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR Protocol error: {0}")]
    Protocol(String),

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR {0} without MULTI")]
    NoTransaction(&'static str),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgCount(&'static str),

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpire(&'static str),

    #[error("ERR key and channel names must be valid UTF-8")]
    InvalidName,
}

impl CommandError {
    pub fn to_resp(&self) -> RespValue {
        RespValue::error(self.to_string())
    }
}

impl From<CommandError> for RespValue {
    fn from(err: CommandError) -> Self {
        err.to_resp()
    }
}

pub type CommandResult = Result<RespValue, CommandError>;

/// Failure to read or write the on-disk snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_messages() {
        assert_eq!(
            CommandError::UnknownCommand("flushall".into()).to_string(),
            "ERR unknown command 'flushall'"
        );
        assert_eq!(
            CommandError::NoTransaction("EXEC").to_resp(),
            RespValue::error("ERR EXEC without MULTI")
        );
        assert!(CommandError::WrongType.to_string().starts_with("WRONGTYPE "));
    }
}
