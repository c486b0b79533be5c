use crate::command::require_arity;
use crate::connection::ClientState;
use crate::error::CommandResult;
use crate::resp::RespValue;

/// PING [message]
pub fn cmd_ping(args: &[Vec<u8>]) -> CommandResult {
    require_arity(args.len() <= 1, "ping")?;
    Ok(match args.first() {
        Some(message) => RespValue::bulk_string(message.as_slice()),
        None => RespValue::simple_string("PONG"),
    })
}

/// QUIT: reply OK; the connection closes after the reply is written.
pub fn cmd_quit(args: &[Vec<u8>], client: &mut ClientState) -> CommandResult {
    require_arity(args.is_empty(), "quit")?;
    client.should_close = true;
    Ok(RespValue::ok())
}
