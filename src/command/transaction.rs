use crate::command::{dispatch, require_arity};
use crate::connection::ClientState;
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::pubsub::PubSubSender;
use crate::resp::RespValue;
use tracing::debug;

/// MULTI: open a transaction. Inside one already, the queue starts over.
pub fn cmd_multi(args: &[Vec<u8>], client: &mut ClientState) -> CommandResult {
    require_arity(args.is_empty(), "multi")?;
    if client.transaction.is_queuing() {
        debug!(client = client.id, dropped = client.transaction.queued(), "MULTI restarts open transaction");
    }
    client.transaction.begin();
    Ok(RespValue::ok())
}

/// EXEC: replay the queue in order and return one reply per command.
///
/// The caller holds the engine for the whole replay, so nothing else can run
/// between the queued commands.
pub fn cmd_exec(
    args: &[Vec<u8>],
    engine: &mut Engine,
    client: &mut ClientState,
    pubsub_tx: &PubSubSender,
) -> CommandResult {
    require_arity(args.is_empty(), "exec")?;
    let queue = client
        .transaction
        .take()
        .ok_or(CommandError::NoTransaction("EXEC"))?;

    let replies = queue
        .into_iter()
        .map(|command| dispatch(command, engine, client, pubsub_tx))
        .collect();
    Ok(RespValue::array(replies))
}

/// DISCARD: drop the queue without running anything.
pub fn cmd_discard(args: &[Vec<u8>], client: &mut ClientState) -> CommandResult {
    require_arity(args.is_empty(), "discard")?;
    client
        .transaction
        .take()
        .ok_or(CommandError::NoTransaction("DISCARD"))?;
    Ok(RespValue::ok())
}
