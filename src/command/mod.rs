pub mod key;
pub mod list;
pub mod pubsub;
pub mod server_cmd;
pub mod set;
pub mod string;
pub mod transaction;

use crate::connection::ClientState;
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::pubsub::PubSubSender;
use crate::resp::RespValue;
use tracing::debug;

/// A decoded request: upper-cased command name plus raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Vec<u8>>,
}

impl Command {
    pub fn new(name: &str, args: Vec<Vec<u8>>) -> Self {
        Command {
            name: name.to_ascii_uppercase(),
            args,
        }
    }

    /// Turn a decoded frame into a command. An empty array (a blank inline
    /// line) yields `Ok(None)` and is ignored by the caller.
    pub fn from_resp(frame: RespValue) -> Result<Option<Command>, CommandError> {
        let items = match frame {
            RespValue::Array(Some(items)) => items,
            _ => return Err(CommandError::Protocol("expected an array of bulk strings".into())),
        };
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            match item {
                RespValue::BulkString(Some(data)) => parts.push(data),
                RespValue::SimpleString(s) => parts.push(s.into_bytes()),
                _ => return Err(CommandError::Protocol("expected an array of bulk strings".into())),
            }
        }
        if parts.is_empty() {
            return Ok(None);
        }
        let name = String::from_utf8_lossy(&parts.remove(0)).into_owned();
        Ok(Some(Command::new(&name, parts)))
    }
}

/// Execute or queue one command for `client`.
///
/// This is the only entry point into command execution: the connection loop
/// calls it for every request, and EXEC calls it again for each queued
/// command once the transaction has been closed.
pub fn dispatch(
    command: Command,
    engine: &mut Engine,
    client: &mut ClientState,
    pubsub_tx: &PubSubSender,
) -> RespValue {
    engine.count_command();
    debug!(client = client.id, command = %command.name, "dispatch");

    match command.name.as_str() {
        "MULTI" => return transaction::cmd_multi(&command.args, client).into_reply(),
        "EXEC" => return transaction::cmd_exec(&command.args, engine, client, pubsub_tx).into_reply(),
        "DISCARD" => return transaction::cmd_discard(&command.args, client).into_reply(),
        _ => {}
    }

    if client.transaction.is_queuing() {
        client.transaction.enqueue(command);
        return RespValue::simple_string("QUEUED");
    }

    execute(&command, engine, client, pubsub_tx).into_reply()
}

fn execute(
    command: &Command,
    engine: &mut Engine,
    client: &mut ClientState,
    pubsub_tx: &PubSubSender,
) -> CommandResult {
    let args = command.args.as_slice();
    match command.name.as_str() {
        // Connection
        "PING" => server_cmd::cmd_ping(args),
        "QUIT" => server_cmd::cmd_quit(args, client),

        // Strings
        "SET" => string::cmd_set(args, engine),
        "GET" => string::cmd_get(args, engine),
        "INCR" => string::cmd_incr(args, engine),
        "DECR" => string::cmd_decr(args, engine),

        // Keys
        "DEL" => key::cmd_del(args, engine),
        "EXPIRE" => key::cmd_expire(args, engine),
        "TTL" => key::cmd_ttl(args, engine),

        // Lists
        "LPUSH" => list::cmd_lpush(args, engine),
        "RPUSH" => list::cmd_rpush(args, engine),
        "LPOP" => list::cmd_lpop(args, engine),
        "RPOP" => list::cmd_rpop(args, engine),
        "LRANGE" => list::cmd_lrange(args, engine),

        // Sets
        "SADD" => set::cmd_sadd(args, engine),
        "SREM" => set::cmd_srem(args, engine),
        "SMEMBERS" => set::cmd_smembers(args, engine),
        "SISMEMBER" => set::cmd_sismember(args, engine),

        // Pub/Sub
        "SUBSCRIBE" => pubsub::cmd_subscribe(args, engine, client, pubsub_tx),
        "UNSUBSCRIBE" => pubsub::cmd_unsubscribe(args, engine, client, pubsub_tx),
        "PUBLISH" => pubsub::cmd_publish(args, engine),

        _ => Err(CommandError::UnknownCommand(command.name.to_lowercase())),
    }
}

trait IntoReply {
    fn into_reply(self) -> RespValue;
}

impl IntoReply for CommandResult {
    fn into_reply(self) -> RespValue {
        self.unwrap_or_else(RespValue::from)
    }
}

/// Arguments are binary; keys and channel names are handled as text and must
/// be valid UTF-8, so distinct byte strings never name the same key.
pub fn arg_to_name(arg: &[u8]) -> Result<String, CommandError> {
    String::from_utf8(arg.to_vec()).map_err(|_| CommandError::InvalidName)
}

pub fn arg_to_i64(arg: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::NotInteger)
}

/// Fail with a wrong-arity error unless `ok` holds.
pub fn require_arity(ok: bool, command: &'static str) -> Result<(), CommandError> {
    if ok {
        Ok(())
    } else {
        Err(CommandError::WrongArgCount(command))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::pubsub::PubSubReceiver;
    use tokio::sync::mpsc;

    /// An engine plus one connected client, for driving `dispatch` directly.
    pub struct Harness {
        pub engine: Engine,
        pub client: ClientState,
        pub tx: PubSubSender,
        pub rx: PubSubReceiver,
    }

    impl Harness {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            let mut engine = Engine::new();
            engine.set_clock(1_000_000);
            Harness {
                engine,
                client: ClientState::new(),
                tx,
                rx,
            }
        }

        pub fn run(&mut self, parts: &[&str]) -> RespValue {
            let args: Vec<&[u8]> = parts[1..].iter().map(|p| p.as_bytes()).collect();
            self.run_bytes(parts[0], &args)
        }

        pub fn run_bytes(&mut self, name: &str, args: &[&[u8]]) -> RespValue {
            let command = Command::new(name, args.iter().map(|a| a.to_vec()).collect());
            dispatch(command, &mut self.engine, &mut self.client, &self.tx)
        }

        pub fn advance(&mut self, millis: u64) {
            let now = self.engine.now() + millis;
            self.engine.set_clock(now);
        }
    }

    pub fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s)
    }
}
