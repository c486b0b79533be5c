use crate::command::{arg_to_name, require_arity};
use crate::connection::ClientState;
use crate::engine::Engine;
use crate::error::CommandResult;
use crate::pubsub::PubSubSender;
use crate::resp::RespValue;

fn ack(kind: &str, channel: Option<String>, count: usize) -> RespValue {
    RespValue::array(vec![
        RespValue::bulk_string(kind),
        channel.map_or_else(RespValue::nil, RespValue::bulk_string),
        RespValue::integer(count as i64),
    ])
}

/// Only one reply can be returned; acknowledgements after the first go out
/// through the connection's push queue, behind it.
fn reply_with(mut acks: Vec<RespValue>, pubsub_tx: &PubSubSender) -> RespValue {
    let first = acks.remove(0);
    for rest in acks {
        let _ = pubsub_tx.send(rest);
    }
    first
}

/// SUBSCRIBE channel [channel ...]
pub fn cmd_subscribe(
    args: &[Vec<u8>],
    engine: &mut Engine,
    client: &ClientState,
    pubsub_tx: &PubSubSender,
) -> CommandResult {
    require_arity(!args.is_empty(), "subscribe")?;
    let channels = args
        .iter()
        .map(|arg| arg_to_name(arg))
        .collect::<Result<Vec<_>, _>>()?;
    let registry = engine.pubsub_mut();
    let acks = channels
        .into_iter()
        .map(|channel| {
            let count = registry.subscribe(client.id, &channel, pubsub_tx);
            ack("subscribe", Some(channel), count)
        })
        .collect();
    Ok(reply_with(acks, pubsub_tx))
}

/// UNSUBSCRIBE [channel ...]: no arguments means every channel.
pub fn cmd_unsubscribe(
    args: &[Vec<u8>],
    engine: &mut Engine,
    client: &ClientState,
    pubsub_tx: &PubSubSender,
) -> CommandResult {
    let registry = engine.pubsub_mut();
    let channels = if args.is_empty() {
        registry.channels_of(client.id)
    } else {
        args.iter()
            .map(|arg| arg_to_name(arg))
            .collect::<Result<Vec<_>, _>>()?
    };

    if channels.is_empty() {
        return Ok(ack("unsubscribe", None, 0));
    }

    let acks = channels
        .into_iter()
        .map(|channel| {
            let count = registry.unsubscribe(client.id, &channel);
            ack("unsubscribe", Some(channel), count)
        })
        .collect();
    Ok(reply_with(acks, pubsub_tx))
}

/// PUBLISH channel message: number of connections that received it.
pub fn cmd_publish(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 2, "publish")?;
    let channel = arg_to_name(&args[0])?;
    let delivered = engine.pubsub().publish(&channel, &args[1]);
    Ok(RespValue::integer(delivered as i64))
}
