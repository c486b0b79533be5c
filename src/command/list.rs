use crate::command::{arg_to_i64, arg_to_name, require_arity};
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::resp::RespValue;
use crate::types::{ListValue, Value};

#[derive(Clone, Copy)]
enum End {
    Head,
    Tail,
}

fn push(args: &[Vec<u8>], engine: &mut Engine, end: End, name: &'static str) -> CommandResult {
    require_arity(args.len() >= 2, name)?;
    let key = arg_to_name(&args[0])?;
    let values = args[1..].iter().cloned();

    let list = engine
        .get_or_insert_with(&key, || Value::List(ListValue::new()))
        .as_list_mut()
        .ok_or(CommandError::WrongType)?;
    let len = match end {
        End::Head => list.push_front_all(values),
        End::Tail => list.push_back_all(values),
    };
    Ok(RespValue::integer(len as i64))
}

fn pop(args: &[Vec<u8>], engine: &mut Engine, end: End, name: &'static str) -> CommandResult {
    require_arity(args.len() == 1, name)?;
    let key = arg_to_name(&args[0])?;

    let popped = match engine.get_mut(&key) {
        Some(Value::List(list)) => match end {
            End::Head => list.pop_front(),
            End::Tail => list.pop_back(),
        },
        Some(_) => return Err(CommandError::WrongType),
        None => None,
    };
    engine.remove_if_empty(&key);
    Ok(popped.map_or_else(RespValue::nil, RespValue::bulk_string))
}

/// LPUSH key value [value ...]
pub fn cmd_lpush(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    push(args, engine, End::Head, "lpush")
}

/// RPUSH key value [value ...]
pub fn cmd_rpush(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    push(args, engine, End::Tail, "rpush")
}

pub fn cmd_lpop(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    pop(args, engine, End::Head, "lpop")
}

pub fn cmd_rpop(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    pop(args, engine, End::Tail, "rpop")
}

/// LRANGE key start stop
pub fn cmd_lrange(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 3, "lrange")?;
    let key = arg_to_name(&args[0])?;
    let start = arg_to_i64(&args[1])?;
    let stop = arg_to_i64(&args[2])?;

    match engine.get(&key) {
        Some(Value::List(list)) => Ok(RespValue::bulk_array(
            list.range(start, stop).into_iter().cloned(),
        )),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(vec![])),
    }
}
