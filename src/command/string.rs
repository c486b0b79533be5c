use crate::command::{arg_to_i64, arg_to_name, require_arity};
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::resp::RespValue;
use crate::types::string::IncrError;
use crate::types::{StrValue, Value};

/// SET key value [EXPIRE seconds]
pub fn cmd_set(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() >= 2, "set")?;
    let key = arg_to_name(&args[0])?;
    let ttl = match &args[2..] {
        [] => None,
        [option, seconds] if is_expire_option(option) => match arg_to_i64(seconds) {
            Ok(n) if n > 0 => Some(n as u64),
            _ => return Err(CommandError::InvalidExpire("set")),
        },
        _ => return Err(CommandError::Syntax),
    };

    engine.set(&key, Value::String(StrValue::new(args[1].clone())));
    if let Some(seconds) = ttl {
        engine.expire_in(&key, seconds);
    }
    Ok(RespValue::ok())
}

fn is_expire_option(option: &[u8]) -> bool {
    option.eq_ignore_ascii_case(b"EXPIRE") || option.eq_ignore_ascii_case(b"EX")
}

pub fn cmd_get(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 1, "get")?;
    let key = arg_to_name(&args[0])?;
    match engine.get(&key) {
        Some(Value::String(s)) => Ok(RespValue::bulk_string(s.as_bytes())),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::nil()),
    }
}

fn incr_decr(args: &[Vec<u8>], engine: &mut Engine, delta: i64, name: &'static str) -> CommandResult {
    require_arity(args.len() == 1, name)?;
    let key = arg_to_name(&args[0])?;

    match engine.get_mut(&key) {
        Some(Value::String(s)) => s
            .incr_by(delta)
            .map(RespValue::integer)
            .map_err(|e| match e {
                IncrError::NotInteger => CommandError::NotInteger,
                IncrError::Overflow => CommandError::Overflow,
            }),
        Some(_) => Err(CommandError::WrongType),
        None => {
            engine.set(&key, Value::String(StrValue::from_i64(delta)));
            Ok(RespValue::integer(delta))
        }
    }
}

pub fn cmd_incr(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    incr_decr(args, engine, 1, "incr")
}

pub fn cmd_decr(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    incr_decr(args, engine, -1, "decr")
}
