use crate::command::{arg_to_name, require_arity};
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::resp::RespValue;
use crate::types::{SetValue, Value};

/// SADD key member [member ...]: the resulting set size.
pub fn cmd_sadd(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() >= 2, "sadd")?;
    let key = arg_to_name(&args[0])?;

    let set = engine
        .get_or_insert_with(&key, || Value::Set(SetValue::new()))
        .as_set_mut()
        .ok_or(CommandError::WrongType)?;
    for member in &args[1..] {
        set.add(member.clone());
    }
    Ok(RespValue::integer(set.len() as i64))
}

/// SREM key member [member ...]: how many members were actually removed.
pub fn cmd_srem(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() >= 2, "srem")?;
    let key = arg_to_name(&args[0])?;

    let removed = match engine.get_mut(&key) {
        Some(Value::Set(set)) => args[1..].iter().filter(|m| set.remove(m)).count(),
        Some(_) => return Err(CommandError::WrongType),
        None => 0,
    };
    engine.remove_if_empty(&key);
    Ok(RespValue::integer(removed as i64))
}

pub fn cmd_smembers(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 1, "smembers")?;
    match engine.get(&arg_to_name(&args[0])?) {
        Some(Value::Set(set)) => Ok(RespValue::bulk_array(set.iter().cloned())),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::array(vec![])),
    }
}

pub fn cmd_sismember(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 2, "sismember")?;
    match engine.get(&arg_to_name(&args[0])?) {
        Some(Value::Set(set)) => Ok(RespValue::integer(set.contains(&args[1]) as i64)),
        Some(_) => Err(CommandError::WrongType),
        None => Ok(RespValue::integer(0)),
    }
}

#[cfg(test)]
mod tests {
    use crate::command::test_support::*;
    use crate::resp::RespValue;

    fn members(reply: RespValue) -> Vec<String> {
        let items = match reply {
            RespValue::Array(Some(items)) => items,
            other => panic!("expected array, got {other:?}"),
        };
        let mut out: Vec<String> = items.iter().filter_map(|i| i.to_string_lossy()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_sadd_membership() {
        let mut h = Harness::new();
        assert_eq!(h.run(&["SADD", "k", "x", "y"]), RespValue::integer(2));
        assert_eq!(h.run(&["SADD", "k", "x"]), RespValue::integer(2));
        assert_eq!(h.run(&["SISMEMBER", "k", "x"]), RespValue::integer(1));
        assert_eq!(members(h.run(&["SMEMBERS", "k"])), ["x", "y"]);

        assert_eq!(h.run(&["SREM", "k", "x"]), RespValue::integer(1));
        assert_eq!(h.run(&["SISMEMBER", "k", "x"]), RespValue::integer(0));
        assert_eq!(members(h.run(&["SMEMBERS", "k"])), ["y"]);
    }

    #[test]
    fn test_srem_counts_only_present_members() {
        let mut h = Harness::new();
        assert_eq!(h.run(&["SREM", "k", "x"]), RespValue::integer(0));
        h.run(&["SADD", "k", "a", "b"]);
        assert_eq!(h.run(&["SREM", "k", "a", "zz", "a"]), RespValue::integer(1));
        assert_eq!(h.run(&["SREM", "k", "b"]), RespValue::integer(1));
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(-2));
    }

    #[test]
    fn test_absent_set_reads() {
        let mut h = Harness::new();
        assert_eq!(h.run(&["SMEMBERS", "nope"]), RespValue::array(vec![]));
        assert_eq!(h.run(&["SISMEMBER", "nope", "x"]), RespValue::integer(0));
    }
}
