use crate::command::{arg_to_i64, arg_to_name, require_arity};
use crate::engine::Engine;
use crate::error::CommandResult;
use crate::resp::RespValue;

/// DEL key [key ...]: number of keys actually removed.
pub fn cmd_del(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(!args.is_empty(), "del")?;
    let keys = args
        .iter()
        .map(|arg| arg_to_name(arg))
        .collect::<Result<Vec<_>, _>>()?;
    let removed = keys.iter().filter(|key| engine.delete(key)).count();
    Ok(RespValue::integer(removed as i64))
}

/// EXPIRE key seconds: 1 if a deadline was set, 0 if the key is missing.
/// A non-positive ttl expires the key immediately.
pub fn cmd_expire(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 2, "expire")?;
    let key = arg_to_name(&args[0])?;
    let seconds = arg_to_i64(&args[1])?;

    let applied = if seconds <= 0 {
        engine.expire_now(&key)
    } else {
        engine.expire_in(&key, seconds as u64)
    };
    Ok(RespValue::integer(applied as i64))
}

pub fn cmd_ttl(args: &[Vec<u8>], engine: &mut Engine) -> CommandResult {
    require_arity(args.len() == 1, "ttl")?;
    Ok(RespValue::integer(engine.ttl(&arg_to_name(&args[0])?)))
}

#[cfg(test)]
mod tests {
    use crate::command::test_support::*;
    use crate::error::CommandError;
    use crate::pubsub::EXPIRED_CHANNEL;
    use crate::resp::RespValue;

    #[test]
    fn test_del() {
        let mut h = Harness::new();
        assert_eq!(h.run(&["DEL", "k"]), RespValue::integer(0));
        h.run(&["SET", "k", "v", "EXPIRE", "100"]);
        assert_eq!(h.run(&["DEL", "k"]), RespValue::integer(1));
        assert_eq!(h.run(&["GET", "k"]), RespValue::nil());
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(-2));
        assert!(h.engine.expiry().is_empty());
    }

    #[test]
    fn test_del_counts_each_kind() {
        let mut h = Harness::new();
        h.run(&["SET", "s", "v"]);
        h.run(&["RPUSH", "l", "a"]);
        h.run(&["SADD", "z", "m"]);
        assert_eq!(h.run(&["DEL", "s", "l", "z", "missing"]), RespValue::integer(3));
    }

    #[test]
    fn test_expire_and_ttl() {
        let mut h = Harness::new();
        assert_eq!(h.run(&["EXPIRE", "k", "10"]), RespValue::integer(0));
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(-2));

        h.run(&["SET", "k", "v"]);
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(-1));
        assert_eq!(h.run(&["EXPIRE", "k", "10"]), RespValue::integer(1));
        h.advance(2_500);
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(8));
        assert_eq!(h.run(&["EXPIRE", "k", "100"]), RespValue::integer(1));
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(100));
    }

    #[test]
    fn test_expire_applies_to_collections() {
        let mut h = Harness::new();
        h.run(&["RPUSH", "l", "a", "b"]);
        assert_eq!(h.run(&["EXPIRE", "l", "1"]), RespValue::integer(1));
        h.advance(1_000);
        assert_eq!(h.run(&["LRANGE", "l", "0", "-1"]), RespValue::array(vec![]));
        assert_eq!(h.run(&["RPUSH", "l", "c"]), RespValue::integer(1));
        assert_eq!(h.run(&["TTL", "l"]), RespValue::integer(-1));
    }

    #[test]
    fn test_expire_non_positive_expires_now() {
        let mut h = Harness::new();
        h.run(&["SUBSCRIBE", EXPIRED_CHANNEL]);
        h.run(&["SET", "k", "v"]);
        assert_eq!(h.run(&["EXPIRE", "k", "0"]), RespValue::integer(1));
        assert_eq!(h.run(&["GET", "k"]), RespValue::nil());
        assert_eq!(h.run(&["EXPIRE", "k", "-5"]), RespValue::integer(0));
        assert_eq!(
            h.rx.try_recv().unwrap(),
            RespValue::bulk_array(["message", EXPIRED_CHANNEL, "k"])
        );
    }

    #[test]
    fn test_expire_rejects_bad_ttl() {
        let mut h = Harness::new();
        h.run(&["SET", "k", "v"]);
        assert_eq!(h.run(&["EXPIRE", "k", "ten"]), CommandError::NotInteger.to_resp());
        assert_eq!(h.run(&["TTL", "k"]), RespValue::integer(-1));
    }
}
