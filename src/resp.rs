use bytes::{Buf, BytesMut};

/// Longest inline command line accepted before giving up on framing.
const MAX_INLINE_LEN: usize = 64 * 1024;
/// Largest bulk string payload accepted from a client.
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Largest multibulk element count accepted from a client.
const MAX_ARRAY_LEN: i64 = 1024 * 1024;
/// Deepest array nesting accepted; commands are flat, so this is generous.
const MAX_NESTING: usize = 32;

/// A RESP2 value, used both for decoded requests and for replies.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n  or  $-1\r\n (nil)
    BulkString(Option<Vec<u8>>),
    /// *2\r\n...  or  *-1\r\n (only ever decoded, never produced)
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn nil() -> Self {
        RespValue::BulkString(None)
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    /// Build an array of bulk strings.
    pub fn bulk_array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        RespValue::Array(Some(items.into_iter().map(RespValue::bulk_string).collect()))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Serialize this value to RESP bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    /// Append the RESP encoding of this value to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, b'+', s.as_bytes()),
            RespValue::Error(s) => write_line(buf, b'-', s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, b':', n.to_string().as_bytes()),
            RespValue::BulkString(None) => buf.extend_from_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => {
                write_line(buf, b'$', data.len().to_string().as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
            RespValue::Array(Some(items)) => {
                write_line(buf, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.write_to(buf);
                }
            }
        }
    }

    /// Raw bytes of a string-like value (bulk or simple string).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(Some(data)) => Some(data),
            RespValue::SimpleString(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn to_string_lossy(&self) -> Option<String> {
        self.as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

fn write_line(buf: &mut Vec<u8>, prefix: u8, body: &[u8]) {
    buf.push(prefix);
    buf.extend_from_slice(body);
    buf.extend_from_slice(b"\r\n");
}

#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("unexpected type byte '{}'", *.0 as char)]
    InvalidByte(u8),

    #[error("{0}")]
    InvalidData(String),
}

/// Streaming RESP decoder.
///
/// Call [`RespParser::parse`] whenever bytes arrive. A complete frame is
/// consumed from the buffer and returned; an incomplete one leaves the buffer
/// untouched and yields `Ok(None)`.
pub struct RespParser;

impl RespParser {
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buf.is_empty() {
            return Ok(None);
        }
        let parsed = match buf[0] {
            b'+' | b'-' | b':' | b'$' | b'*' => parse_frame(&buf[..], 0)?,
            _ => parse_inline(&buf[..])?,
        };
        Ok(parsed.map(|(value, consumed)| {
            buf.advance(consumed);
            value
        }))
    }
}

/// Parse one frame from the front of `input`, returning it with the number of
/// bytes it occupied. `depth` counts the arrays enclosing this frame.
fn parse_frame(input: &[u8], depth: usize) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some(line_end) = find_crlf(input, 1) else {
        return Ok(None);
    };
    let header = &input[1..line_end];
    let body_start = line_end + 2;

    match input[0] {
        b'+' => Ok(Some((
            RespValue::SimpleString(String::from_utf8_lossy(header).into_owned()),
            body_start,
        ))),
        b'-' => Ok(Some((
            RespValue::Error(String::from_utf8_lossy(header).into_owned()),
            body_start,
        ))),
        b':' => {
            let n = parse_int(header, "invalid integer")?;
            Ok(Some((RespValue::Integer(n), body_start)))
        }
        b'$' => {
            let len = parse_int(header, "invalid bulk length")?;
            if len == -1 {
                return Ok(Some((RespValue::BulkString(None), body_start)));
            }
            if !(0..=MAX_BULK_LEN).contains(&len) {
                return Err(RespError::InvalidData("invalid bulk length".into()));
            }
            let end = body_start + len as usize;
            if input.len() < end + 2 {
                return Ok(None);
            }
            if &input[end..end + 2] != b"\r\n" {
                return Err(RespError::InvalidData(
                    "missing CRLF after bulk string".into(),
                ));
            }
            Ok(Some((
                RespValue::BulkString(Some(input[body_start..end].to_vec())),
                end + 2,
            )))
        }
        b'*' => {
            let len = parse_int(header, "invalid multibulk length")?;
            if len < 0 {
                return Ok(Some((RespValue::Array(None), body_start)));
            }
            if len > MAX_ARRAY_LEN {
                return Err(RespError::InvalidData("invalid multibulk length".into()));
            }
            if depth >= MAX_NESTING {
                return Err(RespError::InvalidData("too many nested arrays".into()));
            }
            let mut items = Vec::with_capacity(len as usize);
            let mut pos = body_start;
            for _ in 0..len {
                if pos >= input.len() {
                    return Ok(None);
                }
                match parse_frame(&input[pos..], depth + 1)? {
                    Some((item, used)) => {
                        items.push(item);
                        pos += used;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), pos)))
        }
        other => Err(RespError::InvalidByte(other)),
    }
}

/// Inline commands (`SET k v\r\n`) are decoded into an array of bulk strings.
fn parse_inline(input: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some(line_end) = find_crlf(input, 0) else {
        if input.len() > MAX_INLINE_LEN {
            return Err(RespError::InvalidData("inline command too long".into()));
        }
        return Ok(None);
    };
    let line = String::from_utf8_lossy(&input[..line_end]);
    let items = split_inline(&line)?
        .into_iter()
        .map(|token| RespValue::BulkString(Some(token.into_bytes())))
        .collect();
    Ok(Some((RespValue::Array(Some(items)), line_end + 2)))
}

fn parse_int(raw: &[u8], what: &str) -> Result<i64, RespError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RespError::InvalidData(what.to_string()))
}

fn find_crlf(buf: &[u8], start: usize) -> Option<usize> {
    if buf.len() < start + 2 {
        return None;
    }
    buf[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| i + start)
}

/// Split an inline command on whitespace; double quotes group a token and
/// support `\"`, `\\`, `\n`, `\r`, `\t` escapes.
fn split_inline(line: &str) -> Result<Vec<String>, RespError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quoted, ch) {
            (true, '"') => {
                quoted = false;
                tokens.push(std::mem::take(&mut current));
            }
            (true, '\\') => match chars.next() {
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some('t') => current.push('\t'),
                Some(other) => current.push(other),
                None => break,
            },
            (true, c) => current.push(c),
            (false, '"') if current.is_empty() => quoted = true,
            (false, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            (false, c) => current.push(c),
        }
    }

    if quoted {
        return Err(RespError::InvalidData("unbalanced quotes in request".into()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}
