//! Minimal RESP2 wire codec.
//!
//! Implements just enough of the Redis serialization protocol for the
//! commands [`RedisBackend`](crate::redis::RedisBackend) issues: requests
//! are arrays of bulk strings, replies are parsed into [`Reply`].

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{BackendError, Result};

/// One parsed RESP2 reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A simple string reply, e.g. `+OK`.
    Simple(String),
    /// An error reply, e.g. `-ERR unknown command`.
    Error(String),
    /// An integer reply, e.g. `:42`.
    Int(i64),
    /// A bulk string reply; `None` is the nil bulk string.
    Bulk(Option<Vec<u8>>),
    /// An array reply; `None` is the nil array.
    Array(Option<Vec<Reply>>),
}

/// Encodes a command as a RESP2 array of bulk strings.
#[must_use]
pub fn encode_command(args: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + args.iter().map(|a| a.len() + 16).sum::<usize>());
    buf.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.extend_from_slice(arg);
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

/// Reads one complete reply from the stream.
///
/// # Errors
///
/// Returns [`BackendError::Protocol`] on malformed framing and
/// [`BackendError::Io`] on transport failure. An `-ERR …` reply is returned
/// as [`Reply::Error`], not as a Rust error; command-level code decides how
/// to surface it.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply>
where
    R: AsyncBufRead + Unpin + Send,
{
    let line = read_line(reader).await?;
    let (kind, rest) = line
        .split_at_checked(1)
        .ok_or_else(|| BackendError::Protocol("empty reply line".to_string()))?;

    match kind {
        "+" => Ok(Reply::Simple(rest.to_string())),
        "-" => Ok(Reply::Error(rest.to_string())),
        ":" => Ok(Reply::Int(parse_int(rest)?)),
        "$" => {
            let len = parse_int(rest)?;
            if len < 0 {
                return Ok(Reply::Bulk(None));
            }
            let mut data = vec![0u8; len as usize + 2];
            reader.read_exact(&mut data).await?;
            if data.ends_with(b"\r\n") {
                data.truncate(len as usize);
                Ok(Reply::Bulk(Some(data)))
            } else {
                Err(BackendError::Protocol(
                    "bulk string missing CRLF terminator".to_string(),
                ))
            }
        }
        "*" => {
            let len = parse_int(rest)?;
            if len < 0 {
                return Ok(Reply::Array(None));
            }
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(Box::pin(read_reply(reader)).await?);
            }
            Ok(Reply::Array(Some(items)))
        }
        other => Err(BackendError::Protocol(format!(
            "unknown reply type marker {other:?}"
        ))),
    }
}

async fn read_line<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Err(BackendError::Protocol(
            "connection closed mid-reply".to_string(),
        ));
    }
    if !line.ends_with(b"\r\n") {
        return Err(BackendError::Protocol(
            "reply line missing CRLF terminator".to_string(),
        ));
    }
    line.truncate(line.len() - 2);
    String::from_utf8(line)
        .map_err(|_| BackendError::Protocol("reply line is not valid UTF-8".to_string()))
}

fn parse_int(s: &str) -> Result<i64> {
    s.parse()
        .map_err(|_| BackendError::Protocol(format!("invalid integer {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    async fn parse(input: &[u8]) -> Result<Reply> {
        let mut reader = BufReader::new(Cursor::new(input.to_vec()));
        read_reply(&mut reader).await
    }

    #[test]
    fn encode_ping() {
        assert_eq!(encode_command(&[b"PING"]), b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn encode_set_with_binary_value() {
        let encoded = encode_command(&[b"SET", b"k", b"\x00\x01"]);
        assert_eq!(encoded, b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$2\r\n\x00\x01\r\n");
    }

    #[tokio::test]
    async fn parse_simple_string() {
        assert_eq!(parse(b"+PONG\r\n").await.unwrap(), Reply::Simple("PONG".to_string()));
    }

    #[tokio::test]
    async fn parse_error_reply() {
        assert_eq!(
            parse(b"-ERR boom\r\n").await.unwrap(),
            Reply::Error("ERR boom".to_string())
        );
    }

    #[tokio::test]
    async fn parse_integer() {
        assert_eq!(parse(b":42\r\n").await.unwrap(), Reply::Int(42));
    }

    #[tokio::test]
    async fn parse_bulk_string() {
        assert_eq!(
            parse(b"$5\r\nhello\r\n").await.unwrap(),
            Reply::Bulk(Some(b"hello".to_vec()))
        );
    }

    #[tokio::test]
    async fn parse_nil_bulk_string() {
        assert_eq!(parse(b"$-1\r\n").await.unwrap(), Reply::Bulk(None));
    }

    #[tokio::test]
    async fn parse_nested_array() {
        let reply = parse(b"*2\r\n$1\r\n0\r\n*2\r\n$1\r\na\r\n$1\r\nb\r\n")
            .await
            .unwrap();

        assert_eq!(
            reply,
            Reply::Array(Some(vec![
                Reply::Bulk(Some(b"0".to_vec())),
                Reply::Array(Some(vec![
                    Reply::Bulk(Some(b"a".to_vec())),
                    Reply::Bulk(Some(b"b".to_vec())),
                ])),
            ]))
        );
    }

    #[tokio::test]
    async fn parse_rejects_truncated_bulk() {
        assert!(parse(b"$5\r\nhel").await.is_err());
    }

    #[tokio::test]
    async fn parse_rejects_unknown_marker() {
        assert!(matches!(
            parse(b"?what\r\n").await.unwrap_err(),
            BackendError::Protocol(_)
        ));
    }
}
