//! Redis backend over a hand-rolled RESP2 connection.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::error::{BackendError, Result};
use crate::resp::{encode_command, read_reply, Reply};

/// How many keys one SCAN step asks for.
const SCAN_BATCH: &[u8] = b"100";

/// Connection parameters for a [`RedisBackend`].
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Address of the Redis server.
    pub addr: String,
    /// Password for AUTH; `None` skips authentication.
    pub password: Option<String>,
    /// Logical database index to SELECT.
    pub db: u32,
    /// Per-call timeout. `None` or zero means calls may block indefinitely.
    pub timeout: Option<Duration>,
}

impl RedisConfig {
    /// Creates a configuration for the given server address.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            password: None,
            db: 0,
            timeout: None,
        }
    }

    /// Sets the AUTH password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the logical database index.
    #[must_use]
    pub const fn with_db(mut self, db: u32) -> Self {
        self.db = db;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("127.0.0.1:6379")
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Set while a command is in flight. A call that is cancelled (per-call
    /// timeout, dropped future) between write and read leaves its reply
    /// unread on the socket; pairing the next command with that stale reply
    /// would hand one key's data to another, so a dirty connection is
    /// discarded and reopened instead of reused.
    dirty: bool,
}

impl Connection {
    async fn open(config: &RedisConfig) -> Result<Self> {
        let stream = TcpStream::connect(&config.addr)
            .await
            .map_err(|source| BackendError::Connect {
                addr: config.addr.clone(),
                source,
            })?;
        let (read_half, write_half) = stream.into_split();
        let mut conn = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            dirty: false,
        };

        if let Some(password) = &config.password {
            conn.roundtrip(&[b"AUTH".as_slice(), password.as_bytes()])
                .await?;
        }
        if config.db > 0 {
            conn.roundtrip(&[b"SELECT".as_slice(), config.db.to_string().as_bytes()])
                .await?;
        }

        Ok(conn)
    }

    async fn roundtrip(&mut self, args: &[&[u8]]) -> Result<Reply> {
        self.dirty = true;
        self.writer.write_all(&encode_command(args)).await?;
        self.writer.flush().await?;
        let reply = read_reply(&mut self.reader).await?;
        self.dirty = false;
        match reply {
            Reply::Error(message) => Err(BackendError::Server(message)),
            reply => Ok(reply),
        }
    }
}

/// A Redis client scoped to one logical database.
///
/// One connection is shared across all concurrent callers and commands are
/// serialized over it. A call that is cancelled mid-flight marks the
/// connection dirty and the next call reconnects, so a reply left unread on
/// the wire can never be paired with a later command. Construction pings the
/// server and fails if the store is unreachable, so a process never starts
/// serving against a backend it cannot talk to.
pub struct RedisBackend {
    config: RedisConfig,
    conn: Mutex<Option<Connection>>,
    timeout: Option<Duration>,
}

impl RedisBackend {
    /// Connects, authenticates, selects the configured database, and pings.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Connect`] if the TCP connection cannot be
    /// established, and any command-level error from AUTH, SELECT, or the
    /// initial PING.
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let conn = Connection::open(&config).await?;
        let backend = Self {
            timeout: config.timeout.filter(|t| !t.is_zero()),
            conn: Mutex::new(Some(conn)),
            config,
        };
        backend.ping().await?;
        debug!(addr = %backend.config.addr, db = backend.config.db, "connected to redis");

        Ok(backend)
    }

    async fn command(&self, args: &[&[u8]]) -> Result<Reply> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exec(args))
                .await
                .map_err(|_| BackendError::Timeout(limit))?,
            None => self.exec(args).await,
        }
    }

    async fn exec(&self, args: &[&[u8]]) -> Result<Reply> {
        let mut slot = self.conn.lock().await;
        if slot.as_ref().is_none_or(|conn| conn.dirty) {
            // Drop the broken connection before opening its replacement.
            *slot = None;
            *slot = Some(Connection::open(&self.config).await?);
        }
        match slot.as_mut() {
            Some(conn) => conn.roundtrip(args).await,
            None => Err(BackendError::Protocol(
                "connection slot empty after reconnect".to_string(),
            )),
        }
    }

    async fn scan_step(&self, cursor: &str, pattern: &str) -> Result<(String, Vec<Vec<u8>>)> {
        let reply = self
            .command(&[
                b"SCAN".as_slice(),
                cursor.as_bytes(),
                b"MATCH".as_slice(),
                pattern.as_bytes(),
                b"COUNT".as_slice(),
                SCAN_BATCH,
            ])
            .await?;

        let Reply::Array(Some(items)) = reply else {
            return Err(BackendError::UnexpectedReply(
                "SCAN did not return an array".to_string(),
            ));
        };
        let mut items = items.into_iter();
        let next_cursor = match items.next() {
            Some(Reply::Bulk(Some(bytes))) => String::from_utf8(bytes)
                .map_err(|_| BackendError::Protocol("SCAN cursor is not UTF-8".to_string()))?,
            _ => {
                return Err(BackendError::UnexpectedReply(
                    "SCAN reply missing cursor".to_string(),
                ))
            }
        };
        let keys = match items.next() {
            Some(Reply::Array(Some(replies))) => replies
                .into_iter()
                .map(|r| match r {
                    Reply::Bulk(Some(bytes)) => Ok(bytes),
                    other => Err(BackendError::UnexpectedReply(format!(
                        "SCAN key entry was {other:?}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(BackendError::UnexpectedReply(
                    "SCAN reply missing key list".to_string(),
                ))
            }
        };

        Ok((next_cursor, keys))
    }
}

/// Escapes glob metacharacters so a key prefix matches only itself in a
/// SCAN MATCH pattern. Without this a tenant named `t*` would match, and
/// delete, every tenant starting with `t`.
fn escape_match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '^' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern
}

/// Formats a score the way Redis range commands expect it.
fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

fn expect_int(reply: Reply, command: &str) -> Result<i64> {
    match reply {
        Reply::Int(n) => Ok(n),
        other => Err(BackendError::UnexpectedReply(format!(
            "{command} returned {other:?}"
        ))),
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn insert_scored(&self, key: &str, member: &[u8], score: f64) -> Result<()> {
        let score = format_score(score);
        let reply = self
            .command(&[b"ZADD".as_slice(), key.as_bytes(), score.as_bytes(), member])
            .await?;
        expect_int(reply, "ZADD").map(|_| ())
    }

    async fn range_by_score(
        &self,
        key: &str,
        max_score: f64,
        offset: i64,
        count: i64,
    ) -> Result<Vec<Vec<u8>>> {
        let max = format_score(max_score);
        let offset = offset.to_string();
        let count = count.to_string();
        let reply = self
            .command(&[
                b"ZRANGEBYSCORE".as_slice(),
                key.as_bytes(),
                b"-inf".as_slice(),
                max.as_bytes(),
                b"LIMIT".as_slice(),
                offset.as_bytes(),
                count.as_bytes(),
            ])
            .await?;

        match reply {
            Reply::Array(Some(items)) => items
                .into_iter()
                .map(|r| match r {
                    Reply::Bulk(Some(bytes)) => Ok(bytes),
                    other => Err(BackendError::UnexpectedReply(format!(
                        "ZRANGEBYSCORE member was {other:?}"
                    ))),
                })
                .collect(),
            Reply::Array(None) => Ok(Vec::new()),
            other => Err(BackendError::UnexpectedReply(format!(
                "ZRANGEBYSCORE returned {other:?}"
            ))),
        }
    }

    async fn cardinality(&self, key: &str) -> Result<i64> {
        let reply = self.command(&[b"ZCARD".as_slice(), key.as_bytes()]).await?;
        expect_int(reply, "ZCARD")
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let reply = match ttl.filter(|t| !t.is_zero()) {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1).to_string();
                self.command(&[b"SET".as_slice(), key.as_bytes(), value, b"EX".as_slice(), secs.as_bytes()])
                    .await?
            }
            None => self.command(&[b"SET".as_slice(), key.as_bytes(), value]).await?,
        };
        match reply {
            Reply::Simple(s) if s == "OK" => Ok(()),
            other => Err(BackendError::UnexpectedReply(format!(
                "SET returned {other:?}"
            ))),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.command(&[b"GET".as_slice(), key.as_bytes()]).await? {
            Reply::Bulk(value) => Ok(value),
            other => Err(BackendError::UnexpectedReply(format!(
                "GET returned {other:?}"
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let reply = self.command(&[b"EXISTS".as_slice(), key.as_bytes()]).await?;
        expect_int(reply, "EXISTS").map(|n| n == 1)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let reply = self.command(&[b"DEL".as_slice(), key.as_bytes()]).await?;
        expect_int(reply, "DEL").map(|n| n > 0)
    }

    async fn delete_prefixed(&self, prefix: &str) -> Result<u64> {
        let pattern = format!("{}*", escape_match_pattern(prefix));
        let mut cursor = "0".to_string();
        let mut deleted = 0u64;

        loop {
            let (next_cursor, keys) = self.scan_step(&cursor, &pattern).await?;
            for key in keys {
                let reply = self.command(&[b"DEL".as_slice(), &key]).await?;
                deleted += expect_int(reply, "DEL")? as u64;
            }
            if next_cursor == "0" {
                break;
            }
            cursor = next_cursor;
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<()> {
        match self.command(&[b"PING".as_slice()]).await? {
            Reply::Simple(s) if s == "PONG" => Ok(()),
            other => Err(BackendError::UnexpectedReply(format!(
                "PING returned {other:?}"
            ))),
        }
    }
}
