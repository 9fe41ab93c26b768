use super::EventSource;
use crate::model::{ChainEvent, EventBatch, PoolCreatedEvent, SwapEvent};
use async_trait::async_trait;
use num_bigint::BigInt;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use swapledger_core::{Error, Result};
use tracing::{debug, instrument};

/// Reads chain events from an append-only archive directory of JSONL
/// files, plain or lz4 frame compressed. Files are consumed in
/// lexicographic name order and the cursor is `file:lines_consumed`, so
/// a restart resumes mid-file without replaying anything.
pub struct JsonlSource {
    archive_dir: PathBuf,
    batch_size: usize,
}

/// Wire shape of one archive line. Amounts are decimal strings since
/// int256 values overflow every native integer type.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawEvent {
    PoolCreated(RawPoolCreated),
    Swap(RawSwap),
}

#[derive(Debug, Deserialize)]
struct RawPoolCreated {
    pool: String,
    token0: String,
    token1: String,
    fee: i32,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct RawSwap {
    pool: String,
    sender: String,
    recipient: String,
    amount0: String,
    amount1: String,
    sqrt_price_x96: String,
    liquidity: String,
    tick: i32,
    timestamp: i64,
    transaction_hash: String,
    log_index: u64,
}

struct Position {
    file: String,
    line: usize,
}

impl JsonlSource {
    pub fn new(archive_dir: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            batch_size,
        }
    }

    async fn archive_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut dir = tokio::fs::read_dir(&self.archive_dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".jsonl") || name.ends_with(".jsonl.lz4") {
                files.push((name, entry.path()));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read_lines(&self, name: &str, path: &Path) -> Result<Vec<String>> {
        let bytes = tokio::fs::read(path).await?;
        let text = if name.ends_with(".lz4") {
            let mut decoder = lz4_flex::frame::FrameDecoder::new(bytes.as_slice());
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            String::from_utf8(out)
        } else {
            String::from_utf8(bytes)
        }
        .map_err(|e| Error::Validation(format!("archive file {} is not utf-8: {}", name, e)))?;
        Ok(text.lines().map(str::to_owned).collect())
    }
}

fn parse_cursor(cursor: &str) -> Result<Position> {
    let malformed = || Error::Validation(format!("malformed cursor: {}", cursor));
    let (file, line) = cursor.rsplit_once(':').ok_or_else(malformed)?;
    let line = line.parse::<usize>().map_err(|_| malformed())?;
    Ok(Position {
        file: file.to_string(),
        line,
    })
}

fn parse_bigint(value: &str, field: &str, context: &str) -> Result<BigInt> {
    BigInt::from_str(value)
        .map_err(|e| Error::Validation(format!("bad {} at {}: {}", field, context, e)))
}

/// Addresses and hashes are lowercased here so every downstream lookup
/// key is already canonical.
fn parse_event(line: &str, context: &str) -> Result<ChainEvent> {
    let raw: RawEvent = serde_json::from_str(line)
        .map_err(|e| Error::Validation(format!("malformed event at {}: {}", context, e)))?;
    match raw {
        RawEvent::PoolCreated(raw) => Ok(ChainEvent::PoolCreated(PoolCreatedEvent {
            pool: raw.pool.to_lowercase(),
            token0: raw.token0.to_lowercase(),
            token1: raw.token1.to_lowercase(),
            fee: raw.fee,
            timestamp: raw.timestamp,
        })),
        RawEvent::Swap(raw) => Ok(ChainEvent::Swap(SwapEvent {
            pool: raw.pool.to_lowercase(),
            sender: raw.sender.to_lowercase(),
            recipient: raw.recipient.to_lowercase(),
            amount0: parse_bigint(&raw.amount0, "amount0", context)?,
            amount1: parse_bigint(&raw.amount1, "amount1", context)?,
            sqrt_price_x96: parse_bigint(&raw.sqrt_price_x96, "sqrt_price_x96", context)?,
            liquidity: parse_bigint(&raw.liquidity, "liquidity", context)?,
            tick: raw.tick,
            timestamp: raw.timestamp,
            transaction_hash: raw.transaction_hash.to_lowercase(),
            log_index: raw.log_index,
        })),
    }
}

#[async_trait]
impl EventSource for JsonlSource {
    #[instrument(skip(self))]
    async fn fetch_page(&self, cursor: Option<String>) -> Result<EventBatch> {
        let files = self.archive_files().await?;

        let start = match cursor.as_deref() {
            Some(c) => {
                let pos = parse_cursor(c)?;
                // The archive is append-only; a cursor pointing at a file
                // we can no longer see means events may have been lost.
                let idx = files
                    .iter()
                    .position(|(name, _)| *name == pos.file)
                    .ok_or_else(|| {
                        Error::Validation(format!(
                            "cursor references missing archive file: {}",
                            pos.file
                        ))
                    })?;
                (idx, pos.line)
            }
            None => (0, 0),
        };

        let mut events = Vec::new();
        let mut position = cursor.clone();
        let mut has_more = false;

        'files: for (idx, (name, path)) in files.iter().enumerate().skip(start.0) {
            let skip = if idx == start.0 { start.1 } else { 0 };
            let lines = self.read_lines(name, path).await?;
            for (line_no, line) in lines.iter().enumerate().skip(skip) {
                if events.len() == self.batch_size {
                    has_more = true;
                    break 'files;
                }
                if !line.trim().is_empty() {
                    let context = format!("{}:{}", name, line_no + 1);
                    events.push(parse_event(line, &context)?);
                }
                position = Some(format!("{}:{}", name, line_no + 1));
            }
        }

        debug!(events = events.len(), has_more, "Fetched archive page");
        Ok(EventBatch {
            events,
            cursor: position,
            has_more,
        })
    }

    fn source_id(&self) -> &str {
        "archive"
    }

    async fn health_check(&self) -> Result<()> {
        let meta = tokio::fs::metadata(&self.archive_dir)
            .await
            .map_err(|e| Error::Ingest {
                source_name: self.source_id().to_string(),
                details: format!(
                    "archive dir {} is unreadable: {}",
                    self.archive_dir.display(),
                    e
                ),
            })?;
        if !meta.is_dir() {
            return Err(Error::Ingest {
                source_name: self.source_id().to_string(),
                details: format!("{} is not a directory", self.archive_dir.display()),
            });
        }
        Ok(())
    }
}
