//! Single-writer append channel for a JSONL file.
//!
//! Workers never touch the file. They serialize a record, send the line to
//! the file's writer task, and wait for the acknowledgement, which is sent
//! only after the line has been written, flushed, and synced. Lines from
//! different workers therefore never interleave, and a caller that got `Ok`
//! knows the record is durable.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use longwrite_utils::error::StoreError;

/// Pending lines buffered between workers and the writer task
const CHANNEL_CAPACITY: usize = 256;

struct WriteRequest {
    line: String,
    ack: oneshot::Sender<Result<(), StoreError>>,
}

/// Cloneable sender side of a [`JsonlAppender`]
#[derive(Clone)]
pub struct AppendHandle {
    tx: mpsc::Sender<WriteRequest>,
    path: PathBuf,
}

impl AppendHandle {
    /// Append one record and wait until it is on disk.
    pub async fn append<T: Serialize>(&self, record: &T) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record).map_err(|source| StoreError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        line.push('\n');

        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriteRequest { line, ack })
            .await
            .map_err(|_| self.closed())?;
        done.await.map_err(|_| self.closed())?
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn closed(&self) -> StoreError {
        StoreError::WriterClosed {
            path: self.path.clone(),
        }
    }
}

/// Owner of the writer task for one append-only file
pub struct JsonlAppender {
    handle: AppendHandle,
    task: JoinHandle<u64>,
}

impl JsonlAppender {
    /// Open `path` for appending (creating it if needed) and start its
    /// writer task.
    ///
    /// If a previous run died mid-line, the torn line is terminated first so
    /// the next record starts on a line of its own.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };

        let needs_newline = {
            let probe = path.clone();
            tokio::task::spawn_blocking(move || ends_without_newline(&probe))
                .await
                .map_err(|e| io_err(std::io::Error::other(e)))?
                .map_err(io_err)?
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;

        if needs_newline {
            debug!(path = %path.display(), "Terminating torn final line");
            file.write_all(b"\n").await.map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run_writer(file, rx, path.clone()));

        Ok(Self {
            handle: AppendHandle { tx, path },
            task,
        })
    }

    #[must_use]
    pub fn handle(&self) -> AppendHandle {
        self.handle.clone()
    }

    /// Stop accepting lines and wait for the writer to drain.
    ///
    /// Returns the number of lines written. Every [`AppendHandle`] must have
    /// been dropped, or this waits for them.
    pub async fn close(self) -> Result<u64, StoreError> {
        let path = self.handle.path.clone();
        drop(self.handle);
        self.task.await.map_err(|e| StoreError::Io {
            path,
            source: std::io::Error::other(e),
        })
    }
}

async fn run_writer(
    mut file: tokio::fs::File,
    mut rx: mpsc::Receiver<WriteRequest>,
    path: PathBuf,
) -> u64 {
    let mut written = 0u64;
    while let Some(WriteRequest { line, ack }) = rx.recv().await {
        let result = write_line(&mut file, line.as_bytes()).await;
        match &result {
            Ok(()) => written += 1,
            Err(e) => error!(path = %path.display(), error = %e, "Append failed"),
        }
        // The requester may have gone away; the line is written either way.
        let _ = ack.send(result.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        }));
    }
    written
}

async fn write_line(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}

fn ends_without_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
