use queryspec_core::StoreError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::Path,
};
use tracing::warn;

pub const WAL_FILE: &str = "wal.log";

/// One mutation, serialized as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalRecord {
    Put {
        id: i64,
        payload: serde_json::Value,
    },
    Delete {
        id: i64,
    },
}

pub struct Wal {
    file: File,
}

impl Wal {
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(WAL_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file })
    }

    pub fn append(&mut self, rec: &WalRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(rec).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }

    /// Drops every record; used once a snapshot covers them.
    pub fn truncate(&mut self) -> std::io::Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()
    }

    /// Reads every record in append order. A torn final line is skipped.
    pub fn replay(dir: &Path) -> std::io::Result<Vec<WalRecord>> {
        let path = dir.join(WAL_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let br = BufReader::new(File::open(&path)?);
        let mut out = Vec::new();
        for (n, line) in br.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalRecord>(&line) {
                Ok(rec) => out.push(rec),
                Err(e) => warn!(line = n + 1, error = %e, "skipping unreadable wal record"),
            }
        }
        Ok(out)
    }
}
