use queryspec_core::StoreError;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::Path,
};

pub const SNAPSHOT_FILE: &str = "snapshot.zst";

const ZSTD_LEVEL: i32 = 3;

/// Writes rows as zstd-compressed JSON lines. The file is written beside the target and
/// renamed into place, so readers never see a partial snapshot.
pub fn write_snapshot<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("zst.tmp");
    let out = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    let mut z = zstd::Encoder::new(out, ZSTD_LEVEL)?;
    for row in rows {
        let line = serde_json::to_string(row).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        z.write_all(line.as_bytes())?;
        z.write_all(b"\n")?;
    }
    z.finish()?;
    std::fs::rename(&tmp, path)?;
    Ok(rows.len())
}

pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let fh = File::open(path)?;
    let br = BufReader::new(zstd::Decoder::new(fh)?);
    let mut out = Vec::new();
    for line in br.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        out.push(row);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
        name: String,
    }

    #[test]
    fn test_snapshot_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SNAPSHOT_FILE);
        let rows = vec![
            Row { id: 1, name: "a".into() },
            Row { id: 2, name: "b".into() },
        ];
        assert_eq!(write_snapshot(&path, &rows).unwrap(), 2);
        assert_eq!(read_snapshot::<Row>(&path).unwrap(), rows);
        assert!(!path.with_extension("zst.tmp").exists());
    }

    #[test]
    fn test_undecodable_row_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SNAPSHOT_FILE);
        write_snapshot(&path, &[serde_json::json!({"id": "nope"})]).unwrap();
        assert!(matches!(read_snapshot::<Row>(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_snapshot::<Row>(&dir.path().join("absent.zst")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
