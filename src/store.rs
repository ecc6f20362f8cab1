//! @ai:module:intent Append benchmark records to a schema-stable CSV log
//! @ai:module:layer infrastructure
//! @ai:module:public_api RecordStore
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::record::BenchmarkRecord;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// @ai:intent Appends records to a CSV log; header written only when the file is created
///
/// Writers in separate processes are not coordinated. Callers sharing one log
/// across concurrent runs must serialise access themselves.
pub struct RecordStore;

impl RecordStore {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Open for append, reporting whether this call created the file
    /// @ai:effects fs:write
    fn open_append(path: &Path) -> Result<(File, bool)> {
        match OpenOptions::new().append(true).create_new(true).open(path) {
            Ok(file) => Ok((file, true)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Ok((OpenOptions::new().append(true).open(path)?, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// @ai:intent Encode the optional header and the record row into one buffer
    /// @ai:effects pure
    fn encode(record: &BenchmarkRecord, with_header: bool) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if with_header {
            writer.write_record(BenchmarkRecord::FIELDS)?;
        }
        writer.write_record(record.to_row())?;

        writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }

    /// @ai:intent Durably append one record, never touching existing rows
    /// @ai:post file ends with the record row; header present iff this call created the file
    /// @ai:effects fs:write
    pub fn append(&self, record: &BenchmarkRecord, path: &Path) -> Result<()> {
        let (mut file, created) = Self::open_append(path)?;
        let bytes = Self::encode(record, created)?;

        file.write_all(&bytes)?;
        file.sync_data()?;

        tracing::info!(
            "Appended {} result to {}{}",
            record.model,
            path.display(),
            if created { " (new log)" } else { "" }
        );
        Ok(())
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Sample;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const HEADER: &str =
        "timestamp,model,tokens_per_second,total_tokens,duration_seconds,ram_used_gb,npu_load,prompt\n";

    fn record(model: &str, prompt: &str) -> BenchmarkRecord {
        BenchmarkRecord {
            timestamp: "2026-01-19T10:00:00Z".to_string(),
            model: model.to_string(),
            tokens_per_second: Sample::Present(7.5),
            total_tokens: 300,
            duration_seconds: 40.0,
            ram_used_gb: Sample::Present(4),
            ram_total_gb: Sample::Present(16),
            npu_load: Sample::Unavailable,
            prompt: prompt.to_string(),
        }
    }

    #[test]
    fn test_first_append_writes_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.csv");

        RecordStore::new().append(&record("a.rkllm", "Hi"), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            format!("{HEADER}2026-01-19T10:00:00Z,a.rkllm,7.50,300,40.000,4,N/A,Hi\n")
        );
    }

    #[test]
    fn test_header_written_once_for_many_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.csv");
        let store = RecordStore::new();

        for i in 0..5 {
            store
                .append(&record(&format!("m{i}.rkllm"), "prompt"), &path)
                .unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(format!("{}\n", lines[0]), HEADER);
        assert_eq!(content.matches("timestamp,model").count(), 1);
    }

    #[test]
    fn test_append_preserves_existing_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.csv");
        let store = RecordStore::new();

        store.append(&record("a.rkllm", "one"), &path).unwrap();
        store.append(&record("b.rkllm", "two"), &path).unwrap();
        let before = std::fs::read(&path).unwrap();

        store.append(&record("c.rkllm", "three"), &path).unwrap();
        let after = std::fs::read(&path).unwrap();

        assert_eq!(&after[..before.len()], &before[..]);
        assert!(String::from_utf8(after[before.len()..].to_vec())
            .unwrap()
            .contains("c.rkllm"));
    }

    #[test]
    fn test_prompt_with_delimiters_is_quoted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.csv");
        let prompt = "<|im_start|>user\nSay \"hi\", then stop<|im_end|>\n";

        RecordStore::new().append(&record("q.rkllm", prompt), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), BenchmarkRecord::FIELDS.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][7], prompt);
    }

    #[test]
    fn test_existing_file_gets_no_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.csv");
        std::fs::write(&path, "legacy,row\n").unwrap();

        RecordStore::new().append(&record("a.rkllm", "Hi"), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("legacy,row\n2026-01-19T10:00:00Z,a.rkllm"));
        assert!(!content.contains("timestamp,model"));
    }

    #[test]
    fn test_missing_directory_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("results.csv");
        let err = RecordStore::new()
            .append(&record("a.rkllm", "Hi"), &path)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
