//! Append-only CSV record store.
//!
//! The store is the only source of truth for which URLs are done. Rows are
//! never rewritten. Each append encodes one complete row in memory and hands
//! it to the file in a single write while holding the writer lock, so
//! concurrent appends cannot interleave.
//!
//! # Crash recovery
//!
//! Every row this store writes ends in a newline outside any quoted field. A
//! trailing row that does not (a write cut short by a killed process) is not a
//! record: readers ignore it, and the next writer truncates it away before
//! appending.
//!
//! # Format
//!
//! ```text
//! URL,Title,Text
//! https://example.com/a,Some headline,"Body text, with commas
//! and newlines, quoted per RFC 4180"
//! ```

use crate::error::StoreError;
use crate::models::Record;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Header row written once, before the first record.
pub const HEADER: [&str; 3] = ["URL", "Title", "Text"];

/// Encode one row, terminator included.
fn encode_row(fields: [&str; 3]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|e| StoreError::Io(e.into_error()))
}

/// Byte length of the leading run of complete rows in `path`.
///
/// Equals the file length unless the last row is unterminated: it lacks the
/// trailing newline, or it stops inside a quoted field.
fn complete_len(path: &Path) -> Result<u64, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut row = csv::ByteRecord::new();
    let mut last_start = None;
    while reader.read_byte_record(&mut row)? {
        last_start = row.position().map(|p| p.byte());
    }
    let Some(start) = last_start else {
        return Ok(0);
    };

    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    file.seek(SeekFrom::Start(start))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;

    let quotes = tail.iter().filter(|&&b| b == b'"').count();
    if tail.ends_with(b"\n") && quotes % 2 == 0 {
        Ok(len)
    } else {
        Ok(start)
    }
}

/// A reader over the complete rows of `path`, header included.
fn complete_reader(path: &Path) -> Result<csv::Reader<std::io::Take<File>>, StoreError> {
    let len = complete_len(path)?;
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new().from_reader(file.take(len)))
}

/// Append-only collection of extracted records keyed by URL.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl RecordStore {
    /// Point a store at `path`. Nothing is created until the first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one record as a single write.
    ///
    /// Concurrent callers are serialised on the writer lock. If the file is
    /// missing or empty the header row is written first.
    #[instrument(level = "debug", skip_all, fields(url = %record.url))]
    pub fn append(&self, record: &Record) -> Result<(), StoreError> {
        let row = encode_row([&record.url, &record.title, &record.text])?;

        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = match &mut *guard {
            Some(file) => file,
            slot @ None => slot.insert(self.open_for_append()?),
        };

        let result = file
            .write_all(&row)
            .and_then(|()| file.flush())
            .map_err(StoreError::from);

        if let Err(e) = &result {
            error!(path = %self.path.display(), error = %e, "Failed to append record");
            // Drop the handle so the next append reopens and repairs the file.
            *guard = None;
        } else {
            debug!(bytes = row.len(), "Appended record");
        }
        result
    }

    fn open_for_append(&self) -> Result<File, StoreError> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let len = file.metadata()?.len();
        let complete = if len == 0 { 0 } else { complete_len(&self.path)? };

        if complete < len {
            warn!(
                path = %self.path.display(),
                discarded_bytes = len - complete,
                "Discarding unterminated trailing row"
            );
            file.set_len(complete)?;
        }
        if complete == 0 {
            file.write_all(&encode_row(HEADER)?)?;
            file.flush()?;
            info!(path = %self.path.display(), "Initialised record store");
        }
        Ok(file)
    }

    /// Every URL already present in the store.
    ///
    /// A missing store is simply empty. An unreadable or malformed store is
    /// logged and also treated as empty: re-processing is preferred over
    /// aborting the run.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub fn existing_keys(&self) -> HashSet<String> {
        if !self.path.exists() {
            info!("No existing record store; starting fresh");
            return HashSet::new();
        }
        match self.read_keys() {
            Ok(keys) => {
                info!(count = keys.len(), "Loaded already-processed URLs");
                keys
            }
            Err(e) => {
                warn!(error = %e, "Could not read record store; assuming no prior records");
                HashSet::new()
            }
        }
    }

    fn read_keys(&self) -> Result<HashSet<String>, StoreError> {
        let mut reader = complete_reader(&self.path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h == HEADER[0])
            .ok_or(StoreError::MissingColumn(HEADER[0]))?;

        let mut keys = HashSet::new();
        for row in reader.records() {
            let row = row?;
            if let Some(url) = row.get(column).filter(|u| !u.is_empty()) {
                keys.insert(url.to_string());
            }
        }
        Ok(keys)
    }

    /// Re-read every complete stored record in file order.
    #[cfg(test)]
    pub fn read_all(&self) -> Result<Vec<Record>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = complete_reader(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(url: &str, title: &str, text: &str) -> Record {
        Record {
            url: url.to_string(),
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_missing_store_has_no_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("articles.csv"));
        assert!(store.existing_keys().is_empty());
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let store = RecordStore::open(&path);
        store.append(&record("https://a", "A", "alpha")).unwrap();
        store.append(&record("https://b", "B", "beta")).unwrap();

        // A fresh handle on the same file must not repeat the header.
        let reopened = RecordStore::open(&path);
        reopened.append(&record("https://c", "C", "gamma")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("URL,Title,Text\n"));
        assert_eq!(contents.matches("URL,Title,Text").count(), 1);
        assert_eq!(reopened.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_round_trip_escapes_delimiters_and_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("articles.csv"));
        let tricky = record(
            "https://example.com/x?a=1,2",
            "Quote \"this\", please",
            "Line one,\nline \"two\"\n\nline three",
        );
        store.append(&tricky).unwrap();

        assert_eq!(store.read_all().unwrap(), vec![tricky]);
    }

    #[test]
    fn test_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("articles.csv"));
        store.append(&record("https://a", "A", "alpha")).unwrap();
        store.append(&record("https://b", "B", "beta")).unwrap();

        let keys = store.existing_keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("https://a"));
        assert!(keys.contains("https://b"));
    }

    #[test]
    fn test_schema_mismatch_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        std::fs::write(&path, "link,headline\nhttps://a,A\n").unwrap();

        let store = RecordStore::open(&path);
        assert!(store.existing_keys().is_empty());
    }

    #[test]
    fn test_ragged_store_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        std::fs::write(&path, "URL,Title,Text\nhttps://a,A,alpha\nhttps://b\n").unwrap();

        let store = RecordStore::open(&path);
        assert!(store.existing_keys().is_empty());
    }

    fn store_with_three(path: &Path) -> RecordStore {
        let store = RecordStore::open(path);
        store.append(&record("https://a", "A", "alpha")).unwrap();
        store.append(&record("https://b", "B", "beta, with comma")).unwrap();
        store.append(&record("https://c", "C", "gamma\nsecond line")).unwrap();
        store
    }

    fn append_raw(path: &Path, bytes: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(bytes.as_bytes()).unwrap();
    }

    #[test]
    fn test_row_is_encoded_whole() {
        let row = encode_row(["https://a", "Title", &"word, ".repeat(5_000)]).unwrap();
        assert!(row.len() > 30_000);
        assert!(row.ends_with(b"\n"));
        assert_eq!(row.iter().filter(|&&b| b == b'"').count(), 2);
    }

    #[test]
    fn test_truncated_tail_is_not_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let store = store_with_three(&path);
        append_raw(&path, "https://d,Title,\"partial bo");

        let keys = store.existing_keys();
        assert_eq!(keys.len(), 3);
        assert!(!keys.contains("https://d"));

        let urls: Vec<_> = store.read_all().unwrap().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, ["https://a", "https://b", "https://c"]);
    }

    #[test]
    fn test_tail_cut_inside_quoted_newline_is_not_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let store = store_with_three(&path);
        append_raw(&path, "https://d,Title,\"first line\n");

        assert!(!store.existing_keys().contains("https://d"));
        assert_eq!(store.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_append_after_truncated_tail_stays_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        store_with_three(&path);
        append_raw(&path, "https://d,Title,\"partial bo");

        // A new run opens the store afresh and repairs the tail first.
        let store = RecordStore::open(&path);
        store.append(&record("https://e", "E", "e")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("\"gamma\nsecond line\"\nhttps://e,E,e\n"));
        assert!(!contents.contains("partial"));

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3], record("https://e", "E", "e"));
        assert_eq!(store.existing_keys().len(), 4);
    }

    #[test]
    fn test_unterminated_header_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        std::fs::write(&path, "URL,Ti").unwrap();

        let store = RecordStore::open(&path);
        assert!(store.existing_keys().is_empty());
        store.append(&record("https://a", "A", "alpha")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "URL,Title,Text\nhttps://a,A,alpha\n");
    }

    #[test]
    fn test_empty_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        std::fs::write(&path, "").unwrap();

        let store = RecordStore::open(&path);
        store.append(&record("https://a", "A", "alpha")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "URL,Title,Text\nhttps://a,A,alpha\n");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::open(dir.path().join("articles.csv")));
        let body = "word, ".repeat(2_000);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                let body = body.clone();
                std::thread::spawn(move || {
                    for j in 0..10 {
                        let url = format!("https://example.com/{i}/{j}");
                        store.append(&record(&url, "Title", &body)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 160);
        assert!(records.iter().all(|r| r.title == "Title" && r.text == body));
        assert_eq!(store.existing_keys().len(), 160);
    }
}
