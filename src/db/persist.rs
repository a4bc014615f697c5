use std::{fmt::Display, io, path::Path, str::FromStr};

use bytes::BytesMut;

use crate::{
    SkipDB,
    error::{Error, Result},
    format::{decode_line, encode_entry},
    fs::{File, FileSystem},
};

/// What a load did with each line of the dump file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Empty lines, lines without the delimiter, empty keys or values.
    pub skipped: usize,
    /// Keys already present, left untouched.
    pub duplicates: usize,
}

impl<K, V, FS> SkipDB<K, V, FS>
where
    K: Display,
    V: Display,
    FS: FileSystem,
{
    /// Writes every entry to the configured dump path, in ascending key
    /// order. Returns the number of entries written.
    pub fn dump(&self) -> Result<usize> {
        self.dump_to(&self.options.dump_path)
    }

    pub fn dump_to(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let _guard = self.file_lock.lock();

        // encode under the read lock, write after releasing it
        let (buf, count) = {
            let view = self.list.read();
            let mut buf = BytesMut::new();
            for (key, value) in view.iter() {
                encode_entry(key, value, &self.options.delimiter, &mut buf);
            }
            (buf.freeze(), view.len())
        };

        tracing::debug!(path = %path.display(), count, "dumping");

        // truncate only once the lock is held, a failed lock keeps the old dump
        let mut file = self.fs.open_write(path)?;
        file.lock()?;
        let written = file
            .set_len(0)
            .and_then(|()| file.write_all(&buf))
            .and_then(|()| file.flush());
        let unlocked = file.unlock();
        written?;
        unlocked?;
        file.close()?;

        tracing::debug!(bytes = buf.len(), count, "dump finished");
        Ok(count)
    }
}

impl<K, V, FS> SkipDB<K, V, FS>
where
    K: Ord + FromStr,
    V: FromStr,
    FS: FileSystem,
{
    /// Inserts every entry of the configured dump file. A missing file
    /// loads nothing.
    pub fn load(&self) -> Result<LoadReport> {
        self.load_from(&self.options.dump_path)
    }

    /// Malformed lines, including lines that are not valid UTF-8, are
    /// skipped and duplicate keys are left as they are. A key or value that
    /// does not parse aborts the load; entries from earlier lines stay
    /// inserted.
    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let _guard = self.file_lock.lock();

        let mut file = match self.fs.open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no dump file, nothing to load");
                return Ok(LoadReport::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        file.close()?;

        tracing::debug!(path = %path.display(), bytes = buf.len(), "loading");

        let delimiter = self.options.delimiter.as_str();
        let mut report = LoadReport::default();
        for (index, raw_line) in split_lines(&buf).enumerate() {
            let line_no = index + 1;

            let Ok(line) = std::str::from_utf8(raw_line) else {
                tracing::warn!(line = line_no, "skip line with invalid UTF-8");
                report.skipped += 1;
                continue;
            };
            let Some((raw_key, raw_value)) = decode_line(line, delimiter) else {
                tracing::warn!(line = line_no, "skip malformed line: {:?}", line);
                report.skipped += 1;
                continue;
            };

            let key = raw_key.parse::<K>().map_err(|_| {
                tracing::error!(line = line_no, "unparsable key: {:?}", raw_key);
                Error::UnparsableKey {
                    line: line_no,
                    key: raw_key.to_string(),
                }
            })?;
            let value = raw_value.parse::<V>().map_err(|_| {
                tracing::error!(line = line_no, "unparsable value: {:?}", raw_value);
                Error::UnparsableValue {
                    line: line_no,
                    value: raw_value.to_string(),
                }
            })?;

            match self.list.insert(key, value) {
                Ok(()) => report.loaded += 1,
                Err(skipdb_skiplist::Error::DuplicateKey) => {
                    tracing::warn!(line = line_no, "duplicate key {:?}, keep the old one", raw_key);
                    report.duplicates += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(
            loaded = report.loaded,
            skipped = report.skipped,
            duplicates = report.duplicates,
            "load finished"
        );
        Ok(report)
    }
}

/// Lines split on `\n`. A trailing newline does not start another line.
fn split_lines(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = buf.strip_suffix(b"\n").unwrap_or(buf);
    (!buf.is_empty())
        .then(|| body.split(|b| *b == b'\n'))
        .into_iter()
        .flatten()
}
