//! Reader for the LIB archive that bundles a game's scene videos
//!
//! Layout (all little-endian):
//! - `i16` magic, always 1020
//! - `i32` offset of the index
//! - at the index: `i16` index size, then `{i32 offset, [u8; 13] name}`
//!   records until an empty name
//!
//! Each entry starts with a `u32` byte count followed by the payload.

use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

pub const LIB_MAGIC: i16 = 1020;
const NAME_LEN: usize = 13;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to read archive: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// A named entry in the archive index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibEntry {
    pub name: String,
    pub offset: u32,
}

/// An opened LIB archive. Entry names are matched case-insensitively.
pub struct LibArchive<R> {
    reader: R,
    entries: BTreeMap<String, LibEntry>,
}

impl LibArchive<BufReader<File>> {
    /// Open a LIB archive from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading lib archive {:?}", path);
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> LibArchive<R> {
    /// Parse the header and index from any seekable stream
    pub fn from_reader(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let magic = reader.read_i16::<LittleEndian>()?;
        if magic != LIB_MAGIC {
            return Err(ArchiveError::InvalidFormat(format!(
                "bad magic {} (expected {})",
                magic, LIB_MAGIC
            )));
        }
        let index_offset = reader.read_i32::<LittleEndian>()?;
        if index_offset < 0 {
            return Err(ArchiveError::InvalidFormat(format!(
                "negative index offset {}",
                index_offset
            )));
        }

        reader.seek(SeekFrom::Start(index_offset as u64))?;
        let index_size = reader.read_i16::<LittleEndian>()?;
        if index_size <= 0 {
            return Err(ArchiveError::InvalidFormat(format!(
                "empty index (size {})",
                index_size
            )));
        }

        let mut entries = BTreeMap::new();
        loop {
            let offset = match reader.read_i32::<LittleEndian>() {
                Ok(v) => v,
                // Some archives end without a terminator record
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };
            let mut raw = [0u8; NAME_LEN];
            reader.read_exact(&mut raw)?;
            let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
            if end == 0 {
                break;
            }
            let name = String::from_utf8_lossy(&raw[..end]).into_owned();
            entries.insert(
                name.to_ascii_lowercase(),
                LibEntry {
                    name,
                    offset: offset as u32,
                },
            );
        }

        tracing::debug!("Lib archive index: {} entries", entries.len());
        Ok(Self { reader, entries })
    }

    /// All index entries, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = &LibEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Byte offset of a named entry within the archive stream
    pub fn entry_offset(&self, name: &str) -> Option<u32> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.offset)
    }

    /// Payload size read from the entry's length prefix
    pub fn entry_size(&mut self, name: &str) -> Result<u32> {
        let offset = self
            .entry_offset(name)
            .ok_or_else(|| ArchiveError::EntryNotFound(name.to_string()))?;
        self.reader.seek(SeekFrom::Start(offset as u64))?;
        Ok(self.reader.read_u32::<LittleEndian>()?)
    }

    /// Read an entry's payload (without its length prefix)
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let size = self.entry_size(name)? as u64;
        let start = self.reader.stream_position()?;
        let end = self.reader.seek(SeekFrom::End(0))?;
        if size > end.saturating_sub(start) {
            return Err(ArchiveError::InvalidFormat(format!(
                "entry {} claims {} bytes, {} left in archive",
                name,
                size,
                end.saturating_sub(start)
            )));
        }
        self.reader.seek(SeekFrom::Start(start))?;
        let mut data = vec![0u8; size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Write every entry's payload into `dir`, one file per entry
    pub fn dump_all(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let names: Vec<String> = self.entries().map(|entry| entry.name.clone()).collect();
        if let Some(bad) = names.iter().find(|name| !is_plain_file_name(name)) {
            return Err(ArchiveError::InvalidFormat(format!(
                "entry name {:?} is not a plain file name",
                bad
            )));
        }
        std::fs::create_dir_all(dir)?;
        for name in &names {
            let data = self.read_entry(name)?;
            std::fs::write(dir.join(name), &data)?;
            tracing::debug!("Dumped {} ({} bytes)", name, data.len());
        }
        Ok(names.len())
    }

    /// Hand the whole stream back, e.g. to a video decoder
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Entry names must stay inside the directory they are dumped to
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && !Path::new(name).is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn entry_name(name: &str) -> [u8; NAME_LEN] {
        let mut raw = [0u8; NAME_LEN];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        raw
    }

    /// Build an archive holding `files`, each as a length-prefixed payload
    fn build_archive(files: &[(&str, &[u8])], terminate: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_i16::<LittleEndian>(LIB_MAGIC).unwrap();
        out.write_i32::<LittleEndian>(0).unwrap(); // patched below

        let mut offsets = Vec::new();
        for (_, data) in files {
            offsets.push(out.len() as i32);
            out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
            out.extend_from_slice(data);
        }

        let index_offset = out.len() as i32;
        out[2..6].copy_from_slice(&index_offset.to_le_bytes());
        out.write_i16::<LittleEndian>(files.len() as i16).unwrap();
        for ((name, _), offset) in files.iter().zip(&offsets) {
            out.write_i32::<LittleEndian>(*offset).unwrap();
            out.extend_from_slice(&entry_name(name));
        }
        if terminate {
            out.write_i32::<LittleEndian>(0).unwrap();
            out.extend_from_slice(&[0u8; NAME_LEN]);
        }
        out
    }

    #[test]
    fn test_index_and_payloads() {
        let bytes = build_archive(&[("SCENE1.MM", b"abc"), ("scene2.mm", b"hello")], true);
        let mut lib = LibArchive::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(lib.len(), 2);
        assert_eq!(lib.entry_offset("scene1.mm"), Some(6));
        assert_eq!(lib.entry_size("SCENE2.MM").unwrap(), 5);
        assert_eq!(lib.read_entry("scene2.mm").unwrap(), b"hello");
        assert_eq!(lib.read_entry("scene1.mm").unwrap(), b"abc");
    }

    #[test]
    fn test_unterminated_index() {
        let bytes = build_archive(&[("only.mm", b"x")], false);
        let lib = LibArchive::from_reader(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = lib.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["only.mm"]);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = build_archive(&[("a.mm", b"1")], true);
        bytes[0] = 0;
        assert!(matches!(
            LibArchive::from_reader(Cursor::new(bytes)),
            Err(ArchiveError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_entry() {
        let bytes = build_archive(&[("a.mm", b"1")], true);
        let mut lib = LibArchive::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(lib.entry_offset("b.mm"), None);
        assert!(matches!(
            lib.read_entry("b.mm"),
            Err(ArchiveError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_dump_all() {
        let bytes = build_archive(&[("one.mm", b"11"), ("two.mm", b"222")], true);
        let mut lib = LibArchive::from_reader(Cursor::new(bytes)).unwrap();
        let dir = std::env::temp_dir().join("openalg_test_libdump");
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(lib.dump_all(&dir).unwrap(), 2);
        assert_eq!(std::fs::read(dir.join("two.mm")).unwrap(), b"222");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_dump_rejects_escaping_names() {
        let bytes = build_archive(&[("../escape", b"x")], true);
        let mut lib = LibArchive::from_reader(Cursor::new(bytes)).unwrap();
        let root = std::env::temp_dir().join("openalg_test_libescape");
        let _ = std::fs::remove_dir_all(&root);
        let dir = root.join("dump");

        assert!(matches!(
            lib.dump_all(&dir),
            Err(ArchiveError::InvalidFormat(_))
        ));
        assert!(!root.join("escape").exists());
        assert!(!dir.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("scene12.mm"));
        assert!(!is_plain_file_name("../escape"));
        assert!(!is_plain_file_name("/abs"));
        assert!(!is_plain_file_name("a\\b"));
        assert!(!is_plain_file_name(".."));
    }

    #[test]
    fn test_oversized_entry_is_rejected() {
        let mut bytes = build_archive(&[("big.mm", b"abc")], true);
        // payload length prefix sits right after the header
        bytes[6..10].copy_from_slice(&u32::MAX.to_le_bytes());
        let mut lib = LibArchive::from_reader(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            lib.read_entry("big.mm"),
            Err(ArchiveError::InvalidFormat(_))
        ));
    }
}
