//! Save slots: binary game state in numbered files
//!
//! Every save starts with the big-endian tag `ALGS` and a version byte.
//! The game variant writes its own fixed field list after that; this
//! module supplies the header, string helpers and the slot file I/O.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

pub const SAVE_MAGIC: u32 = u32::from_be_bytes(*b"ALGS");
pub const SAVE_VERSION: u8 = 0;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Save I/O failed: {0}")]
    IoError(#[from] io::Error),

    #[error("Unknown save file, header {0:#010x}")]
    BadMagic(u32),

    #[error("Unsupported save version {0}")]
    UnsupportedVersion(u8),
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

pub fn write_header<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_u32::<BigEndian>(SAVE_MAGIC)?;
    w.write_u8(SAVE_VERSION)
}

pub fn read_header<R: Read>(r: &mut R) -> Result<(), SaveError> {
    let magic = r.read_u32::<BigEndian>()?;
    if magic != SAVE_MAGIC {
        return Err(SaveError::BadMagic(magic));
    }
    let version = r.read_u8()?;
    if version != SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion(version));
    }
    Ok(())
}

/// NUL-terminated string
pub fn write_cstr<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_all(s.as_bytes())?;
    w.write_u8(0)
}

pub fn read_cstr<R: Read>(r: &mut R) -> io::Result<String> {
    let mut bytes = Vec::new();
    loop {
        match r.read_u8()? {
            0 => break,
            b => bytes.push(b),
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ---------------------------------------------------------------------------
// Slot files
// ---------------------------------------------------------------------------

/// Reads and writes `<game>.<slot>` files in one directory
pub struct SaveManager {
    dir: PathBuf,
    game: String,
}

impl SaveManager {
    pub fn new(dir: &Path, game: &str) -> Self {
        SaveManager {
            dir: dir.to_path_buf(),
            game: game.to_string(),
        }
    }

    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.dir.join(format!("{}.{:03}", self.game, slot))
    }

    pub fn write(&self, slot: u32, bytes: &[u8]) -> Result<(), SaveError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(slot);
        std::fs::write(&path, bytes)?;
        tracing::info!("Saved game to {}", path.display());
        Ok(())
    }

    /// `Ok(None)` when the slot has never been written
    pub fn read(&self, slot: u32) -> Result<Option<Vec<u8>>, SaveError> {
        let path = self.slot_path(slot);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Can't load {}, game not loaded", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Cursor;

    fn temp_save_dir() -> PathBuf {
        env::temp_dir().join("openalg_test_save")
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn header_is_big_endian_tag() {
        let mut out = Vec::new();
        write_header(&mut out).unwrap();
        assert_eq!(out, b"ALGS\0");
        read_header(&mut Cursor::new(out)).unwrap();
    }

    #[test]
    fn foreign_header_rejected() {
        let err = read_header(&mut Cursor::new(b"RIFF\0".to_vec())).unwrap_err();
        assert!(matches!(err, SaveError::BadMagic(m) if m == u32::from_be_bytes(*b"RIFF")));
        let err = read_header(&mut Cursor::new(b"ALGS\x07".to_vec())).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedVersion(7)));
    }

    #[test]
    fn cstr_roundtrip_and_truncation() {
        let mut out = Vec::new();
        write_cstr(&mut out, "scene28").unwrap();
        write_cstr(&mut out, "").unwrap();
        let mut r = Cursor::new(out);
        assert_eq!(read_cstr(&mut r).unwrap(), "scene28");
        assert_eq!(read_cstr(&mut r).unwrap(), "");
        assert!(read_cstr(&mut Cursor::new(b"abc".to_vec())).is_err());
    }

    #[test]
    fn slot_files() {
        let dir = temp_save_dir().join("slots");
        cleanup(&dir);

        let saves = SaveManager::new(&dir, "maddog");
        assert_eq!(saves.slot_path(0).file_name().unwrap(), "maddog.000");
        assert!(saves.read(0).unwrap().is_none());

        saves.write(0, b"data").unwrap();
        assert_eq!(saves.read(0).unwrap().as_deref(), Some(&b"data"[..]));

        cleanup(&dir);
    }
}
