//! Game data discovery
//!
//! An ALG game ships as a flat DOS directory: a LIB archive holding every
//! scene segment, the scene script, and raw `.8b` sound cues. File names
//! on disk may be in any case.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use openalg_archive::LibArchive;
use openalg_common::GameId;
use openalg_media::SoundClip;

use crate::game::Cue;

/// Scene segment offsets, looked up case-insensitively
#[derive(Debug, Clone, Default)]
pub struct SceneLibrary {
    offsets: HashMap<String, u32>,
}

impl SceneLibrary {
    pub fn from_archive<R: Read + Seek>(archive: &LibArchive<R>) -> Self {
        Self::from_entries(archive.entries().map(|e| (e.name.as_str(), e.offset)))
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let offsets = entries
            .into_iter()
            .map(|(name, offset)| (name.to_ascii_lowercase(), offset))
            .collect();
        SceneLibrary { offsets }
    }

    pub fn offset(&self, name: &str) -> Option<u32> {
        self.offsets.get(&name.to_ascii_lowercase()).copied()
    }

    /// Archive entry holding a scene's video
    pub fn scene_entry(scene: &str) -> String {
        format!("{scene}.mm")
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Find `name` in `dir`, ignoring case
pub fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|f| f.to_string_lossy().eq_ignore_ascii_case(name))
                    .unwrap_or(false)
        })
}

/// Paths and cue sounds for one game installation
pub struct GameData {
    pub lib_path: PathBuf,
    pub script_path: PathBuf,
    pub cues: HashMap<Cue, SoundClip>,
}

impl GameData {
    /// Locate the archive and script, and load whatever cues exist
    pub fn locate(game_dir: &Path, game: GameId, cue_files: &[(Cue, &str)]) -> Result<Self> {
        let lib_path = find_file(game_dir, game.lib_file()).with_context(|| {
            format!("{} not found in {}", game.lib_file(), game_dir.display())
        })?;
        let script_path = find_file(game_dir, game.script_file()).with_context(|| {
            format!("{} not found in {}", game.script_file(), game_dir.display())
        })?;

        let mut cues = HashMap::new();
        for &(cue, file) in cue_files {
            let Some(path) = find_file(game_dir, file) else {
                tracing::warn!("Sound cue {} missing, {:?} will be silent", file, cue);
                continue;
            };
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let clip = SoundClip::from_cue_bytes(&bytes);
                    tracing::debug!("Cue {:?}: {} ({} ms)", cue, file, clip.duration_ms());
                    cues.insert(cue, clip);
                }
                Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        tracing::info!(
            "{}: {} / {}, {} sound cues",
            game.display_name(),
            lib_path.display(),
            script_path.display(),
            cues.len()
        );

        Ok(GameData {
            lib_path,
            script_path,
            cues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn library_ignores_case() {
        let lib = SceneLibrary::from_entries([("SCENE1.MM", 0x40), ("scene2.mm", 0x80)]);
        assert_eq!(lib.offset("scene1.mm"), Some(0x40));
        assert_eq!(lib.offset(&SceneLibrary::scene_entry("Scene2")), Some(0x80));
        assert_eq!(lib.offset("scene3.mm"), None);
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn locate_finds_dos_names() {
        let dir = std::env::temp_dir().join("openalg_test_assets");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("maddog.lib"), b"").unwrap();
        fs::write(dir.join("MADDOG.SCN"), b"").unwrap();
        fs::write(dir.join("BLOW.8B"), [0x80u8; 16]).unwrap();

        let cues = [(Cue::Shot, "blow.8b"), (Cue::Empty, "empty.8b")];
        let data = GameData::locate(&dir, GameId::MadDog, &cues).unwrap();
        assert!(data.lib_path.ends_with("maddog.lib"));
        assert_eq!(data.cues.len(), 1);
        assert_eq!(data.cues[&Cue::Shot].pcm_data.len(), 16);

        fs::remove_file(dir.join("MADDOG.SCN")).unwrap();
        assert!(GameData::locate(&dir, GameId::MadDog, &[]).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
