//! Audio artifact discovery and loading.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// A downloaded audio file, fully loaded into memory for delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// File name as written by the download tool.
    pub file_name: String,
    pub title: String,
    pub performer: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioArtifact")
            .field("file_name", &self.file_name)
            .field("title", &self.title)
            .field("performer", &self.performer)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Finds the first file under `root` whose extension matches `extension`
/// (case-insensitive).
///
/// The walk is depth-first with entries visited in file-name order, so the
/// result is deterministic when the tool writes several candidates.
///
/// # Errors
///
/// Returns the IO error of the first directory that cannot be read.
pub fn find_audio_file(root: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    let mut entries: Vec<_> = fs::read_dir(root)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if let Some(found) = find_audio_file(&path, extension)? {
                return Ok(Some(found));
            }
        } else if has_extension(&path, extension) {
            debug!(path = %path.display(), "found audio artifact");
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_audio_file_in_root() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("song.mp3"), b"id3").unwrap();

        let found = find_audio_file(tmp.path(), "mp3").unwrap();
        assert_eq!(found, Some(tmp.path().join("song.mp3")));
    }

    #[test]
    fn test_find_audio_file_nested_two_levels() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("output").join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("track.mp3"), b"id3").unwrap();
        fs::write(tmp.path().join("log.txt"), b"noise").unwrap();

        let found = find_audio_file(tmp.path(), "mp3").unwrap();
        assert_eq!(found, Some(nested.join("track.mp3")));
    }

    #[test]
    fn test_find_audio_file_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("LOUD.MP3"), b"id3").unwrap();

        assert!(find_audio_file(tmp.path(), "mp3").unwrap().is_some());
    }

    #[test]
    fn test_find_audio_file_none_when_absent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cover.jpg"), b"jpg").unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();

        assert_eq!(find_audio_file(tmp.path(), "mp3").unwrap(), None);
    }

    #[test]
    fn test_find_audio_file_order_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.mp3"), b"b").unwrap();
        fs::write(tmp.path().join("a.mp3"), b"a").unwrap();

        let found = find_audio_file(tmp.path(), "mp3").unwrap();
        assert_eq!(found, Some(tmp.path().join("a.mp3")));
    }

    #[test]
    fn test_find_audio_file_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(find_audio_file(&tmp.path().join("gone"), "mp3").is_err());
    }

    #[test]
    fn test_artifact_debug_omits_bytes() {
        let artifact = AudioArtifact {
            file_name: "a.mp3".to_string(),
            title: "A".to_string(),
            performer: "B".to_string(),
            bytes: vec![0; 4096],
        };
        let rendered = format!("{artifact:?}");
        assert!(rendered.contains("len: 4096"), "got: {rendered}");
    }
}
