//! Local m3u playlist reading

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ordered track list read from one local playlist file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDefinition {
    /// Remote collection name: the file name without its extension
    pub name: String,
    /// Library-relative track paths, each starting with `/`
    pub tracks: Vec<String>,
}

impl PlaylistDefinition {
    /// Read a playlist file, stripping `strip_prefix` from every track path
    pub fn read(path: &Path, strip_prefix: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read playlist file {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Playlist path has no file name: {}", path.display()))?;

        Ok(Self {
            name,
            tracks: parse_tracks(&contents, strip_prefix),
        })
    }
}

/// Extract track paths from m3u content, preserving order
///
/// Blank lines and `#` directives (`#EXTM3U`, `#EXTINF:...`) are skipped.
pub fn parse_tracks(contents: &str, strip_prefix: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| normalize_track(line, strip_prefix))
        .collect()
}

fn normalize_track(line: &str, strip_prefix: &str) -> String {
    let stripped = if strip_prefix.is_empty() {
        line
    } else {
        line.strip_prefix(strip_prefix).unwrap_or(line)
    };

    if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{}", stripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stripped_and_order_kept() {
        let contents = "/rep/music/b.mp3\n/rep/music/Sub/a.mp3\n";
        assert_eq!(
            parse_tracks(contents, "/rep/music"),
            vec!["/b.mp3".to_string(), "/Sub/a.mp3".to_string()]
        );
    }

    #[test]
    fn test_paths_normalized_to_leading_slash() {
        assert_eq!(parse_tracks("Sub/a.mp3\n", ""), vec!["/Sub/a.mp3".to_string()]);
        assert_eq!(
            parse_tracks("/rep/musicSub/a.mp3\n", "/rep/music"),
            vec!["/Sub/a.mp3".to_string()]
        );
    }

    #[test]
    fn test_directives_blank_lines_and_crlf_skipped() {
        let contents = "#EXTM3U\r\n#EXTINF:123,Artist - Title\r\n/x/a.mp3\r\n\r\n   \n/x/b.mp3";
        assert_eq!(
            parse_tracks(contents, "/x"),
            vec!["/a.mp3".to_string(), "/b.mp3".to_string()]
        );
    }

    #[test]
    fn test_line_without_prefix_is_kept() {
        assert_eq!(
            parse_tracks("/elsewhere/a.mp3\n", "/rep/music"),
            vec!["/elsewhere/a.mp3".to_string()]
        );
    }

    #[test]
    fn test_read_uses_file_stem_as_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Road Trip.m3u");
        fs::write(&path, "/rep/music/a.mp3\n").unwrap();

        let playlist = PlaylistDefinition::read(&path, "/rep/music").unwrap();
        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.tracks, vec!["/a.mp3".to_string()]);
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlaylistDefinition::read(&dir.path().join("none.m3u"), "").is_err());
    }
}
