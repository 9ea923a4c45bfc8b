//! Path -> file id index over a remote tree snapshot

use std::collections::HashMap;
use tracing::{debug, warn};

use super::LibraryError;
use super::snapshot::RemoteTreeSnapshot;
use crate::pcloud::RemoteEntry;

/// Maps a root-relative track path (`/Artist/Album/01.mp3`) to its file id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicIndex {
    entries: HashMap<String, u64>,
}

impl MusicIndex {
    /// Walk the snapshot and record every file whose name ends with one of
    /// `suffixes`. Matching is a case-sensitive test on the trailing
    /// characters of the name, not an extension parse.
    pub fn build(snapshot: &RemoteTreeSnapshot, suffixes: &[String]) -> Result<Self, LibraryError> {
        let suffixes: Vec<&str> = suffixes
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();

        let mut entries = HashMap::new();
        let root_children = snapshot.metadata.contents.as_deref().ok_or_else(|| {
            LibraryError::MissingContents(snapshot.source_path().unwrap_or("/").to_string())
        })?;

        // Each stack frame is a folder's children plus the path segments leading to it
        let mut stack: Vec<(Vec<&str>, &[RemoteEntry])> = vec![(Vec::new(), root_children)];

        while let Some((segments, children)) = stack.pop() {
            for entry in children {
                let mut path = segments.clone();
                path.push(entry.name.as_str());

                if !entry.is_folder && suffixes.iter().any(|s| entry.name.ends_with(s)) {
                    let key = join_segments(&path);
                    let file_id = entry
                        .file_id
                        .ok_or_else(|| LibraryError::MalformedEntry(key.clone()))?;
                    if let Some(previous) = entries.insert(key.clone(), file_id) {
                        warn!("Duplicate track path {} ({} replaced by {})", key, previous, file_id);
                    }
                }

                if let Some(contents) = entry.contents.as_deref() {
                    stack.push((path, contents));
                }
            }
        }

        debug!("Indexed {} tracks", entries.len());
        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<u64> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, u64)> for MusicIndex {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn join_segments(segments: &[&str]) -> String {
    let mut key = String::new();
    for segment in segments {
        key.push('/');
        key.push_str(segment);
    }
    key
}
