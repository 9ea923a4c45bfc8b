//! Path helpers

use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory
///
/// Paths without a leading `~` are returned unchanged, as is `~user`.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_unchanged() {
        assert_eq!(expand_home("/tmp/cache.json"), PathBuf::from("/tmp/cache.json"));
        assert_eq!(expand_home("relative/x.m3u"), PathBuf::from("relative/x.m3u"));
    }

    #[test]
    fn test_tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.cache/music.json"), home.join(".cache/music.json"));
            assert_eq!(expand_home("~"), home);
        }
    }

    #[test]
    fn test_other_user_not_expanded() {
        assert_eq!(expand_home("~bob/x"), PathBuf::from("~bob/x"));
    }
}
