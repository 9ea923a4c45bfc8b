//! pCloud API response models

use serde::{Deserialize, Serialize};

/// Envelope fields shared by every response
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub result: i64,
    pub error: Option<String>,
}

// userinfo?getauth=1
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub auth: String,
}

// listfolder?recursive=1
#[derive(Debug, Clone, Deserialize)]
pub struct FolderListing {
    pub metadata: RemoteEntry,
}

/// A file or folder in the remote tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(rename = "isfolder", default)]
    pub is_folder: bool,
    #[serde(rename = "fileid", default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<u64>,
    #[serde(rename = "folderid", default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<u64>,
    /// Only present on the entry a listing was requested for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<RemoteEntry>>,
}

impl RemoteEntry {
    pub fn file(name: &str, file_id: u64) -> Self {
        Self {
            name: name.to_string(),
            is_folder: false,
            file_id: Some(file_id),
            folder_id: None,
            path: None,
            contents: None,
        }
    }

    pub fn folder(name: &str, contents: Vec<RemoteEntry>) -> Self {
        Self {
            name: name.to_string(),
            is_folder: true,
            file_id: None,
            folder_id: None,
            path: None,
            contents: Some(contents),
        }
    }
}

// collection_list
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionList {
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// Remote collection (playlist) summary
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Collection {
    pub id: u64,
    pub name: String,
}

// collection_create
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionCreated {
    pub collection: Collection,
}

// listtokens
#[derive(Debug, Clone, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub tokens: Vec<IssuedToken>,
}

/// A session token issued to some device
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssuedToken {
    #[serde(rename = "tokenid")]
    pub token_id: u64,
    pub expires: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_entry_from_listing_json() {
        let json = serde_json::json!({
            "name": "Music",
            "isfolder": true,
            "folderid": 10,
            "path": "/Music",
            "contents": [
                {"name": "a.mp3", "isfolder": false, "fileid": 1, "size": 1234},
            ]
        });
        let entry: RemoteEntry = serde_json::from_value(json).unwrap();
        assert!(entry.is_folder);
        assert_eq!(entry.path.as_deref(), Some("/Music"));
        let contents = entry.contents.unwrap();
        assert_eq!(contents[0].file_id, Some(1));
        assert!(!contents[0].is_folder);
    }

    #[test]
    fn test_issued_token_defaults() {
        let json = serde_json::json!({"tokenid": 7, "expires": "Thu, 01 Jan 2026 00:00:00 +0000"});
        let token: IssuedToken = serde_json::from_value(json).unwrap();
        assert_eq!(token.token_id, 7);
        assert!(token.device.is_empty());
        assert!(!token.current);
    }
}
