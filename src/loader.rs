//! Reads the exported `messages.json` archive.

use std::path::Path;

use anyhow::{Context, Result};

use crate::debug_log;
use crate::types::RawConversation;

/// Read and parse the export at `path`. Any structural problem fails the whole load.
pub fn load_export(path: &Path) -> Result<Vec<RawConversation>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read export file {}", path.display()))?;

    let records = parse_export(bytes)
        .with_context(|| format!("Failed to parse export file {}", path.display()))?;

    debug_log::log(
        "load",
        "PARSED",
        &format!("{} records from {}", records.len(), path.display()),
    );

    Ok(records)
}

pub fn parse_export(mut bytes: Vec<u8>) -> Result<Vec<RawConversation>> {
    let records: Vec<RawConversation> =
        simd_json::from_slice(&mut bytes).context("Export is not a list of conversations")?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"[
        {
            "participants": ["alice", "bob"],
            "conversation": [
                {"sender": "bob", "created_at": "2019-03-12T18:40:21.123456+00:00", "text": "hey",
                 "likes": [{"username": "alice", "date": "2019-03-12T18:41:00+00:00"}]},
                {"sender": "alice", "created_at": "2019-03-13T09:00:00+00:00", "media_url": "x.jpg"}
            ]
        },
        {"participants": ["alice", "carol", "dave"], "conversation": []}
    ]"#;

    #[test]
    fn test_load_export_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();

        let records = load_export(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].participants, vec!["alice", "bob"]);
        assert_eq!(records[0].conversation.len(), 2);

        let first = &records[0].conversation[0];
        assert_eq!(first.sender, "bob");
        assert_eq!(first.likes.as_ref().map(Vec::len), Some(1));
        assert!(records[0].conversation[1].likes.is_none());
        assert!(records[1].conversation.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_export(&dir.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read export file"));
    }

    #[test]
    fn test_missing_fields_are_fatal() {
        let err = parse_export(br#"[{"participants": ["alice"]}]"#.to_vec()).unwrap_err();
        assert!(format!("{err:#}").contains("Export is not a list of conversations"));

        let err = parse_export(br#"[{"conversation": []}]"#.to_vec()).unwrap_err();
        assert!(format!("{err:#}").contains("Export is not a list of conversations"));
    }

    #[test]
    fn test_non_array_is_fatal() {
        assert!(parse_export(br#"{"participants": [], "conversation": []}"#.to_vec()).is_err());
        assert!(parse_export(b"not json".to_vec()).is_err());
    }

    #[test]
    fn test_empty_export() {
        assert!(parse_export(b"[]".to_vec()).unwrap().is_empty());
    }
}
