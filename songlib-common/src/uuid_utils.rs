//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse an id read back from storage
///
/// Ids are written as hyphenated TEXT, so a parse failure means the row is
/// corrupt rather than the caller being wrong.
pub fn parse_stored(column: &str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        Error::Internal(format!("{} holds invalid UUID '{}': {}", column, s, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_v4_and_unique() {
        let a = generate();
        let b = generate();
        assert_eq!(a.get_version_num(), 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_stored_round_trips_text_form() {
        let id = generate();
        assert_eq!(parse_stored("songs.id", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_stored_rejects_garbage() {
        let err = parse_stored("songs.group_id", "not-a-uuid").unwrap_err();
        assert!(matches!(err, Error::Internal(msg) if msg.contains("songs.group_id")));
    }
}
