//! Cursor-based pagination utilities.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;
use uuid::Uuid;

/// Error type for cursor operations.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid rank in cursor")]
    InvalidRank,
    #[error("Invalid ID in cursor")]
    InvalidId,
}

/// Encodes a cursor from a sort rank and an ID.
///
/// The cursor format is: base64(rank:id). The composite cursor keeps
/// ordering stable when two entries share the same rank value.
pub fn encode_cursor(rank: u64, id: Uuid) -> String {
    let raw = format!("{}:{}", rank, id);
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor into its rank and ID.
///
/// Returns a `(rank, id)` tuple on success.
pub fn decode_cursor(cursor: &str) -> Result<(u64, Uuid), CursorError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;

    let s = String::from_utf8(decoded).map_err(|_| CursorError::InvalidFormat)?;

    let colon_pos = s.find(':').ok_or(CursorError::InvalidFormat)?;

    let rank: u64 = s[..colon_pos].parse().map_err(|_| CursorError::InvalidRank)?;
    let id: Uuid = s[colon_pos + 1..]
        .parse()
        .map_err(|_| CursorError::InvalidId)?;

    Ok((rank, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_cursor_roundtrip() {
        let id = Uuid::new_v4();
        let cursor = encode_cursor(42, id);
        let (rank, decoded_id) = decode_cursor(&cursor).unwrap();
        assert_eq!(rank, 42);
        assert_eq!(decoded_id, id);
    }

    #[test]
    fn test_decode_cursor_rejects_garbage() {
        assert!(matches!(
            decode_cursor("!!not-base64!!"),
            Err(CursorError::InvalidEncoding)
        ));
    }

    #[test]
    fn test_decode_cursor_rejects_missing_separator() {
        let cursor = URL_SAFE_NO_PAD.encode(b"12345");
        assert!(matches!(
            decode_cursor(&cursor),
            Err(CursorError::InvalidFormat)
        ));
    }

    #[test]
    fn test_decode_cursor_rejects_bad_id() {
        let cursor = URL_SAFE_NO_PAD.encode(b"7:not-a-uuid");
        assert!(matches!(decode_cursor(&cursor), Err(CursorError::InvalidId)));
    }

    #[test]
    fn test_decode_cursor_rejects_bad_rank() {
        let id = Uuid::new_v4();
        let cursor = URL_SAFE_NO_PAD.encode(format!("abc:{}", id).as_bytes());
        assert!(matches!(
            decode_cursor(&cursor),
            Err(CursorError::InvalidRank)
        ));
    }
}
