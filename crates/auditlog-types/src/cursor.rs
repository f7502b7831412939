//! Pagination cursor codec.
//!
//! A cursor is nothing more than an offset and a page size carried in the
//! query string (`?offset=<n>&limit=<n>`). [`decode`] validates the raw
//! parameters, [`next_cursor_for`] decides whether another page exists, and
//! [`encode`] renders a window back into a followable link.

use thiserror::Error;
use url::form_urlencoded;

use crate::{PageRequest, PagingSettings};

/// Query parameter carrying the page offset.
pub const OFFSET_PARAM: &str = "offset";
/// Query parameter carrying the page size.
pub const LIMIT_PARAM: &str = "limit";

/// Errors produced while decoding pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The offset was present but is not a non-negative integer.
    #[error("invalid offset '{0}': expected a non-negative integer")]
    InvalidOffset(String),

    /// The limit was present but is not a positive integer.
    #[error("invalid limit '{0}': expected a positive integer")]
    InvalidLimit(String),
}

/// Parses raw `offset` / `limit` query values into a [`PageRequest`].
///
/// A missing offset means `0`. A missing limit means
/// `settings.default_limit`; any limit above `settings.max_limit` is clamped
/// down to it.
///
/// # Errors
///
/// Returns [`CursorError::InvalidOffset`] or [`CursorError::InvalidLimit`]
/// when a value is present but malformed. Empty strings are malformed.
pub fn decode(
    raw_offset: Option<&str>,
    raw_limit: Option<&str>,
    settings: PagingSettings,
) -> Result<PageRequest, CursorError> {
    let offset = match raw_offset {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| CursorError::InvalidOffset(raw.to_string()))?,
        None => 0,
    };

    let limit = match raw_limit {
        Some(raw) => parse_limit(raw, settings.max_limit)?,
        None => settings.default_limit,
    };

    let limit = limit.min(settings.max_limit);
    PageRequest::new(offset, limit).ok_or_else(|| CursorError::InvalidLimit(limit.to_string()))
}

fn parse_limit(raw: &str, max_limit: u32) -> Result<u32, CursorError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(0) => Err(CursorError::InvalidLimit(raw.to_string())),
        Ok(n) => Ok(u32::try_from(n).unwrap_or(max_limit)),
        // All digits but too large for u64: still a positive integer, so clamp.
        Err(_) if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(max_limit)
        }
        Err(_) => Err(CursorError::InvalidLimit(raw.to_string())),
    }
}

/// Computes the window following a page.
///
/// Returns `None` when the page came back short (`returned_count < limit`),
/// which signals end of stream.
pub fn next_cursor_for(current_offset: u64, limit: u32, returned_count: usize) -> Option<PageRequest> {
    if returned_count < limit as usize {
        return None;
    }
    PageRequest::new(current_offset.saturating_add(u64::from(limit)), limit)
}

/// Renders `page` as query parameters appended to `base_uri`.
pub fn encode(page: &PageRequest, base_uri: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(OFFSET_PARAM, &page.offset.to_string())
        .append_pair(LIMIT_PARAM, &page.limit.to_string())
        .finish();

    let separator = if base_uri.contains('?') { '&' } else { '?' };
    format!("{base_uri}{separator}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PagingSettings {
        PagingSettings {
            default_limit: 25,
            max_limit: 50,
        }
    }

    #[test]
    fn decode_defaults_when_absent() {
        let page = decode(None, None, settings()).unwrap();
        assert_eq!(page, PageRequest::new(0, 25).unwrap());
    }

    #[test]
    fn decode_reads_both_values() {
        let page = decode(Some("10"), Some("5"), settings()).unwrap();
        assert_eq!(page, PageRequest::new(10, 5).unwrap());
    }

    #[test]
    fn decode_clamps_limit_to_max() {
        let page = decode(None, Some("500"), settings()).unwrap();
        assert_eq!(page.limit, 50);

        let page = decode(None, Some("99999999999999999999999"), settings()).unwrap();
        assert_eq!(page.limit, 50);
    }

    #[test]
    fn decode_clamps_default_above_max() {
        let settings = PagingSettings {
            default_limit: 200,
            max_limit: 50,
        };
        assert_eq!(decode(None, None, settings).unwrap().limit, 50);
    }

    #[test]
    fn decode_rejects_non_numeric_offset() {
        let err = decode(Some("incorrect offset"), Some("2"), settings()).unwrap_err();
        assert_eq!(err, CursorError::InvalidOffset("incorrect offset".to_string()));
    }

    #[test]
    fn decode_rejects_negative_and_empty_offset() {
        assert!(matches!(
            decode(Some("-1"), None, settings()),
            Err(CursorError::InvalidOffset(_))
        ));
        assert!(matches!(
            decode(Some(""), None, settings()),
            Err(CursorError::InvalidOffset(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_limits() {
        for raw in ["0", "-3", "ten", "", "2.5"] {
            assert!(
                matches!(
                    decode(None, Some(raw), settings()),
                    Err(CursorError::InvalidLimit(_))
                ),
                "limit {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn next_cursor_absent_on_short_page() {
        assert_eq!(next_cursor_for(4, 2, 1), None);
        assert_eq!(next_cursor_for(0, 10, 0), None);
    }

    #[test]
    fn next_cursor_advances_by_limit() {
        assert_eq!(next_cursor_for(0, 2, 2), PageRequest::new(2, 2));
        assert_eq!(next_cursor_for(2, 2, 2), PageRequest::new(4, 2));
    }

    #[test]
    fn encode_appends_query() {
        let page = PageRequest::new(4, 2).unwrap();
        assert_eq!(
            encode(&page, "/api/audit-events"),
            "/api/audit-events?offset=4&limit=2"
        );
        assert_eq!(
            encode(&page, "http://host/api/audit-events?x=1"),
            "http://host/api/audit-events?x=1&offset=4&limit=2"
        );
    }

    #[test]
    fn encoded_link_decodes_to_same_window() {
        let page = PageRequest::new(40, 20).unwrap();
        let link = encode(&page, "/feed");
        let query = link.split_once('?').map(|(_, q)| q).unwrap();

        let mut offset = None;
        let mut limit = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                OFFSET_PARAM => offset = Some(value.into_owned()),
                LIMIT_PARAM => limit = Some(value.into_owned()),
                _ => {}
            }
        }

        let decoded = decode(offset.as_deref(), limit.as_deref(), settings()).unwrap();
        assert_eq!(decoded, page);
    }
}
