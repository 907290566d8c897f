//! Resumption cursor for the location backfill.
//!
//! The backfill endpoint keeps no state between calls. Each response hands
//! the caller a serialized [`ContinuationToken`]; replaying it resumes the
//! scan after `last_processed_id`.
//!
//! Wire format is a JSON object with a `v` field. Tokens written before the
//! field existed carry no `v` and are read as version 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

pub const CONTINUATION_TOKEN_VERSION: u32 = 1;
pub const DEFAULT_LOCATION_BATCH_SIZE: u32 = 40;
/// Upper bound on ids per GraphQL `nodes` query.
pub const MAX_LOCATION_BATCH_SIZE: u32 = 250;

fn legacy_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationToken {
    #[serde(rename = "v", default = "legacy_version")]
    pub version: u32,
    pub last_processed_id: Option<Uuid>,
    pub batch_size: u32,
    pub updated_count: u64,
    pub total_processed: u64,
    pub start_time: DateTime<Utc>,
}

impl ContinuationToken {
    /// Token for a fresh backfill starting at `start_time`.
    #[must_use]
    pub fn start(batch_size: u32, start_time: DateTime<Utc>) -> Self {
        Self {
            version: CONTINUATION_TOKEN_VERSION,
            last_processed_id: None,
            batch_size,
            updated_count: 0,
            total_processed: 0,
            start_time,
        }
    }

    /// Token for the next step after a batch ending at `last_id`.
    #[must_use]
    pub fn advance(&self, last_id: Uuid, processed: u64, updated: u64) -> Self {
        Self {
            version: CONTINUATION_TOKEN_VERSION,
            last_processed_id: Some(last_id),
            batch_size: self.batch_size,
            updated_count: self.updated_count.saturating_add(updated),
            total_processed: self.total_processed.saturating_add(processed),
            start_time: self.start_time,
        }
    }

    /// Serializes to the opaque string handed to clients.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing a struct of plain fields to a String cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses a client-supplied token.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MalformedToken`] if the string is not a token object.
    /// - [`CoreError::UnsupportedTokenVersion`] for versions this build does
    ///   not understand.
    /// - [`CoreError::InvalidBatchSize`] if `batchSize` is zero or above
    ///   [`MAX_LOCATION_BATCH_SIZE`].
    pub fn decode(raw: &str) -> Result<Self, CoreError> {
        let token: Self = serde_json::from_str(raw).map_err(CoreError::MalformedToken)?;
        if token.version != CONTINUATION_TOKEN_VERSION {
            return Err(CoreError::UnsupportedTokenVersion {
                found: token.version,
                expected: CONTINUATION_TOKEN_VERSION,
            });
        }
        if token.batch_size == 0 || token.batch_size > MAX_LOCATION_BATCH_SIZE {
            return Err(CoreError::InvalidBatchSize {
                found: token.batch_size,
                max: MAX_LOCATION_BATCH_SIZE,
            });
        }
        Ok(token)
    }

    /// Milliseconds since the backfill began.
    #[must_use]
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.start_time).num_milliseconds()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn start_token_has_no_cursor() {
        let token = ContinuationToken::start(40, t0());
        assert!(token.last_processed_id.is_none());
        assert_eq!(token.updated_count, 0);
        assert_eq!(token.total_processed, 0);
        assert_eq!(token.version, CONTINUATION_TOKEN_VERSION);
    }

    #[test]
    fn advance_accumulates_and_keeps_start_time() {
        let id = Uuid::new_v4();
        let next = ContinuationToken::start(40, t0()).advance(id, 40, 12);
        let after = next.advance(Uuid::new_v4(), 3, 1);
        assert_eq!(next.last_processed_id, Some(id));
        assert_eq!(after.total_processed, 43);
        assert_eq!(after.updated_count, 13);
        assert_eq!(after.start_time, t0());
        assert_eq!(after.batch_size, 40);
    }

    #[test]
    fn encode_uses_camel_case_and_version_field() {
        let encoded = ContinuationToken::start(40, t0()).encode();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["v"], 1);
        assert_eq!(value["batchSize"], 40);
        assert!(value["lastProcessedId"].is_null());
        assert!(value["startTime"].is_string());
    }

    #[test]
    fn decode_accepts_unversioned_legacy_token() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"lastProcessedId":"{id}","batchSize":40,"updatedCount":12,"totalProcessed":40,"startTime":"2026-03-01T12:00:00Z"}}"#
        );
        let token = ContinuationToken::decode(&raw).unwrap();
        assert_eq!(token.version, 1);
        assert_eq!(token.last_processed_id, Some(id));
        assert_eq!(token.updated_count, 12);
    }

    #[test]
    fn decode_rejects_future_version() {
        let raw = r#"{"v":2,"lastProcessedId":null,"batchSize":40,"updatedCount":0,"totalProcessed":0,"startTime":"2026-03-01T12:00:00Z"}"#;
        let err = ContinuationToken::decode(raw).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedTokenVersion { found: 2, expected: 1 }
        ));
    }

    #[test]
    fn decode_rejects_zero_batch_size() {
        let raw = r#"{"v":1,"lastProcessedId":null,"batchSize":0,"updatedCount":0,"totalProcessed":0,"startTime":"2026-03-01T12:00:00Z"}"#;
        assert!(matches!(
            ContinuationToken::decode(raw),
            Err(CoreError::InvalidBatchSize { found: 0, .. })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            ContinuationToken::decode("not a token"),
            Err(CoreError::MalformedToken(_))
        ));
    }

    #[test]
    fn elapsed_is_never_negative() {
        let token = ContinuationToken::start(40, t0());
        assert_eq!(token.elapsed_ms(t0() - chrono::Duration::seconds(5)), 0);
        assert_eq!(token.elapsed_ms(t0() + chrono::Duration::seconds(2)), 2000);
    }
}
