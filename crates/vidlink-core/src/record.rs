//! Registry record and public listing shapes
//!
//! The on-disk primary store is a bare JSON object mapping a public number
//! to a record, e.g.:
//!
//! ```json
//! { "4217": { "driveId": "1AbC...", "name": "clip.mp4" } }
//! ```
//!
//! Legacy files carry only `driveId` and `name`; the richer metadata fields
//! (`size`, `createdAt`, `views`) are present only when the secondary store
//! holds the record, so all of them deserialize as optional and are skipped
//! when absent so rewritten files stay legacy-compatible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum length of an opaque blob identifier.
///
/// Public numbers are four digits, so anything this long made of URL-safe
/// base64 characters can only be a raw blob id embedded in an old link.
const DIRECT_REFERENCE_MIN_LEN: usize = 28;

/// A single registry entry, keyed externally by its public number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Opaque identifier returned by the external blob store
    #[serde(rename = "driveId")]
    pub drive_id: String,

    /// Original filename, display-only
    pub name: String,

    /// Payload size in bytes (secondary store only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Creation timestamp (secondary store only)
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    /// View counter (secondary store only, best-effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl VideoRecord {
    /// Create a record as the upload path produces it: blob reference plus
    /// display name, with optional size. Timestamps and view counts are
    /// defaulted by the secondary store on first insert, not here.
    pub fn new(drive_id: impl Into<String>, name: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            drive_id: drive_id.into(),
            name: name.into(),
            size,
            created_at: None,
            views: None,
        }
    }

    /// Fill fields absent on `self` from another copy of the same record.
    ///
    /// Used when the secondary store wins a read but the primary copy still
    /// carries metadata the secondary never stored.
    pub fn backfill_from(mut self, other: &VideoRecord) -> Self {
        if self.size.is_none() {
            self.size = other.size;
        }
        if self.created_at.is_none() {
            self.created_at = other.created_at;
        }
        if self.views.is_none() {
            self.views = other.views;
        }
        self
    }
}

/// Public-facing listing shape produced by `list()` and the broadcast path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoListing {
    /// Public number
    pub number: String,

    /// Opaque blob identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Viewer link embedding the configured base URL and the number
    pub link: String,

    /// Direct link into the blob store's own UI (admin listing only)
    #[serde(rename = "driveLink", default, skip_serializing_if = "Option::is_none")]
    pub drive_link: Option<String>,
}

impl VideoListing {
    /// Build a listing from a registry entry.
    pub fn from_record(number: &str, record: &VideoRecord, base_url: &str) -> Self {
        Self {
            number: number.to_string(),
            id: record.drive_id.clone(),
            name: record.name.clone(),
            link: format!("{}/?video={}", base_url.trim_end_matches('/'), number),
            drive_link: None,
        }
    }

    /// Attach the blob store's own viewer link (admin listing shape).
    pub fn with_drive_link(mut self) -> Self {
        self.drive_link = Some(format!(
            "https://drive.google.com/file/d/{}/view",
            self.id
        ));
        self
    }
}

/// Result of resolving a public identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The identifier IS the opaque blob id (legacy link support); neither
    /// store was consulted.
    Direct {
        /// The blob identifier as given
        drive_id: String,
    },

    /// The identifier matched a registry entry in one of the stores.
    Stored {
        /// Public number the record is keyed by
        number: String,
        /// The resolved record
        record: VideoRecord,
    },
}

impl Resolution {
    /// The blob identifier this resolution points at.
    pub fn drive_id(&self) -> &str {
        match self {
            Resolution::Direct { drive_id } => drive_id,
            Resolution::Stored { record, .. } => &record.drive_id,
        }
    }

    /// Whether this was a direct (store-bypassing) reference.
    pub fn is_direct(&self) -> bool {
        matches!(self, Resolution::Direct { .. })
    }
}

/// Whether an identifier syntactically looks like a raw opaque blob id:
/// at least 28 characters, all URL-safe base64.
///
/// Old links embedded the blob id directly; those must keep resolving
/// without a registry entry.
pub fn is_direct_reference(identifier: &str) -> bool {
    identifier.len() >= DIRECT_REFERENCE_MIN_LEN
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_file_entry_deserializes() {
        let json = r#"{ "driveId": "abc", "name": "x.mp4" }"#;
        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.drive_id, "abc");
        assert_eq!(record.name, "x.mp4");
        assert!(record.size.is_none());
        assert!(record.created_at.is_none());
        assert!(record.views.is_none());
    }

    #[test]
    fn minimal_record_serializes_without_optional_fields() {
        let record = VideoRecord::new("abc", "x.mp4", None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "driveId": "abc", "name": "x.mp4" })
        );
    }

    #[test]
    fn direct_reference_shape() {
        // A realistic Drive file id: 33 URL-safe base64 chars
        assert!(is_direct_reference("1aBcDeFgHiJkLmNoPqRsTuVwXyZ01234-"));
        // Too short
        assert!(!is_direct_reference("4217"));
        // Long enough but contains a non-base64 character
        assert!(!is_direct_reference("1aBcDeFgHiJkLmNoPqRsTuVwXyZ/1234"));
    }

    #[test]
    fn listing_link_embeds_number() {
        let record = VideoRecord::new("abc", "x.mp4", None);
        let listing = VideoListing::from_record("42", &record, "https://vid.example/");
        assert_eq!(listing.link, "https://vid.example/?video=42");
        assert!(listing.drive_link.is_none());

        let listing = listing.with_drive_link();
        assert_eq!(
            listing.drive_link.as_deref(),
            Some("https://drive.google.com/file/d/abc/view")
        );
    }

    #[test]
    fn backfill_preserves_secondary_fields() {
        let mut secondary = VideoRecord::new("abc", "x.mp4", None);
        secondary.views = Some(7);
        let primary = VideoRecord::new("abc", "x.mp4", Some(1024));

        let merged = secondary.backfill_from(&primary);
        assert_eq!(merged.views, Some(7));
        assert_eq!(merged.size, Some(1024));
    }
}
