use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::mime::mime_for_filename;

/// The kind of business record an attachment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Event,
    WorkOrder,
    ProductionOrder,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentKind::Event => "event",
            ParentKind::WorkOrder => "work_order",
            ParentKind::ProductionOrder => "production_order",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ParentKind::Event => "Event",
            ParentKind::WorkOrder => "Work Order",
            ParentKind::ProductionOrder => "Production Order",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "event" => Some(ParentKind::Event),
            "work_order" => Some(ParentKind::WorkOrder),
            "production_order" => Some(ParentKind::ProductionOrder),
            _ => None,
        }
    }
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A file attached to a parent record.
///
/// Created once on the client when the user picks a file and persisted inside
/// the parent's document. `storage_path` is opaque: only the storage reference
/// resolver knows how to turn it into an object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRef {
    /// Build a new record with a fresh id, inferring the MIME type from the filename.
    pub fn new(filename: &str, storage_path: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            mime_type: mime_for_filename(filename).to_string(),
            storage_path: storage_path.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// The attachment list of an event, work order or production order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRecord {
    pub kind: ParentKind,
    pub id: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl ParentRecord {
    pub fn new(kind: ParentKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn attach(&mut self, attachment: AttachmentRef) -> Result<(), CoreError> {
        if self.find(&attachment.id).is_some() {
            return Err(CoreError::InvalidInput(format!(
                "attachment {} already on {} {}",
                attachment.id, self.kind, self.id
            )));
        }
        self.attachments.push(attachment);
        Ok(())
    }

    /// Remove an attachment before the parent is saved.
    pub fn detach(&mut self, attachment_id: &str) -> Result<AttachmentRef, CoreError> {
        let idx = self
            .attachments
            .iter()
            .position(|a| a.id == attachment_id)
            .ok_or_else(|| CoreError::NotFound(format!("attachment {attachment_id}")))?;
        Ok(self.attachments.remove(idx))
    }

    pub fn find(&self, attachment_id: &str) -> Option<&AttachmentRef> {
        self.attachments.iter().find(|a| a.id == attachment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_kind_parse_str_round_trip() {
        let all = [
            ParentKind::Event,
            ParentKind::WorkOrder,
            ParentKind::ProductionOrder,
        ];
        for kind in all {
            assert_eq!(ParentKind::parse_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ParentKind::parse_str("invoice"), None);
        assert_eq!(ParentKind::parse_str(""), None);
    }

    #[test]
    fn parent_kind_display() {
        assert_eq!(format!("{}", ParentKind::WorkOrder), "Work Order");
        assert_eq!(
            format!("{}", ParentKind::ProductionOrder),
            "Production Order"
        );
    }

    #[test]
    fn new_attachment_infers_mime_type() {
        let att = AttachmentRef::new("Report.PDF", "documents/123_Report.PDF");
        assert_eq!(att.mime_type, "application/pdf");
        assert_eq!(att.storage_path, "documents/123_Report.PDF");
        assert!(!att.id.is_empty());

        let att = AttachmentRef::new("notes", "documents/notes");
        assert_eq!(att.mime_type, "application/octet-stream");
    }

    #[test]
    fn attachment_serializes_camel_case() {
        let att = AttachmentRef::new("photo.jpg", "documents/photo.jpg");
        let json = serde_json::to_value(&att).unwrap();
        assert_eq!(json["mimeType"], "image/jpeg");
        assert_eq!(json["storagePath"], "documents/photo.jpg");
        assert!(json.get("createdAt").is_some());

        let back: AttachmentRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, att);
    }

    #[test]
    fn attach_rejects_duplicate_id() {
        let mut order = ParentRecord::new(ParentKind::WorkOrder, "wo-1");
        let att = AttachmentRef::new("a.pdf", "documents/a.pdf");
        order.attach(att.clone()).unwrap();
        let err = order.attach(att).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(order.attachments.len(), 1);
    }

    #[test]
    fn detach_removes_and_returns_attachment() {
        let mut event = ParentRecord::new(ParentKind::Event, "ev-7");
        let a = AttachmentRef::new("a.pdf", "documents/a.pdf");
        let b = AttachmentRef::new("b.png", "documents/b.png");
        event.attach(a.clone()).unwrap();
        event.attach(b.clone()).unwrap();

        let removed = event.detach(&a.id).unwrap();
        assert_eq!(removed.id, a.id);
        assert!(event.find(&a.id).is_none());
        assert!(event.find(&b.id).is_some());

        let err = event.detach(&a.id).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
