//! Filename helpers: MIME inference from extension and filesystem-safe names.

pub const DEFAULT_MIME: &str = "application/octet-stream";

const MIME_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
];

/// Lowercased extension of the final path segment, if it looks like one.
pub fn extension(name: &str) -> Option<String> {
    let segment = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn has_extension(name: &str) -> bool {
    extension(name).is_some()
}

/// Infer a MIME type from the filename extension, case-insensitively.
pub fn mime_for_filename(name: &str) -> &'static str {
    let Some(ext) = extension(name) else {
        return DEFAULT_MIME;
    };
    MIME_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME)
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Make a filename safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_lookup_covers_table() {
        assert_eq!(mime_for_filename("a.pdf"), "application/pdf");
        assert_eq!(mime_for_filename("a.JPG"), "image/jpeg");
        assert_eq!(mime_for_filename("a.jpeg"), "image/jpeg");
        assert_eq!(mime_for_filename("a.png"), "image/png");
        assert_eq!(mime_for_filename("a.gif"), "image/gif");
        assert_eq!(mime_for_filename("a.doc"), "application/msword");
        assert!(mime_for_filename("a.docx").contains("wordprocessingml"));
        assert_eq!(mime_for_filename("a.xls"), "application/vnd.ms-excel");
        assert!(mime_for_filename("a.xlsx").contains("spreadsheetml"));
        assert_eq!(mime_for_filename("a.txt"), "text/plain");
        assert_eq!(mime_for_filename("a.csv"), "text/csv");
    }

    #[test]
    fn unknown_or_missing_extension_is_octet_stream() {
        assert_eq!(mime_for_filename("archive.zip"), DEFAULT_MIME);
        assert_eq!(mime_for_filename("550e8400-e29b-41d4-a716-446655440000"), DEFAULT_MIME);
        assert_eq!(mime_for_filename(".pdf"), DEFAULT_MIME);
        assert_eq!(mime_for_filename(""), DEFAULT_MIME);
    }

    #[test]
    fn extension_only_looks_at_last_segment() {
        assert_eq!(extension("documents.v2/abc"), None);
        assert_eq!(extension("documents/abc.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("1700000000000_report.final.xlsx").as_deref(), Some("xlsx"));
        assert!(!has_extension("trailing."));
        assert!(!has_extension("weird.ext-with-dash"));
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("My Report (v2).pdf"), "My_Report__v2_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("résumé.doc"), "r_sum_.doc");
        assert_eq!(sanitize_filename(""), "attachment");
        assert_eq!(sanitize_filename("..."), "attachment");
    }

    #[test]
    fn image_mime_detection() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("Image/JPEG"));
        assert!(!is_image_mime("application/pdf"));
    }
}
