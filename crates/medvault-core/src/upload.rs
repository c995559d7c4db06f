use thiserror::Error;

/// Hard cap on uploaded content: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Reasons an upload is rejected before anything is written.
///
/// The messages are part of the public API and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("file and patient_id required")]
    MissingField,

    #[error("only PDF files are allowed")]
    NotPdf,

    #[error("file size exceeds 10MB limit")]
    TooLarge,
}

/// Upload acceptance rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Also require the content to start with `%PDF-`. Rejections use the
    /// same `NotPdf` error as a wrong declared content type.
    pub sniff_magic: bool,
}

impl UploadPolicy {
    pub fn strict() -> Self {
        Self { sniff_magic: true }
    }

    /// Check an upload. Rules run in a fixed order and the first failure wins:
    /// required fields, then content type, then size.
    ///
    /// A file without a filename counts as missing.
    pub fn validate(
        &self,
        filename: &str,
        content_type: Option<&str>,
        patient_id: &str,
        content: &[u8],
    ) -> Result<(), UploadError> {
        if filename.is_empty() || content.is_empty() || patient_id.is_empty() {
            return Err(UploadError::MissingField);
        }
        if !content_type.is_some_and(is_pdf_media_type) {
            return Err(UploadError::NotPdf);
        }
        if self.sniff_magic && !content.starts_with(PDF_MAGIC) {
            return Err(UploadError::NotPdf);
        }
        if content.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }
        Ok(())
    }
}

/// Media types compare case-insensitively and parameters are ignored,
/// so `Application/PDF; name=x` is still a PDF.
pub fn is_pdf_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.4 test";

    #[test]
    fn accepts_declared_pdf() {
        let policy = UploadPolicy::default();
        assert_eq!(
            policy.validate("a.pdf", Some("application/pdf"), "p1", PDF),
            Ok(())
        );
    }

    #[test]
    fn missing_fields_rejected_first() {
        let policy = UploadPolicy::default();
        // Empty content with a non-PDF type still reports the missing field.
        assert_eq!(
            policy.validate("a.txt", Some("text/plain"), "p1", b""),
            Err(UploadError::MissingField)
        );
        assert_eq!(
            policy.validate("a.pdf", Some("application/pdf"), "", PDF),
            Err(UploadError::MissingField)
        );
        assert_eq!(
            policy.validate("", Some("application/pdf"), "p1", PDF),
            Err(UploadError::MissingField)
        );
    }

    #[test]
    fn non_pdf_content_type_rejected() {
        let policy = UploadPolicy::default();
        assert_eq!(
            policy.validate("test.txt", Some("text/plain"), "p1", b"hello"),
            Err(UploadError::NotPdf)
        );
        assert_eq!(
            policy.validate("test.pdf", None, "p1", PDF),
            Err(UploadError::NotPdf)
        );
    }

    #[test]
    fn content_type_check_runs_before_size_check() {
        let policy = UploadPolicy::default();
        let big = vec![b'x'; MAX_UPLOAD_BYTES + 1];
        assert_eq!(
            policy.validate("big.bin", Some("application/octet-stream"), "p1", &big),
            Err(UploadError::NotPdf)
        );
    }

    #[test]
    fn size_cap_is_inclusive() {
        let policy = UploadPolicy::default();
        let exact = vec![b'x'; MAX_UPLOAD_BYTES];
        assert_eq!(
            policy.validate("ok.pdf", Some("application/pdf"), "p1", &exact),
            Ok(())
        );
        let over = vec![b'x'; MAX_UPLOAD_BYTES + 1];
        assert_eq!(
            policy.validate("big.pdf", Some("application/pdf"), "p1", &over),
            Err(UploadError::TooLarge)
        );
    }

    #[test]
    fn media_type_parameters_and_case_ignored() {
        assert!(is_pdf_media_type("application/pdf"));
        assert!(is_pdf_media_type("Application/PDF"));
        assert!(is_pdf_media_type("application/pdf; name=scan.pdf"));
        assert!(!is_pdf_media_type("application/pdfx"));
        assert!(!is_pdf_media_type("application/x-pdf"));
        assert!(!is_pdf_media_type(""));
    }

    #[test]
    fn sniffing_rejects_mislabelled_content() {
        let strict = UploadPolicy::strict();
        assert_eq!(
            strict.validate("fake.pdf", Some("application/pdf"), "p1", b"<html>"),
            Err(UploadError::NotPdf)
        );
        assert_eq!(
            strict.validate("real.pdf", Some("application/pdf"), "p1", PDF),
            Ok(())
        );
        // Without sniffing the label alone decides.
        assert_eq!(
            UploadPolicy::default().validate("fake.pdf", Some("application/pdf"), "p1", b"<html>"),
            Ok(())
        );
    }

    #[test]
    fn error_messages_are_stable() {
        assert_eq!(UploadError::MissingField.to_string(), "file and patient_id required");
        assert_eq!(UploadError::NotPdf.to_string(), "only PDF files are allowed");
        assert_eq!(UploadError::TooLarge.to_string(), "file size exceeds 10MB limit");
    }
}
