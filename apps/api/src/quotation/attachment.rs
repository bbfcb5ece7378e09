//! Attachment staging: writes an uploaded PDF to a scoped temp file and reads its text.
//!
//! The temp file lives exactly as long as the returned `StagedPdf`; every
//! early return drops it, which deletes it from disk.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";
const DEFAULT_FILE_NAME: &str = "documento.pdf";

/// A file received from the form, still in memory.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Attachment {
    pub fn new(file_name: Option<String>, bytes: Bytes) -> Self {
        let file_name = file_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        Self { file_name, bytes }
    }
}

/// A PDF staged on disk, with its extracted text when extraction was requested.
#[derive(Debug)]
pub struct StagedPdf {
    file: NamedTempFile,
    pub file_name: String,
    /// Empty unless staged with `extract_text`.
    pub text: String,
}

impl StagedPdf {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// First `max_chars` characters of the extracted text.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

/// Stages a PDF in the system temp directory.
///
/// Only the `%PDF-` header is checked. The body is parsed just when
/// `extract_text` is set, so a file headed for upload is never rejected
/// by the local parser.
pub async fn stage_pdf(attachment: &Attachment, extract_text: bool) -> Result<StagedPdf, AppError> {
    stage_pdf_in(&std::env::temp_dir(), attachment, extract_text).await
}

pub async fn stage_pdf_in(
    dir: &Path,
    attachment: &Attachment,
    extract_text: bool,
) -> Result<StagedPdf, AppError> {
    if !attachment.bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation(format!(
            "Attachment '{}' is not a PDF",
            attachment.file_name
        )));
    }

    let mut file = tempfile::Builder::new()
        .prefix("cotizacion-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .context("Failed to create temp file for attachment")?;
    file.write_all(&attachment.bytes)
        .and_then(|_| file.flush())
        .context("Failed to write attachment to temp file")?;

    let text = if extract_text {
        // pdf-extract is synchronous and may panic on malformed input
        let path = file.path().to_path_buf();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| unreadable(&attachment.file_name, e))?
            .map_err(|e| unreadable(&attachment.file_name, e))?
    } else {
        String::new()
    };

    debug!(
        "Staged attachment '{}' ({} bytes, {} chars of text)",
        attachment.file_name,
        attachment.bytes.len(),
        text.chars().count()
    );

    Ok(StagedPdf {
        file,
        file_name: attachment.file_name.clone(),
        text,
    })
}

fn unreadable(file_name: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Attachment '{file_name}' could not be read as a PDF: {err}"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a one-page PDF drawing `text` in Helvetica. An empty `text`
    /// gives a page with an empty content stream.
    pub(crate) fn sample_pdf(text: &str) -> Vec<u8> {
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
        };
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
            format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_at = pdf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            tail.push_str(&format!("{offset:010} 00000 n \n"));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.extend_from_slice(tail.as_bytes());
        pdf
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_attachment_name_defaults_when_missing_or_blank() {
        let bytes = Bytes::from_static(b"%PDF-");
        assert_eq!(Attachment::new(None, bytes.clone()).file_name, "documento.pdf");
        assert_eq!(Attachment::new(Some("  ".into()), bytes.clone()).file_name, "documento.pdf");
        assert_eq!(Attachment::new(Some("req.pdf".into()), bytes).file_name, "req.pdf");
    }

    #[tokio::test]
    async fn test_non_pdf_rejected_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = Attachment::new(Some("notas.txt".into()), Bytes::from_static(b"hola"));

        let err = stage_pdf_in(dir.path(), &attachment, true).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_broken_pdf_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = Attachment::new(
            Some("roto.pdf".into()),
            Bytes::from_static(b"%PDF-1.4\nthis is not really a pdf\n"),
        );

        match stage_pdf_in(dir.path(), &attachment, true).await {
            Err(AppError::Validation(msg)) => assert!(msg.contains("roto.pdf")),
            Err(other) => panic!("expected Validation, got {other:?}"),
            // a lenient parser may accept it, but there is no text to find
            Ok(staged) => assert!(staged.text.trim().is_empty()),
        }
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_unparseable_pdf_is_staged_when_not_extracting() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = Attachment::new(
            Some("escaneo.pdf".into()),
            Bytes::from_static(b"%PDF-1.7\nbody only the provider can read\n"),
        );

        let staged = stage_pdf_in(dir.path(), &attachment, false).await.unwrap();
        assert!(staged.text.is_empty());
        assert_eq!(std::fs::read(staged.path()).unwrap(), attachment.bytes.as_ref());

        drop(staged);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_extracts_text_from_valid_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = Attachment::new(
            Some("ticket.pdf".into()),
            Bytes::from(sample_pdf("Exportacion")),
        );

        let staged = stage_pdf_in(dir.path(), &attachment, true).await.unwrap();
        assert!(staged.text.contains("Exportacion"), "{:?}", staged.text);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let staged = StagedPdf {
            file,
            file_name: "a.pdf".to_string(),
            text: "añoñ".to_string(),
        };
        assert_eq!(staged.excerpt(2), "añ");
        assert_eq!(staged.excerpt(10), "añoñ");
    }

    #[test]
    fn test_dropping_staged_pdf_deletes_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let staged = StagedPdf {
            file,
            file_name: "a.pdf".to_string(),
            text: String::new(),
        };
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }
}
