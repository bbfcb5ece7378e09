//! Document Renderer: binds a quotation into a `.docx` template.
//!
//! A `.docx` is a zip archive. The XML parts that carry text (`word/document.xml`,
//! headers and footers) are preprocessed (see `xml`) and rendered with Tera;
//! every other entry is copied through untouched.
//!
//! Placeholder names must match the record's field names exactly. A
//! placeholder with no matching field fails the whole render.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub mod xml;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOCX_FILE_NAME: &str = "cotizacion.docx";

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("failed to read template {}: {source}", .path.display())]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template is not a valid .docx archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("template has no word/document.xml")]
    MissingDocumentPart,

    #[error("render data must be a JSON object")]
    DataNotObject,

    #[error("{part}: {message}")]
    Template { part: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders `data` into the template at `template_path`.
///
/// The returned buffer holds the complete document and is rewound to offset 0.
pub fn render_docx(data: &Value, template_path: &Path) -> Result<Cursor<Vec<u8>>, RenderError> {
    let template = std::fs::read(template_path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            RenderError::TemplateNotFound(template_path.to_path_buf())
        } else {
            RenderError::ReadTemplate {
                path: template_path.to_path_buf(),
                source,
            }
        }
    })?;
    render_docx_bytes(data, &template)
}

/// Renders `data` into an in-memory template.
pub fn render_docx_bytes(data: &Value, template: &[u8]) -> Result<Cursor<Vec<u8>>, RenderError> {
    if !data.is_object() {
        return Err(RenderError::DataNotObject);
    }
    let context = Context::from_value(xml::escape_values(data.clone()))
        .map_err(|_| RenderError::DataNotObject)?;

    let mut archive = ZipArchive::new(Cursor::new(template))?;
    if archive.index_for_name(DOCUMENT_PART).is_none() {
        return Err(RenderError::MissingDocumentPart);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if is_template_part(&name) {
            let mut source = String::new();
            entry.read_to_string(&mut source)?;
            let rendered = render_part(&name, &source, &context)?;
            debug!("Rendered {name} ({} bytes)", rendered.len());

            writer.start_file(name, options)?;
            writer.write_all(rendered.as_bytes())?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    let mut output = writer.finish()?;
    output.set_position(0);
    Ok(output)
}

fn is_template_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    name.strip_prefix("word/")
        .filter(|rest| !rest.contains('/') && rest.ends_with(".xml"))
        .is_some_and(|rest| rest.starts_with("header") || rest.starts_with("footer"))
}

fn render_part(name: &str, source: &str, context: &Context) -> Result<String, RenderError> {
    let template = xml::prepare_template(source).map_err(|message| RenderError::Template {
        part: name.to_string(),
        message,
    })?;

    Tera::one_off(&template, context, false).map_err(|e| RenderError::Template {
        part: name.to_string(),
        message: error_chain(&e),
    })
}

/// Tera's top-level message only names the template; the cause is in the chain.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
