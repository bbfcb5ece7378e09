use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPLATE_PATH: &str = "templates/plantilla_cotizacion.docx";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// How an attached PDF reaches the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachmentMode {
    /// Upload the file to the provider and reference it by id.
    #[default]
    Upload,
    /// Extract the PDF text locally and embed it in the prompt.
    Inline,
}

impl FromStr for AttachmentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upload" => Ok(AttachmentMode::Upload),
            "inline" => Ok(AttachmentMode::Inline),
            other => bail!("ATTACHMENT_MODE must be 'upload' or 'inline', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub template_path: PathBuf,
    pub attachment_mode: AttachmentMode,
    pub max_upload_bytes: usize,
    /// Browser origins allowed by CORS. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            template_path: optional_env("TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH)),
            attachment_mode: optional_env("ATTACHMENT_MODE")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or_default(),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_allowed_origins: optional_env("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Splits a comma-separated origin list, dropping blanks.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_mode_parses_case_insensitively() {
        assert_eq!("upload".parse::<AttachmentMode>().unwrap(), AttachmentMode::Upload);
        assert_eq!(" Inline ".parse::<AttachmentMode>().unwrap(), AttachmentMode::Inline);
    }

    #[test]
    fn test_attachment_mode_rejects_unknown_values() {
        let err = "base64".parse::<AttachmentMode>().unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.example, ,https://b.example "),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins(" , ").is_empty());
    }

    #[test]
    fn test_attachment_mode_defaults_to_upload() {
        assert_eq!(AttachmentMode::default(), AttachmentMode::Upload);
    }
}
