//! Configuration for the theme-weaver backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Session folders and knowledge store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Text extraction / OCR configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// LLM provider credentials and generation settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Per-document query configuration
    #[serde(default)]
    pub query: QueryConfig,
    /// Theme identification configuration
    #[serde(default)]
    pub themes: ThemeConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides for provider credentials.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?
            }
            None => Self::default(),
        };

        config.llm.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.server.max_upload_size == 0 {
            return Err(Error::Config("server.max_upload_size must be > 0".to_string()));
        }
        if self.server.max_request_size < self.server.max_upload_size {
            return Err(Error::Config(
                "server.max_request_size must be >= server.max_upload_size".to_string(),
            ));
        }
        if self.extraction.render_dpi == 0 {
            return Err(Error::Config("extraction.render_dpi must be > 0".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config("llm.temperature must be in [0.0, 2.0]".to_string()));
        }
        if self.query.document_context_chars == 0 {
            return Err(Error::Config(
                "query.document_context_chars must be > 0".to_string(),
            ));
        }
        if self.themes.excerpt_chars == 0 {
            return Err(Error::Config("themes.excerpt_chars must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum size of a single uploaded file in bytes (default: 10MB)
    pub max_upload_size: usize,
    /// Maximum size of a whole upload request in bytes (default: 50MB)
    pub max_request_size: usize,
    /// Allowed CORS origins; empty means any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: 10 * 1024 * 1024,
            max_request_size: 50 * 1024 * 1024,
            cors_origins: vec!["http://localhost:8080".to_string()],
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding one folder per upload session
    pub data_dir: PathBuf,
    /// JSON file backing the local knowledge store
    pub store_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("theme-weaver");

        Self {
            data_dir: base.join("uploads"),
            store_path: base.join("store.json"),
        }
    }
}

/// Text extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum trimmed text-layer length for a PDF to skip OCR
    #[serde(default = "default_min_direct_text_chars")]
    pub min_direct_text_chars: usize,
    /// Render and OCR PDFs whose text layer is too short
    #[serde(default = "default_true")]
    pub pdf_ocr_fallback: bool,
    /// Tesseract language code
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// Resolution used when rendering PDF pages for OCR
    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,
    /// Tesseract executable
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: String,
    /// pdftoppm executable (poppler-utils)
    #[serde(default = "default_pdftoppm_cmd")]
    pub pdftoppm_cmd: String,
}

fn default_min_direct_text_chars() -> usize { 20 }
fn default_true() -> bool { true }
fn default_ocr_language() -> String { "eng".to_string() }
fn default_render_dpi() -> u32 { 150 }
fn default_tesseract_cmd() -> String { "tesseract".to_string() }
fn default_pdftoppm_cmd() -> String { "pdftoppm".to_string() }

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_direct_text_chars: default_min_direct_text_chars(),
            pdf_ocr_fallback: true,
            ocr_language: default_ocr_language(),
            render_dpi: default_render_dpi(),
            tesseract_cmd: default_tesseract_cmd(),
            pdftoppm_cmd: default_pdftoppm_cmd(),
        }
    }
}

/// LLM provider configuration
///
/// Providers are tried in a fixed order (OpenAI, Gemini, Groq); the first
/// one with a key is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Google Generative Language API key
    #[serde(default)]
    pub google_api_key: Option<String>,
    /// Groq API key
    #[serde(default)]
    pub groq_api_key: Option<String>,
    /// OpenAI chat model
    pub openai_model: String,
    /// Gemini model
    pub gemini_model: String,
    /// Groq chat model
    pub groq_model: String,
    /// OpenAI API base URL
    pub openai_base_url: String,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Groq (OpenAI-compatible) API base URL
    pub groq_base_url: String,
    /// Temperature for per-document answers
    pub temperature: f32,
    /// Token cap for per-document answers
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            groq_api_key: None,
            openai_model: "gpt-4".to_string(),
            gemini_model: "gemini-pro".to_string(),
            groq_model: "llama-3.3-70b-versatile".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            temperature: 0.2,
            max_tokens: 800,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Fill credentials from `OPENAI_API_KEY`, `GOOGLE_API_KEY` and `GROQ_API_KEY`
    pub fn apply_env_overrides(&mut self) {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(key) = read("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = read("GOOGLE_API_KEY") {
            self.google_api_key = Some(key);
        }
        if let Some(key) = read("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
    }
}

/// Per-document query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Characters of document text included in each prompt
    pub document_context_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            document_context_chars: 3000,
        }
    }
}

/// Theme identification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Characters of each document included in the analysis prompt
    pub excerpt_chars: usize,
    /// Temperature for theme identification
    pub temperature: f32,
    /// Token cap for theme identification
    pub max_tokens: u32,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: 1000,
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}
