use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 10;
/// Room for multipart boundaries, part headers and the prompt field.
const FORM_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Per-file upload cap.
    pub max_file_bytes: usize,
    /// Files accepted by the batch route.
    pub max_files: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            gemini_api_key: None,
            gemini_model: providers::gemini::DEFAULT_MODEL.to_string(),
            gemini_base_url: providers::gemini::DEFAULT_BASE_URL.to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl ServerConfig {
    /// Reads `PORT`, `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_BASE_URL`,
    /// `MAX_FILE_BYTES` and `MAX_FILES` from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("port", defaults.port as i64)?
            .set_default("gemini_model", defaults.gemini_model)?
            .set_default("gemini_base_url", defaults.gemini_base_url)?
            .set_default("max_file_bytes", defaults.max_file_bytes as i64)?
            .set_default("max_files", defaults.max_files as i64)?
            .add_source(config::Environment::default())
            .build()?;
        let mut cfg: ServerConfig = settings.try_deserialize()?;
        if cfg.gemini_api_key.as_deref().map(str::trim) == Some("") {
            cfg.gemini_api_key = None;
        }
        if cfg.gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set, image analysis requests will fail");
        }
        info!(port = cfg.port, model = %cfg.gemini_model, "proxy configuration loaded");
        Ok(cfg)
    }

    /// Largest multipart body the single-image route can legitimately carry.
    pub fn single_body_limit(&self) -> usize {
        self.max_file_bytes.saturating_add(FORM_OVERHEAD)
    }

    /// Largest multipart body the batch route can legitimately carry.
    pub fn batch_body_limit(&self) -> usize {
        self.max_file_bytes
            .saturating_mul(self.max_files.max(1))
            .saturating_add(FORM_OVERHEAD)
    }
}
