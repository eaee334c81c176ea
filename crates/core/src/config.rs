use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub pipeline: PipelineConfig,
    pub splitter: SplitterConfig,
    pub ocr: OcrConfig,
    pub mcq: McqConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `QUICKPREP_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("QUICKPREP_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            pipeline: PipelineConfig::from_env_profiled(p),
            splitter: SplitterConfig::from_env_profiled(p),
            ocr: OcrConfig::from_env_profiled(p),
            mcq: McqConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  server:    {}:{} upload_dir={} max_upload_mb={}",
            self.server.host,
            self.server.port,
            self.server.upload_dir.display(),
            self.server.max_upload_mb
        );
        tracing::info!(
            "  llm:       provider={} configured={}",
            self.llm.provider,
            self.llm.is_configured()
        );
        tracing::info!("  ollama:    url={} model={}", self.ollama.url, self.ollama.model);
        tracing::info!(
            "  pipeline:  chunk_chars={} input_chars={} concurrency={} timeout={}s",
            self.pipeline.max_chunk_chars,
            self.pipeline.max_input_chars,
            self.pipeline.concurrency,
            self.pipeline.chunk_timeout_secs
        );
        tracing::info!(
            "  splitter:  short_line_rule={} duplicates={}",
            self.splitter.short_line_rule,
            self.splitter.duplicate_policy
        );
        tracing::info!("  ocr:       enabled={} lang={}", self.ocr.enabled, self.ocr.language);
        tracing::info!("  mcq:       questions={}", self.mcq.question_count);
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Directory where uploads are staged while a request is in flight.
    pub upload_dir: PathBuf,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origin: "*".into(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_mb: 50,
        }
    }
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            host: profiled_env_or(p, "HOST", &d.host),
            port: profiled_env_parse(p, "PORT", d.port),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", &d.cors_origin),
            upload_dir: profiled_env_opt(p, "UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.upload_dir),
            max_upload_mb: profiled_env_parse(p, "MAX_UPLOAD_MB", d.max_upload_mb),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama", "openai", "anthropic"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-5-20250929".into(),
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", &d.provider).to_lowercase(),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", &d.openai_model),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", &d.anthropic_model),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", d.temperature),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", d.max_tokens),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" | "claude" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
        }
    }
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", &d.url),
            model: profiled_env_or(p, "OLLAMA_MODEL", &d.model),
        }
    }
}

// ── Pipeline ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on chunk length, in characters.
    pub max_chunk_chars: usize,
    /// Characters of a chunk submitted to the model.
    pub max_input_chars: usize,
    pub max_points: usize,
    /// Points at or below this many characters are discarded.
    pub min_point_chars: usize,
    /// Chunks in flight at once per request.
    pub concurrency: usize,
    pub chunk_timeout_secs: u64,
    /// "summary" or "points"
    pub default_mode: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 800,
            max_input_chars: 2000,
            max_points: 6,
            min_point_chars: 10,
            concurrency: 4,
            chunk_timeout_secs: 120,
            default_mode: "summary".into(),
        }
    }
}

impl PipelineConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            max_chunk_chars: profiled_env_parse(p, "CHUNK_MAX_CHARS", d.max_chunk_chars).max(1),
            max_input_chars: profiled_env_parse(p, "SUMMARY_INPUT_CHARS", d.max_input_chars).max(1),
            max_points: profiled_env_parse(p, "SUMMARY_MAX_POINTS", d.max_points),
            min_point_chars: profiled_env_parse(p, "SUMMARY_MIN_POINT_CHARS", d.min_point_chars),
            concurrency: profiled_env_parse(p, "LLM_CONCURRENCY", d.concurrency).max(1),
            chunk_timeout_secs: profiled_env_parse(p, "LLM_CHUNK_TIMEOUT_SECS", d.chunk_timeout_secs),
            default_mode: profiled_env_or(p, "SUMMARY_MODE", &d.default_mode).to_lowercase(),
        }
    }
}

// ── Section splitter ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Points above the average font size for a slide block to count as a heading.
    pub font_margin: f32,
    /// Average assumed when a deck carries no explicit font sizes.
    pub default_font_size: f32,
    /// "no_terminal_period" or "trailing_colon"
    pub short_line_rule: String,
    /// "overwrite" or "append"
    pub duplicate_policy: String,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            font_margin: 1.0,
            default_font_size: 18.0,
            short_line_rule: "no_terminal_period".into(),
            duplicate_policy: "overwrite".into(),
        }
    }
}

impl SplitterConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            font_margin: profiled_env_parse(p, "HEADING_FONT_MARGIN", d.font_margin),
            default_font_size: profiled_env_parse(p, "DEFAULT_FONT_SIZE", d.default_font_size),
            short_line_rule: profiled_env_or(p, "HEADING_SHORT_LINE_RULE", &d.short_line_rule)
                .to_lowercase(),
            duplicate_policy: profiled_env_or(p, "DUPLICATE_HEADING_POLICY", &d.duplicate_policy)
                .to_lowercase(),
        }
    }
}

// ── OCR ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub enabled: bool,
    pub tesseract_bin: String,
    pub pdftoppm_bin: String,
    pub dpi: u32,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tesseract_bin: "tesseract".into(),
            pdftoppm_bin: "pdftoppm".into(),
            dpi: 300,
            language: "eng".into(),
        }
    }
}

impl OcrConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            enabled: profiled_env_bool(p, "OCR_ENABLED", d.enabled),
            tesseract_bin: profiled_env_or(p, "TESSERACT_BIN", &d.tesseract_bin),
            pdftoppm_bin: profiled_env_or(p, "PDFTOPPM_BIN", &d.pdftoppm_bin),
            dpi: profiled_env_parse(p, "OCR_DPI", d.dpi),
            language: profiled_env_or(p, "OCR_LANG", &d.language),
        }
    }
}

// ── MCQ ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqConfig {
    pub question_count: usize,
    /// Characters of document text included in the prompt.
    pub max_content_chars: usize,
    /// Documents with less extracted text than this are rejected.
    pub min_text_chars: usize,
    pub temperature: f32,
}

impl Default for McqConfig {
    fn default() -> Self {
        Self {
            question_count: 10,
            max_content_chars: 6000,
            min_text_chars: 100,
            temperature: 0.3,
        }
    }
}

impl McqConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            question_count: profiled_env_parse(p, "MCQ_QUESTIONS", d.question_count).max(1),
            max_content_chars: profiled_env_parse(p, "MCQ_MAX_CONTENT_CHARS", d.max_content_chars),
            min_text_chars: profiled_env_parse(p, "MCQ_MIN_TEXT_CHARS", d.min_text_chars),
            temperature: profiled_env_parse(p, "MCQ_TEMPERATURE", d.temperature),
        }
    }
}
