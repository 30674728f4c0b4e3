//! TOML configuration.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, and running without `--config` uses [`Config::default`].
//! See `config/devdoc.example.toml` for a complete example.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use dev_documento_core::chunk::ChunkConfig;
use dev_documento_core::prompt::PromptTemplate;
use dev_documento_core::retrieval::RetrievalParams;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalParams,
    pub ingest: IngestConfig,
    pub server: ServerConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one SQLite file per corpus.
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("vectorstores"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub code: ChunkConfig,
    pub practices: ChunkConfig,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            code: ChunkConfig::CODE,
            practices: ChunkConfig::PRACTICES,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `local`, `ollama`, `openai`, or `disabled`.
    pub provider: String,
    pub model: Option<String>,
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    pub url: Option<String>,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// `ollama` or `openai` (any OpenAI-compatible chat completions server).
    pub provider: String,
    pub model: String,
    pub url: Option<String>,
    pub temperature: Option<f32>,
    /// Upper bound on one generation call.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "phi3:mini".to_string(),
            url: None,
            temperature: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IngestConfig {
    pub code: CodeIngestConfig,
    pub practices: PracticesIngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CodeIngestConfig {
    pub path: PathBuf,
    /// File suffixes to ingest, with the leading dot.
    pub extensions: Vec<String>,
    /// Directory names skipped anywhere in the tree.
    pub ignore_dirs: Vec<String>,
    /// Extra glob patterns, matched against paths relative to the root.
    pub exclude_globs: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for CodeIngestConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            extensions: vec![".py".to_string()],
            ignore_dirs: default_ignore_dirs(),
            exclude_globs: Vec::new(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PracticesIngestConfig {
    /// Parent of the per-language directories.
    pub root: PathBuf,
    pub language: String,
    pub extensions: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for PracticesIngestConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("knowledge_base"),
            language: "python".to_string(),
            extensions: vec![".pdf".to_string(), ".md".to_string(), ".txt".to_string()],
            exclude_globs: Vec::new(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl PracticesIngestConfig {
    /// `<root>/<language>`.
    pub fn language_dir(&self, language: &str) -> PathBuf {
        self.root.join(language)
    }
}

fn default_ignore_dirs() -> Vec<String> {
    ["venv", ".git", "__pycache__", "node_modules", ".vscode"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Optional overrides for the built-in prompt templates.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PromptsConfig {
    /// Must contain `{context}` and `{code}`.
    pub documentation: Option<String>,
    /// Must contain `{practices}`, `{context}` and `{code}`.
    pub review: Option<String>,
}

impl PromptsConfig {
    pub fn documentation_template(&self) -> Result<PromptTemplate> {
        match &self.documentation {
            Some(t) => Ok(PromptTemplate::new(t.as_str(), &["context", "code"])
                .context("prompts.documentation")?),
            None => Ok(PromptTemplate::documentation()),
        }
    }

    pub fn review_template(&self) -> Result<PromptTemplate> {
        match &self.review {
            Some(t) => Ok(PromptTemplate::new(t.as_str(), &["practices", "context", "code"])
                .context("prompts.review")?),
            None => Ok(PromptTemplate::review()),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.chunking
            .code
            .validate()
            .context("invalid [chunking.code]")?;
        self.chunking
            .practices
            .validate()
            .context("invalid [chunking.practices]")?;

        let r = &self.retrieval;
        if r.document_k == 0 || r.review_code_k == 0 || r.review_practices_k == 0 {
            bail!("retrieval k values must be >= 1");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "local" | "ollama" | "openai" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be local, ollama, openai, or disabled.",
                other
            ),
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }
        if matches!(self.embedding.provider.as_str(), "ollama" | "openai") {
            if self.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.dims.unwrap_or(0) == 0 {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
        }

        match self.llm.provider.as_str() {
            "ollama" | "openai" => {}
            other => bail!(
                "Unknown llm provider: '{}'. Must be ollama or openai.",
                other
            ),
        }
        if self.llm.timeout_secs == 0 {
            bail!("llm.timeout_secs must be > 0");
        }

        self.prompts.documentation_template()?;
        self.prompts.review_template()?;

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
