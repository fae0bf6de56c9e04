#![deny(warnings)]

//! Level content loading with schema validation.
//!
//! Level documents live at `{content_dir}/level{n}.json`. Every document is
//! checked twice: against the JSON Schema derived from [`LevelPack`], then
//! against the semantic rules in `sandbox_core::level_violations`. All
//! violations are reported together, each with a JSON-pointer path.

pub mod schema;

pub use schema::{compile_level_schema, level_schema, schema_violations};

use anyhow::Context;
use jsonschema::JSONSchema;
use sandbox_core::{level_violations, LevelPack, SandboxConfig, Violation};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("level index must be >= 1")]
    InvalidIndex,
    #[error("io error reading {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("level {level}: malformed JSON: {message}")]
    Json { level: u32, message: String },
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    #[error("schema build failed: {0}")]
    SchemaBuild(String),
}

impl LoadError {
    /// Violations carried by a schema failure; empty for other errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            LoadError::Schema(e) => &e.violations,
            _ => &[],
        }
    }
}

/// A level document failed validation. Carries every violation found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub level: u32,
    pub violations: Vec<Violation>,
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "level {} failed validation with {} violation(s)",
            self.level,
            self.violations.len()
        )?;
        for v in &self.violations {
            write!(f, "\n  {v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaValidationError {}

/// Loads and validates level documents from a content directory.
pub struct LevelLoader {
    root: PathBuf,
    schema: JSONSchema,
}

impl LevelLoader {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, LoadError> {
        Ok(Self {
            root: root.into(),
            schema: compile_level_schema()?,
        })
    }

    pub fn from_config(cfg: &SandboxConfig) -> Result<Self, LoadError> {
        Self::new(&cfg.content_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn level_path(&self, level: u32) -> PathBuf {
        self.root.join(format!("level{level}.json"))
    }

    /// Read and validate `level{n}.json`.
    pub fn load_level(&self, level: u32) -> Result<LevelPack, LoadError> {
        if level == 0 {
            return Err(LoadError::InvalidIndex);
        }
        let path = self.level_path(level);
        let text = fs::read_to_string(&path).map_err(|e| LoadError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let pack = self.parse_level(level, &text)?;
        info!(
            level,
            scenarios = pack.scenarios.len(),
            path = %path.display(),
            "loaded level"
        );
        Ok(pack)
    }

    /// Validate a level document held in memory.
    pub fn parse_level(&self, level: u32, text: &str) -> Result<LevelPack, LoadError> {
        let instance: Value = serde_json::from_str(text).map_err(|e| LoadError::Json {
            level,
            message: e.to_string(),
        })?;

        let violations = schema_violations(&self.schema, &instance);
        if !violations.is_empty() {
            warn!(level, count = violations.len(), "schema violations");
            return Err(SchemaValidationError { level, violations }.into());
        }

        // Only fails on constraints the schema cannot express, such as integer width.
        let pack: LevelPack = serde_json::from_value(instance).map_err(|e| {
            SchemaValidationError {
                level,
                violations: vec![Violation::new("", e)],
            }
        })?;

        let violations = level_violations(&pack, Some(level));
        if !violations.is_empty() {
            warn!(level, count = violations.len(), "semantic violations");
            return Err(SchemaValidationError { level, violations }.into());
        }
        debug!(level, "level document valid");
        Ok(pack)
    }

    /// Validate levels `1..=total`, returning each outcome.
    pub fn validate_all(&self, total: u32) -> Vec<(u32, Result<LevelPack, LoadError>)> {
        (1..=total).map(|n| (n, self.load_level(n))).collect()
    }
}

/// Load a config file, or defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<SandboxConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config not found, using defaults");
        return Ok(SandboxConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: SandboxConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
