use crate::core::ConfigProvider;
use crate::domain::model::ScoreKind;
use crate::domain::services::editing::{RecordOverride, RecordSelector};
use crate::domain::services::normalize::INSTITUTION_HEADER;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    pub header: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub drop: Vec<RecordSelector>,
    #[serde(default)]
    pub overrides: Vec<RecordOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub score: Option<ScoreKind>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_path("source.path", &self.source.path)?;
        validation::validate_file_extension(
            "source.path",
            &self.source.path,
            &validation::SUPPORTED_INPUT_EXTENSIONS,
        )?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;

        if let Some(compression) = &self.load.compression {
            if compression.enabled {
                validation::validate_non_empty_string("load.compression.filename", &compression.filename)?;
            }
        }

        for item in &self.transform.overrides {
            if item.edit.is_empty() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "transform.overrides".to_string(),
                    value: item.selector.to_string(),
                    reason: "override sets none of hours, grade or name".to_string(),
                });
            }
            if let Some(grade) = item.edit.grade {
                validation::validate_range("transform.overrides.grade", grade, 0.0, 10.0)?;
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    fn header(&self) -> &str {
        self.source.header.as_deref().unwrap_or(INSTITUTION_HEADER)
    }

    fn overrides(&self) -> Vec<RecordOverride> {
        self.transform.overrides.clone()
    }

    fn drops(&self) -> Vec<RecordSelector> {
        self.transform.drop.clone()
    }

    fn score_kind(&self) -> ScoreKind {
        self.load.score.unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
