pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::ScoreKind;
#[cfg(feature = "cli")]
use crate::domain::services::editing::{RecordOverride, RecordSelector};
#[cfg(feature = "cli")]
use crate::domain::services::normalize::INSTITUTION_HEADER;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
fn parse_hours(s: &str) -> std::result::Result<RecordOverride, String> {
    RecordOverride::hours(s).map_err(|e| e.to_string())
}

#[cfg(feature = "cli")]
fn parse_grade(s: &str) -> std::result::Result<RecordOverride, String> {
    RecordOverride::grade(s).map_err(|e| e.to_string())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "transcript-etl")]
#[command(about = "Extracts disciplines from a transcript and computes grade averages")]
pub struct CliConfig {
    /// Transcript PDF, or a text dump with pages separated by form feeds
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<String>,

    /// Bundle every output file into one ZIP archive
    #[arg(long)]
    pub zip: bool,

    #[arg(long, default_value = "transcript_report.zip")]
    pub archive_name: String,

    /// Fill in credit hours, e.g. EXA806@2020.1=60
    #[arg(long = "hours", value_parser = parse_hours)]
    pub hours: Vec<RecordOverride>,

    /// Correct a grade, e.g. EXA806=7.5
    #[arg(long = "grade", value_parser = parse_grade)]
    pub grades: Vec<RecordOverride>,

    /// Remove a discipline before computing, e.g. LET100@2019.2
    #[arg(long = "drop")]
    pub drops: Vec<RecordSelector>,

    /// Headline score: weighted or semester
    #[arg(long, default_value = "weighted")]
    pub score: ScoreKind,

    #[arg(long, default_value = INSTITUTION_HEADER)]
    pub header: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system resource usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_log: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.zip.then_some(self.archive_name.as_str())
    }

    fn header(&self) -> &str {
        &self.header
    }

    fn overrides(&self) -> Vec<RecordOverride> {
        self.hours.iter().chain(&self.grades).cloned().collect()
    }

    fn drops(&self) -> Vec<RecordSelector> {
        self.drops.clone()
    }

    fn score_kind(&self) -> ScoreKind {
        self.score
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, &validation::SUPPORTED_INPUT_EXTENSIONS)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("formats", &self.formats)?;
        if self.zip {
            validation::validate_non_empty_string("archive_name", &self.archive_name)?;
        }
        Ok(())
    }
}
