pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    etl::{EtlEngine, RunOutcome},
    pipeline::TranscriptPipeline,
};
pub use domain::model::{CalculatorResult, DisciplineRecord, ScoreKind, SemesterScore, Status};
pub use domain::services::{aggregate, extract};
pub use utils::error::{EtlError, Result};
