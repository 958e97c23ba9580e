#![cfg(feature = "cli")]

use clap::Parser;
use tempfile::TempDir;
use transcript_etl::core::ConfigProvider;
use transcript_etl::utils::validation::Validate;
use transcript_etl::{CliConfig, EtlEngine, LocalStorage, ScoreKind, TranscriptPipeline};

const TRANSCRIPT: &str = "UNIVERSIDADE ESTADUAL DE FEIRA DE SANTANA
9,5 60 2019.1 AP INTRODUCAO A PROGRAMACAO EXA854
7,0 60 2019.1 AP CALCULO I EXA806
--- --- 2019.2 RE CALCULO II EXA807
8,0 60 2019.2 AP ESTRUTURAS DE DADOS EXA855
";

#[tokio::test]
async fn test_cli_run_with_hours_flag() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("historico.txt");
    std::fs::write(&input, TRANSCRIPT)?;
    let output = temp_dir.path().join("report");

    let config = CliConfig::try_parse_from([
        "transcript-etl",
        input.to_str().unwrap(),
        "--output-path",
        output.to_str().unwrap(),
        "--hours",
        "EXA807@2019.2=60",
        "--grade",
        "EXA807@2019.2=4,0",
        "--zip",
        "--archive-name",
        "notas.zip",
    ])?;
    config.validate()?;
    assert_eq!(config.score_kind(), ScoreKind::Weighted);

    let engine = EtlEngine::new(TranscriptPipeline::new(LocalStorage::current_dir(), config));
    let outcome = engine.run().await?;
    let result = &outcome.transform.result;

    // 2019.1: 8.25, 2019.2: 6.0; weighted (570 + 420 + 240 + 480) / 240
    assert!(outcome.is_complete());
    assert!((result.exact_score - 7.125).abs() < 1e-9);
    assert!((result.cumulative_score - 7.125).abs() < 1e-9);
    assert_eq!(result.official_score, 7.1);
    assert!(output.join("notas.zip").exists());

    Ok(())
}

#[test]
fn test_cli_defaults() -> anyhow::Result<()> {
    let config = CliConfig::try_parse_from(["transcript-etl", "historico.pdf"])?;

    assert_eq!(config.output_path(), "./output");
    assert_eq!(config.output_formats(), ["json".to_string(), "csv".to_string()]);
    assert_eq!(config.archive_name(), None);
    assert!(config.overrides().is_empty());
    assert!(config.validate().is_ok());

    Ok(())
}
