use clap::Parser;
use transcript_etl::core::ConfigProvider;
use transcript_etl::utils::error::ErrorSeverity;
use transcript_etl::utils::{logger, validation::Validate};
use transcript_etl::{CliConfig, EtlEngine, LocalStorage, RunOutcome, TranscriptPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    if config.json_log {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting transcript-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let score_kind = config.score_kind();
    let storage = LocalStorage::current_dir();
    let pipeline = TranscriptPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Transcript processed successfully!");
            print_outcome(&outcome, &format!("{:?}", score_kind).to_lowercase());
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_outcome(outcome: &RunOutcome, score_label: &str) {
    let result = &outcome.transform.result;

    if outcome.is_complete() {
        println!("✅ {} score: {:.1}", score_label, outcome.headline_score());
        println!(
            "   exact {:.4} | cumulative {:.4} | {} approved hours",
            result.exact_score, result.cumulative_score, result.approved_hours
        );
    } else {
        println!(
            "⚠️  {} disciplines have no credit hours, scores were not computed:",
            result.pending_disciplines.len()
        );
        for record in &result.pending_disciplines {
            println!("   {}@{}  {}", record.code, record.semester, record.name);
        }
        println!("💡 Fill them in with --hours CODE@SEMESTER=HOURS and run again");
    }

    println!("📁 Output saved to: {}", outcome.output_path);
}
