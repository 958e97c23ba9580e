use clap::Parser;
use transcript_etl::core::ConfigProvider;
use transcript_etl::utils::error::ErrorSeverity;
use transcript_etl::utils::{logger, validation::Validate};
use transcript_etl::{EtlEngine, LocalStorage, TomlConfig, TranscriptPipeline};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Transcript ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "transcript-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Parse the transcript and list the corrections without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based transcript ETL");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = TranscriptPipeline::new(LocalStorage::current_dir(), config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            if outcome.is_complete() {
                println!("✅ Score: {:.1}", outcome.headline_score());
            } else {
                println!(
                    "⚠️  {} disciplines still need credit hours, add [[transform.overrides]] for them",
                    outcome.transform.result.pending_disciplines.len()
                );
            }
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("0.0.0")
    );
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!("  Score: {:?}", config.score_kind());

    if let Some(archive) = config.archive_name() {
        println!("  Archive: {}", archive);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    use transcript_etl::adapters::read_pages;
    use transcript_etl::domain::services::extract_with_header;

    println!("🔍 Dry Run Analysis:");
    println!();

    let bytes = tokio::fs::read(config.input_path()).await?;
    let pages = read_pages(config.input_path(), &bytes)?;
    let records = extract_with_header(&pages, config.header())?;

    println!("📄 Transcript:");
    println!("  Pages: {}", pages.len());
    println!("  Disciplines: {}", records.len());
    println!(
        "  Missing hours: {}",
        records.iter().filter(|r| r.is_pending()).count()
    );

    let drops = config.drops();
    if !drops.is_empty() {
        println!();
        println!("🗑️ Drops:");
        for selector in &drops {
            let hits = records.iter().filter(|r| selector.matches(r)).count();
            println!("  {} ({} matching)", selector, hits);
        }
    }

    let overrides = config.overrides();
    if !overrides.is_empty() {
        println!();
        println!("🛠️ Overrides:");
        for item in &overrides {
            let hits = records.iter().filter(|r| item.selector.matches(r)).count();
            println!("  {} ({} matching): {:?}", item.selector, hits, item.edit);
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Remove --dry-run to write the report.");

    Ok(())
}
