use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use ledgermark::config::Config;
use ledgermark::dataset::{CategorySet, TransactionSet};
use ledgermark::embedding::{download, encoder::OnnxEncoder, store};
use ledgermark::hub::{HubClient, DEFAULT_HUB_URL};
use ledgermark::pipeline::{self, results, ModelEvaluation};
use ledgermark::report::svg::{ChartGenerator, ModelCharts};
use ledgermark::report::{html, terminal};

/// Ledgermark: benchmark sentence-embedding models on expense categorization.
///
/// Classifies free-text transaction descriptions into expense categories by
/// cosine similarity against per-category keyword embeddings, scores each
/// configured model against ground-truth labels, and renders a comparison
/// report.
#[derive(Parser)]
#[command(name = "ledgermark", version, about)]
struct Cli {
    /// Path to the JSON configuration file (default: ./config.json,
    /// or the LEDGERMARK_CONFIG env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full evaluation pipeline for every configured model
    Run,

    /// Download the ONNX model files for the configured models
    DownloadModels,

    /// Check the configured model names against the HuggingFace hub
    ValidateModels,

    /// Re-render the HTML report from previously saved results
    Report,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Set up structured logging; the config level is the fallback when
    // RUST_LOG is unset
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "ledgermark={}",
                    config.logging.log_level
                ))
            }),
        )
        .init();

    match cli.command {
        Commands::Run => run_evaluation(&config).await?,

        Commands::DownloadModels => {
            config.require_models()?;

            let hub_url = hub_url();
            let hub = HubClient::new(&hub_url)?;
            let valid = hub
                .validate_models(&config.models.transformer_models)
                .await?;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", config.model_dir.display());

            download::download_models(&config.model_dir, &valid, &hub_url).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `ledgermark run`.");
        }

        Commands::ValidateModels => {
            config.require_models()?;
            let hub = HubClient::new(&hub_url())?;

            println!("Validating configured models against the hub...\n");
            let mut valid_count = 0;
            for name in &config.models.transformer_models {
                let outcome = match ledgermark::hub::check_model_name(name) {
                    Err(reason) => format!("{} ({reason})", "✗".red()),
                    Ok(()) => match hub.model_exists(name).await {
                        Ok(true) => {
                            valid_count += 1;
                            "✓".green().to_string()
                        }
                        Ok(false) => format!("{} (not found on the hub)", "✗".red()),
                        Err(e) => format!("{} ({e})", "✗".red()),
                    },
                };
                println!("  {outcome}  {name}");
            }
            println!(
                "\n{valid_count} of {} models are valid.",
                config.models.transformer_models.len()
            );
        }

        Commands::Report => {
            let evaluations = results::load_all(&config.output.results_dir)?;
            let transactions = TransactionSet::load(&config.test_data.transactions_file)?;

            let report_path = render_report(&config, &evaluations, &transactions)?;
            terminal::display_comparison(&evaluations);
            println!(
                "\n{}",
                format!("Report generated at: {}", report_path.display()).bold()
            );
        }
    }

    Ok(())
}

/// The full pipeline: validate models, embed, classify, score, and report.
async fn run_evaluation(config: &Config) -> Result<()> {
    config.require_models()?;
    config.ensure_directories()?;

    let categories = CategorySet::load(&config.test_data.categories_file)?;
    let transactions = TransactionSet::load(&config.test_data.transactions_file)?;
    println!(
        "Loaded {} categories and {} test transactions.",
        categories.len(),
        transactions.len()
    );

    let hub = HubClient::new(&hub_url())?;
    let valid_models = hub
        .validate_models(&config.models.transformer_models)
        .await?;

    // Fail fast on missing model files before spending time on any model
    for model in &valid_models {
        if !download::model_files_present(&config.model_dir, model) {
            anyhow::bail!(
                "Model files for '{}' not found in {}\n\
                 Run `ledgermark download-models` first.",
                model,
                config.model_dir.display()
            );
        }
    }

    let mut evaluations: Vec<ModelEvaluation> = Vec::with_capacity(valid_models.len());

    for model in &valid_models {
        println!("\nEvaluating {model}...");

        let model_dir = download::model_dir_for(&config.model_dir, model);
        let encoder = OnnxEncoder::load(&model_dir, model)?;

        let run = pipeline::evaluate_model(model, &encoder, &categories, &transactions).await?;

        // Persist the category embeddings and the raw results
        let dump = store::dump(
            &config.embedding_settings.embeddings_output_dir,
            model,
            &run.category_embeddings,
        )?;
        info!(model, path = %dump.display(), "Dumped category embeddings");
        results::save(&config.output.results_dir, &run.evaluation)?;

        terminal::display_model_summary(&run.evaluation);
        evaluations.push(run.evaluation);
    }

    let report_path = render_report(config, &evaluations, &transactions)?;
    terminal::display_comparison(&evaluations);

    println!("\n{}", "Evaluation complete.".bold());
    println!("  Report generated at: {}", report_path.display());
    Ok(())
}

/// Generate all charts and the HTML report for a set of evaluations.
fn render_report(
    config: &Config,
    evaluations: &[ModelEvaluation],
    transactions: &TransactionSet,
) -> Result<PathBuf> {
    config.ensure_directories()?;

    let generator = ChartGenerator::new(&config.output.image_storage);
    let model_charts: Vec<ModelCharts> = evaluations
        .iter()
        .map(|e| generator.generate_model_charts(e))
        .collect::<Result<_>>()?;
    let comparison = generator.generate_comparison_charts(evaluations)?;

    html::generate_report(
        evaluations,
        &model_charts,
        &comparison,
        transactions,
        &config.output.output_file,
    )
}

/// Hub base URL, with an env override for mirrors. Validation and
/// downloads both use the resolved URL.
fn hub_url() -> String {
    let url = env::var("LEDGERMARK_HUB_URL").unwrap_or_else(|_| DEFAULT_HUB_URL.to_string());
    if url != DEFAULT_HUB_URL {
        warn!(hub = %url, "Using non-default hub URL");
    }
    url
}
