use clap::Parser;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use stratflow::prelude::*;

mod logging;

/// Runs a strategy graph against fixture market data and prints the report
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the strategy JSON file
    strategy_path: String,

    /// Market fixture JSON; the built-in sample market is used when omitted
    #[arg(short, long)]
    market: Option<String>,

    /// Execution options JSON (mode, validate, failOnValidationError, targetNodeId)
    #[arg(short, long)]
    options: Option<String>,

    /// Only run the control ancestors of this node
    #[arg(short, long)]
    target: Option<String>,

    /// Send order intents through the exchange's read-only validation
    #[arg(long)]
    validate: bool,

    /// Run in live mode against an in-memory paper exchange
    #[arg(long)]
    live_paper: bool,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Log level or full filter directive, e.g. `debug` or `stratflow=trace`
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level, cli.json);
    let total_start = Instant::now();

    // --- 1. Loading ---
    let strategy_json = fs::read_to_string(&cli.strategy_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read strategy file '{}': {}",
            cli.strategy_path, e
        ))
    });
    let strategy = Strategy::from_json(&strategy_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse strategy JSON: {}", e)));

    let market = match &cli.market {
        Some(path) => MarketFixture::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load market fixture: {}", e))
        }),
        None => MarketFixture::sample(),
    };

    let mut options = match &cli.options {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read options file '{}': {}", path, e))
            });
            ExecutionOptions::from_json(&json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to parse options JSON: {}", e))
            })
        }
        None => ExecutionOptions::default(),
    };
    if cli.target.is_some() {
        options.target_node_id = cli.target.clone();
    }
    if cli.validate {
        options.validate = true;
    }
    if cli.live_paper {
        options.mode = ExecutionMode::Live;
    }

    // Dry runs get an exchange that refuses mutating calls outright.
    let exchange = match options.mode {
        ExecutionMode::Live => PaperExchange::new(),
        ExecutionMode::DryRun => PaperExchange::read_only(),
    };
    let ctx = ExecutionContext::from_options(options, Arc::new(market), Arc::new(exchange));

    // --- 2. Execution ---
    let executor = Executor::builder().build();
    let run_start = Instant::now();
    let result = executor.execute(&strategy, &ctx).await;
    let run_duration = run_start.elapsed();

    // --- 3. Report ---
    if cli.json {
        match result.to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => exit_with_error(&format!("Failed to serialize report: {}", e)),
        }
    } else {
        println!("Strategy '{}'", strategy.metadata.name);
        print!("{}", ReportFormatter::format_summary(&result));
        println!("\n--- Performance Summary ---");
        println!("Execution:            {:?}", run_duration);
        println!("Total:                {:?}", total_start.elapsed());
    }

    if !result.success {
        let reason = result.primary_error().unwrap_or("run failed");
        exit_with_error(reason);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
