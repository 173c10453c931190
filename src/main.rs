use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use shelf_score::cache::{self, DiskCache};
use shelf_score::config::{self, Settings};
use shelf_score::off::OffClient;
use shelf_score::scan::{self, CachedProduct, Scanner, DEFAULT_CONCURRENCY};
use shelf_score::scoring::ScoringEngine;
use shelf_score::{output, telemetry};
use shelf_score::{EXIT_CONFIG, EXIT_INVALID_INPUT, EXIT_NETWORK, EXIT_NOT_FOUND, EXIT_SUCCESS};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a barcode on Open Food Facts and score it
    Scan {
        /// EAN/UPC barcode (8-20 digits, whitespace ignored)
        barcode: String,
    },
    /// Score a saved Open Food Facts product JSON file ("-" reads stdin)
    Score {
        path: String,
    },
    /// Scan several barcodes and rank them by score
    Batch {
        #[arg(required = true)]
        barcodes: Vec<String>,

        /// Maximum number of concurrent lookups
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the scan cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Score a barcode from the cache without contacting Open Food Facts
    Get {
        barcode: String,
    },
    /// Remove every cached scan
    Clear,
}

#[derive(Parser, Debug)]
#[command(name = "shelf-score")]
#[command(about = "Barcode-driven health scores for packaged food", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/shelf-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Neither read nor write the scan cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

type AppScanner = Scanner<OffClient, DiskCache<CachedProduct>>;

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    let start_time = Instant::now();

    if let Err(e) = telemetry::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    let config_path = cli.config.as_ref().map(PathBuf::from);

    // Runs before loading so a broken config file can be replaced
    if let Commands::Config {
        action: ConfigAction::Init { force },
    } = cli.command
    {
        let path = config_path.unwrap_or_else(config::get_config_path);
        match config::write_default_config(&path, force) {
            Ok(()) => {
                println!("Wrote default config to {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    let settings = load_settings(config_path);
    let use_colors = output::should_use_colors();

    match cli.command {
        Commands::Scan { barcode } => {
            let scanner = build_scanner(&settings, cli.no_cache);
            match scanner.scan(&barcode).await {
                Ok(scanned) => {
                    if cli.json {
                        print_json(&scanned.report);
                    } else {
                        println!("{}", output::format_report(&scanned.report, scanned.cached, use_colors));
                    }
                }
                Err(e) => {
                    eprintln!("Scan failed: {}", e);
                    std::process::exit(e.exit_code());
                }
            }
        }
        Commands::Score { path } => {
            let document = match read_document(&path) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Failed to read product document: {:#}", e);
                    std::process::exit(EXIT_INVALID_INPUT);
                }
            };
            let product = match scan::parse_product_document(&document) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Invalid product document: {:#}", e);
                    std::process::exit(EXIT_INVALID_INPUT);
                }
            };

            let engine = ScoringEngine::new(&settings.scoring);
            let (summary, score) = scan::score_off_product(&engine, &product);
            if cli.json {
                print_json(&serde_json::json!({ "product": summary, "score": score }));
            } else {
                println!("{}", output::format_product_score(&summary, &score, use_colors));
            }
        }
        Commands::Batch { barcodes, concurrency } => {
            let scanner = build_scanner(&settings, cli.no_cache);
            let results = scanner.scan_many(&barcodes, concurrency).await;

            if cli.json {
                let rows: Vec<serde_json::Value> = results
                    .iter()
                    .map(|(input, result)| match result {
                        Ok(scanned) => serde_json::json!({
                            "input": input,
                            "cached": scanned.cached,
                            "report": scanned.report,
                        }),
                        Err(e) => serde_json::json!({
                            "input": input,
                            "error": e.to_string(),
                            "status": e.http_status(),
                        }),
                    })
                    .collect();
                print_json(&rows);
            } else {
                println!("{}", output::format_batch_table(&results, use_colors));
            }

            if cli.verbose {
                eprintln!();
                eprintln!("Total: {} barcodes in {:?}", results.len(), start_time.elapsed());
            }

            // Partial failure is still success; fail only when nothing scanned
            if results.iter().all(|(_, r)| r.is_err()) {
                let code = results
                    .iter()
                    .find_map(|(_, r)| r.as_ref().err().map(|e| e.exit_code()))
                    .unwrap_or(EXIT_NETWORK);
                std::process::exit(code);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => match serde_saphyr::to_string(&settings.to_config()) {
                Ok(yaml) => print!("{}", yaml),
                Err(e) => {
                    eprintln!("Failed to render config: {}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            },
            ConfigAction::Init { .. } => unreachable!("handled before config loading"),
        },
        Commands::Cache { action } => match action {
            CacheAction::Get { barcode } => {
                let scanner = build_scanner(&settings, cli.no_cache);
                match scanner.cached(&barcode) {
                    Ok(Some(report)) => {
                        if cli.json {
                            print_json(&report);
                        } else {
                            println!("{}", output::format_report(&report, true, use_colors));
                        }
                    }
                    Ok(None) => {
                        eprintln!("Barcode {} is not cached", barcode.trim());
                        std::process::exit(EXIT_NOT_FOUND);
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(EXIT_INVALID_INPUT);
                    }
                }
            }
            CacheAction::Clear => {
                let path = cache::get_cache_path();
                if let Err(e) = cache::clear_cache(&path) {
                    eprintln!("Failed to clear cache: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
                println!("Cleared cache at {}", path.display());
            }
        },
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Load, validate and resolve configuration, exiting on any config error
fn load_settings(config_path: Option<PathBuf>) -> Settings {
    let loaded = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = config::validate_config(&loaded) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    match config::resolve(&loaded) {
        Ok(settings) => {
            tracing::debug!(
                base_url = %settings.base_url,
                cache_ttl = ?settings.cache_ttl,
                cache_enabled = settings.cache_enabled,
                "loaded config"
            );
            settings
        }
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

fn build_scanner(settings: &Settings, no_cache: bool) -> AppScanner {
    let client = match OffClient::new(&settings.base_url, settings.timeout) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create Open Food Facts client: {}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };

    let cache = (settings.cache_enabled && !no_cache).then(|| DiskCache::new(cache::get_cache_path()));
    if cache.is_none() {
        tracing::debug!("scan cache disabled");
    }

    Scanner::new(
        client,
        ScoringEngine::new(&settings.scoring),
        cache,
        settings.cache_ttl,
    )
}

fn read_document(path: &str) -> anyhow::Result<String> {
    use anyhow::Context;

    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read product document from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_INVALID_INPUT);
        }
    }
}
