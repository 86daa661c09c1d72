use catalog_merge::notifier::TracingNotifier;
use catalog_merge::utils::{is_iso_date, today_label};
use catalog_merge::{run, RunConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "catalog-merge")]
#[command(about = "Fold today's scraped catalog into the price history")]
struct Cli {
    /// Accumulated price history csv
    history: PathBuf,
    /// Freshly scraped snapshot csv
    snapshot: PathBuf,
    /// Category label, selects the brand keyword list
    category: String,
    /// Name of the new price column (defaults to today)
    date: Option<String>,
    /// Directory for <category>_db.csv
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// JSON file with {"categories": {"<category>": ["keyword", ...]}} overrides
    #[arg(long)]
    brands: Option<PathBuf>,
    /// Also write the intermediate history/snapshot correlation to this csv
    #[arg(long)]
    dump_correlation: Option<PathBuf>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();

    let date = cli.date.unwrap_or_else(today_label);
    if !is_iso_date(&date) {
        warn!("Date label '{}' is not YYYY-MM-DD, using it as is", date);
    }

    let config = RunConfig {
        history_path: cli.history,
        snapshot_path: cli.snapshot,
        category: cli.category,
        date,
        out_dir: cli.out_dir,
        brands_path: cli.brands,
        dump_correlation: cli.dump_correlation,
    };

    info!("Starting loading process");
    let notifier = TracingNotifier::new(&config.category, &config.date);
    match run(&config, &notifier) {
        Ok(path) => info!("Done: {}", path.display()),
        Err(e) => {
            error!("Merge failed: {}", e);
            std::process::exit(1);
        }
    }
}
