// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use fastmoney::{import_results, load_results_csv, seed_defaults, Config, SqliteStore};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = Config::load()?;

    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(&config)?,
        Some("import") => {
            let csv_path = args
                .get(2)
                .context("Usage: fastmoney import <results.csv>")?;
            run_import(&config, Path::new(csv_path))?;
        }
        // UI mode (default)
        _ => run_ui_mode(&config)?,
    }

    Ok(())
}

fn run_seed(config: &Config) -> Result<()> {
    fastmoney::init_logging(fastmoney::LogTarget::Stderr)?;

    println!("🌱 Seeding default content");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = SqliteStore::open(&config.database_path)?;
    let report = seed_defaults(&store)?;

    if report.homepage_created {
        println!("✓ Created homepage content");
    } else {
        println!("✓ Homepage content already present");
    }
    println!("✓ Created {} category boxes", report.categories_created);

    Ok(())
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    fastmoney::init_logging(fastmoney::LogTarget::Stderr)?;

    println!("🗄️  Results Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\n📂 Loading CSV...");
    let drafts = load_results_csv(csv_path)?;
    println!("✓ Loaded {} results from CSV", drafts.len());

    // 2. Setup database
    println!("\n🔧 Opening database...");
    let store = SqliteStore::open(&config.database_path)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Insert results
    println!("\n💾 Inserting results...");
    let inserted = import_results(&store, &drafts)?;

    // 4. Verify count
    let count = store.count_results()?;
    println!("✓ Inserted {} results, database now holds {}", inserted, count);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    use fastmoney::{ContentRepository, HomepageContent, ResultsSnapshot};

    // The terminal belongs to the UI, so logs go to a file
    fastmoney::init_logging(fastmoney::LogTarget::File(&config.log_file))?;

    println!("🖥️  Loading FastMoney...\n");

    let store = SqliteStore::open(&config.database_path)?;

    let homepage = match store.homepage() {
        Ok(Some(content)) => content,
        Ok(None) => HomepageContent::fallback(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load homepage content");
            HomepageContent::fallback()
        }
    };

    let categories = store.list_categories().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load category boxes");
        Vec::new()
    });

    let snapshot = ResultsSnapshot::fetch(&store);
    println!("✓ Loaded {} results\n", snapshot.results.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(homepage, categories, snapshot, config.listing_engine());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin fastmoney-server --features server");
    std::process::exit(1);
}
