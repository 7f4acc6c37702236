//! Soil Advisor CLI
//!
//! Fertilizer recommendations and soil health scores from the command line.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use soil_advisor::health::{self, OptimalRange, SoilParameter};
use soil_advisor::models::{FertilizerProduct, NutrientDeficit, SoilReading};
use soil_advisor::{calculator, catalog, db, import, improvement};

#[derive(Parser)]
#[command(name = "soil-advisor")]
#[command(about = "Fertilizer allocation and soil health calculator")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "SOIL_ADVISOR_DB", default_value = "soil_advisor.db")]
    database: PathBuf,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, env = "SOIL_ADVISOR_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and load the standard catalog and state prices
    Init,

    /// Recommend fertilizers for a nutrient deficit
    Recommend {
        /// Nitrogen deficit in kg/ha
        #[arg(short, long, default_value = "0")]
        nitrogen: f64,

        /// Phosphorus deficit in kg/ha
        #[arg(short, long, default_value = "0")]
        phosphorus: f64,

        /// Potassium deficit in kg/ha
        #[arg(short = 'k', long, default_value = "0")]
        potassium: f64,

        /// Field area in hectares
        #[arg(short, long, default_value = "1.0")]
        area: f64,

        /// Crop name, selects the application schedule
        #[arg(short, long)]
        crop: Option<String>,

        /// State for regional prices
        #[arg(short, long)]
        state: Option<String>,

        /// Show per-product detail and the schedule
        #[arg(short, long)]
        verbose: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a single soil parameter
    Score {
        /// Parameter (n, p, k, ph, ec, oc)
        parameter: String,

        /// Measured value
        value: f64,

        /// Lower bound of the optimal range
        #[arg(long, requires = "max")]
        min: Option<f64>,

        /// Upper bound of the optimal range
        #[arg(long, requires = "min")]
        max: Option<f64>,
    },

    /// Soil health report and amendment advice for a soil test
    Health {
        #[arg(short, long)]
        nitrogen: Option<f64>,

        #[arg(short, long)]
        phosphorus: Option<f64>,

        #[arg(short = 'k', long)]
        potassium: Option<f64>,

        #[arg(long)]
        ph: Option<f64>,

        /// Electrical conductivity in dS/m
        #[arg(long)]
        ec: Option<f64>,

        /// Organic carbon in percent
        #[arg(long)]
        organic_carbon: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// List products in the catalog
    Catalog {
        /// Show prices for this state
        #[arg(short, long)]
        state: Option<String>,
    },

    /// List states with regional prices
    States,

    /// Add or replace a product, e.g. "NPK 17-17-17"
    AddProduct {
        /// Product name, parsed for the grade unless --grade is given
        name: String,

        /// N-P-K grade such as 46-0-0
        #[arg(short, long)]
        grade: Option<String>,

        /// Retail price per 50 kg bag
        #[arg(long)]
        price_per_bag: f64,

        /// Mark the price as not verified (excluded from cost totals)
        #[arg(long)]
        unverified: bool,
    },

    /// Import regional price sheets (*.prices) from a directory
    ImportPrices {
        /// Directory to scan
        dir: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            let products = db::seed_standard_catalog(&conn)?;
            let prices = db::seed_state_prices(&conn)?;
            println!(
                "Database initialized at: {} ({} products, {} state prices)",
                cli.database.display(),
                products,
                prices
            );
        }

        Commands::Recommend {
            nitrogen,
            phosphorus,
            potassium,
            area,
            crop,
            state,
            verbose,
            json,
        } => {
            let catalog = db::load_catalog(&conn, state.as_deref())?;
            let deficit = NutrientDeficit::new(nitrogen, phosphorus, potassium);
            let result = calculator::recommend(&deficit, area, &catalog, crop.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            if verbose {
                println!("Recommendation:\n");
                println!("{}", calculator::format_recommendation(&result));
            }

            println!("{}", calculator::summarize(&result));
        }

        Commands::Score {
            parameter,
            value,
            min,
            max,
        } => {
            let Some(param) = SoilParameter::from_name(&parameter) else {
                bail!("Unknown parameter '{}' (expected n, p, k, ph, ec or oc)", parameter);
            };
            let range = match (min, max) {
                (Some(min), Some(max)) => OptimalRange::new(min, max),
                _ => health::default_range(param),
            };
            let s = health::score_parameter(param, value, range)?;
            println!(
                "{}: {} {} (optimal {}-{}) -> score {:.0}, {}, {}",
                s.parameter,
                s.value,
                param.unit(),
                s.range.min,
                s.range.max,
                s.score,
                s.status,
                s.severity
            );
        }

        Commands::Health {
            nitrogen,
            phosphorus,
            potassium,
            ph,
            ec,
            organic_carbon,
            json,
        } => {
            let reading = SoilReading {
                nitrogen_mg_per_kg: nitrogen,
                phosphorus_mg_per_kg: phosphorus,
                potassium_mg_per_kg: potassium,
                ph,
                ec_ds_per_m: ec,
                organic_carbon_pct: organic_carbon,
            };
            let report = health::assess(&reading)?;
            let improvements = improvement::soil_improvements(&reading);
            let biofertilizer = improvement::biofertilizer_recommended(reading.organic_carbon_pct);

            if json {
                let value = serde_json::json!({
                    "health": report,
                    "soil_improvements": improvements,
                    "biofertilizer_recommended": biofertilizer,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            println!("{}", report);
            println!("Soil improvement advisory:");
            for imp in &improvements {
                println!("  {}: {} @ {}", imp.issue, imp.recommendation, imp.quantity);
                println!("    {}", imp.purpose);
            }
            if biofertilizer {
                println!("  Seed treatment: Biofertilizer (Rhizobium/Azotobacter) @ 2 kg/ha");
            }
        }

        Commands::Catalog { state } => {
            let catalog = db::load_catalog(&conn, state.as_deref())?;
            println!(
                "{:<16} {:>10} {:>12} {:>12}",
                "Product", "Grade", "Rs/50kg", "Verified"
            );
            println!("{}", "-".repeat(53));
            for p in catalog.products() {
                println!(
                    "{:<16} {:>10} {:>12.2} {:>12}",
                    p.name,
                    p.grade(),
                    p.price_per_bag(),
                    if p.price_verified { "yes" } else { "no" }
                );
            }
        }

        Commands::States => {
            let states = db::list_states(&conn)?;
            if states.is_empty() {
                println!("No state prices in database. Run 'init' or 'import-prices' first.");
            } else {
                println!("States with regional prices:");
                for s in states {
                    println!("  {}", s);
                }
            }
        }

        Commands::AddProduct {
            name,
            grade,
            price_per_bag,
            unverified,
        } => {
            let (n, p, k) = catalog::parse_grade(grade.as_deref().unwrap_or(&name))?;
            if !price_per_bag.is_finite() || price_per_bag <= 0.0 {
                bail!("Price per bag must be positive");
            }
            let product = FertilizerProduct {
                name: name.clone(),
                n_pct: n,
                p_pct: p,
                k_pct: k,
                price_per_kg: db::bag_to_kg(price_per_bag),
                price_verified: !unverified,
            };
            db::upsert_product(&conn, &product)?;
            println!("Saved {} ({})", product.name, product.grade());
        }

        Commands::ImportPrices { dir } => {
            let stats = import::import_price_sheets(&conn, &dir)?;
            println!("{}", stats);
        }
    }

    Ok(())
}
