//! Regional price sheet import
//!
//! A price sheet is a `<State>.prices` text file with one `Product = price`
//! line per product (price per 50 kg bag). `:` works as a separator too, and
//! `#` starts a comment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::price_key;
use crate::db;

const SHEET_EXTENSION: &str = "prices";

/// Parsed contents of one price sheet
#[derive(Debug, Default)]
struct PriceSheet {
    state: String,
    prices: Vec<(String, f64)>,
    malformed: usize,
}

/// Find all price sheets under `dir`
pub fn find_price_sheets(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sheets = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == SHEET_EXTENSION) {
            sheets.push(path.to_path_buf());
        }
    }

    sheets.sort();
    Ok(sheets)
}

fn parse_price_sheet(filepath: &Path) -> Result<Option<PriceSheet>> {
    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read {}", filepath.display()))?;

    let state = filepath
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.replace('_', " ").trim().to_string())
        .unwrap_or_default();
    if state.is_empty() {
        return Ok(None);
    }

    let line_re = Regex::new(r"^\s*([A-Za-z][\w\s().-]*?)\s*[=:]\s*(\d+(?:\.\d+)?)\s*$")?;

    let mut sheet = PriceSheet {
        state,
        ..Default::default()
    };

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        match line_re.captures(line) {
            Some(cap) => {
                let price = cap[2].parse::<f64>().unwrap_or(0.0);
                if price <= 0.0 {
                    sheet.malformed += 1;
                    continue;
                }
                sheet.prices.push((price_key(cap[1].trim()).to_string(), price));
            }
            None => {
                warn!(file = %filepath.display(), line = lineno + 1, "skipping malformed price line");
                sheet.malformed += 1;
            }
        }
    }

    Ok(Some(sheet))
}

/// Import every price sheet under `dir` into the state price table
pub fn import_price_sheets(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    info!(dir = %dir.display(), "scanning for price sheets");
    let sheets = find_price_sheets(dir)?;
    info!(count = sheets.len(), "found price sheets");

    for filepath in &sheets {
        match parse_price_sheet(filepath) {
            Ok(Some(mut sheet)) => {
                if let Some(state) = db::canonical_state(conn, &sheet.state)? {
                    sheet.state = state;
                }
                for (product, price) in &sheet.prices {
                    db::upsert_state_price(conn, &sheet.state, product, *price)?;
                }

                stats.states += 1;
                stats.prices += sheet.prices.len();
                stats.malformed += sheet.malformed;

                info!(
                    state = %sheet.state,
                    prices = sheet.prices.len(),
                    malformed = sheet.malformed,
                    "imported price sheet"
                );
            }
            Ok(None) => {
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(file = %filepath.display(), error = %e, "failed to import price sheet");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub states: usize,
    pub prices: usize,
    pub malformed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} prices for {} states. Malformed lines: {}, Skipped: {}, Errors: {}",
            self.prices, self.states, self.malformed, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("soil-advisor-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn imports_sheets_and_counts_bad_lines() {
        let dir = scratch_dir("import");
        fs::create_dir_all(dir.join("south")).unwrap();
        fs::write(
            dir.join("south").join("Tamil_Nadu.prices"),
            "# NBS retail\nUrea = 270\nDAP: 1362.5\nNPK 10-26-26 = 1466\nMOP = lots\n\n",
        )
        .unwrap();
        fs::write(dir.join("Goa.prices"), "MOP = 1740 # dealer quote\n").unwrap();
        fs::write(dir.join("readme.txt"), "Urea = 1\n").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_price_sheets(&conn, &dir).unwrap();

        assert_eq!(stats.states, 2);
        assert_eq!(stats.prices, 4);
        assert_eq!(stats.malformed, 1);

        let prices = db::get_state_prices(&conn, "tamil nadu").unwrap();
        assert_eq!(
            prices,
            vec![
                ("DAP".to_string(), 1362.5),
                ("NPK".to_string(), 1466.0),
                ("Urea".to_string(), 270.0),
            ]
        );
        assert_eq!(db::get_state_prices(&conn, "Goa").unwrap(), vec![("MOP".to_string(), 1740.0)]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn lowercase_sheet_replaces_seeded_state() {
        let dir = scratch_dir("reimport");
        fs::write(dir.join("punjab.prices"), "dap = 1400\nUREA = 270\n").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        db::seed_state_prices(&conn).unwrap();
        import_price_sheets(&conn, &dir).unwrap();

        let states = db::list_states(&conn).unwrap();
        assert_eq!(states.len(), 15);
        assert_eq!(states.iter().filter(|s| s.eq_ignore_ascii_case("punjab")).count(), 1);
        assert!(states.contains(&"Punjab".to_string()));

        let prices = db::get_state_prices(&conn, "Punjab").unwrap();
        assert_eq!(
            prices,
            vec![
                ("DAP".to_string(), 1400.0),
                ("MOP".to_string(), 1720.0),
                ("NPK".to_string(), 1460.0),
                ("Urea".to_string(), 270.0),
            ]
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
