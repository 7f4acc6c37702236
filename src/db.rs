//! Database schema and reference-data operations

use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::catalog::{self, Catalog};
use crate::error::Result;
use crate::models::{FertilizerProduct, BAG_SIZE_KG};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Fertilizer products with grade in percent by weight
        CREATE TABLE IF NOT EXISTS products (
            name TEXT PRIMARY KEY,
            n_pct REAL NOT NULL,
            p_pct REAL NOT NULL,
            k_pct REAL NOT NULL,
            price_per_kg REAL NOT NULL,
            price_verified INTEGER NOT NULL DEFAULT 1
        );

        -- Regional retail prices per 50 kg bag, keyed by price key (Urea, DAP, MOP, NPK)
        CREATE TABLE IF NOT EXISTS state_prices (
            state TEXT NOT NULL COLLATE NOCASE,
            product TEXT NOT NULL COLLATE NOCASE,
            price_per_50kg REAL NOT NULL,
            PRIMARY KEY (state, product)
        );

        CREATE INDEX IF NOT EXISTS idx_state_prices_state ON state_prices(state);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a product
pub fn upsert_product(conn: &Connection, product: &FertilizerProduct) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO products (name, n_pct, p_pct, k_pct, price_per_kg, price_verified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &product.name,
            product.n_pct,
            product.p_pct,
            product.k_pct,
            product.price_per_kg,
            product.price_verified,
        ),
    )?;
    Ok(())
}

/// Insert or replace a regional bag price
pub fn upsert_state_price(conn: &Connection, state: &str, product: &str, price_per_50kg: f64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO state_prices (state, product, price_per_50kg)
         VALUES (?1, ?2, ?3)",
        (state, product, price_per_50kg),
    )?;
    Ok(())
}

/// Load the standard five-product catalog
pub fn seed_standard_catalog(conn: &Connection) -> Result<usize> {
    let catalog = Catalog::standard();
    for product in catalog.products() {
        upsert_product(conn, product)?;
    }
    info!(products = catalog.products().len(), "seeded standard catalog");
    Ok(catalog.products().len())
}

/// Load the built-in state price table
pub fn seed_state_prices(conn: &Connection) -> Result<usize> {
    let rows = catalog::state_price_rows();
    for (state, product, price) in &rows {
        upsert_state_price(conn, state, product, *price)?;
    }
    info!(rows = rows.len(), "seeded state prices");
    Ok(rows.len())
}

/// List all products in the database
pub fn list_products(conn: &Connection) -> Result<Vec<FertilizerProduct>> {
    let mut stmt = conn.prepare(
        "SELECT name, n_pct, p_pct, k_pct, price_per_kg, price_verified FROM products ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(FertilizerProduct {
            name: row.get(0)?,
            n_pct: row.get(1)?,
            p_pct: row.get(2)?,
            k_pct: row.get(3)?,
            price_per_kg: row.get(4)?,
            price_verified: row.get(5)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Bag prices for one state as (price key, price per 50 kg)
pub fn get_state_prices(conn: &Connection, state: &str) -> Result<Vec<(String, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT product, price_per_50kg FROM state_prices
         WHERE state = ?1 COLLATE NOCASE
         ORDER BY product",
    )?;

    let rows = stmt.query_map([state], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all states with price data
pub fn list_states(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT state FROM state_prices ORDER BY state")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Stored spelling of `state`, falling back to the built-in table
pub fn canonical_state(conn: &Connection, state: &str) -> Result<Option<String>> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT state FROM state_prices WHERE state = ?1 COLLATE NOCASE LIMIT 1",
            [state],
            |row| row.get(0),
        )
        .optional()?;
    Ok(stored.or_else(|| catalog::known_state(state).map(str::to_string)))
}

pub fn get_product(conn: &Connection, name: &str) -> Result<Option<FertilizerProduct>> {
    let product = conn
        .query_row(
            "SELECT name, n_pct, p_pct, k_pct, price_per_kg, price_verified
             FROM products WHERE name = ?1 COLLATE NOCASE",
            [name],
            |row| {
                Ok(FertilizerProduct {
                    name: row.get(0)?,
                    n_pct: row.get(1)?,
                    p_pct: row.get(2)?,
                    k_pct: row.get(3)?,
                    price_per_kg: row.get(4)?,
                    price_verified: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(product)
}

/// Build the catalog from the products table, repriced for `state`
///
/// Stored products are merged over the standard catalog. Unknown states keep
/// the base prices.
pub fn load_catalog(conn: &Connection, state: Option<&str>) -> Result<Catalog> {
    let mut catalog = Catalog::standard();
    for product in list_products(conn)? {
        catalog.upsert(product);
    }

    if let Some(state) = state {
        let prices = get_state_prices(conn, state)?;
        if prices.is_empty() {
            warn!(state, "no regional prices, using base prices");
        }
        for (key, price) in prices {
            catalog.set_bag_price(&key, price);
        }
    }

    Ok(catalog)
}

/// Price per kg for a bag price
pub fn bag_to_kg(price_per_50kg: f64) -> f64 {
    price_per_50kg / BAG_SIZE_KG
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        seed_standard_catalog(&conn).unwrap();
        seed_state_prices(&conn).unwrap();
        conn
    }

    #[test]
    fn empty_database_falls_back_to_standard() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(load_catalog(&conn, None).unwrap(), Catalog::standard());
    }

    #[test]
    fn state_prices_reprice_catalog() {
        let conn = seeded();
        assert_eq!(list_states(&conn).unwrap().len(), 15);

        let catalog = load_catalog(&conn, Some("punjab")).unwrap();
        assert_relative_eq!(catalog.get("DAP").unwrap().price_per_kg, bag_to_kg(1360.0));
        assert_relative_eq!(catalog.get("NPK 12-32-16").unwrap().price_per_kg, bag_to_kg(1460.0));

        let base = load_catalog(&conn, Some("Nowhere")).unwrap();
        assert_relative_eq!(base.get("DAP").unwrap().price_per_kg, 27.0);
    }

    #[test]
    fn stored_products_merge_over_standard() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let product = FertilizerProduct {
            name: "NPK 17-17-17".to_string(),
            n_pct: 17.0,
            p_pct: 17.0,
            k_pct: 17.0,
            price_per_kg: 30.0,
            price_verified: false,
        };
        upsert_product(&conn, &product).unwrap();

        let catalog = load_catalog(&conn, None).unwrap();
        assert_eq!(catalog.products().len(), 6);
        assert!(catalog.get("DAP").is_some());
        assert_eq!(catalog.get("npk 17-17-17"), Some(&product));

        let deficit = crate::models::NutrientDeficit::new(40.0, 20.0, 30.0);
        assert!(crate::calculator::recommend(&deficit, 1.0, &catalog, None).is_ok());
    }

    #[test]
    fn state_price_keys_ignore_case() {
        let conn = seeded();
        upsert_state_price(&conn, "PUNJAB", "dap", 1400.0).unwrap();

        assert_eq!(list_states(&conn).unwrap().len(), 15);
        let prices = get_state_prices(&conn, "Punjab").unwrap();
        assert_eq!(prices.len(), 4);
        let dap: Vec<_> = prices.iter().filter(|(k, _)| k.eq_ignore_ascii_case("DAP")).collect();
        assert_eq!(dap.len(), 1);
        assert_relative_eq!(dap[0].1, 1400.0);
    }

    #[test]
    fn canonical_state_prefers_stored_spelling() {
        let conn = seeded();
        assert_eq!(canonical_state(&conn, "punjab").unwrap().as_deref(), Some("Punjab"));

        let empty = Connection::open_in_memory().unwrap();
        init_schema(&empty).unwrap();
        assert_eq!(canonical_state(&empty, "KERALA").unwrap().as_deref(), Some("Kerala"));
        assert_eq!(canonical_state(&empty, "Goa").unwrap(), None);
    }

    #[test]
    fn unverified_product_round_trips() {
        let conn = seeded();
        let product = FertilizerProduct {
            name: "SSP".to_string(),
            n_pct: 0.0,
            p_pct: 16.0,
            k_pct: 0.0,
            price_per_kg: 9.0,
            price_verified: false,
        };
        upsert_product(&conn, &product).unwrap();
        assert_eq!(get_product(&conn, "ssp").unwrap(), Some(product));
        assert_eq!(list_products(&conn).unwrap().len(), 6);
        assert!(get_product(&conn, "Potash Nitrate").unwrap().is_none());
    }
}
