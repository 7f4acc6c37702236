//! Fertilizer catalog and allocation reference data
//!
//! Prices are Government of India retail prices per 50 kg bag under the
//! Nutrient Based Subsidy scheme (December 2024), converted to price per kg.

use regex::Regex;

use crate::error::{AdvisorError, Result};
use crate::models::{FertilizerProduct, Nutrient, BAG_SIZE_KG};

pub const UREA: &str = "Urea";
pub const DAP: &str = "DAP";
pub const MOP: &str = "MOP";
/// Shared regional price key for every NPK blend
pub const NPK: &str = "NPK";

const PRICE_KEYS: [&str; 4] = [UREA, DAP, MOP, NPK];

/// (name, N%, P%, K%, INR per 50 kg bag)
const STANDARD_PRODUCTS: [(&str, f64, f64, f64, f64); 5] = [
    (UREA, 46.0, 0.0, 0.0, 266.0),
    (DAP, 18.0, 46.0, 0.0, 1350.0),
    (MOP, 0.0, 0.0, 60.0, 1700.0),
    ("NPK 10-26-26", 10.0, 26.0, 26.0, 1450.0),
    ("NPK 12-32-16", 12.0, 32.0, 16.0, 1500.0),
];

/// Greedy allocation order: each nutrient is covered by exactly one product.
///
/// Phosphorus goes first so that DAP's nitrogen is credited before Urea is sized.
pub const ALLOCATION_PLAN: [(Nutrient, &str); 3] = [
    (Nutrient::Phosphorus, DAP),
    (Nutrient::Potassium, MOP),
    (Nutrient::Nitrogen, UREA),
];

/// State-wise bag prices in INR per 50 kg: (state, Urea, DAP, MOP, NPK)
pub static STATE_PRICES: [(&str, f64, f64, f64, f64); 15] = [
    ("Andhra Pradesh", 269.0, 1360.0, 1720.0, 1465.0),
    ("Bihar", 265.0, 1345.0, 1695.0, 1445.0),
    ("Gujarat", 267.0, 1355.0, 1710.0, 1455.0),
    ("Haryana", 267.0, 1355.0, 1710.0, 1455.0),
    ("Karnataka", 270.0, 1365.0, 1730.0, 1470.0),
    ("Kerala", 272.0, 1370.0, 1735.0, 1475.0),
    ("Madhya Pradesh", 266.0, 1350.0, 1700.0, 1450.0),
    ("Maharashtra", 266.0, 1350.0, 1700.0, 1450.0),
    ("Odisha", 268.0, 1358.0, 1715.0, 1460.0),
    ("Punjab", 268.0, 1360.0, 1720.0, 1460.0),
    ("Rajasthan", 266.0, 1350.0, 1705.0, 1450.0),
    ("Tamil Nadu", 268.0, 1358.0, 1715.0, 1460.0),
    ("Telangana", 269.0, 1360.0, 1720.0, 1465.0),
    ("Uttar Pradesh", 265.0, 1345.0, 1695.0, 1445.0),
    ("West Bengal", 268.0, 1358.0, 1715.0, 1460.0),
];

/// Key used by the regional price tables; all NPK blends share one price
///
/// Known keys come back in their canonical casing; anything else is returned as is.
pub fn price_key(product_name: &str) -> &str {
    if product_name.get(..NPK.len()).is_some_and(|p| p.eq_ignore_ascii_case(NPK)) {
        return NPK;
    }
    match PRICE_KEYS.iter().find(|k| k.eq_ignore_ascii_case(product_name)) {
        Some(&key) => key,
        None => product_name,
    }
}

/// Canonical spelling of a state in the built-in price table
pub fn known_state(state: &str) -> Option<&'static str> {
    STATE_PRICES
        .iter()
        .map(|(s, ..)| *s)
        .find(|s| s.eq_ignore_ascii_case(state))
}

fn is_standard(product_name: &str) -> bool {
    STANDARD_PRODUCTS
        .iter()
        .any(|(name, ..)| name.eq_ignore_ascii_case(product_name))
}

/// Flatten the state table into (state, price key, bag price) rows
pub fn state_price_rows() -> Vec<(&'static str, &'static str, f64)> {
    let mut rows = Vec::with_capacity(STATE_PRICES.len() * 4);
    for (state, urea, dap, mop, npk) in STATE_PRICES {
        rows.push((state, UREA, urea));
        rows.push((state, DAP, dap));
        rows.push((state, MOP, mop));
        rows.push((state, NPK, npk));
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    products: Vec<FertilizerProduct>,
}

impl Catalog {
    pub fn new(products: Vec<FertilizerProduct>) -> Self {
        Self { products }
    }

    /// The five products the allocation engine is calibrated for
    pub fn standard() -> Self {
        let products = STANDARD_PRODUCTS
            .iter()
            .map(|&(name, n, p, k, bag_price)| FertilizerProduct {
                name: name.to_string(),
                n_pct: n,
                p_pct: p,
                k_pct: k,
                price_per_kg: bag_price / BAG_SIZE_KG,
                price_verified: true,
            })
            .collect();
        Self { products }
    }

    pub fn products(&self) -> &[FertilizerProduct] {
        &self.products
    }

    pub fn get(&self, name: &str) -> Option<&FertilizerProduct> {
        self.products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Insert `product`, replacing any product with the same name
    pub fn upsert(&mut self, product: FertilizerProduct) {
        match self
            .products
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&product.name))
        {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    /// Override the bag price of every standard product sharing `key`
    ///
    /// User-added products keep their own price and verification flag.
    pub fn set_bag_price(&mut self, key: &str, price_per_bag: f64) {
        for product in &mut self.products {
            if is_standard(&product.name) && price_key(&product.name).eq_ignore_ascii_case(key) {
                product.price_per_kg = price_per_bag / BAG_SIZE_KG;
                product.price_verified = true;
            }
        }
    }

    /// Standard catalog repriced for one state, if the state is known
    pub fn for_state(state: &str) -> Option<Self> {
        let (_, urea, dap, mop, npk) = STATE_PRICES
            .iter()
            .find(|(s, ..)| s.eq_ignore_ascii_case(state))?;
        let mut catalog = Self::standard();
        catalog.set_bag_price(UREA, *urea);
        catalog.set_bag_price(DAP, *dap);
        catalog.set_bag_price(MOP, *mop);
        catalog.set_bag_price(NPK, *npk);
        Some(catalog)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse an N-P-K grade such as "NPK 10-26-26", "12:32:16" or "20-20-0-13"
///
/// Only the first three figures are read; a trailing sulphur figure is ignored.
pub fn parse_grade(label: &str) -> Result<(f64, f64, f64)> {
    let grade_re = Regex::new(r"(\d+(?:\.\d+)?)\s*[-:]\s*(\d+(?:\.\d+)?)\s*[-:]\s*(\d+(?:\.\d+)?)")
        .map_err(|e| AdvisorError::InvalidGrade(e.to_string()))?;

    let cap = grade_re
        .captures(label)
        .ok_or_else(|| AdvisorError::InvalidGrade(format!("no N-P-K figures in '{}'", label)))?;

    let figure = |i: usize| -> Result<f64> {
        cap[i]
            .parse::<f64>()
            .map_err(|e| AdvisorError::InvalidGrade(format!("{}: {}", &cap[i], e)))
    };
    let (n, p, k) = (figure(1)?, figure(2)?, figure(3)?);

    if n + p + k > 100.0 {
        return Err(AdvisorError::InvalidGrade(format!(
            "'{}' adds up to more than 100%",
            label
        )));
    }
    Ok((n, p, k))
}
