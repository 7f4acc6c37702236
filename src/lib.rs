//! Soil Advisor
//!
//! Fertilizer allocation and soil health scoring. A nutrient deficit in kg/ha
//! is turned into quantities of Urea, DAP and MOP with an application
//! schedule; measured soil parameters are scored 0-100.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod health;
pub mod import;
pub mod improvement;
pub mod models;
pub mod schedule;

pub use calculator::recommend;
pub use catalog::Catalog;
pub use error::{AdvisorError, Result};
pub use models::{NutrientDeficit, RecommendationResult};
