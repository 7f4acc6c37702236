//! Data models for fertilizer products, allocations and soil readings

use serde::{Deserialize, Serialize};

/// Hectare to acre conversion used for per-acre quantities
pub const ACRES_PER_HECTARE_FACTOR: f64 = 0.4047;

/// Retail bag size in kg
pub const BAG_SIZE_KG: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium];

    pub fn symbol(self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "N",
            Nutrient::Phosphorus => "P",
            Nutrient::Potassium => "K",
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Nutrient::Nitrogen => "Nitrogen",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Potassium => "Potassium",
        };
        write!(f, "{}", name)
    }
}

/// Nutrient gap between the soil and the crop target, in kg/ha
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientDeficit {
    pub nitrogen_kg_per_ha: f64,
    pub phosphorus_kg_per_ha: f64,
    pub potassium_kg_per_ha: f64,
}

impl NutrientDeficit {
    pub fn new(nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            nitrogen_kg_per_ha: nitrogen,
            phosphorus_kg_per_ha: phosphorus,
            potassium_kg_per_ha: potassium,
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen_kg_per_ha,
            Nutrient::Phosphorus => self.phosphorus_kg_per_ha,
            Nutrient::Potassium => self.potassium_kg_per_ha,
        }
    }
}

/// A commercial fertilizer with its N-P-K grade (percent by weight)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerProduct {
    pub name: String,
    pub n_pct: f64,
    pub p_pct: f64,
    pub k_pct: f64,
    pub price_per_kg: f64,
    pub price_verified: bool,
}

impl FertilizerProduct {
    pub fn pct(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.n_pct,
            Nutrient::Phosphorus => self.p_pct,
            Nutrient::Potassium => self.k_pct,
        }
    }

    /// kg of `nutrient` delivered by `quantity_kg` of this product
    pub fn supplies(&self, nutrient: Nutrient, quantity_kg: f64) -> f64 {
        quantity_kg * self.pct(nutrient) / 100.0
    }

    pub fn price_per_bag(&self) -> f64 {
        self.price_per_kg * BAG_SIZE_KG
    }

    pub fn grade(&self) -> String {
        format!("{}-{}-{}", self.n_pct, self.p_pct, self.k_pct)
    }
}

/// One product in a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub product: FertilizerProduct,
    /// Nutrient this line was chosen to cover
    pub target: Nutrient,
    pub quantity_kg_per_ha: f64,
    pub quantity_kg_per_acre: f64,
    pub quantity_total_kg: f64,
    pub bags_50kg: u64,
    /// None when the price is not verified
    pub cost: Option<f64>,
    pub price_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStage {
    pub stage_name: String,
    pub timing_label: String,
    pub product_name: String,
    pub quantity_percent: f64,
    pub quantity_kg: f64,
    pub note: String,
}

/// Result of a fertilizer recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub deficit: NutrientDeficit,
    pub allocation: Vec<AllocationLine>,
    pub schedule: Vec<ApplicationStage>,
    /// Sum of verified line costs only
    pub total_cost: f64,
    pub field_area_ha: f64,
    pub unverified_products: Vec<String>,
}

impl RecommendationResult {
    /// kg/ha of `nutrient` delivered by the whole allocation
    pub fn supplied(&self, nutrient: Nutrient) -> f64 {
        self.allocation
            .iter()
            .map(|line| line.product.supplies(nutrient, line.quantity_kg_per_ha))
            .sum()
    }

    pub fn line(&self, product_name: &str) -> Option<&AllocationLine> {
        self.allocation.iter().find(|l| l.product.name == product_name)
    }
}

/// Measured soil parameters, as reported by a soil test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub nitrogen_mg_per_kg: Option<f64>,
    pub phosphorus_mg_per_kg: Option<f64>,
    pub potassium_mg_per_kg: Option<f64>,
    pub ph: Option<f64>,
    pub ec_ds_per_m: Option<f64>,
    pub organic_carbon_pct: Option<f64>,
}

/// A soil amendment suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilImprovement {
    pub issue: String,
    pub recommendation: String,
    pub quantity: String,
    pub purpose: String,
}
