//! Fertilizer allocation engine
//!
//! Converts a nutrient deficit into product quantities with a fixed greedy
//! order (phosphorus, potassium, then nitrogen). The engine never searches
//! alternative mixes: the NPK blends in the catalog are not used even when
//! they would be cheaper.

use tracing::debug;

use crate::catalog::{Catalog, ALLOCATION_PLAN};
use crate::error::{ensure_non_negative, ensure_positive, AdvisorError, Result};
use crate::models::{
    AllocationLine, Nutrient, NutrientDeficit, RecommendationResult, ACRES_PER_HECTARE_FACTOR,
    BAG_SIZE_KG,
};
use crate::schedule;

/// Remaining need below this many kg/ha counts as covered
const COVERED_TOLERANCE: f64 = 1e-9;

/// Recommend products and an application schedule for a deficit
///
/// `crop` only selects the schedule profile; quantities do not depend on it.
pub fn recommend(
    deficit: &NutrientDeficit,
    field_area_ha: f64,
    catalog: &Catalog,
    crop: Option<&str>,
) -> Result<RecommendationResult> {
    ensure_non_negative("nitrogen deficit", deficit.nitrogen_kg_per_ha)?;
    ensure_non_negative("phosphorus deficit", deficit.phosphorus_kg_per_ha)?;
    ensure_non_negative("potassium deficit", deficit.potassium_kg_per_ha)?;
    ensure_positive("field area", field_area_ha)?;

    let allocation = allocate(deficit, field_area_ha, catalog)?;
    let schedule = schedule::build_schedule(&allocation, crop);

    let total_cost: f64 = allocation.iter().filter_map(|line| line.cost).sum();
    let unverified_products = allocation
        .iter()
        .filter(|line| !line.price_verified)
        .map(|line| line.product.name.clone())
        .collect();

    Ok(RecommendationResult {
        deficit: *deficit,
        allocation,
        schedule,
        total_cost,
        field_area_ha,
        unverified_products,
    })
}

fn allocate(
    deficit: &NutrientDeficit,
    field_area_ha: f64,
    catalog: &Catalog,
) -> Result<Vec<AllocationLine>> {
    // kg/ha already delivered, indexed like Nutrient::ALL
    let mut supplied = [0.0_f64; 3];
    let mut lines = Vec::new();

    for (target, product_name) in ALLOCATION_PLAN {
        let product = catalog
            .get(product_name)
            .ok_or_else(|| AdvisorError::MissingProduct(product_name.to_string()))?;
        if product.pct(target) <= 0.0 {
            return Err(AdvisorError::InvalidProduct(product.name.clone()));
        }

        let remaining = (deficit.get(target) - supplied[index(target)]).max(0.0);
        if remaining <= COVERED_TOLERANCE {
            debug!(product = %product.name, nutrient = %target, "deficit already covered");
            continue;
        }

        let per_ha = remaining / (product.pct(target) / 100.0);
        for nutrient in Nutrient::ALL {
            supplied[index(nutrient)] += product.supplies(nutrient, per_ha);
        }

        let total = per_ha * field_area_ha;
        let cost = product.price_verified.then(|| total * product.price_per_kg);
        debug!(
            product = %product.name,
            nutrient = %target,
            remaining,
            per_ha,
            total,
            "allocated"
        );

        lines.push(AllocationLine {
            product: product.clone(),
            target,
            quantity_kg_per_ha: per_ha,
            quantity_kg_per_acre: per_ha * ACRES_PER_HECTARE_FACTOR,
            quantity_total_kg: total,
            bags_50kg: (total / BAG_SIZE_KG).ceil() as u64,
            cost,
            price_verified: product.price_verified,
        });
    }

    Ok(lines)
}

fn index(nutrient: Nutrient) -> usize {
    match nutrient {
        Nutrient::Nitrogen => 0,
        Nutrient::Phosphorus => 1,
        Nutrient::Potassium => 2,
    }
}

/// Per-nutrient balance of a recommendation
#[derive(Debug)]
pub struct NutrientBalance {
    pub nutrient: Nutrient,
    pub required_kg_per_ha: f64,
    pub supplied_kg_per_ha: f64,
}

impl NutrientBalance {
    pub fn surplus(&self) -> f64 {
        self.supplied_kg_per_ha - self.required_kg_per_ha
    }
}

/// Summary of a recommendation
#[derive(Debug)]
pub struct RecommendationSummary {
    pub field_area_ha: f64,
    pub balances: Vec<NutrientBalance>,
    pub products: Vec<(String, f64, Option<f64>)>,
    pub total_quantity_kg_per_ha: f64,
    pub total_cost: f64,
    pub unverified_products: Vec<String>,
}

pub fn summarize(result: &RecommendationResult) -> RecommendationSummary {
    let balances = Nutrient::ALL
        .iter()
        .map(|&nutrient| NutrientBalance {
            nutrient,
            required_kg_per_ha: result.deficit.get(nutrient),
            supplied_kg_per_ha: result.supplied(nutrient),
        })
        .collect();

    let products = result
        .allocation
        .iter()
        .map(|line| (line.product.name.clone(), line.quantity_total_kg, line.cost))
        .collect();

    RecommendationSummary {
        field_area_ha: result.field_area_ha,
        balances,
        products,
        total_quantity_kg_per_ha: result.allocation.iter().map(|l| l.quantity_kg_per_ha).sum(),
        total_cost: result.total_cost,
        unverified_products: result.unverified_products.clone(),
    }
}

/// Format the allocation and schedule as a readable report
pub fn format_recommendation(result: &RecommendationResult) -> String {
    let mut output = String::new();

    if result.allocation.is_empty() {
        output.push_str("No fertilizer needed - deficit is zero.\n");
        return output;
    }

    for (i, line) in result.allocation.iter().enumerate() {
        let provides: Vec<String> = Nutrient::ALL
            .iter()
            .filter(|&&n| line.product.pct(n) > 0.0)
            .map(|&n| format!("{:.1} kg {}", line.product.supplies(n, line.quantity_kg_per_ha), n.symbol()))
            .collect();

        output.push_str(&format!("{}. {} ({})\n", i + 1, line.product.name, line.product.grade()));
        output.push_str(&format!(
            "   {:.2} kg/ha ({:.2} kg/acre), {:.2} kg total, {} bags\n",
            line.quantity_kg_per_ha, line.quantity_kg_per_acre, line.quantity_total_kg, line.bags_50kg
        ));
        output.push_str(&format!("   provides {} per ha\n", provides.join(" + ")));
        match line.cost {
            Some(cost) => output.push_str(&format!("   cost: Rs {:.2}\n", cost)),
            None => output.push_str("   cost: price not verified\n"),
        }
    }

    output.push_str("\nApplication schedule:\n");
    for stage in &result.schedule {
        output.push_str(&format!(
            "  {} ({}): {:.0}% of {} = {:.2} kg - {}\n",
            stage.stage_name,
            stage.timing_label,
            stage.quantity_percent,
            stage.product_name,
            stage.quantity_kg,
            stage.note
        ));
    }

    output
}

impl std::fmt::Display for RecommendationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Fertilizer Recommendation ===")?;
        writeln!(f, "Field area: {:.2} ha", self.field_area_ha)?;
        writeln!(f)?;

        writeln!(f, "Nutrients (kg/ha):")?;
        for b in &self.balances {
            writeln!(
                f,
                "  {:<11} required {:>8.2}  supplied {:>8.2}  surplus {:>7.2}",
                b.nutrient.to_string(),
                b.required_kg_per_ha,
                b.supplied_kg_per_ha,
                b.surplus()
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Products:")?;
        for (name, total, cost) in &self.products {
            match cost {
                Some(cost) => writeln!(f, "  {:<14} {:>9.2} kg  Rs {:>10.2}", name, total, cost)?,
                None => writeln!(f, "  {:<14} {:>9.2} kg  (price not verified)", name, total)?,
            }
        }
        writeln!(f)?;

        writeln!(f, "Total quantity: {:.2} kg/ha", self.total_quantity_kg_per_ha)?;
        writeln!(f, "Total cost:     Rs {:.2}", self.total_cost)?;
        if !self.unverified_products.is_empty() {
            writeln!(f, "Excluded from cost: {}", self.unverified_products.join(", "))?;
        }

        Ok(())
    }
}
