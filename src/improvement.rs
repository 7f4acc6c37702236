//! Soil amendment advisory based on pH, salinity and organic carbon

use crate::models::{SoilImprovement, SoilReading};

const LIME_TARGET_PH: f64 = 6.5;
const BIOFERTILIZER_OC_THRESHOLD: f64 = 0.75;

/// Agricultural lime in kg/ha to bring acidic soil towards pH 6.5
///
/// Roughly 500 kg per 0.5 pH units, clamped to 500..=3000.
pub fn lime_requirement(ph: f64) -> u32 {
    let increase = LIME_TARGET_PH - ph;
    if increase <= 0.0 {
        return 0;
    }
    let kg = (increase * 1000.0).trunc();
    kg.clamp(500.0, 3000.0) as u32
}

/// Gypsum in kg/ha for alkaline soil
pub fn gypsum_requirement(ph: f64) -> u32 {
    if ph <= 7.5 {
        0
    } else if ph > 8.5 {
        750
    } else if ph > 8.0 {
        500
    } else {
        350
    }
}

/// Seed treatment with Rhizobium/Azotobacter is advised on low-carbon soils
pub fn biofertilizer_recommended(organic_carbon_pct: Option<f64>) -> bool {
    organic_carbon_pct.is_some_and(|oc| oc < BIOFERTILIZER_OC_THRESHOLD)
}

fn improvement(issue: &str, recommendation: &str, quantity: String, purpose: &str) -> SoilImprovement {
    SoilImprovement {
        issue: issue.to_string(),
        recommendation: recommendation.to_string(),
        quantity,
        purpose: purpose.to_string(),
    }
}

pub fn soil_improvements(reading: &SoilReading) -> Vec<SoilImprovement> {
    let mut improvements = Vec::new();

    if let Some(ph) = reading.ph {
        if ph < 5.5 {
            improvements.push(improvement(
                "Acidic Soil (pH < 5.5)",
                "Agricultural Lime (CaCO3)",
                format!("{} kg/ha", lime_requirement(ph)),
                "Raise pH to neutral range (6.0-7.0), improve nutrient availability",
            ));
        } else if ph > 7.5 {
            improvements.push(improvement(
                "Alkaline Soil (pH > 7.5)",
                "Gypsum (CaSO4.2H2O)",
                format!("{} kg/ha", gypsum_requirement(ph)),
                "Lower pH, improve phosphorus availability, reduce sodicity",
            ));
        }
    }

    if reading.ec_ds_per_m.is_some_and(|ec| ec > 2.0) {
        improvements.push(improvement(
            "High Salinity (EC > 2.0 dS/m)",
            "Gypsum + Leaching",
            "500-750 kg/ha + 7.5cm irrigation".to_string(),
            "Displace sodium, improve soil structure, leach excess salts",
        ));
    }

    match reading.organic_carbon_pct {
        Some(oc) if oc < 0.5 => improvements.push(improvement(
            "Low Organic Matter (OC < 0.5%)",
            "Farmyard Manure (FYM) or Compost",
            "8-10 tonnes/ha".to_string(),
            "Improve soil structure, water retention, microbial activity",
        )),
        Some(oc) if oc < 0.75 => improvements.push(improvement(
            "Moderate Organic Matter",
            "Farmyard Manure (FYM) or Vermicompost",
            "5-7 tonnes/ha".to_string(),
            "Maintain soil health, enhance nutrient cycling",
        )),
        _ => {}
    }

    if reading.phosphorus_mg_per_kg.is_some_and(|p| p < 10.0) {
        improvements.push(improvement(
            "Very Low Phosphorus",
            "Rock Phosphate or Bone Meal",
            "300-400 kg/ha".to_string(),
            "Long-term P availability, especially in acidic soils",
        ));
    }

    if improvements.len() >= 2 {
        improvements.push(improvement(
            "Multiple Soil Health Issues",
            "Green Manure (Dhaincha/Sunhemp)",
            "20-25 kg seed/ha".to_string(),
            "Add organic matter, fix nitrogen, break pest cycles",
        ));
    }

    if improvements.is_empty() {
        improvements.push(improvement(
            "Soil Health Maintenance",
            "Farmyard Manure (FYM)",
            "3-5 tonnes/ha".to_string(),
            "Maintain optimal soil conditions, sustained productivity",
        ));
    }

    improvements
}
