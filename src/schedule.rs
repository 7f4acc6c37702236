//! Application timing derived from an allocation
//!
//! Each allocation line is split across three growth stages. The split is a
//! static table keyed by the nutrient the line covers; crop profiles only
//! replace the nitrogen row and the stage wording.

use crate::models::{AllocationLine, ApplicationStage, Nutrient};

pub const STAGE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub name: &'static str,
    pub timing: &'static str,
    pub note: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct CropProfile {
    /// Lowercase substrings matched against the crop name
    pub keywords: &'static [&'static str],
    pub stages: [StageSpec; STAGE_COUNT],
    pub nitrogen_split: [f64; STAGE_COUNT],
}

/// Percent of each line applied per stage, keyed by the nutrient it covers
pub const DEFAULT_SPLIT: [(Nutrient, [f64; STAGE_COUNT]); 3] = [
    (Nutrient::Phosphorus, [100.0, 0.0, 0.0]),
    (Nutrient::Potassium, [100.0, 0.0, 0.0]),
    (Nutrient::Nitrogen, [50.0, 25.0, 25.0]),
];

pub const DEFAULT_STAGES: [StageSpec; STAGE_COUNT] = [
    StageSpec {
        name: "Basal Application",
        timing: "At sowing/planting (Day 0)",
        note: "Apply before or at planting",
    },
    StageSpec {
        name: "First Top Dressing",
        timing: "3-4 weeks after planting",
        note: "Apply during active vegetative growth",
    },
    StageSpec {
        name: "Second Top Dressing",
        timing: "6-7 weeks after planting",
        note: "Apply before flowering/fruiting",
    },
];

pub static CROP_PROFILES: [CropProfile; 7] = [
    CropProfile {
        keywords: &["rice", "paddy"],
        stages: [
            StageSpec {
                name: "Basal (At transplanting)",
                timing: "Day 0",
                note: "Apply 1 day before transplanting",
            },
            StageSpec {
                name: "First Top Dressing",
                timing: "20-25 days after transplanting",
                note: "Apply during active tillering stage",
            },
            StageSpec {
                name: "Second Top Dressing",
                timing: "40-45 days after transplanting",
                note: "Apply before panicle initiation",
            },
        ],
        nitrogen_split: [0.0, 50.0, 50.0],
    },
    CropProfile {
        keywords: &["wheat"],
        stages: [
            StageSpec {
                name: "Basal (At sowing)",
                timing: "Day 0",
                note: "Apply with seed drill or broadcast before sowing",
            },
            StageSpec {
                name: "Crown Root Initiation",
                timing: "21 days after sowing",
                note: "First irrigation + fertilizer application",
            },
            StageSpec {
                name: "Late Jointing/Booting",
                timing: "40-45 days after sowing",
                note: "Second irrigation + final N application",
            },
        ],
        nitrogen_split: [33.0, 33.0, 34.0],
    },
    CropProfile {
        keywords: &["maize", "corn"],
        stages: [
            StageSpec {
                name: "Basal (At sowing)",
                timing: "Day 0",
                note: "Apply 5-7cm below and beside seed",
            },
            StageSpec {
                name: "Knee-High Stage",
                timing: "25-30 days after sowing",
                note: "Side dress before first irrigation",
            },
            StageSpec {
                name: "Pre-Tasseling",
                timing: "45-50 days after sowing",
                note: "Apply before flowering for good cob development",
            },
        ],
        nitrogen_split: [0.0, 50.0, 50.0],
    },
    CropProfile {
        keywords: &["cotton"],
        stages: [
            StageSpec {
                name: "Basal (At sowing)",
                timing: "Day 0",
                note: "Apply in furrows before sowing",
            },
            StageSpec {
                name: "Square Formation",
                timing: "30-35 days after sowing",
                note: "Apply with first irrigation",
            },
            StageSpec {
                name: "Flowering Stage",
                timing: "60-65 days after sowing",
                note: "Apply during peak flowering",
            },
        ],
        nitrogen_split: [25.0, 37.5, 37.5],
    },
    CropProfile {
        keywords: &["sugarcane"],
        stages: [
            StageSpec {
                name: "Basal (At planting)",
                timing: "Day 0",
                note: "Apply in furrows, mix with soil",
            },
            StageSpec {
                name: "Tillering Stage",
                timing: "30-40 days after planting",
                note: "Apply and earthing up",
            },
            StageSpec {
                name: "Grand Growth",
                timing: "90-120 days after planting",
                note: "Apply before rapid cane elongation",
            },
        ],
        nitrogen_split: [0.0, 50.0, 50.0],
    },
    CropProfile {
        keywords: &["potato"],
        stages: [
            StageSpec {
                name: "Basal (At planting)",
                timing: "Day 0",
                note: "Apply in furrows, cover with soil",
            },
            StageSpec {
                name: "Earthing Up",
                timing: "25-30 days after planting",
                note: "Apply and earth up ridges",
            },
            StageSpec {
                name: "Tuber Bulking",
                timing: "45-50 days after planting",
                note: "Final application for tuber development",
            },
        ],
        nitrogen_split: [33.0, 33.0, 34.0],
    },
    CropProfile {
        keywords: &["tomato"],
        stages: [
            StageSpec {
                name: "Basal (Before transplanting)",
                timing: "Day -1",
                note: "Apply and incorporate into beds",
            },
            StageSpec {
                name: "Vegetative Growth",
                timing: "15-20 days after transplanting",
                note: "Apply around plants, avoid stem contact",
            },
            StageSpec {
                name: "Flowering & Fruiting",
                timing: "35-40 days after transplanting",
                note: "Split into 2 applications during fruit development",
            },
        ],
        nitrogen_split: [0.0, 33.0, 67.0],
    },
];

/// Find the crop profile whose keyword appears in `crop` (case-insensitive)
pub fn crop_profile(crop: &str) -> Option<&'static CropProfile> {
    let crop = crop.to_lowercase();
    CROP_PROFILES
        .iter()
        .find(|profile| profile.keywords.iter().any(|k| crop.contains(k)))
}

fn default_split(nutrient: Nutrient) -> [f64; STAGE_COUNT] {
    DEFAULT_SPLIT
        .iter()
        .find(|(n, _)| *n == nutrient)
        .map(|(_, split)| *split)
        .unwrap_or([100.0, 0.0, 0.0])
}

/// Split every allocation line across the growth stages
///
/// Stages with a zero share are left out. Output is ordered by stage, then
/// by the line's position in the allocation.
pub fn build_schedule(allocation: &[AllocationLine], crop: Option<&str>) -> Vec<ApplicationStage> {
    let profile = crop.and_then(crop_profile);
    let stages = profile.map_or(DEFAULT_STAGES, |p| p.stages);

    let mut schedule = Vec::new();
    for (stage_idx, stage) in stages.iter().enumerate() {
        for line in allocation {
            let split = match (line.target, profile) {
                (Nutrient::Nitrogen, Some(p)) => p.nitrogen_split,
                (nutrient, _) => default_split(nutrient),
            };
            let percent = split[stage_idx];
            if percent <= 0.0 {
                continue;
            }
            schedule.push(ApplicationStage {
                stage_name: stage.name.to_string(),
                timing_label: stage.timing.to_string(),
                product_name: line.product.name.clone(),
                quantity_percent: percent,
                quantity_kg: line.quantity_total_kg * percent / 100.0,
                note: stage.note.to_string(),
            });
        }
    }
    schedule
}
