//! Soil health scoring
//!
//! Every parameter maps a measured value and its optimal range to a 0-100
//! score. Two formulas exist and are kept separate: pH loses a fixed 40
//! points per 0.5 units outside the band, every other parameter loses points
//! in proportion to its relative distance from the range midpoint.

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::models::SoilReading;

const PH_STEP: f64 = 0.5;
const PH_POINTS_PER_STEP: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilParameter {
    Nitrogen,
    Phosphorus,
    Potassium,
    Ph,
    ElectricalConductivity,
    OrganicCarbon,
}

impl SoilParameter {
    pub const ALL: [SoilParameter; 6] = [
        SoilParameter::Nitrogen,
        SoilParameter::Phosphorus,
        SoilParameter::Potassium,
        SoilParameter::Ph,
        SoilParameter::ElectricalConductivity,
        SoilParameter::OrganicCarbon,
    ];

    pub fn unit(self) -> &'static str {
        match self {
            SoilParameter::Nitrogen | SoilParameter::Phosphorus | SoilParameter::Potassium => "mg/kg",
            SoilParameter::Ph => "",
            SoilParameter::ElectricalConductivity => "dS/m",
            SoilParameter::OrganicCarbon => "%",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "n" | "nitrogen" => Some(SoilParameter::Nitrogen),
            "p" | "phosphorus" => Some(SoilParameter::Phosphorus),
            "k" | "potassium" => Some(SoilParameter::Potassium),
            "ph" => Some(SoilParameter::Ph),
            "ec" | "conductivity" => Some(SoilParameter::ElectricalConductivity),
            "oc" | "organic-carbon" | "organic_carbon" => Some(SoilParameter::OrganicCarbon),
            _ => None,
        }
    }

    fn reading(self, reading: &SoilReading) -> Option<f64> {
        match self {
            SoilParameter::Nitrogen => reading.nitrogen_mg_per_kg,
            SoilParameter::Phosphorus => reading.phosphorus_mg_per_kg,
            SoilParameter::Potassium => reading.potassium_mg_per_kg,
            SoilParameter::Ph => reading.ph,
            SoilParameter::ElectricalConductivity => reading.ec_ds_per_m,
            SoilParameter::OrganicCarbon => reading.organic_carbon_pct,
        }
    }
}

impl std::fmt::Display for SoilParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SoilParameter::Nitrogen => "Nitrogen (N)",
            SoilParameter::Phosphorus => "Phosphorus (P)",
            SoilParameter::Potassium => "Potassium (K)",
            SoilParameter::Ph => "pH",
            SoilParameter::ElectricalConductivity => "EC",
            SoilParameter::OrganicCarbon => "Organic Carbon",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalRange {
    pub min: f64,
    pub max: f64,
}

impl OptimalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Distance from `value` to the nearest bound, zero inside the range
    pub fn deviation(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringRule {
    /// 40 points per 0.5 units beyond the band
    PhDecay,
    /// 100 minus the percentage distance from the midpoint
    ProportionalDeviation,
}

/// (parameter, scoring rule, default optimal range)
pub const SCORING_TABLE: [(SoilParameter, ScoringRule, OptimalRange); 6] = [
    (SoilParameter::Nitrogen, ScoringRule::ProportionalDeviation, OptimalRange::new(20.0, 40.0)),
    (SoilParameter::Phosphorus, ScoringRule::ProportionalDeviation, OptimalRange::new(15.0, 35.0)),
    (SoilParameter::Potassium, ScoringRule::ProportionalDeviation, OptimalRange::new(20.0, 35.0)),
    (SoilParameter::Ph, ScoringRule::PhDecay, OptimalRange::new(6.5, 7.5)),
    (SoilParameter::ElectricalConductivity, ScoringRule::ProportionalDeviation, OptimalRange::new(0.0, 2.0)),
    (SoilParameter::OrganicCarbon, ScoringRule::ProportionalDeviation, OptimalRange::new(0.5, 0.75)),
];

fn table_entry(parameter: SoilParameter) -> (ScoringRule, OptimalRange) {
    SCORING_TABLE
        .iter()
        .find(|(p, ..)| *p == parameter)
        .map(|&(_, rule, range)| (rule, range))
        .unwrap_or((ScoringRule::ProportionalDeviation, OptimalRange::new(0.0, 0.0)))
}

pub fn scoring_rule(parameter: SoilParameter) -> ScoringRule {
    table_entry(parameter).0
}

pub fn default_range(parameter: SoilParameter) -> OptimalRange {
    table_entry(parameter).1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Poor,
    Average,
    Optimal,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            Severity::Poor
        } else if score < 75.0 {
            Severity::Average
        } else {
            Severity::Optimal
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Status::Low => "Low",
            Status::Optimal => "Optimal",
            Status::High => "High",
        })
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Severity::Poor => "Poor",
            Severity::Average => "Average",
            Severity::Optimal => "Optimal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub parameter: SoilParameter,
    pub value: f64,
    pub range: OptimalRange,
    pub score: f64,
    pub status: Status,
    pub severity: Severity,
}

/// Raw 0-100 score for `value` under `rule`
pub fn score_value(rule: ScoringRule, value: f64, range: OptimalRange) -> f64 {
    if range.contains(value) {
        return 100.0;
    }
    match rule {
        ScoringRule::PhDecay => {
            let steps = range.deviation(value) / PH_STEP;
            (100.0 - steps * PH_POINTS_PER_STEP).max(0.0)
        }
        ScoringRule::ProportionalDeviation => {
            let mid = range.midpoint();
            if mid <= 0.0 {
                return 0.0;
            }
            (100.0 - ((value - mid).abs() / mid) * 100.0).clamp(0.0, 100.0)
        }
    }
}

/// Score one measured parameter against `range`
pub fn score_parameter(parameter: SoilParameter, value: f64, range: OptimalRange) -> Result<HealthScore> {
    if !value.is_finite() {
        return Err(AdvisorError::InvalidInput(format!("{} value must be a number", parameter)));
    }
    if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
        return Err(AdvisorError::InvalidInput(format!(
            "invalid optimal range [{}, {}] for {}",
            range.min, range.max, parameter
        )));
    }

    let rule = scoring_rule(parameter);
    if rule == ScoringRule::ProportionalDeviation && range.midpoint() <= 0.0 {
        return Err(AdvisorError::InvalidInput(format!(
            "optimal range [{}, {}] for {} needs a positive midpoint",
            range.min, range.max, parameter
        )));
    }

    let score = score_value(rule, value, range);
    let status = if value < range.min {
        Status::Low
    } else if value > range.max {
        Status::High
    } else {
        Status::Optimal
    };

    Ok(HealthScore {
        parameter,
        value,
        range,
        score,
        status,
        severity: Severity::from_score(score),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilHealthReport {
    pub scores: Vec<HealthScore>,
    /// Mean of the parameter scores
    pub overall_score: f64,
    pub overall_severity: Severity,
}

/// Score every parameter present in `reading` against the default ranges
pub fn assess(reading: &SoilReading) -> Result<SoilHealthReport> {
    let mut scores = Vec::new();
    for parameter in SoilParameter::ALL {
        if let Some(value) = parameter.reading(reading) {
            scores.push(score_parameter(parameter, value, default_range(parameter))?);
        }
    }

    if scores.is_empty() {
        return Err(AdvisorError::InvalidInput("soil reading has no values".to_string()));
    }

    let overall_score = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
    Ok(SoilHealthReport {
        scores,
        overall_score,
        overall_severity: Severity::from_score(overall_score),
    })
}

impl std::fmt::Display for SoilHealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Soil Health ===")?;
        writeln!(
            f,
            "{:<16} {:>8} {:<6} {:>13} {:>6}  {:<8} {}",
            "Parameter", "Value", "Unit", "Optimal", "Score", "Status", "Rating"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;
        for s in &self.scores {
            writeln!(
                f,
                "{:<16} {:>8.2} {:<6} {:>6.2}-{:<6.2} {:>6.0}  {:<8} {}",
                s.parameter,
                s.value,
                s.parameter.unit(),
                s.range.min,
                s.range.max,
                s.score,
                s.status,
                s.severity
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Overall: {:.0}/100 ({})", self.overall_score, self.overall_severity)
    }
}
