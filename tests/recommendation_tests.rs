// Recommendation engine properties, exercised through the public API.

use approx::assert_relative_eq;
use soil_advisor::catalog::{DAP, MOP, UREA};
use soil_advisor::health::{self, OptimalRange, Severity, SoilParameter, Status};
use soil_advisor::models::Nutrient;
use soil_advisor::{recommend, AdvisorError, Catalog, NutrientDeficit};

const DEFICITS: [(f64, f64, f64); 8] = [
    (40.0, 20.0, 30.0),
    (120.0, 60.0, 40.0),
    (0.0, 25.0, 0.0),
    (5.0, 50.0, 10.0),
    (80.0, 0.0, 0.0),
    (0.0, 0.0, 75.0),
    (0.1, 0.2, 0.3),
    (250.0, 115.0, 90.0),
];

#[test]
fn allocation_always_covers_the_deficit() {
    let catalog = Catalog::standard();
    for (n, p, k) in DEFICITS {
        let deficit = NutrientDeficit::new(n, p, k);
        let result = recommend(&deficit, 1.0, &catalog, None).unwrap();
        for nutrient in Nutrient::ALL {
            let required = deficit.get(nutrient);
            let supplied = result.supplied(nutrient);
            assert!(
                supplied >= required - 1e-9,
                "{:?}: {} supplied {} < required {}",
                (n, p, k),
                nutrient,
                supplied,
                required
            );
        }
    }
}

#[test]
fn greedy_overshoot_is_limited_to_dap_nitrogen() {
    let catalog = Catalog::standard();
    // P and K are matched exactly; N is only exceeded when DAP alone overshoots it
    let result = recommend(&NutrientDeficit::new(5.0, 50.0, 10.0), 1.0, &catalog, None).unwrap();
    assert_relative_eq!(result.supplied(Nutrient::Phosphorus), 50.0, epsilon = 1e-9);
    assert_relative_eq!(result.supplied(Nutrient::Potassium), 10.0, epsilon = 1e-9);
    assert_relative_eq!(result.supplied(Nutrient::Nitrogen), 50.0 / 0.46 * 0.18, epsilon = 1e-9);
    assert!(result.line(UREA).is_none());

    let result = recommend(&NutrientDeficit::new(40.0, 20.0, 30.0), 1.0, &catalog, None).unwrap();
    assert_relative_eq!(result.supplied(Nutrient::Nitrogen), 40.0, epsilon = 1e-9);
}

#[test]
fn zero_deficits_drop_their_products() {
    let catalog = Catalog::standard();

    let no_p = recommend(&NutrientDeficit::new(30.0, 0.0, 20.0), 1.0, &catalog, None).unwrap();
    assert!(no_p.line(DAP).is_none());

    let no_k = recommend(&NutrientDeficit::new(30.0, 20.0, 0.0), 1.0, &catalog, None).unwrap();
    assert!(no_k.line(MOP).is_none());

    let n_from_dap = 20.0 / 0.46 * 0.18;
    let covered = recommend(&NutrientDeficit::new(n_from_dap, 20.0, 0.0), 1.0, &catalog, None).unwrap();
    assert!(covered.line(UREA).is_none());
    assert_eq!(covered.allocation.len(), 1);
}

#[test]
fn blends_are_never_used() {
    let catalog = Catalog::standard();
    for (n, p, k) in DEFICITS {
        let result = recommend(&NutrientDeficit::new(n, p, k), 1.0, &catalog, None).unwrap();
        assert!(result.allocation.iter().all(|l| !l.product.name.starts_with("NPK")));
    }
}

#[test]
fn total_cost_is_sum_of_verified_lines() {
    let mut products = Catalog::standard().products().to_vec();
    for p in &mut products {
        if p.name == UREA {
            p.price_verified = false;
        }
    }
    let catalog = Catalog::new(products);
    let result = recommend(&NutrientDeficit::new(120.0, 60.0, 40.0), 3.0, &catalog, None).unwrap();

    let expected: f64 = result
        .allocation
        .iter()
        .filter(|l| l.price_verified)
        .map(|l| l.cost.unwrap())
        .sum();
    assert_relative_eq!(result.total_cost, expected, epsilon = 1e-9);

    let urea = result.line(UREA).unwrap();
    assert!(urea.cost.is_none());
    assert!(urea.quantity_total_kg > 0.0);
    assert_eq!(result.unverified_products, vec![UREA.to_string()]);
}

#[test]
fn area_scales_totals_not_rates() {
    let catalog = Catalog::standard();
    let deficit = NutrientDeficit::new(120.0, 60.0, 40.0);
    let one = recommend(&deficit, 1.0, &catalog, None).unwrap();
    let many = recommend(&deficit, 2.5, &catalog, None).unwrap();

    assert_eq!(one.allocation.len(), many.allocation.len());
    for (a, b) in one.allocation.iter().zip(&many.allocation) {
        assert_relative_eq!(a.quantity_kg_per_ha, b.quantity_kg_per_ha);
        assert_relative_eq!(b.quantity_total_kg, a.quantity_total_kg * 2.5, epsilon = 1e-9);
        assert_relative_eq!(b.cost.unwrap(), a.cost.unwrap() * 2.5, epsilon = 1e-9);
    }
    assert_relative_eq!(many.total_cost, one.total_cost * 2.5, epsilon = 1e-9);
}

#[test]
fn regional_prices_change_cost_only() {
    let deficit = NutrientDeficit::new(40.0, 20.0, 30.0);
    let national = recommend(&deficit, 1.0, &Catalog::standard(), None).unwrap();
    let kerala = recommend(&deficit, 1.0, &Catalog::for_state("Kerala").unwrap(), None).unwrap();

    for (a, b) in national.allocation.iter().zip(&kerala.allocation) {
        assert_relative_eq!(a.quantity_kg_per_ha, b.quantity_kg_per_ha);
    }
    assert!(kerala.total_cost > national.total_cost);
}

#[test]
fn invalid_input_yields_no_result() {
    let catalog = Catalog::standard();
    let cases = [
        (NutrientDeficit::new(-1.0, 0.0, 0.0), 1.0),
        (NutrientDeficit::new(0.0, 0.0, -5.0), 1.0),
        (NutrientDeficit::new(10.0, 10.0, 10.0), 0.0),
        (NutrientDeficit::new(10.0, 10.0, 10.0), -2.0),
        (NutrientDeficit::new(f64::INFINITY, 0.0, 0.0), 1.0),
    ];
    for (deficit, area) in cases {
        match recommend(&deficit, area, &catalog, None) {
            Err(AdvisorError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput for {:?} / {}, got {:?}", deficit, area, other),
        }
    }
}

#[test]
fn schedule_follows_allocation() {
    let result = recommend(&NutrientDeficit::new(40.0, 20.0, 30.0), 2.0, &Catalog::standard(), None).unwrap();

    let urea_total = result.line(UREA).unwrap().quantity_total_kg;
    let urea_stages: Vec<_> = result.schedule.iter().filter(|s| s.product_name == UREA).collect();
    assert_eq!(urea_stages.len(), 3);
    let percents: Vec<f64> = urea_stages.iter().map(|s| s.quantity_percent).collect();
    assert_eq!(percents, vec![50.0, 25.0, 25.0]);
    let scheduled: f64 = urea_stages.iter().map(|s| s.quantity_kg).sum();
    assert_relative_eq!(scheduled, urea_total, epsilon = 1e-9);

    for name in [DAP, MOP] {
        let stages: Vec<_> = result.schedule.iter().filter(|s| s.product_name == name).collect();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].quantity_percent, 100.0);
        assert_eq!(stages[0].stage_name, "Basal Application");
    }
}

#[test]
fn crop_profile_changes_schedule_only() {
    let catalog = Catalog::standard();
    let deficit = NutrientDeficit::new(40.0, 20.0, 30.0);
    let default = recommend(&deficit, 1.0, &catalog, None).unwrap();
    let cotton = recommend(&deficit, 1.0, &catalog, Some("Cotton")).unwrap();

    assert_eq!(default.allocation, cotton.allocation);
    let urea: Vec<f64> = cotton
        .schedule
        .iter()
        .filter(|s| s.product_name == UREA)
        .map(|s| s.quantity_percent)
        .collect();
    assert_eq!(urea, vec![25.0, 37.5, 37.5]);
}

#[test]
fn result_serializes_to_json() {
    let result = recommend(&NutrientDeficit::new(40.0, 20.0, 30.0), 1.0, &Catalog::standard(), None).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["allocation"].as_array().unwrap().len(), 3);
    assert_eq!(value["allocation"][0]["target"], "Phosphorus");
    assert!(value["schedule"].is_array());
}

#[test]
fn health_score_examples() {
    let range = OptimalRange::new(6.5, 7.5);

    let inside = health::score_parameter(SoilParameter::Ph, 7.0, range).unwrap();
    assert_eq!(inside.score, 100.0);
    assert_eq!(inside.status, Status::Optimal);

    let acidic = health::score_parameter(SoilParameter::Ph, 5.5, range).unwrap();
    assert_relative_eq!(acidic.score, 20.0, epsilon = 1e-9);
    assert_eq!(acidic.status, Status::Low);
    assert_eq!(acidic.severity, Severity::Poor);
}
