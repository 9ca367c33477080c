mod common;

use apu_core::number::{format_number, parse_number, round_to, Category, NumberFormat, Precision};
use apu_core::pricing::{self, breakdown, compute_unit_price, line_total};
use apu_core::project::{ResourceKind, ResourceSet, Settings};
use common::{close, item, line};

fn resources(material_price: f64, labor_qty: f64, equipment_price: f64) -> ResourceSet {
    let mut set = ResourceSet::default();
    set.materials.push(line("Cemento", "kg", 3.0, material_price));
    set.labor.push(line("Oficial", "hr", labor_qty, 18.0));
    set.equipment.push(line("Mezcladora", "hr", 0.2, equipment_price));
    set
}

#[test]
fn empty_resources_price_to_zero() {
    let settings = Settings::default();
    assert_eq!(compute_unit_price(&ResourceSet::default(), &settings), 0.0);
}

#[test]
fn labor_chain_matches_reference_values() {
    let settings = Settings {
        social: 55.0,
        iva_mo: 14.94,
        ..Settings::default()
    };
    let mut set = ResourceSet::default();
    set.labor.push(line("Albañil", "hr", 1.0, 1000.0));
    let b = breakdown(&set, &settings);
    assert!(close(b.social_charges, 550.0));
    assert!(close(b.labor_tax, 231.57));
    assert!(close(b.loaded_labor, 1781.57));
}

#[test]
fn unit_price_is_monotonic_in_each_rate() {
    let set = resources(1.3, 0.4, 25.0);
    let base = Settings::default();
    let base_price = compute_unit_price(&set, &base);
    let bumps: [fn(&mut Settings); 6] = [
        |s| s.social += 5.0,
        |s| s.iva_mo += 5.0,
        |s| s.tools += 5.0,
        |s| s.gg += 5.0,
        |s| s.util += 5.0,
        |s| s.it += 5.0,
    ];
    for bump in bumps {
        let mut raised = base.clone();
        bump(&mut raised);
        assert!(compute_unit_price(&set, &raised) >= base_price);
    }
}

#[test]
fn unit_price_is_monotonic_in_prices_and_quantities() {
    let settings = Settings::default();
    let base = compute_unit_price(&resources(1.3, 0.4, 25.0), &settings);
    assert!(compute_unit_price(&resources(2.0, 0.4, 25.0), &settings) >= base);
    assert!(compute_unit_price(&resources(1.3, 0.9, 25.0), &settings) >= base);
    assert!(compute_unit_price(&resources(1.3, 0.4, 40.0), &settings) >= base);
}

#[test]
fn line_total_uses_rounded_unit_price() {
    let settings = Settings::default();
    let budget_item = item(1, "m", 3.0, vec![line("Clavos", "kg", 1.0, 0.333)]);
    let unit = round_to(
        compute_unit_price(&budget_item.resources, &settings),
        settings.precision.total,
    );
    assert!(close(line_total(&budget_item, &settings), unit * 3.0));
}

#[test]
fn module_and_grand_totals_add_up() {
    let settings = Settings::default();
    let items = vec![
        item(1, "a", 2.0, vec![line("x", "u", 1.0, 10.0)]),
        item(2, "b", 1.0, vec![line("y", "u", 1.0, 7.5)]),
        item(3, "a", 4.0, vec![line("z", "u", 0.5, 3.0)]),
    ];
    let a = pricing::module_total(&items, "a", &settings);
    let b = pricing::module_total(&items, "b", &settings);
    assert!(close(pricing::grand_total(&items, &settings), a + b));
}

#[test]
fn round_half_goes_away_from_zero() {
    assert_eq!(round_to(1.005, 2), 1.01);
    assert_eq!(round_to(-1.005, 2), -1.01);
    assert_eq!(round_to(2.5, 0), 3.0);
}

#[test]
fn parse_of_formatted_total_round_trips() {
    let precision = Precision::default();
    for value in [0.0, 0.01, 12.345, 999.999, 1_234_567.891, 987_654_321.5] {
        let text = format_number(value, Category::Total, &precision, NumberFormat::Intl);
        let parsed = parse_number(&text, NumberFormat::Intl);
        assert!(
            (parsed - value).abs() <= 0.005 + 1e-9,
            "{value} -> {text} -> {parsed}"
        );
    }
}

#[test]
fn resource_kinds_feed_their_own_branch() {
    let settings = Settings {
        social: 0.0,
        iva_mo: 0.0,
        tools: 0.0,
        gg: 0.0,
        util: 0.0,
        it: 0.0,
        ..Settings::default()
    };
    for kind in ResourceKind::ALL {
        let mut set = ResourceSet::default();
        set.lines_mut(kind).push(line("r", "u", 2.0, 3.0));
        assert!(close(compute_unit_price(&set, &settings), 6.0));
    }
}
