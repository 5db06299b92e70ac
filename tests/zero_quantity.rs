use cost_report::rate::{period_kpi, Currency};
use cost_report::types::{LineItem, UnitCosts};
use proptest::prelude::*;

fn line(qty: f64, tag: f64, raw: f64, labor: f64) -> LineItem {
    let costs = UnitCosts {
        raw,
        labor,
        ..UnitCosts::default()
    };
    LineItem {
        qty,
        tag,
        usd: costs,
        krw: costs,
        ..LineItem::default()
    }
}

fn arb_line() -> impl Strategy<Value = LineItem> {
    (1u32..500, 10_000u32..500_000, 0u32..100, 0u32..50)
        .prop_map(|(q, t, r, l)| line(q as f64, t as f64, r as f64, l as f64))
}

proptest! {
    #[test]
    fn zero_quantity_lines_do_not_move_rates(
        lines in prop::collection::vec(arb_line(), 0..20),
        noise in prop::collection::vec((0u32..1_000_000, 0u32..1_000), 0..10),
    ) {
        let mut padded = lines.clone();
        padded.extend(noise.iter().map(|&(t, c)| line(0.0, t as f64, c as f64, c as f64)));

        for currency in [Currency::Usd, Currency::Krw] {
            let a = period_kpi(&lines, currency, |_| 1300.0);
            let b = period_kpi(&padded, currency, |_| 1300.0);
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn cost_rate_is_component_sum(lines in prop::collection::vec(arb_line(), 1..20)) {
        let kpi = period_kpi(&lines, Currency::Krw, |_| 1.0);
        prop_assert!((kpi.component_rates.total() - kpi.cost_rate).abs() < 1e-6);
        prop_assert!(kpi.cost_rate >= 0.0);
    }
}
