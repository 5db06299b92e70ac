// Quantity-weighted cost rates.
//
// Every report in the crate goes through `period_kpi`; nothing else divides
// cost by price. All divisions degrade to zero instead of producing NaN.
use crate::types::{LineItem, UnitCosts};

/// Divisor that strips the 10% VAT from a list price.
pub const VAT_DIVISOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Krw,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentCosts {
    pub material: f64,
    pub artwork: f64,
    pub labor: f64,
    pub margin: f64,
    pub expense: f64,
}

impl ComponentCosts {
    pub fn total(&self) -> f64 {
        self.material + self.artwork + self.labor + self.margin + self.expense
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> ComponentCosts {
        ComponentCosts {
            material: f(self.material),
            artwork: f(self.artwork),
            labor: f(self.labor),
            margin: f(self.margin),
            expense: f(self.expense),
        }
    }

    fn from_unit(c: &UnitCosts) -> ComponentCosts {
        ComponentCosts {
            material: c.material(),
            artwork: c.artwork,
            labor: c.labor,
            margin: c.margin,
            expense: c.expense,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodKpi {
    pub qty: f64,
    pub avg_tag: f64,
    pub avg_cost: f64,
    pub cost_rate: f64,
    pub components: ComponentCosts,
    pub component_rates: ComponentCosts,
    /// Σ(TAG × qty) in the computation currency.
    pub tag_amount: f64,
}

/// `a / b`, or zero when `b` is not positive.
pub fn safe_div(a: f64, b: f64) -> f64 {
    if b > 0.0 {
        a / b
    } else {
        0.0
    }
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn ratio_pct(part: f64, whole: f64) -> f64 {
    safe_div(part, whole) * 100.0
}

/// Current over previous as a percentage (100 = flat).
pub fn yoy_pct(curr: f64, prev: f64) -> f64 {
    ratio_pct(curr, prev)
}

/// Σ(value × weight) / Σ(weight).
pub fn weighted_average(pairs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let (sum, weight) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(s, w), (v, q)| (s + v * q, w + q));
    safe_div(sum, weight)
}

/// Cost rates for one period in one currency.
///
/// `tag_rate` gives the KRW-per-USD rate used to convert a line's TAG when
/// `currency` is USD; it is not called for KRW.
pub fn period_kpi<'a, I, F>(items: I, currency: Currency, tag_rate: F) -> PeriodKpi
where
    I: IntoIterator<Item = &'a LineItem>,
    F: Fn(&LineItem) -> f64,
{
    // (components, tag, qty) per line
    let lines: Vec<(ComponentCosts, f64, f64)> = items
        .into_iter()
        .map(|item| {
            let (tag, unit) = match currency {
                Currency::Krw => (item.tag, &item.krw),
                Currency::Usd => (safe_div(item.tag, tag_rate(item)), &item.usd),
            };
            (ComponentCosts::from_unit(unit), tag, item.qty)
        })
        .collect();

    let qty: f64 = lines.iter().map(|(_, _, q)| q).sum();
    let tag_amount: f64 = lines.iter().map(|(_, t, q)| t * q).sum();
    let weighted = |field: fn(&ComponentCosts) -> f64| {
        weighted_average(lines.iter().map(|(c, _, q)| (field(c), *q)))
    };
    let components = ComponentCosts {
        material: weighted(|c| c.material),
        artwork: weighted(|c| c.artwork),
        labor: weighted(|c| c.labor),
        margin: weighted(|c| c.margin),
        expense: weighted(|c| c.expense),
    };
    let avg_tag = weighted_average(lines.iter().map(|(_, t, q)| (*t, *q)));
    let avg_cost = components.total();
    let tag_excl_vat = avg_tag / VAT_DIVISOR;

    PeriodKpi {
        qty,
        avg_tag,
        avg_cost,
        cost_rate: ratio_pct(avg_cost, tag_excl_vat),
        components,
        component_rates: components.map(|c| ratio_pct(c, tag_excl_vat)),
        tag_amount,
    }
}
