use crate::fx::FxTable;
use crate::rate::{period_kpi, ratio_pct, yoy_pct, Currency, PeriodKpi};
use crate::season::{Period, Season};
use crate::types::{
    CategoryStats, ComparisonStats, CurrencyComparison, ItemCostRow, ItemRowKind, LineItem,
    ItemPreviewRow, MarginPreviewRow, MarginRow, RoundedKpi, SeasonSummary, SummaryPreviewRow,
};
use crate::util::{format_int, format_number, round_to};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Reporting order of category groups; anything else follows alphabetically.
pub const CATEGORY_ORDER: [&str; 5] = ["Outer", "Inner", "Bottom", "Acc_etc", "Wear_etc"];

/// Brand codes in the order the item table lists them.
pub const BRAND_ORDER: [&str; 5] = ["M", "I", "X", "ST", "V"];

pub static BRAND_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("M", "MLB"),
        ("I", "MLB KIDS"),
        ("X", "DISCOVERY"),
        ("ST", "SERGIO TACCHINI"),
        ("V", "DUVETICA"),
    ])
});

pub fn brand_name(code: &str) -> &str {
    BRAND_NAMES.get(code).copied().unwrap_or(code)
}

fn category_rank(group: &str) -> usize {
    CATEGORY_ORDER
        .iter()
        .position(|c| *c == group)
        .unwrap_or(CATEGORY_ORDER.len())
}

fn brand_rank(brand: &str) -> usize {
    BRAND_ORDER
        .iter()
        .position(|b| *b == brand)
        .unwrap_or(BRAND_ORDER.len())
}

/// One slice of a brand's file that gets its own summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandSlice {
    pub style_prefix: Option<&'static str>,
    pub file_suffix: &'static str,
}

/// DISCOVERY ships adult (`DX`) and kids (`DK`) styles in one file; they are
/// summarized separately.
pub fn brand_slices(brand: &str) -> Vec<BrandSlice> {
    match brand {
        "X" => vec![
            BrandSlice {
                style_prefix: Some("DX"),
                file_suffix: "",
            },
            BrandSlice {
                style_prefix: Some("DK"),
                file_suffix: "_kids",
            },
        ],
        _ => vec![BrandSlice {
            style_prefix: None,
            file_suffix: "",
        }],
    }
}

impl BrandSlice {
    pub fn select<'a>(&self, items: &'a [LineItem]) -> Vec<&'a LineItem> {
        items
            .iter()
            .filter(|i| match self.style_prefix {
                Some(p) => i.style.trim().to_uppercase().starts_with(p),
                None => true,
            })
            .collect()
    }
}

/// The season pair being compared plus the FX table used to price TAGs in
/// USD.
pub struct PeriodContext<'a> {
    pub brand: &'a str,
    pub current: Season,
    pub previous: Option<Season>,
    pub fx: &'a FxTable,
}

impl<'a> PeriodContext<'a> {
    pub fn new(brand: &'a str, current: Season, fx: &'a FxTable) -> Self {
        PeriodContext {
            brand,
            current,
            previous: current.previous(),
            fx,
        }
    }

    fn season_of(&self, period: Period) -> Option<Season> {
        match period {
            Period::Current => Some(self.current),
            Period::Previous => self.previous,
        }
    }

    /// TAGs of a period are converted at the rate of the season before it
    /// (26S lines use 25S rates, 25S lines use 24S rates).
    pub fn fx_season(&self, period: Period) -> Option<Season> {
        self.season_of(period).map(|s| s.previous().unwrap_or(s))
    }

    pub fn split<'i>(
        &self,
        items: impl IntoIterator<Item = &'i LineItem>,
    ) -> (Vec<&'i LineItem>, Vec<&'i LineItem>) {
        let mut prev = Vec::new();
        let mut curr = Vec::new();
        for item in items {
            match Period::classify(&item.season, self.current, self.previous) {
                Some(Period::Previous) => prev.push(item),
                Some(Period::Current) => curr.push(item),
                None => {}
            }
        }
        (prev, curr)
    }

    pub fn kpi(&self, items: &[&LineItem], period: Period, currency: Currency) -> PeriodKpi {
        let fx_season = self.fx_season(period).map(|s| s.to_string());
        period_kpi(items.iter().copied(), currency, |item| match &fx_season {
            Some(season) => self.fx.rate(self.brand, season, &item.category),
            None => self.fx.fallback(),
        })
    }
}

fn rounded(kpi: &PeriodKpi) -> RoundedKpi {
    let c = &kpi.components;
    let r = &kpi.component_rates;
    RoundedKpi {
        avg_tag: round_to(kpi.avg_tag, 2),
        avg_cost: round_to(kpi.avg_cost, 2),
        cost_rate: round_to(kpi.cost_rate, 1),
        components: [c.material, c.artwork, c.labor, c.margin, c.expense].map(|v| round_to(v, 2)),
        component_rates: [r.material, r.artwork, r.labor, r.margin, r.expense].map(|v| round_to(v, 1)),
    }
}

// Changes and YoY are taken from the rounded figures so they agree with
// what the dashboard displays.
fn compare_currency(prev: &PeriodKpi, curr: &PeriodKpi) -> CurrencyComparison {
    let prev = rounded(prev);
    let curr = rounded(curr);
    CurrencyComparison {
        cost_rate_change: round_to(curr.cost_rate - prev.cost_rate, 1),
        tag_yoy: round_to(yoy_pct(curr.avg_tag, prev.avg_tag), 1),
        cost_yoy: round_to(yoy_pct(curr.avg_cost, prev.avg_cost), 1),
        prev,
        curr,
    }
}

pub fn compare_periods(ctx: &PeriodContext, prev: &[&LineItem], curr: &[&LineItem]) -> ComparisonStats {
    let usd_prev = ctx.kpi(prev, Period::Previous, Currency::Usd);
    let usd_curr = ctx.kpi(curr, Period::Current, Currency::Usd);
    let krw_prev = ctx.kpi(prev, Period::Previous, Currency::Krw);
    let krw_curr = ctx.kpi(curr, Period::Current, Currency::Krw);

    ComparisonStats {
        // Whole units, fractions dropped.
        qty_prev: usd_prev.qty.trunc() as i64,
        qty_curr: usd_curr.qty.trunc() as i64,
        qty_yoy: round_to(yoy_pct(usd_curr.qty, usd_prev.qty), 1),
        usd: compare_currency(&usd_prev, &usd_curr),
        krw: compare_currency(&krw_prev, &krw_curr),
    }
}

/// Groups present in `items`, in reporting order.
fn ordered_groups<'i>(items: impl IntoIterator<Item = &'i LineItem>) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for item in items {
        if !groups.contains(&item.group) {
            groups.push(item.group.clone());
        }
    }
    groups.sort_by(|a, b| category_rank(a).cmp(&category_rank(b)).then_with(|| a.cmp(b)));
    groups
}

/// Total and per-category cost-rate comparison for one brand slice.
pub fn build_summary(items: &[&LineItem], ctx: &PeriodContext) -> SeasonSummary {
    let (prev, curr) = ctx.split(items.iter().copied());
    let total = compare_periods(ctx, &prev, &curr);

    let categories = ordered_groups(prev.iter().chain(curr.iter()).copied())
        .into_iter()
        .map(|group| {
            let p: Vec<&LineItem> = prev.iter().copied().filter(|i| i.group == group).collect();
            let c: Vec<&LineItem> = curr.iter().copied().filter(|i| i.group == group).collect();
            CategoryStats {
                stats: compare_periods(ctx, &p, &c),
                category: group,
            }
        })
        .collect();

    SeasonSummary { total, categories }
}

fn item_row(
    ctx: &PeriodContext,
    kind: ItemRowKind,
    prev: &[&LineItem],
    curr: &[&LineItem],
    brand_tag: (f64, f64),
) -> ItemCostRow {
    let krw_prev = ctx.kpi(prev, Period::Previous, Currency::Krw);
    let krw_curr = ctx.kpi(curr, Period::Current, Currency::Krw);
    ItemCostRow {
        kind,
        brand: ctx.brand.to_string(),
        usd_prev: ctx.kpi(prev, Period::Previous, Currency::Usd),
        usd_curr: ctx.kpi(curr, Period::Current, Currency::Usd),
        share_prev: ratio_pct(krw_prev.tag_amount, brand_tag.0),
        share_curr: ratio_pct(krw_curr.tag_amount, brand_tag.1),
        krw_prev,
        krw_curr,
    }
}

/// Item-level cost rates for one brand: item rows grouped by category, a
/// subtotal after each category and a brand total at the end. Subtotals and
/// totals are recomputed from the underlying lines.
pub fn build_item_table(items: &[LineItem], ctx: &PeriodContext) -> Vec<ItemCostRow> {
    let (prev, curr) = ctx.split(items);
    if prev.is_empty() && curr.is_empty() {
        return Vec::new();
    }
    let tag_amount = |lines: &[&LineItem]| lines.iter().map(|i| i.tag * i.qty).sum::<f64>();
    let brand_tag = (tag_amount(&prev), tag_amount(&curr));

    let mut rows = Vec::new();
    for group in ordered_groups(prev.iter().chain(curr.iter()).copied()) {
        let gp: Vec<&LineItem> = prev.iter().copied().filter(|i| i.group == group).collect();
        let gc: Vec<&LineItem> = curr.iter().copied().filter(|i| i.group == group).collect();

        let mut names: Vec<&str> = gp.iter().chain(gc.iter()).map(|i| i.item.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        for name in names {
            let ip: Vec<&LineItem> = gp.iter().copied().filter(|i| i.item == name).collect();
            let ic: Vec<&LineItem> = gc.iter().copied().filter(|i| i.item == name).collect();
            let kind = ItemRowKind::Item {
                group: group.clone(),
                item: name.to_string(),
            };
            rows.push(item_row(ctx, kind, &ip, &ic, brand_tag));
        }
        rows.push(item_row(ctx, ItemRowKind::Subtotal { group }, &gp, &gc, brand_tag));
    }

    let kind = ItemRowKind::BrandTotal {
        brand_name: brand_name(ctx.brand).to_string(),
    };
    rows.push(item_row(ctx, kind, &prev, &curr, brand_tag));
    rows
}

/// Brand codes as typed on the command line (`x`, ` st `) in the form the
/// files and FX table use.
pub fn normalize_brand(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn brand_order(a: &str, b: &str) -> Ordering {
    brand_rank(a).cmp(&brand_rank(b)).then_with(|| a.cmp(b))
}

/// Item tables of several brands, concatenated in brand order.
pub fn build_item_tables(
    brands: &[(String, Vec<LineItem>)],
    current: Season,
    fx: &FxTable,
) -> Vec<ItemCostRow> {
    let mut order: Vec<&(String, Vec<LineItem>)> = brands.iter().collect();
    order.sort_by(|a, b| brand_order(&a.0, &b.0));
    order
        .into_iter()
        .flat_map(|(brand, items)| build_item_table(items, &PeriodContext::new(brand, current, fx)))
        .collect()
}

const COMPONENT_LABELS: [&str; 6] = ["재료계", "아트웍", "공임", "마진", "경비", "합계"];
const PERIOD_LABELS: [&str; 2] = ["전년", "당년"];

pub fn item_table_headers() -> Vec<String> {
    let mut headers = vec!["중분류".to_string(), "아이템명".to_string(), "브랜드".to_string()];
    for family in ["USD원가율", "USD평균단가", "KRW원가율"] {
        for comp in COMPONENT_LABELS {
            for period in PERIOD_LABELS {
                headers.push(format!("{}_{}_{}", family, comp, period));
            }
        }
    }
    for period in PERIOD_LABELS {
        for col in ["발주비중", "수량", "평균TAG_KRW", "TAG금액"] {
            headers.push(format!("{}_{}", col, period));
        }
    }
    headers
}

fn component_values(kpi: &PeriodKpi, rates: bool) -> [f64; 6] {
    let c = if rates { &kpi.component_rates } else { &kpi.components };
    let total = if rates { kpi.cost_rate } else { kpi.avg_cost };
    [c.material, c.artwork, c.labor, c.margin, c.expense, total]
}

impl ItemCostRow {
    pub fn labels(&self) -> (String, String, String) {
        match &self.kind {
            ItemRowKind::Item { group, item } => (group.clone(), item.clone(), self.brand.clone()),
            ItemRowKind::Subtotal { group } => (group.clone(), "소계".to_string(), self.brand.clone()),
            ItemRowKind::BrandTotal { brand_name } => {
                ("합계".to_string(), brand_name.clone(), self.brand.clone())
            }
        }
    }

    /// Rates at 1 dp, average costs and shares at 2 dp, TAG figures whole.
    pub fn record(&self) -> Vec<String> {
        let (group, item, brand) = self.labels();
        let mut out = vec![group, item, brand];
        let families = [
            (&self.usd_prev, &self.usd_curr, true, 1),
            (&self.usd_prev, &self.usd_curr, false, 2),
            (&self.krw_prev, &self.krw_curr, true, 1),
        ];
        for (prev, curr, rates, dp) in families {
            let p = component_values(prev, rates);
            let c = component_values(curr, rates);
            for i in 0..COMPONENT_LABELS.len() {
                out.push(round_to(p[i], dp).to_string());
                out.push(round_to(c[i], dp).to_string());
            }
        }
        for (kpi, share) in [(&self.krw_prev, self.share_prev), (&self.krw_curr, self.share_curr)] {
            out.push(round_to(share, 2).to_string());
            out.push(round_to(kpi.qty, 0).to_string());
            out.push(round_to(kpi.avg_tag, 0).to_string());
            out.push(round_to(kpi.tag_amount, 0).to_string());
        }
        out
    }

    pub fn preview(&self) -> ItemPreviewRow {
        let (group, item, brand) = self.labels();
        ItemPreviewRow {
            brand,
            label: format!("{} / {}", group, item),
            qty_curr: format_number(self.usd_curr.qty, 0),
            cost_rate_prev: format_number(self.usd_prev.cost_rate, 1),
            cost_rate_curr: format_number(self.usd_curr.cost_rate, 1),
        }
    }
}

pub fn margin_headers(prev: Season, curr: Season, by_vendor: bool) -> Vec<String> {
    let mut headers = vec!["중분류".to_string(), "아이템명".to_string()];
    if by_vendor {
        headers.push("제조업체".to_string());
    }
    headers.push(format!("{}_정상마진율(%)", prev));
    headers.push(format!("{}_정상마진율(%)", curr));
    headers.push("정상마진율_차이(%p)".to_string());
    headers
}

impl MarginRow {
    pub fn record(&self) -> Vec<String> {
        let mut out = vec![self.category.clone(), self.item.clone()];
        if let Some(v) = &self.vendor {
            out.push(v.clone());
        }
        out.push(self.prev_rate.to_string());
        out.push(self.curr_rate.to_string());
        out.push(self.diff.to_string());
        out
    }

    pub fn preview(&self) -> MarginPreviewRow {
        MarginPreviewRow {
            category: self.category.clone(),
            item: match &self.vendor {
                Some(v) => format!("{} ({})", self.item, v),
                None => self.item.clone(),
            },
            prev_rate: format_number(self.prev_rate, 2),
            curr_rate: format_number(self.curr_rate, 2),
            diff: format_number(self.diff, 2),
        }
    }
}

impl SeasonSummary {
    pub fn preview_rows(&self) -> Vec<SummaryPreviewRow> {
        std::iter::once(("TOTAL", &self.total))
            .chain(self.categories.iter().map(|c| (c.category.as_str(), &c.stats)))
            .map(|(name, s)| SummaryPreviewRow {
                category: name.to_string(),
                qty_prev: format_int(s.qty_prev),
                qty_curr: format_int(s.qty_curr),
                cost_rate_prev: format_number(s.usd.prev.cost_rate, 1),
                cost_rate_curr: format_number(s.usd.curr.cost_rate, 1),
                change: format_number(s.usd.cost_rate_change, 1),
            })
            .collect()
    }
}

/// Normal margin relative to the pre-margin cost of a line, in percent.
/// Lines without any pre-margin cost have no rate.
pub fn normal_margin_rate(item: &LineItem) -> Option<f64> {
    let u = &item.usd;
    let base = u.raw + u.sub + u.labor + u.artwork;
    if base > 0.0 {
        Some(u.margin / base * 100.0)
    } else {
        None
    }
}

#[derive(Default)]
struct MarginAcc {
    prev: Vec<f64>,
    curr: Vec<f64>,
}

fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

/// Item label of the per-category subtotal rows in the margin table.
pub const MARGIN_SUBTOTAL: &str = "[소계]";

/// Mean of the rows' rates over rows priced in both seasons; `None` when
/// there is no such row.
fn margin_subtotal(category: &str, rows: &[MarginRow], by_vendor: bool) -> Option<MarginRow> {
    let valid: Vec<&MarginRow> = rows
        .iter()
        .filter(|r| r.prev_rate > 0.0 && r.curr_rate > 0.0)
        .collect();
    let prev = mean(&valid.iter().map(|r| r.prev_rate).collect::<Vec<_>>())?;
    let curr = mean(&valid.iter().map(|r| r.curr_rate).collect::<Vec<_>>())?;
    Some(MarginRow {
        category: category.to_string(),
        item: MARGIN_SUBTOTAL.to_string(),
        vendor: by_vendor.then(String::new),
        prev_rate: round_to(prev, 2),
        curr_rate: round_to(curr, 2),
        diff: round_to(curr - prev, 2),
    })
}

/// Simple (unweighted) mean of the normal margin rate per raw category and
/// item, optionally per vendor, previous season against current season.
/// Each category closes with a subtotal row.
pub fn build_margin_analysis(items: &[LineItem], ctx: &PeriodContext, by_vendor: bool) -> Vec<MarginRow> {
    let mut map: BTreeMap<(String, String, Option<String>), MarginAcc> = BTreeMap::new();
    for item in items {
        let Some(period) = Period::classify(&item.season, ctx.current, ctx.previous) else {
            continue;
        };
        let vendor = by_vendor.then(|| item.vendor.clone());
        let acc = map
            .entry((item.category.clone(), item.item.clone(), vendor))
            .or_default();
        let rate = normal_margin_rate(item);
        match period {
            Period::Previous => acc.prev.extend(rate),
            Period::Current => acc.curr.extend(rate),
        }
    }

    let rows: Vec<MarginRow> = map
        .into_iter()
        .map(|((category, item, vendor), acc)| {
            let prev = mean(&acc.prev);
            let curr = mean(&acc.curr);
            let diff = match (prev, curr) {
                (Some(p), Some(c)) => c - p,
                _ => 0.0,
            };
            MarginRow {
                category,
                item,
                vendor,
                prev_rate: round_to(prev.unwrap_or(0.0), 2),
                curr_rate: round_to(curr.unwrap_or(0.0), 2),
                diff: round_to(diff, 2),
            }
        })
        .collect();

    let mut out = Vec::with_capacity(rows.len());
    let mut start = 0;
    while start < rows.len() {
        let category = rows[start].category.clone();
        let end = rows[start..]
            .iter()
            .position(|r| r.category != category)
            .map_or(rows.len(), |n| start + n);
        out.extend_from_slice(&rows[start..end]);
        out.extend(margin_subtotal(&category, &rows[start..end], by_vendor));
        start = end;
    }
    out
}
