use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::rate::PeriodKpi;

/// One line of a `<brand>_<season>.csv` export, exactly as written by the
/// warehouse extract. Every field is optional text; cleaning happens in
/// the loader.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRow {
    #[serde(rename = "브랜드", alias = "\u{feff}브랜드")]
    pub brand: Option<String>,
    #[serde(rename = "시즌")]
    pub season: Option<String>,
    #[serde(rename = "스타일")]
    pub style: Option<String>,
    #[serde(rename = "중분류")]
    pub category: Option<String>,
    #[serde(rename = "아이템명")]
    pub item: Option<String>,
    #[serde(rename = "TAG")]
    pub tag: Option<String>,
    #[serde(rename = "수량")]
    pub qty: Option<String>,
    #[serde(rename = "제조업체")]
    pub vendor: Option<String>,
    #[serde(rename = "견적서제출일자")]
    pub quoted_on: Option<String>,

    #[serde(rename = "(USD)_원자재")]
    pub usd_raw: Option<String>,
    #[serde(rename = "(USD)_아트웍")]
    pub usd_artwork: Option<String>,
    #[serde(rename = "(USD)_부자재")]
    pub usd_sub: Option<String>,
    #[serde(rename = "(USD)_택/라벨")]
    pub usd_tag_label: Option<String>,
    #[serde(rename = "(USD) 공임", alias = "(USD)_공임")]
    pub usd_labor: Option<String>,
    #[serde(rename = "(USD)본사공급자재", alias = "(USD)_본사공급자재")]
    pub usd_hq_supply: Option<String>,
    #[serde(rename = "(USD)_정상마진")]
    pub usd_margin: Option<String>,
    #[serde(rename = "(USD)_경비", alias = "(USD)_기타마진/경비")]
    pub usd_expense: Option<String>,

    #[serde(rename = "(KRW)_원자재")]
    pub krw_raw: Option<String>,
    #[serde(rename = "(KRW)_아트웍")]
    pub krw_artwork: Option<String>,
    #[serde(rename = "(KRW)_부자재")]
    pub krw_sub: Option<String>,
    #[serde(rename = "(KRW)_택/라벨")]
    pub krw_tag_label: Option<String>,
    #[serde(rename = "(KRW)_공임", alias = "(KRW) 공임")]
    pub krw_labor: Option<String>,
    #[serde(rename = "(KRW)본사공급자재", alias = "(KRW)_본사공급자재")]
    pub krw_hq_supply: Option<String>,
    #[serde(rename = "(KRW)_정상마진")]
    pub krw_margin: Option<String>,
    #[serde(rename = "(KRW)_경비", alias = "(KRW)_기타마진/경비")]
    pub krw_expense: Option<String>,
}

/// Unit costs of one line in a single currency, split the way the quotation
/// sheet splits them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnitCosts {
    pub raw: f64,
    pub artwork: f64,
    pub sub: f64,
    pub tag_label: f64,
    pub labor: f64,
    pub hq_supply: f64,
    pub margin: f64,
    pub expense: f64,
}

impl UnitCosts {
    /// Raw + sub materials + tag/label + HQ-supplied material. Artwork is
    /// tracked separately and never part of material.
    pub fn material(&self) -> f64 {
        self.raw + self.sub + self.tag_label + self.hq_supply
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineItem {
    pub brand: String,
    /// Season text as exported (`25F`, `25FW`, ...).
    pub season: String,
    pub style: String,
    /// Category as exported; drives the FX bucket.
    pub category: String,
    /// Reporting group derived from `category` (footwear and accessories
    /// collapse into `Acc_etc`).
    pub group: String,
    pub item: String,
    pub vendor: String,
    pub quoted_on: Option<NaiveDate>,
    /// List price in KRW.
    pub tag: f64,
    pub qty: f64,
    pub usd: UnitCosts,
    pub krw: UnitCosts,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub zero_qty_rows: usize,
    pub latest_quotation: Option<NaiveDate>,
}

/// Previous-vs-current comparison as written to `summary_*.json`. Key names
/// are fixed by the dashboard: `24F` is always the previous period and
/// `25F` the current one, whatever the seasons actually are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonStats {
    pub qty_prev: i64,
    pub qty_curr: i64,
    pub qty_yoy: f64,
    pub usd: CurrencyComparison,
    pub krw: CurrencyComparison,
}

/// Rounded KPI pair for one currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyComparison {
    pub prev: RoundedKpi,
    pub curr: RoundedKpi,
    pub cost_rate_change: f64,
    pub tag_yoy: f64,
    pub cost_yoy: f64,
}

/// Money at 2 dp, percentages at 1 dp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundedKpi {
    pub avg_tag: f64,
    pub avg_cost: f64,
    pub cost_rate: f64,
    /// material, artwork, labor, margin, expense
    pub components: [f64; 5],
    pub component_rates: [f64; 5],
}

const COMPONENT_KEYS: [&str; 5] = ["material", "artwork", "labor", "margin", "expense"];

impl CurrencyComparison {
    fn write_entries<M: SerializeMap>(&self, map: &mut M, suffix: &str, detailed: bool) -> Result<(), M::Error> {
        map.serialize_entry(&format!("costRate24F_{}", suffix), &self.prev.cost_rate)?;
        map.serialize_entry(&format!("costRate25F_{}", suffix), &self.curr.cost_rate)?;
        map.serialize_entry(&format!("costRateChange_{}", suffix), &self.cost_rate_change)?;
        map.serialize_entry(&format!("avgTag24F_{}", suffix), &self.prev.avg_tag)?;
        map.serialize_entry(&format!("avgTag25F_{}", suffix), &self.curr.avg_tag)?;
        map.serialize_entry(&format!("tagYoY_{}", suffix), &self.tag_yoy)?;
        map.serialize_entry(&format!("avgCost24F_{}", suffix), &self.prev.avg_cost)?;
        map.serialize_entry(&format!("avgCost25F_{}", suffix), &self.curr.avg_cost)?;
        map.serialize_entry(&format!("costYoY_{}", suffix), &self.cost_yoy)?;
        if !detailed {
            return Ok(());
        }
        for (i, key) in COMPONENT_KEYS.iter().enumerate() {
            map.serialize_entry(&format!("{}24F_{}", key, suffix), &self.prev.components[i])?;
            map.serialize_entry(&format!("{}25F_{}", key, suffix), &self.curr.components[i])?;
        }
        for (i, key) in COMPONENT_KEYS.iter().enumerate() {
            map.serialize_entry(&format!("{}Rate24F_{}", key, suffix), &self.prev.component_rates[i])?;
            map.serialize_entry(&format!("{}Rate25F_{}", key, suffix), &self.curr.component_rates[i])?;
        }
        Ok(())
    }
}

// The dashboard only reads the component breakdown for USD.
impl Serialize for ComparisonStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("qty24F", &self.qty_prev)?;
        map.serialize_entry("qty25F", &self.qty_curr)?;
        map.serialize_entry("qtyYoY", &self.qty_yoy)?;
        self.usd.write_entries(&mut map, "usd", true)?;
        self.krw.write_entries(&mut map, "krw", false)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    #[serde(flatten)]
    pub stats: ComparisonStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub total: ComparisonStats,
    pub categories: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SummaryPreviewRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "QtyPrev")]
    pub qty_prev: String,
    #[tabled(rename = "QtyCurr")]
    pub qty_curr: String,
    #[tabled(rename = "CostRatePrev(USD)")]
    pub cost_rate_prev: String,
    #[tabled(rename = "CostRateCurr(USD)")]
    pub cost_rate_curr: String,
    #[tabled(rename = "Change(%p)")]
    pub change: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemRowKind {
    Item { group: String, item: String },
    Subtotal { group: String },
    BrandTotal { brand_name: String },
}

#[derive(Debug, Clone)]
pub struct ItemCostRow {
    pub kind: ItemRowKind,
    pub brand: String,
    pub usd_prev: PeriodKpi,
    pub usd_curr: PeriodKpi,
    pub krw_prev: PeriodKpi,
    pub krw_curr: PeriodKpi,
    pub share_prev: f64,
    pub share_curr: f64,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ItemPreviewRow {
    #[tabled(rename = "Brand")]
    pub brand: String,
    #[tabled(rename = "Row")]
    pub label: String,
    #[tabled(rename = "QtyCurr")]
    pub qty_curr: String,
    #[tabled(rename = "CostRatePrev(USD)")]
    pub cost_rate_prev: String,
    #[tabled(rename = "CostRateCurr(USD)")]
    pub cost_rate_curr: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginRow {
    pub category: String,
    pub item: String,
    pub vendor: Option<String>,
    pub prev_rate: f64,
    pub curr_rate: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MarginPreviewRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Item")]
    pub item: String,
    #[tabled(rename = "Prev(%)")]
    pub prev_rate: String,
    #[tabled(rename = "Curr(%)")]
    pub curr_rate: String,
    #[tabled(rename = "Diff(%p)")]
    pub diff: String,
}
