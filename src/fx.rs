// KRW-per-USD exchange rates keyed by brand, season and FX bucket.
use crate::error::{ReportError, Result};
use crate::season::normalize;
use crate::util::parse_f64_safe;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_FALLBACK_RATE: f64 = 1300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FxBucket {
    Apparel,
    Footwear,
    Accessories,
}

impl FxBucket {
    pub fn for_category(category: &str) -> FxBucket {
        match category.trim().to_uppercase().as_str() {
            "SHOES" => FxBucket::Footwear,
            "BAG" | "HEADWEAR" | "ACC_ETC" | "ACC" => FxBucket::Accessories,
            _ => FxBucket::Apparel,
        }
    }

    /// Label used in the `카테고리` column of the FX file.
    pub fn label(&self) -> &'static str {
        match self {
            FxBucket::Apparel => "의류",
            FxBucket::Footwear => "슈즈",
            FxBucket::Accessories => "용품",
        }
    }

    pub fn from_label(label: &str) -> Option<FxBucket> {
        match label.trim() {
            "의류" => Some(FxBucket::Apparel),
            "슈즈" => Some(FxBucket::Footwear),
            "용품" => Some(FxBucket::Accessories),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FxRow {
    #[serde(rename = "브랜드", alias = "\u{feff}브랜드")]
    brand: Option<String>,
    #[serde(rename = "시즌")]
    season: Option<String>,
    #[serde(rename = "카테고리")]
    bucket: Option<String>,
    #[serde(rename = "환율")]
    rate: Option<String>,
}

type FxKey = (String, String, FxBucket);

#[derive(Debug)]
pub struct FxTable {
    rates: HashMap<FxKey, f64>,
    fallback: f64,
    warned: RefCell<HashSet<FxKey>>,
}

impl FxTable {
    pub fn empty(fallback: f64) -> Self {
        FxTable {
            rates: HashMap::new(),
            fallback,
            warned: RefCell::new(HashSet::new()),
        }
    }

    pub fn load(path: &Path, fallback: f64) -> Result<FxTable> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| ReportError::csv(path, e))?;
        let mut table = FxTable::empty(fallback);
        let mut skipped = 0usize;

        for result in rdr.deserialize::<FxRow>() {
            let row = match result {
                Ok(r) => r,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            let parsed = (|| {
                let brand = row.brand.as_deref()?.trim().to_string();
                let season = normalize(row.season.as_deref()?);
                let bucket = FxBucket::from_label(row.bucket.as_deref()?)?;
                let rate = parse_f64_safe(row.rate.as_deref())?;
                Some(((brand, season, bucket), rate))
            })();
            match parsed {
                // First row for a key wins, later duplicates are ignored.
                Some((key, rate)) => {
                    table.rates.entry(key).or_insert(rate);
                }
                None => skipped += 1,
            }
        }

        info!(
            path = %path.display(),
            rates = table.rates.len(),
            skipped,
            "loaded FX table"
        );
        Ok(table)
    }

    pub fn insert(&mut self, brand: &str, season: &str, bucket: FxBucket, rate: f64) {
        self.rates
            .insert((brand.trim().to_string(), normalize(season), bucket), rate);
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    fn positive(&self, key: &FxKey) -> Option<f64> {
        self.rates.get(key).copied().filter(|r| *r > 0.0)
    }

    /// Rate for a brand/season/category. Non-apparel buckets fall back to the
    /// apparel rate of the same brand and season, then to the fixed fallback.
    pub fn rate(&self, brand: &str, season: &str, category: &str) -> f64 {
        let bucket = FxBucket::for_category(category);
        let key = (brand.trim().to_string(), normalize(season), bucket);
        if let Some(rate) = self.positive(&key) {
            return rate;
        }
        if bucket != FxBucket::Apparel {
            let apparel = (key.0.clone(), key.1.clone(), FxBucket::Apparel);
            if let Some(rate) = self.positive(&apparel) {
                return rate;
            }
        }
        if self.warned.borrow_mut().insert(key.clone()) {
            warn!(
                brand = %key.0,
                season = %key.1,
                bucket = key.2.label(),
                fallback = self.fallback,
                "no FX rate found, using fallback"
            );
        }
        self.fallback
    }
}
