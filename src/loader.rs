use crate::error::{ReportError, Result};
use crate::season::Season;
use crate::types::{LineItem, LoadReport, RawRow, UnitCosts};
use crate::util::{format_int, parse_date_safe, parse_f64_or_zero};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ACC_GROUP: &str = "Acc_etc";

/// Collapse footwear and accessory categories into one reporting group.
pub fn group_for_category(category: &str) -> String {
    let trimmed = category.trim();
    match trimmed.to_uppercase().as_str() {
        "" | "SHOES" | "BAG" | "HEADWEAR" | "ACC_ETC" | "ACC" => ACC_GROUP.to_string(),
        _ => trimmed.to_string(),
    }
}

fn text(v: Option<String>) -> String {
    v.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn costs(fields: [&Option<String>; 8]) -> UnitCosts {
    let [raw, artwork, sub, tag_label, labor, hq_supply, margin, expense] =
        fields.map(|f| parse_f64_or_zero(f.as_deref()));
    UnitCosts {
        raw,
        artwork,
        sub,
        tag_label,
        labor,
        hq_supply,
        margin,
        expense,
    }
}

pub fn clean_row(row: RawRow) -> LineItem {
    let usd = costs([
        &row.usd_raw,
        &row.usd_artwork,
        &row.usd_sub,
        &row.usd_tag_label,
        &row.usd_labor,
        &row.usd_hq_supply,
        &row.usd_margin,
        &row.usd_expense,
    ]);
    let krw = costs([
        &row.krw_raw,
        &row.krw_artwork,
        &row.krw_sub,
        &row.krw_tag_label,
        &row.krw_labor,
        &row.krw_hq_supply,
        &row.krw_margin,
        &row.krw_expense,
    ]);
    let tag = parse_f64_or_zero(row.tag.as_deref());
    let qty = parse_f64_or_zero(row.qty.as_deref());
    let quoted_on = parse_date_safe(row.quoted_on.as_deref());
    let category = text(row.category);

    LineItem {
        brand: text(row.brand),
        season: text(row.season),
        style: text(row.style),
        group: group_for_category(&category),
        category,
        item: text(row.item),
        vendor: text(row.vendor),
        quoted_on,
        tag,
        qty,
        usd,
        krw,
    }
}

pub fn load_items(path: &Path) -> Result<(Vec<LineItem>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReportError::csv(path, e))?;
    let mut report = LoadReport::default();
    let mut items = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable row");
                report.parse_errors += 1;
                continue;
            }
        };
        let item = clean_row(row);
        if item.qty == 0.0 {
            report.zero_qty_rows += 1;
        }
        if let Some(d) = item.quoted_on {
            report.latest_quotation = Some(report.latest_quotation.map_or(d, |cur| cur.max(d)));
        }
        items.push(item);
    }

    info!(
        path = %path.display(),
        rows = %format_int(items.len()),
        parse_errors = report.parse_errors,
        zero_qty = report.zero_qty_rows,
        latest_quotation = ?report.latest_quotation,
        "loaded cost lines"
    );
    Ok((items, report))
}

/// Locate `<brand>_<season>.csv` under the data root, trying each season
/// folder spelling and finally the root itself.
pub fn resolve_brand_file(root: &Path, season: Season, brand: &str) -> Option<PathBuf> {
    let files = season.file_candidates(brand);
    let mut dirs: Vec<PathBuf> = season
        .folder_candidates()
        .into_iter()
        .map(|f| root.join(f))
        .collect();
    dirs.push(root.to_path_buf());

    dirs.iter()
        .flat_map(|dir| files.iter().map(move |f| dir.join(f)))
        .find(|p| p.is_file())
}

/// Folder that outputs for `season` are written to: the first existing
/// candidate, otherwise the long spelling.
pub fn season_dir(root: &Path, season: Season) -> PathBuf {
    season
        .folder_candidates()
        .into_iter()
        .map(|f| root.join(f))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| root.join(season.long_code()))
}

/// Load several seasons of one brand into a single list. Missing seasons are
/// skipped with a warning; finding none at all is an error.
pub fn load_seasons(root: &Path, seasons: &[Season], brand: &str) -> Result<Vec<LineItem>> {
    let mut items = Vec::new();
    let mut found = 0;
    for season in seasons {
        match resolve_brand_file(root, *season, brand) {
            Some(path) => {
                items.extend(load_items(&path)?.0);
                found += 1;
            }
            None => warn!(brand, season = %season, "cost file missing, skipping"),
        }
    }
    if found == 0 {
        return Err(ReportError::NoData(format!(
            "no cost files found for brand {}",
            brand
        )));
    }
    Ok(items)
}

/// Concatenate the raw exports of several seasons for one brand, keeping
/// every column of the first file found. Columns are matched by header name
/// so files with a different column order still line up; missing seasons
/// are skipped.
pub fn merge_season_files(
    root: &Path,
    seasons: &[Season],
    brand: &str,
) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut headers: Option<StringRecord> = None;
    let mut rows = Vec::new();

    for season in seasons {
        let Some(path) = resolve_brand_file(root, *season, brand) else {
            warn!(brand, season = %season, "cost file missing, skipping");
            continue;
        };
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| ReportError::csv(&path, e))?;
        let file_headers = clean_headers(rdr.headers().map_err(|e| ReportError::csv(&path, e))?);
        let out_headers = headers.get_or_insert_with(|| file_headers.clone());
        let mapping: Vec<Option<usize>> = out_headers
            .iter()
            .map(|h| file_headers.iter().position(|fh| fh == h))
            .collect();

        let before = rows.len();
        for record in rdr.records() {
            let record = record.map_err(|e| ReportError::csv(&path, e))?;
            let merged: StringRecord = mapping
                .iter()
                .map(|idx| idx.and_then(|i| record.get(i)).unwrap_or(""))
                .collect();
            rows.push(merged);
        }
        info!(path = %path.display(), rows = rows.len() - before, "merged season file");
    }

    match headers {
        Some(h) => Ok((h, rows)),
        None => Err(ReportError::NoData(format!(
            "no cost files found for brand {}",
            brand
        ))),
    }
}

fn clean_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "브랜드,시즌,스타일,중분류,아이템명,PO,TAG,수량,원가견적번호,발주통화,제조업체,견적서제출일자,(USD)_원자재,(USD)_아트웍,(USD)_부자재,(USD)_택/라벨,(USD) 공임,(USD)본사공급자재,(USD)_정상마진,(USD)_경비";

    #[test]
    fn groups_accessories() {
        assert_eq!(group_for_category("Shoes"), "Acc_etc");
        assert_eq!(group_for_category(" BAG "), "Acc_etc");
        assert_eq!(group_for_category(""), "Acc_etc");
        assert_eq!(group_for_category(" Outer "), "Outer");
    }

    #[test]
    fn loads_and_cleans_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("M_25F.csv");
        let body = format!(
            "{}\nM,25F,3AJPB,Shoes,Sneakers,P1,\"129,000\",\" 1,000 \",Q1,usd,ACME,2025-02-01,5,1,2,0.5,3,0,1.5,0.25\nM,24F,3AJPC,Outer,Down,P2,299000,abc,Q2,KRW,ACME,,,,,,,,,\n",
            HEADER
        );
        fs::write(&path, body).unwrap();

        let (items, report) = load_items(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(report.zero_qty_rows, 1);
        assert_eq!(
            report.latest_quotation,
            chrono::NaiveDate::from_ymd_opt(2025, 2, 1)
        );

        let first = &items[0];
        assert_eq!(first.tag, 129_000.0);
        assert_eq!(first.qty, 1000.0);
        assert_eq!(first.category, "Shoes");
        assert_eq!(first.group, "Acc_etc");
        assert_eq!(first.usd.material(), 5.0 + 2.0 + 0.5);
        assert_eq!(first.usd.labor, 3.0);
        // KRW columns are absent from this file.
        assert_eq!(first.krw, UnitCosts::default());
    }

    #[test]
    fn resolves_folder_spellings() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("25S")).unwrap();
        fs::write(root.join("25S").join("M_25SS.csv"), HEADER).unwrap();
        fs::write(root.join("I_24F.csv"), HEADER).unwrap();

        let spring = Season::parse("25SS").unwrap();
        assert_eq!(
            resolve_brand_file(root, spring, "M"),
            Some(root.join("25S").join("M_25SS.csv"))
        );
        let fall = Season::parse("24F").unwrap();
        assert_eq!(resolve_brand_file(root, fall, "I"), Some(root.join("I_24F.csv")));
        assert_eq!(resolve_brand_file(root, fall, "X"), None);
        assert_eq!(season_dir(root, spring), root.join("25S"));
        assert_eq!(season_dir(root, fall), root.join("24FW"));
    }

    #[test]
    fn loads_available_seasons_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let row = ",,,,,,,,,,,,,,,,,,";
        fs::write(root.join("M_25F.csv"), format!("{}\nM,25F,S1,Outer,Down,P,1000,2{}\n", HEADER, &row[..12])).unwrap();
        fs::write(root.join("M_24F.csv"), format!("{}\nM,24F,S2,Outer,Down,P,1000,3{}\n", HEADER, &row[..12])).unwrap();
        let seasons = [Season::parse("24F").unwrap(), Season::parse("25F").unwrap(), Season::parse("23F").unwrap()];

        let items = load_seasons(root, &seasons, "M").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].season, "24F");
        assert_eq!(items[1].qty, 2.0);
        assert!(load_seasons(root, &seasons, "I").is_err());
    }

    #[test]
    fn merge_aligns_columns_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("M_24S.csv"), "브랜드,시즌,수량\nM,24S,10\n").unwrap();
        fs::write(root.join("M_25S.csv"), "시즌,브랜드,수량,기타\n25S,M,20,x\n").unwrap();
        let seasons = [
            Season::parse("24S").unwrap(),
            Season::parse("25S").unwrap(),
            Season::parse("26S").unwrap(),
        ];

        let (headers, rows) = merge_season_files(root, &seasons, "M").unwrap();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["브랜드", "시즌", "수량"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].iter().collect::<Vec<_>>(), vec!["M", "25S", "20"]);

        assert!(merge_season_files(root, &seasons, "V").is_err());
    }
}
