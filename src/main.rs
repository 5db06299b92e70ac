// Entry point and high-level CLI flow.
//
// Each subcommand loads the brand files it needs, builds one kind of
// report, writes it next to the raw data and prints a short preview.
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cost_report::config::AppConfig;
use cost_report::loader::{load_seasons, merge_season_files, season_dir};
use cost_report::logging::init_logging;
use cost_report::output::{preview_table_rows, write_json, write_records};
use cost_report::reports::{
    brand_slices, build_item_tables, build_margin_analysis, build_summary, item_table_headers,
    margin_headers, normalize_brand, PeriodContext, BRAND_ORDER,
};
use cost_report::season::Season;
use cost_report::types::LineItem;
use cost_report::util::format_int;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cost_report", version, about = "Cost-rate reports from quotation exports")]
struct Cli {
    /// Config file (defaults to ./cost_report.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding the season folders and brand files.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// FX table (defaults to <root>/FX.csv).
    #[arg(long, global = true)]
    fx: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Season summary JSON per brand, previous season vs current.
    Summary {
        #[arg(long)]
        season: String,
        #[arg(long, num_args = 1.., required = true, value_parser = parse_brand)]
        brand: Vec<String>,
    },
    /// Item-level cost-rate table across brands.
    Items {
        #[arg(long)]
        period: String,
        #[arg(long, num_args = 1.., value_parser = parse_brand)]
        brand: Vec<String>,
    },
    /// Normal margin rate by category and item.
    Margin {
        #[arg(long)]
        season: String,
        #[arg(long, value_parser = parse_brand)]
        brand: String,
        #[arg(long)]
        by_vendor: bool,
    },
    /// Concatenate several season files of one brand.
    Merge {
        #[arg(long, num_args = 1.., required = true)]
        season: Vec<String>,
        #[arg(long, value_parser = parse_brand)]
        brand: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_brand(raw: &str) -> std::result::Result<String, String> {
    let brand = normalize_brand(raw);
    if brand.is_empty() {
        return Err("brand code is empty".to_string());
    }
    Ok(brand)
}

/// Lines of the current season and the one a year earlier.
fn load_pair(cfg: &AppConfig, season: Season, brand: &str) -> Result<Vec<LineItem>> {
    let mut seasons = Vec::with_capacity(2);
    seasons.extend(season.previous());
    seasons.push(season);
    load_seasons(&cfg.data_root, &seasons, brand)
        .with_context(|| format!("loading brand {} around {}", brand, season))
}

fn run_summary(cfg: &AppConfig, season: Season, brands: &[String]) -> Result<usize> {
    let fx = cfg.fx_table().context("loading FX table")?;
    let dir = season_dir(&cfg.data_root, season);
    let mut written = 0;

    for brand in brands {
        let items = match load_pair(cfg, season, brand) {
            Ok(items) => items,
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(brand = %brand, error = %reason, "skipping brand");
                continue;
            }
        };
        let ctx = PeriodContext::new(brand, season, &fx);
        for slice in brand_slices(brand) {
            let selected = slice.select(&items);
            if selected.is_empty() {
                warn!(brand = %brand, suffix = slice.file_suffix, "no lines for brand slice");
                continue;
            }
            let summary = build_summary(&selected, &ctx);
            let file = dir.join(format!(
                "summary_{}_{}{}.json",
                season.long_code().to_lowercase(),
                brand.to_lowercase(),
                slice.file_suffix
            ));
            write_json(&file, &summary).with_context(|| format!("writing {}", file.display()))?;
            info!(path = %file.display(), categories = summary.categories.len(), "summary written");

            println!("Summary {}{} ({})", brand, slice.file_suffix, season.long_code());
            preview_table_rows("Cost rate by category (USD)", &summary.preview_rows(), 10);
            println!("(Full summary exported to {})\n", file.display());
            written += 1;
        }
    }
    Ok(written)
}

fn run_items(cfg: &AppConfig, period: Season, brands: &[String]) -> Result<usize> {
    let fx = cfg.fx_table().context("loading FX table")?;
    let codes: Vec<String> = if brands.is_empty() {
        BRAND_ORDER.iter().map(|b| b.to_string()).collect()
    } else {
        brands.to_vec()
    };

    let mut loaded = Vec::new();
    for brand in codes {
        match load_pair(cfg, period, &brand) {
            Ok(items) => loaded.push((brand, items)),
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(brand = %brand, error = %reason, "skipping brand");
            }
        }
    }

    let rows = build_item_tables(&loaded, period, &fx);
    if rows.is_empty() {
        return Ok(0);
    }
    let file = season_dir(&cfg.data_root, period)
        .join(format!("item_cost_rate_{}.csv", period.long_code()));
    let n = write_records(&file, item_table_headers(), rows.iter().map(|r| r.record()))
        .with_context(|| format!("writing {}", file.display()))?;
    info!(path = %file.display(), rows = %format_int(n), "item table written");

    let preview: Vec<_> = rows.iter().map(|r| r.preview()).collect();
    preview_table_rows("Item cost rates", &preview, 5);
    println!("(Full table exported to {})\n", file.display());
    Ok(1)
}

fn run_margin(cfg: &AppConfig, season: Season, brand: &str, by_vendor: bool) -> Result<usize> {
    let fx = cfg.fx_table().context("loading FX table")?;
    let items = load_pair(cfg, season, brand)?;
    let ctx = PeriodContext::new(brand, season, &fx);
    let rows = build_margin_analysis(&items, &ctx, by_vendor);
    if rows.is_empty() {
        return Ok(0);
    }

    let prev = season.previous().unwrap_or(season);
    let file = season_dir(&cfg.data_root, season).join(format!(
        "margin_rate_{}_{}{}.csv",
        season,
        brand,
        if by_vendor { "_by_vendor" } else { "" }
    ));
    let n = write_records(
        &file,
        margin_headers(prev, season, by_vendor),
        rows.iter().map(|r| r.record()),
    )
    .with_context(|| format!("writing {}", file.display()))?;
    info!(path = %file.display(), rows = %format_int(n), "margin analysis written");

    let preview: Vec<_> = rows.iter().map(|r| r.preview()).collect();
    preview_table_rows("Normal margin rate", &preview, 5);
    println!("(Full table exported to {})\n", file.display());
    Ok(1)
}

fn run_merge(cfg: &AppConfig, seasons: &[Season], brand: &str, out: Option<PathBuf>) -> Result<usize> {
    let (headers, rows) = merge_season_files(&cfg.data_root, seasons, brand)?;
    let file = out.unwrap_or_else(|| cfg.data_root.join(format!("{}_ALL.csv", brand)));
    let n = write_records(&file, &headers, &rows)
        .with_context(|| format!("writing {}", file.display()))?;
    info!(path = %file.display(), rows = %format_int(n), "merged file written");
    println!("Merged {} rows into {}", format_int(n), file.display());
    Ok(1)
}

fn parse_season(raw: &str) -> Result<Season> {
    Season::parse(raw).with_context(|| format!("invalid season {:?}", raw))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cfg.apply_overrides(cli.root, cli.fx);
    init_logging(&cfg.logging);
    info!(root = %cfg.data_root.display(), "starting");

    let written = match cli.command {
        Command::Summary { season, brand } => run_summary(&cfg, parse_season(&season)?, &brand)?,
        Command::Items { period, brand } => run_items(&cfg, parse_season(&period)?, &brand)?,
        Command::Margin {
            season,
            brand,
            by_vendor,
        } => run_margin(&cfg, parse_season(&season)?, &brand, by_vendor)?,
        Command::Merge { season, brand, out } => {
            let seasons = season
                .iter()
                .map(|s| parse_season(s))
                .collect::<Result<Vec<_>>>()?;
            run_merge(&cfg, &seasons, &brand, out)?
        }
    };

    if written == 0 {
        bail!("nothing was written");
    }
    Ok(())
}
