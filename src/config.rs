use crate::error::{ReportError, Result};
use crate::fx::{FxTable, DEFAULT_FALLBACK_RATE};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_DATA_ROOT: &str = "public/COST RAW";
pub const DEFAULT_CONFIG_FILE: &str = "cost_report";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_root: PathBuf,
    /// Defaults to `<data_root>/FX.csv`.
    pub fx_file: Option<PathBuf>,
    pub fallback_fx_rate: f64,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            fx_file: None,
            fallback_fx_rate: DEFAULT_FALLBACK_RATE,
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file (`cost_report.toml` unless one is
    /// given; only an explicit file is required to exist), then
    /// `COST_REPORT_*` variables (`COST_REPORT_LOGGING__LEVEL=debug`).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = Config::builder()
            .set_default("data_root", DEFAULT_DATA_ROOT)?
            .set_default("fallback_fx_rate", defaults.fallback_fx_rate)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?;

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("COST_REPORT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// CLI flags win over everything else.
    pub fn apply_overrides(&mut self, data_root: Option<PathBuf>, fx_file: Option<PathBuf>) {
        if let Some(root) = data_root {
            self.data_root = root;
        }
        if let Some(fx) = fx_file {
            self.fx_file = Some(fx);
        }
    }

    pub fn fx_path(&self) -> PathBuf {
        self.fx_file
            .clone()
            .unwrap_or_else(|| self.data_root.join("FX.csv"))
    }

    /// Load the FX table. A file named explicitly must exist; a missing
    /// default `FX.csv` leaves every lookup on the fallback rate.
    pub fn fx_table(&self) -> Result<FxTable> {
        let path = self.fx_path();
        if path.is_file() {
            return FxTable::load(&path, self.fallback_fx_rate);
        }
        if self.fx_file.is_some() {
            return Err(ReportError::MissingInput(format!(
                "FX table {} does not exist",
                path.display()
            )));
        }
        warn!(
            path = %path.display(),
            fallback = self.fallback_fx_rate,
            "FX table not found, using fallback rate"
        );
        Ok(FxTable::empty(self.fallback_fx_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        fs::write(
            &path,
            "data_root = \"/data/cost\"\nfallback_fx_rate = 1350.0\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.data_root, PathBuf::from("/data/cost"));
        assert_eq!(cfg.fallback_fx_rate, 1350.0);
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.fx_path(), PathBuf::from("/data/cost/FX.csv"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn explicit_fx_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(Some(dir.path().to_path_buf()), Some(dir.path().join("missing.csv")));
        assert!(matches!(cfg.fx_table(), Err(ReportError::MissingInput(_))));
    }

    #[test]
    fn missing_default_fx_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.fallback_fx_rate = 1250.0;
        cfg.apply_overrides(Some(dir.path().to_path_buf()), None);

        let fx = cfg.fx_table().unwrap();
        assert_eq!(fx.len(), 0);
        assert_eq!(fx.rate("M", "25F", "Outer"), 1250.0);

        fs::write(dir.path().join("FX.csv"), "브랜드,시즌,카테고리,환율\nM,25F,의류,1400\n").unwrap();
        assert_eq!(cfg.fx_table().unwrap().rate("M", "25F", "Outer"), 1400.0);
    }

    #[test]
    fn cli_overrides_win() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(Some(PathBuf::from("raw")), None);
        assert_eq!(cfg.fx_path(), PathBuf::from("raw/FX.csv"));
        cfg.apply_overrides(None, Some(PathBuf::from("fx.csv")));
        assert_eq!(cfg.fx_path(), PathBuf::from("fx.csv"));
    }
}
