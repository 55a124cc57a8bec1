use chrono::{Duration, NaiveTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::report::ReportRules;

pub const ENV_BIND: &str = "INTAKE_BIND";
pub const ENV_STORE: &str = "INTAKE_STORE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Month label shown to operators and the worksheet that holds it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSheet {
    pub label: String,
    pub sheet: String,
}

/// Application settings, passed explicitly to the store and the web layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_name: String,
    pub version: String,
    /// Address the web server listens on
    pub bind: String,
    /// Workbook file (gzip + bincode)
    pub store_path: PathBuf,
    /// Fill the first month with sample rows when the workbook is new
    pub seed_demo: bool,
    pub months: Vec<MonthSheet>,
    /// First sheet row that receives pasted data; the header sits just above
    pub start_row: u32,
    /// First-cell text that identifies the header row when reading back
    pub header_marker: String,
    /// Rows at or beyond this index are ignored by reports
    pub max_row: usize,
    pub preview_limit: usize,
    /// `HH:MM:SS`; weigh-out after this is a late intake
    pub late_cutoff: String,
    pub slow_threshold_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            app_name: "Hệ Thống Báo Cáo Nhập Hàng - Kho Nguyên Liệu".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bind: "127.0.0.1:7860".to_string(),
            store_path: PathBuf::from("data/intake.bin.gz"),
            seed_demo: true,
            months: (1..=12)
                .map(|i| MonthSheet {
                    label: format!("Tháng {}", i),
                    sheet: format!("T{}", i),
                })
                .collect(),
            start_row: 7,
            header_marker: "Ngày/tháng".to_string(),
            max_row: 70,
            preview_limit: 20,
            late_cutoff: "17:00:00".to_string(),
            slow_threshold_minutes: 120,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file, then apply environment overrides
    ///
    /// A missing file is not an error: defaults are used. Fields absent from
    /// the file keep their default values.
    ///
    /// # Arguments
    /// * `path` - Optional path to a JSON config file
    ///
    /// # Returns
    /// * `Result<AppConfig, ConfigError>` - Validated configuration
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match File::open(path) {
            Ok(file) => {
                let config = serde_json::from_reader(BufReader::new(file))?;
                info!("Loaded config from {:?}", path);
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config file {:?} not found, using defaults", path);
                Ok(AppConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Override fields from `INTAKE_BIND` / `INTAKE_STORE` as found by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(store) = lookup(ENV_STORE) {
            self.store_path = PathBuf::from(store);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.months.is_empty() {
            return Err(ConfigError::InvalidValue("months must not be empty".into()));
        }
        if self.start_row == 0 {
            return Err(ConfigError::InvalidValue("start_row is 1-based".into()));
        }
        if self.slow_threshold_minutes < 0 {
            return Err(ConfigError::InvalidValue(
                "slow_threshold_minutes must not be negative".into(),
            ));
        }
        self.report_rules().map(|_| ())
    }

    pub fn report_rules(&self) -> Result<ReportRules, ConfigError> {
        let late_cutoff = NaiveTime::parse_from_str(&self.late_cutoff, "%H:%M:%S")
            .map_err(|e| ConfigError::InvalidValue(format!("late_cutoff {:?}: {}", self.late_cutoff, e)))?;
        Ok(ReportRules {
            late_cutoff,
            slow_threshold: Duration::minutes(self.slow_threshold_minutes),
        })
    }

    /// Worksheet for a month label, falling back to the first configured month.
    pub fn sheet_for_month(&self, label: &str) -> &str {
        self.months
            .iter()
            .find(|m| m.label == label)
            .or_else(|| self.months.first())
            .map_or("T1", |m| m.sheet.as_str())
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.months.iter().map(|m| m.sheet.clone()).collect()
    }
}
