use crate::calendar::Horizon;
use crate::model::{Area, SlotKey};
use crate::scheduler::{SchedError, SolveOptions};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Libellés des deux zones, utilisés dans les en-têtes CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaLabels {
    pub area1: String,
    pub area2: String,
}

impl Default for AreaLabels {
    fn default() -> Self {
        Self {
            area1: "NE1".to_string(),
            area2: "NE2".to_string(),
        }
    }
}

impl AreaLabels {
    pub fn label(&self, area: Area) -> &str {
        match area {
            Area::Area1 => &self.area1,
            Area::Area2 => &self.area2,
        }
    }

    /// En-tête de colonne, ex. `NE1_primary`.
    pub fn column(&self, slot: SlotKey) -> String {
        format!("{}_{}", self.label(slot.area()), slot.role().as_str())
    }
}

/// Configuration d'une exécution (fichier JSON optionnel, surchargée par la CLI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub exclude_start: Option<NaiveDate>,
    pub exclude_end: Option<NaiveDate>,
    pub areas: AreaLabels,
    pub time_budget_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 9, 21).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 13).unwrap_or_default(),
            exclude_start: NaiveDate::from_ymd_opt(2025, 11, 24),
            exclude_end: NaiveDate::from_ymd_opt(2025, 11, 30),
            areas: AreaLabels::default(),
            time_budget_secs: 60,
        }
    }
}

impl SchedulerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let cfg: SchedulerConfig = serde_json::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// L'exclusion n'est prise en compte que si ses deux bornes sont données.
    pub fn horizon(&self) -> Result<Horizon, SchedError> {
        let excluded = self.exclude_start.zip(self.exclude_end);
        Horizon::new(self.start, self.end, excluded)
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            time_budget: Duration::from_secs(self.time_budget_secs),
        }
    }
}
