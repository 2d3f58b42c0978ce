use crate::config::AreaLabels;
use crate::model::{PrefLevel, Ra, RaId, Roster, SlotKey, WeekdayPrefs};
use crate::preassign::PreassignRow;
use crate::scheduler::{LoadReport, SchedError, Schedule};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::io::{Read, Write};
use std::path::Path;

/// Ligne du fichier de préférences normalisé.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefsRecord {
    pub ra_id: String,
    pub name: String,
    pub home_area: String,
    pub home_area_pref: String,
    pub block_pref: String,
    #[serde(rename = "Sun")]
    pub sun: String,
    #[serde(rename = "Mon")]
    pub mon: String,
    #[serde(rename = "Tue")]
    pub tue: String,
    #[serde(rename = "Wed")]
    pub wed: String,
    #[serde(rename = "Thu")]
    pub thu: String,
    pub blackout_dates: String,
    pub weekend_unavailable: String,
}

impl PrefsRecord {
    /// Valide la ligne ; toute erreur est fatale pour l'exécution.
    pub fn into_ra(self) -> Result<Ra, SchedError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SchedError::InputValidation("missing name".to_string()));
        }
        let id = if self.ra_id.trim().is_empty() {
            Ra::new(name.clone()).id
        } else {
            RaId::new(self.ra_id.trim())
        };
        let invalid = |field: &str, value: &str| {
            SchedError::InputValidation(format!("{id}: invalid {field} value {value:?}"))
        };
        let level = |field: &str, raw: &str| PrefLevel::parse(raw).ok_or_else(|| invalid(field, raw));

        let block_pref = parse_bool(&self.block_pref).ok_or_else(|| invalid("block_pref", &self.block_pref))?;
        let weekday_prefs = WeekdayPrefs {
            sun: level("Sun", &self.sun)?,
            mon: level("Mon", &self.mon)?,
            tue: level("Tue", &self.tue)?,
            wed: level("Wed", &self.wed)?,
            thu: level("Thu", &self.thu)?,
        };
        let blackout_dates = parse_dates(&self.blackout_dates)
            .ok_or_else(|| invalid("blackout_dates", &self.blackout_dates))?;
        let weekend_unavailable = parse_dates(&self.weekend_unavailable)
            .ok_or_else(|| invalid("weekend_unavailable", &self.weekend_unavailable))?;

        Ok(Ra {
            id,
            name,
            home_area: self.home_area.trim().to_string(),
            home_area_pref: self.home_area_pref.trim().to_string(),
            block_pref,
            weekday_prefs,
            blackout_dates,
            weekend_unavailable,
        })
    }

    pub fn from_ra(ra: &Ra) -> Self {
        let join = |dates: &BTreeSet<NaiveDate>| {
            dates
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(";")
        };
        let p = &ra.weekday_prefs;
        Self {
            ra_id: ra.id.as_str().to_string(),
            name: ra.name.clone(),
            home_area: ra.home_area.clone(),
            home_area_pref: ra.home_area_pref.clone(),
            block_pref: if ra.block_pref { "Yes" } else { "No" }.to_string(),
            sun: p.sun.as_str().to_string(),
            mon: p.mon.as_str().to_string(),
            tue: p.tue.as_str().to_string(),
            wed: p.wed.as_str().to_string(),
            thu: p.thu.as_str().to_string(),
            blackout_dates: join(&ra.blackout_dates),
            weekend_unavailable: join(&ra.weekend_unavailable),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Liste de dates ISO séparées par `;` (vide autorisé).
fn parse_dates(raw: &str) -> Option<BTreeSet<NaiveDate>> {
    raw.split(';')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| NaiveDate::parse_from_str(chunk, "%Y-%m-%d").ok())
        .collect()
}

/// Import des préférences : header `ra_id,name,home_area,home_area_pref,block_pref,Sun,Mon,Tue,Wed,Thu,blackout_dates,weekend_unavailable`
pub fn import_roster_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Roster> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("reading {}", path.display()))?;
    parse_roster_csv(file).with_context(|| format!("loading preferences {}", path.display()))
}

pub fn parse_roster_csv<R: Read>(reader: R) -> anyhow::Result<Roster> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut ras = Vec::new();
    let mut taken = HashSet::new();
    for (line, rec) in rdr.deserialize::<PrefsRecord>().enumerate() {
        let rec = rec.map_err(|e| {
            SchedError::InputValidation(format!("row {}: {e}", line + 1))
        })?;
        let derived = rec.ra_id.trim().is_empty();
        let mut ra = rec.into_ra()?;
        // un id explicite en double reste une erreur (Roster::new)
        if derived {
            ra.id = ra.id.unique_in(&mut taken);
        } else {
            taken.insert(ra.id.clone());
        }
        ras.push(ra);
    }
    Ok(Roster::new(ras)?)
}

/// Export des préférences normalisées (même format que l'import).
pub fn export_prefs_csv<W: Write>(writer: W, records: &[PrefsRecord]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(writer);
    for rec in records {
        w.serialize(rec)?;
    }
    w.flush()?;
    Ok(())
}

/// Import des pré-affectations : header `date,<A1>_primary,<A2>_primary,<A1>_secondary,<A2>_secondary`
pub fn import_preassignments_csv<P: AsRef<Path>>(
    path: P,
    areas: &AreaLabels,
) -> anyhow::Result<Vec<PreassignRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("reading {}", path.display()))?;
    parse_preassignments_csv(file, areas)
        .with_context(|| format!("loading pre-assignments {}", path.display()))
}

pub fn parse_preassignments_csv<R: Read>(
    reader: R,
    areas: &AreaLabels,
) -> anyhow::Result<Vec<PreassignRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let date_col = column(&headers, "date")?;
    let slot_cols = SlotKey::COLUMNS
        .iter()
        .map(|slot| column(&headers, &areas.column(*slot)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let raw = rec.get(date_col).context("missing date")?.trim();
        if raw.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid date: {raw}"))?;
        let mut row = PreassignRow::new(date);
        for (slot, col) in SlotKey::COLUMNS.iter().zip(&slot_cols) {
            let value = rec.get(*col).unwrap_or("").trim();
            if !value.is_empty() {
                row.slots[slot.column()] = Some(value.to_string());
            }
        }
        out.push(row);
    }
    Ok(out)
}

fn column(headers: &StringRecord, name: &str) -> anyhow::Result<usize> {
    match headers.iter().position(|h| h.trim() == name) {
        Some(idx) => Ok(idx),
        None => bail!("missing column {name}"),
    }
}

/// Export CSV du planning : header `date,<A1>_primary,<A2>_primary,<A1>_secondary,<A2>_secondary`,
/// une ligne par jour, prénom du RA dans chaque colonne.
pub fn export_schedule_csv<W: Write>(
    writer: W,
    schedule: &Schedule,
    roster: &Roster,
    areas: &AreaLabels,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    let mut header = vec!["date".to_string()];
    header.extend(SlotKey::COLUMNS.iter().map(|s| areas.column(*s)));
    w.write_record(&header)?;

    for row in &schedule.rows {
        let mut record = vec![row.date.to_string()];
        for slot in SlotKey::COLUMNS {
            let name = row
                .get(slot)
                .and_then(|id| roster.find_by_id(id))
                .map(|ra| ra.first_name())
                .unwrap_or("");
            record.push(name.to_string());
        }
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des compteurs : header `first_name,primaries,secondaries,weekend_primaries,weekend_secondaries`
pub fn export_metrics_csv<W: Write>(writer: W, loads: &LoadReport) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record([
        "first_name",
        "primaries",
        "secondaries",
        "weekend_primaries",
        "weekend_secondaries",
    ])?;
    for load in &loads.per_ra {
        let c = &load.counters;
        w.write_record([
            load.first_name.clone(),
            c.primaries.to_string(),
            c.secondaries.to_string(),
            c.weekend_primaries.to_string(),
            c.weekend_secondaries.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
