use super::builder::ShiftModel;
use crate::model::{RaId, Role, Roster, Shift, SlotKey};
use crate::solver::Assignment;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Charge d'un RA sur l'horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadCounters {
    pub primaries: u32,
    pub secondaries: u32,
    pub weekend_primaries: u32,
    pub weekend_secondaries: u32,
}

impl LoadCounters {
    /// Comptabilise un créneau tenu (week-end = vendredi/samedi).
    pub fn record(&mut self, shift: &Shift) {
        match shift.role {
            Role::Primary => {
                self.primaries += 1;
                if shift.is_weekend() {
                    self.weekend_primaries += 1;
                }
            }
            Role::Secondary => {
                self.secondaries += 1;
                if shift.is_weekend() {
                    self.weekend_secondaries += 1;
                }
            }
        }
    }
}

impl AddAssign for LoadCounters {
    fn add_assign(&mut self, other: Self) {
        self.primaries += other.primaries;
        self.secondaries += other.secondaries;
        self.weekend_primaries += other.weekend_primaries;
        self.weekend_secondaries += other.weekend_secondaries;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaLoad {
    pub ra_id: RaId,
    pub first_name: String,
    pub counters: LoadCounters,
}

/// Compteurs par RA, dans l'ordre du roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub per_ra: Vec<RaLoad>,
}

impl LoadReport {
    pub fn get(&self, id: &RaId) -> Option<&LoadCounters> {
        self.per_ra
            .iter()
            .find(|l| &l.ra_id == id)
            .map(|l| &l.counters)
    }

    /// Totaux sur tout le roster.
    pub fn totals(&self) -> LoadCounters {
        self.per_ra
            .iter()
            .fold(LoadCounters::default(), |mut acc, l| {
                acc += l.counters;
                acc
            })
    }
}

/// Une ligne du planning : un jour, quatre colonnes (`SlotKey::COLUMNS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub date: NaiveDate,
    pub cells: [Option<RaId>; 4],
}

impl ScheduleRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cells: Default::default(),
        }
    }

    pub fn get(&self, slot: SlotKey) -> Option<&RaId> {
        self.cells[slot.column()].as_ref()
    }

    pub fn set(&mut self, slot: SlotKey, ra: RaId) {
        self.cells[slot.column()] = Some(ra);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn row(&self, date: NaiveDate) -> Option<&ScheduleRow> {
        self.rows.iter().find(|r| r.date == date)
    }

    pub fn assigned(&self, date: NaiveDate, slot: SlotKey) -> Option<&RaId> {
        self.row(date).and_then(|r| r.get(slot))
    }

    /// Créneaux tenus par un RA, ordre chronologique.
    pub fn shifts_of<'a>(&'a self, ra: &'a RaId) -> impl Iterator<Item = (NaiveDate, SlotKey)> + 'a {
        self.rows.iter().flat_map(move |row| {
            SlotKey::COLUMNS
                .into_iter()
                .filter(move |slot| row.get(*slot) == Some(ra))
                .map(move |slot| (row.date, slot))
        })
    }

    pub fn shift_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.iter().filter(|c| c.is_some()).count())
            .sum()
    }
}

/// Lit l'affectation résolue : planning par jour et compteurs par RA.
///
/// Les compteurs partent de ceux des pré-affectations (calculés à la
/// construction du modèle) puis chaque créneau non forcé est ajouté.
/// Fonction pure de `solution` : deux appels donnent le même résultat.
pub(super) fn extract(
    shift_model: &ShiftModel,
    roster: &Roster,
    solution: &Assignment,
) -> (Schedule, LoadReport) {
    let n = shift_model.ra_ids().len();
    let mut counters = shift_model.seed_counters().to_vec();
    let mut schedule = Schedule::default();

    for (j, shift) in shift_model.shifts().iter().enumerate() {
        if schedule.rows.last().map(|r| r.date) != Some(shift.date) {
            schedule.rows.push(ScheduleRow::new(shift.date));
        }
        let Some(i) = (0..n).find(|&i| solution.is_true(shift_model.assign_var(j, i))) else {
            continue;
        };
        if let Some(row) = schedule.rows.last_mut() {
            row.set(shift.slot(), shift_model.ra_ids()[i].clone());
        }
        if !shift_model.forced().contains_key(&j) {
            counters[i].record(shift);
        }
    }

    let per_ra = roster
        .ras()
        .iter()
        .zip(counters)
        .map(|(ra, counters)| RaLoad {
            ra_id: ra.id.clone(),
            first_name: ra.first_name().to_string(),
            counters,
        })
        .collect();

    (schedule, LoadReport { per_ra })
}
