use crate::model::{Area, Role, Shift};
use crate::scheduler::SchedError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Horizon de planification : `[start, end]` moins une plage exclue (bornes incluses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    start: NaiveDate,
    end: NaiveDate,
    excluded: Option<(NaiveDate, NaiveDate)>,
}

impl Horizon {
    /// Échoue seulement si `start > end`. Une exclusion inversée n'exclut rien.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        excluded: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Self, SchedError> {
        if start > end {
            return Err(SchedError::InvalidHorizon { start, end });
        }
        Ok(Self { start, end, excluded })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn excluded(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.excluded
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end && !self.is_excluded(date)
    }

    fn is_excluded(&self, date: NaiveDate) -> bool {
        self.excluded
            .map(|(from, to)| from <= date && date <= to)
            .unwrap_or(false)
    }

    /// Jours de l'horizon, ordre croissant. Chaque appel repart du début.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |d| *d <= self.end)
            .filter(move |d| !self.is_excluded(*d))
    }

    /// Univers des créneaux : jour, puis zone, puis rôle.
    /// C'est l'indexation canonique utilisée par le modèle et l'extraction.
    pub fn shifts(&self) -> Vec<Shift> {
        self.dates()
            .flat_map(|date| {
                Area::ALL.into_iter().flat_map(move |area| {
                    Role::ALL
                        .into_iter()
                        .map(move |role| Shift::new(date, area, role))
                })
            })
            .collect()
    }
}
