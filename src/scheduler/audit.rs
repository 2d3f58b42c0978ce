use super::extract::Schedule;
use super::{Violation, ViolationKind};
use crate::model::{is_weekend, PrefLevel, Roster, SlotKey};
use crate::preassign::Preassignments;
use chrono::Datelike;
use std::collections::HashMap;

/// Vérifie un planning contre le roster et les pré-affectations.
pub(super) fn audit(schedule: &Schedule, roster: &Roster, fixes: &Preassignments) -> Vec<Violation> {
    let mut out = Vec::new();

    for row in &schedule.rows {
        let mut seen: HashMap<&crate::model::RaId, usize> = HashMap::new();

        for slot in SlotKey::COLUMNS {
            let Some(id) = row.get(slot) else {
                out.push(Violation {
                    date: row.date,
                    slot,
                    ra: None,
                    kind: ViolationKind::Uncovered,
                });
                continue;
            };
            let mut push = |kind| {
                out.push(Violation {
                    date: row.date,
                    slot,
                    ra: Some(id.clone()),
                    kind,
                })
            };

            *seen.entry(id).or_default() += 1;
            if seen[id] == 2 {
                push(ViolationKind::DoubleBooking);
            }

            let Some(ra) = roster.find_by_id(id) else {
                push(ViolationKind::UnknownRa);
                continue;
            };
            if ra.blackout_dates.contains(&row.date) {
                push(ViolationKind::Blackout);
            }
            if is_weekend(row.date) && ra.weekend_unavailable.contains(&row.date) {
                push(ViolationKind::WeekendUnavailable);
            }
            if ra.weekday_prefs.for_weekday(row.date.weekday()) == Some(PrefLevel::NotAvailable) {
                push(ViolationKind::NotAvailable);
            }
        }

        for slot in SlotKey::COLUMNS {
            if let Some(expected) = fixes.get(row.date, slot) {
                if row.get(slot) != Some(expected) && roster.find_by_id(expected).is_some() {
                    out.push(Violation {
                        date: row.date,
                        slot,
                        ra: Some(expected.clone()),
                        kind: ViolationKind::PreassignmentChanged,
                    });
                }
            }
        }
    }

    out
}
