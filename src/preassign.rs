//! Résolution des pré-affectations : noms libres → identités du roster.
//!
//! Un nom complet (insensible à la casse) l'emporte ; sinon on cherche parmi
//! les prénoms. Un prénom partagé ou un nom inconnu laisse le créneau libre
//! pour le solveur et produit un avertissement, jamais une erreur.

use crate::model::{RaId, Roster, SlotKey};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

/// Ligne brute de pré-affectation : un jour et quatre noms optionnels,
/// dans l'ordre de `SlotKey::COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreassignRow {
    pub date: NaiveDate,
    pub slots: [Option<String>; 4],
}

impl PreassignRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            slots: Default::default(),
        }
    }

    pub fn with(mut self, slot: SlotKey, name: &str) -> Self {
        self.slots[slot.column()] = Some(name.to_string());
        self
    }
}

/// Issue de la résolution d'un nom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(RaId),
    Ambiguous(Vec<RaId>),
    Unmatched,
}

/// Avertissements non bloquants : le créneau concerné n'est pas forcé.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    #[error("{date} {slot}: name {name:?} is ambiguous ({} candidates)", .candidates.len())]
    AmbiguousName {
        date: NaiveDate,
        slot: SlotKey,
        name: String,
        candidates: Vec<RaId>,
    },
    #[error("{date} {slot}: unknown name {name:?}")]
    UnknownName {
        date: NaiveDate,
        slot: SlotKey,
        name: String,
    },
    #[error("{date} {slot}: pre-assigned ra_id {ra} is not in the roster")]
    UnresolvedPreassignment {
        date: NaiveDate,
        slot: SlotKey,
        ra: RaId,
    },
    #[error("{date} {slot}: pre-assignment for {ra} falls outside the horizon")]
    OutsideHorizon {
        date: NaiveDate,
        slot: SlotKey,
        ra: RaId,
    },
}

/// Index des noms du roster, en minuscules.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    full: HashMap<String, Vec<RaId>>,
    first: HashMap<String, Vec<RaId>>,
}

impl NameIndex {
    pub fn new(roster: &Roster) -> Self {
        let mut index = Self::default();
        for ra in roster.ras() {
            index
                .full
                .entry(normalize(&ra.name))
                .or_default()
                .push(ra.id.clone());
            index
                .first
                .entry(ra.first_name().to_lowercase())
                .or_default()
                .push(ra.id.clone());
        }
        index
    }

    pub fn resolve(&self, name: &str) -> Resolution {
        let key = normalize(name);
        if key.is_empty() {
            return Resolution::Unmatched;
        }
        if let Some(ids) = self.full.get(&key) {
            return from_candidates(ids);
        }
        match self.first.get(&key) {
            Some(ids) => from_candidates(ids),
            None => Resolution::Unmatched,
        }
    }
}

fn from_candidates(ids: &[RaId]) -> Resolution {
    match ids {
        [] => Resolution::Unmatched,
        [one] => Resolution::Resolved(one.clone()),
        many => Resolution::Ambiguous(many.to_vec()),
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Pré-affectations résolues : (jour, colonne) → RA.
#[derive(Debug, Clone, Default)]
pub struct Preassignments {
    fixes: BTreeMap<(NaiveDate, SlotKey), RaId>,
    warnings: Vec<ResolveWarning>,
}

impl Preassignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construit directement à partir d'identifiants déjà connus.
    pub fn from_fixes<I: IntoIterator<Item = ((NaiveDate, SlotKey), RaId)>>(fixes: I) -> Self {
        Self {
            fixes: fixes.into_iter().collect(),
            warnings: Vec::new(),
        }
    }

    pub fn fixes(&self) -> &BTreeMap<(NaiveDate, SlotKey), RaId> {
        &self.fixes
    }

    pub fn get(&self, date: NaiveDate, slot: SlotKey) -> Option<&RaId> {
        self.fixes.get(&(date, slot))
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Résout toutes les lignes. Doit précéder la construction du modèle.
pub fn resolve_preassignments(roster: &Roster, rows: &[PreassignRow]) -> Preassignments {
    let index = NameIndex::new(roster);
    let mut out = Preassignments::new();

    for row in rows {
        for slot in SlotKey::COLUMNS {
            let Some(name) = row.slots[slot.column()].as_deref() else {
                continue;
            };
            if name.trim().is_empty() {
                continue;
            }
            match index.resolve(name) {
                Resolution::Resolved(id) => {
                    debug!(date = %row.date, %slot, ra = %id, "pre-assignment resolved");
                    if let Some(prev) = out.fixes.insert((row.date, slot), id) {
                        warn!(date = %row.date, %slot, replaced = %prev, "duplicate pre-assignment row, keeping the last one");
                    }
                }
                Resolution::Ambiguous(candidates) => {
                    let w = ResolveWarning::AmbiguousName {
                        date: row.date,
                        slot,
                        name: name.trim().to_string(),
                        candidates,
                    };
                    warn!("{w}");
                    out.warnings.push(w);
                }
                Resolution::Unmatched => {
                    let w = ResolveWarning::UnknownName {
                        date: row.date,
                        slot,
                        name: name.trim().to_string(),
                    };
                    warn!("{w}");
                    out.warnings.push(w);
                }
            }
        }
    }

    out
}
