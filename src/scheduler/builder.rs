use super::extract::LoadCounters;
use crate::calendar::Horizon;
use crate::model::{RaId, Role, Roster, Shift, SlotKey};
use crate::preassign::{Preassignments, ResolveWarning};
use crate::solver::{Cmp, ConstraintModel, LinearExpr, VarId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use tracing::{debug, warn};

/// Compteur d'équité suivi par RA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Primaries,
    Secondaries,
    WeekendPrimaries,
    WeekendSecondaries,
}

impl CounterKind {
    pub const ALL: [CounterKind; 4] = [
        CounterKind::Primaries,
        CounterKind::Secondaries,
        CounterKind::WeekendPrimaries,
        CounterKind::WeekendSecondaries,
    ];

    fn counts(&self, shift: &Shift) -> bool {
        match self {
            CounterKind::Primaries => shift.role == Role::Primary,
            CounterKind::Secondaries => shift.role == Role::Secondary,
            CounterKind::WeekendPrimaries => shift.role == Role::Primary && shift.is_weekend(),
            CounterKind::WeekendSecondaries => {
                shift.role == Role::Secondary && shift.is_weekend()
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CounterKind::Primaries => "prim",
            CounterKind::Secondaries => "sec",
            CounterKind::WeekendPrimaries => "wprim",
            CounterKind::WeekendSecondaries => "wsec",
        }
    }
}

/// Modèle d'astreinte construit : le modèle neutre plus les index nécessaires
/// à l'extraction.
#[derive(Debug, Clone)]
pub struct ShiftModel {
    model: ConstraintModel,
    shifts: Vec<Shift>,
    days: Vec<(NaiveDate, Range<usize>)>,
    ra_ids: Vec<RaId>,
    assign: Vec<VarId>,
    forced: BTreeMap<usize, usize>,
    seed: Vec<LoadCounters>,
    spreads: Vec<VarId>,
    block_indicators: Vec<VarId>,
    warnings: Vec<ResolveWarning>,
}

impl ShiftModel {
    pub fn model(&self) -> &ConstraintModel {
        &self.model
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn ra_ids(&self) -> &[RaId] {
        &self.ra_ids
    }

    /// Variable « le RA `ra` couvre le créneau `shift` ».
    ///
    /// # Panics
    ///
    /// Si `shift >= shifts().len()` ou `ra >= ra_ids().len()`.
    /// Voir [`ShiftModel::get_assign_var`].
    pub fn assign_var(&self, shift: usize, ra: usize) -> VarId {
        self.assign[shift * self.ra_ids.len() + ra]
    }

    pub fn get_assign_var(&self, shift: usize, ra: usize) -> Option<VarId> {
        if ra >= self.ra_ids.len() {
            return None;
        }
        self.assign.get(shift * self.ra_ids.len() + ra).copied()
    }

    /// Créneaux forcés : index de créneau → index de RA.
    pub fn forced(&self) -> &BTreeMap<usize, usize> {
        &self.forced
    }

    /// Compteurs issus des seules pré-affectations, dans l'ordre du roster.
    pub fn seed_counters(&self) -> &[LoadCounters] {
        &self.seed
    }

    /// Écarts max − min, dans l'ordre de `CounterKind::ALL`.
    pub fn spreads(&self) -> &[VarId] {
        &self.spreads
    }

    pub fn block_indicators(&self) -> &[VarId] {
        &self.block_indicators
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().map(|(d, _)| *d)
    }
}

pub(super) fn build(roster: &Roster, horizon: &Horizon, fixes: &Preassignments) -> ShiftModel {
    let shifts = horizon.shifts();
    let n = roster.len();
    let mut model = ConstraintModel::new();

    // variables de décision : ordre calendrier × ordre roster
    let mut assign = Vec::with_capacity(shifts.len() * n);
    for j in 0..shifts.len() {
        for i in 0..n {
            assign.push(model.new_bool(format!("x_{i}_{j}")));
        }
    }
    let x = |j: usize, i: usize| assign[j * n + i];

    let days = group_days(&shifts);
    let by_slot: HashMap<(NaiveDate, SlotKey), usize> = shifts
        .iter()
        .enumerate()
        .map(|(j, s)| ((s.date, s.slot()), j))
        .collect();

    // forçage des pré-affectations
    let mut forced = BTreeMap::new();
    let mut seed = vec![LoadCounters::default(); n];
    let mut warnings = Vec::new();
    for ((date, slot), ra) in fixes.fixes() {
        let Some(&j) = by_slot.get(&(*date, *slot)) else {
            let w = ResolveWarning::OutsideHorizon {
                date: *date,
                slot: *slot,
                ra: ra.clone(),
            };
            warn!("{w}");
            warnings.push(w);
            continue;
        };
        let Some(target) = roster.index_of(ra) else {
            let w = ResolveWarning::UnresolvedPreassignment {
                date: *date,
                slot: *slot,
                ra: ra.clone(),
            };
            warn!("{w}");
            warnings.push(w);
            continue;
        };
        for i in 0..n {
            model.fix(x(j, i), i64::from(i == target));
        }
        forced.insert(j, target);
        seed[target].record(&shifts[j]);
    }

    // couverture : exactement un RA par créneau
    for j in 0..shifts.len() {
        model.add_linear(LinearExpr::sum((0..n).map(|i| x(j, i))), Cmp::Eq, 1);
    }

    // disponibilités
    for (i, ra) in roster.ras().iter().enumerate() {
        for (j, shift) in shifts.iter().enumerate() {
            if !ra.is_unavailable_on(shift.date) {
                continue;
            }
            match forced.get(&j) {
                // déjà à zéro via le forçage
                Some(&owner) if owner != i => continue,
                Some(_) => warn!(
                    date = %shift.date,
                    slot = %shift.slot(),
                    ra = %ra.id,
                    "pre-assignment contradicts availability; model will be infeasible"
                ),
                None => {}
            }
            model.fix(x(j, i), 0);
        }
    }

    // un créneau par jour au plus
    for i in 0..n {
        for (_, range) in &days {
            model.add_linear(LinearExpr::sum(range.clone().map(|j| x(j, i))), Cmp::Le, 1);
        }
    }

    // équité : écart max − min de chaque compteur
    let upper = shifts.len() as i64;
    let mut objective = LinearExpr::new();
    let mut spreads = Vec::with_capacity(CounterKind::ALL.len());
    for kind in CounterKind::ALL {
        let counters: Vec<VarId> = (0..n)
            .map(|i| {
                let c = model.new_int(format!("{}_{i}", kind.label()), 0, upper);
                let mut expr = LinearExpr::sum(
                    shifts
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| kind.counts(s))
                        .map(|(j, _)| x(j, i)),
                );
                expr.add_term(c, -1);
                model.add_linear(expr, Cmp::Eq, 0);
                c
            })
            .collect();
        let maxv = model.new_int(format!("max_{}", kind.label()), 0, upper);
        let minv = model.new_int(format!("min_{}", kind.label()), 0, upper);
        // bornes suffisantes : l'objectif minimise max − min
        model.add_max_bound(maxv, &counters);
        model.add_min_bound(minv, &counters);
        let spread = model.new_int(format!("spread_{}", kind.label()), 0, upper);
        model.add_linear(
            LinearExpr::from(spread).term(maxv, -1).term(minv, 1),
            Cmp::Eq,
            0,
        );
        objective.add_term(spread, 1);
        spreads.push(spread);
    }

    // Indicateurs de blocs (jours consécutifs) pour les RA qui les préfèrent.
    // Ils sont ajoutés à un objectif minimisé : ils pénalisent donc les jours
    // consécutifs au lieu de les favoriser. Comportement conservé tel quel.
    let mut block_indicators = Vec::new();
    for (i, ra) in roster.ras().iter().enumerate().filter(|(_, r)| r.block_pref) {
        for pair in days.windows(2) {
            let [(d1, r1), (d2, r2)] = pair else {
                continue;
            };
            if d1.succ_opt() != Some(*d2) {
                continue;
            }
            for j1 in r1.clone() {
                for j2 in r2.clone() {
                    let y = model.new_bool(format!("block_{i}_{j1}_{j2}"));
                    model.add_and_indicator(y, vec![x(j1, i), x(j2, i)]);
                    objective.add_term(y, 1);
                    block_indicators.push(y);
                }
            }
        }
        debug!(ra = %ra.id, "block indicators added");
    }

    model.minimise(objective);

    debug!(
        shifts = shifts.len(),
        ras = n,
        vars = model.var_count(),
        constraints = model.constraint_count(),
        forced = forced.len(),
        "constraint model built"
    );

    ShiftModel {
        model,
        shifts,
        days,
        ra_ids: roster.ras().iter().map(|r| r.id.clone()).collect(),
        assign,
        forced,
        seed,
        spreads,
        block_indicators,
        warnings,
    }
}

/// Regroupe les créneaux consécutifs d'un même jour.
fn group_days(shifts: &[Shift]) -> Vec<(NaiveDate, Range<usize>)> {
    let mut days: Vec<(NaiveDate, Range<usize>)> = Vec::new();
    for (j, shift) in shifts.iter().enumerate() {
        match days.last_mut() {
            Some((date, range)) if *date == shift.date => range.end = j + 1,
            _ => days.push((shift.date, j..j + 1)),
        }
    }
    days
}
