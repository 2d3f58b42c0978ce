mod audit;
mod builder;
mod extract;
mod types;

pub use builder::{CounterKind, ShiftModel};
pub use extract::{LoadCounters, LoadReport, RaLoad, Schedule, ScheduleRow};
pub use types::{SchedError, SolveOptions, Violation, ViolationKind};

use crate::calendar::Horizon;
use crate::model::Roster;
use crate::preassign::{Preassignments, ResolveWarning};
use crate::solver::{Assignment, SolveStatus, SolverBackend};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Résultat d'une exécution réussie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub horizon: Horizon,
    pub status: SolveStatus,
    pub objective: Option<i64>,
    pub schedule: Schedule,
    pub loads: LoadReport,
    #[serde(skip)]
    pub warnings: Vec<ResolveWarning>,
}

/// Scheduler : roster + horizon, construit et résout le modèle d'astreinte.
#[derive(Debug, Clone)]
pub struct Scheduler<'a> {
    roster: &'a Roster,
    horizon: Horizon,
    opts: SolveOptions,
}

impl<'a> Scheduler<'a> {
    pub fn new(roster: &'a Roster, horizon: Horizon) -> Self {
        Self {
            roster,
            horizon,
            opts: SolveOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: SolveOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn roster(&self) -> &Roster {
        self.roster
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    /// Variables, contraintes dures et objectif d'équité.
    pub fn build_model(&self, fixes: &Preassignments) -> ShiftModel {
        builder::build(self.roster, &self.horizon, fixes)
    }

    /// Planning et compteurs lus dans une affectation résolue.
    ///
    /// # Panics
    ///
    /// Si `solution` ne provient pas de `model` (moins de valeurs que de variables).
    pub fn extract(&self, model: &ShiftModel, solution: &Assignment) -> (Schedule, LoadReport) {
        extract::extract(model, self.roster, solution)
    }

    /// Construit, résout dans le budget, puis extrait.
    /// Aucun résultat partiel si le moteur ne trouve pas de solution.
    pub fn run(
        &self,
        backend: &dyn SolverBackend,
        fixes: &Preassignments,
    ) -> Result<RunReport, SchedError> {
        let model = self.build_model(fixes);
        info!(
            backend = backend.name(),
            shifts = model.shifts().len(),
            ras = self.roster.len(),
            budget_s = self.opts.time_budget.as_secs(),
            "solving shift model"
        );

        let outcome = backend.solve(model.model(), self.opts.time_budget)?;
        let solution = match (outcome.status.has_solution(), outcome.solution) {
            (true, Some(solution)) => solution,
            _ => {
                warn!(status = %outcome.status, "no feasible schedule");
                return Err(SchedError::Infeasible(outcome.status));
            }
        };

        let (schedule, loads) = self.extract(&model, &solution);
        info!(status = %outcome.status, objective = ?outcome.objective, "schedule extracted");

        let mut warnings = fixes.warnings().to_vec();
        warnings.extend_from_slice(model.warnings());
        Ok(RunReport {
            horizon: self.horizon,
            status: outcome.status,
            objective: outcome.objective,
            schedule,
            loads,
            warnings,
        })
    }

    /// Détecte les violations d'un planning (couverture, doublons, indisponibilités, pré-affectations).
    pub fn audit(&self, schedule: &Schedule, fixes: &Preassignments) -> Vec<Violation> {
        audit::audit(schedule, self.roster, fixes)
    }
}
