#![forbid(unsafe_code)]
//! Astreinte RA — planification des astreintes d'une équipe de RA (sans BD).
//!
//! - Préférences et pré-affectations en CSV, rapports en JSON.
//! - Modèle à contraintes : couverture, disponibilités, un créneau par jour.
//! - Équité : écarts max − min des charges, week-end compris.
//! - Moteur de résolution interchangeable derrière `solver::SolverBackend`.

pub mod calendar;
pub mod config;
pub mod io;
pub mod model;
pub mod preassign;
pub mod scheduler;
pub mod solver;
pub mod storage;
pub mod survey;

pub use calendar::Horizon;
pub use config::{AreaLabels, SchedulerConfig};
pub use model::{Area, PrefLevel, Ra, RaId, Role, Roster, Shift, SlotKey, WeekdayPrefs};
pub use preassign::{resolve_preassignments, PreassignRow, Preassignments, Resolution, ResolveWarning};
pub use scheduler::{
    LoadCounters, LoadReport, RunReport, SchedError, Schedule, Scheduler, ShiftModel, SolveOptions,
    Violation, ViolationKind,
};
pub use solver::{LpBackend, SolveStatus, SolverBackend};
pub use storage::{JsonReportStorage, ReportStorage};
