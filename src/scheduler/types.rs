use crate::model::{RaId, SlotKey};
use crate::solver::{SolveStatus, SolverError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Options de résolution
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    pub time_budget: Duration,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    Uncovered,
    DoubleBooking,
    Blackout,
    WeekendUnavailable,
    NotAvailable,
    PreassignmentChanged,
    UnknownRa,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Uncovered => "uncovered",
            ViolationKind::DoubleBooking => "double",
            ViolationKind::Blackout => "blackout",
            ViolationKind::WeekendUnavailable => "weekend",
            ViolationKind::NotAvailable => "not_available",
            ViolationKind::PreassignmentChanged => "preassignment",
            ViolationKind::UnknownRa => "unknown_ra",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub date: NaiveDate,
    pub slot: SlotKey,
    pub ra: Option<RaId>,
    pub kind: ViolationKind,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid horizon: start {start} is after end {end}")]
    InvalidHorizon { start: NaiveDate, end: NaiveDate },
    #[error("invalid input: {0}")]
    InputValidation(String),
    #[error("no feasible schedule ({0})")]
    Infeasible(SolveStatus),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
