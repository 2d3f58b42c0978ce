//! Interface neutre entre le modèle d'astreinte et un moteur de résolution.
//!
//! Le constructeur de modèle ne connaît que [`ConstraintModel`] ; n'importe quel
//! moteur (PLNE, CP-SAT, ...) peut être branché via [`SolverBackend`].

mod lp;

pub use lp::LpBackend;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Index d'une variable dans un [`ConstraintModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Bool,
    Int { lo: i64, hi: i64 },
}

impl VarKind {
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            VarKind::Bool => (0, 1),
            VarKind::Int { lo, hi } => (lo, hi),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub kind: VarKind,
}

/// Expression linéaire entière `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
            constant: 0,
        }
    }

    pub fn term(mut self, var: VarId, coef: i64) -> Self {
        self.terms.push((var, coef));
        self
    }

    pub fn add_term(&mut self, var: VarId, coef: i64) {
        self.terms.push((var, coef));
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Évalue l'expression pour une affectation donnée.
    pub fn eval(&self, values: &Assignment) -> i64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.value(*v))
            .sum::<i64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::sum([var])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Le,
    Ge,
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cmp::Eq => "==",
            Cmp::Le => "<=",
            Cmp::Ge => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `expr cmp rhs`
    Linear { expr: LinearExpr, cmp: Cmp, rhs: i64 },
    /// `target <=> AND(inputs)`
    AndIndicator { target: VarId, inputs: Vec<VarId> },
}

impl Constraint {
    /// Vrai si l'affectation respecte la contrainte.
    pub fn is_satisfied(&self, values: &Assignment) -> bool {
        match self {
            Constraint::Linear { expr, cmp, rhs } => {
                let lhs = expr.eval(values);
                match cmp {
                    Cmp::Eq => lhs == *rhs,
                    Cmp::Le => lhs <= *rhs,
                    Cmp::Ge => lhs >= *rhs,
                }
            }
            Constraint::AndIndicator { target, inputs } => {
                values.is_true(*target) == inputs.iter().all(|v| values.is_true(*v))
            }
        }
    }
}

/// Modèle à contraintes, indépendant du moteur.
#[derive(Debug, Clone, Default)]
pub struct ConstraintModel {
    vars: Vec<VarDecl>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl ConstraintModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool<S: Into<String>>(&mut self, name: S) -> VarId {
        self.push_var(name.into(), VarKind::Bool)
    }

    pub fn new_int<S: Into<String>>(&mut self, name: S, lo: i64, hi: i64) -> VarId {
        self.push_var(name.into(), VarKind::Int { lo, hi })
    }

    fn push_var(&mut self, name: String, kind: VarKind) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDecl { name, kind });
        id
    }

    pub fn add_linear(&mut self, expr: LinearExpr, cmp: Cmp, rhs: i64) {
        self.constraints.push(Constraint::Linear { expr, cmp, rhs });
    }

    /// Fixe une variable à une valeur.
    pub fn fix(&mut self, var: VarId, value: i64) {
        self.add_linear(LinearExpr::from(var), Cmp::Eq, value);
    }

    pub fn add_and_indicator(&mut self, target: VarId, inputs: Vec<VarId>) {
        self.constraints
            .push(Constraint::AndIndicator { target, inputs });
    }

    /// `target >= v` pour chaque `v`. Si `target` est poussé vers le bas par
    /// l'objectif, il vaut `max(vars)` à l'optimum.
    pub fn add_max_bound(&mut self, target: VarId, vars: &[VarId]) {
        for v in vars {
            self.add_linear(LinearExpr::from(target).term(*v, -1), Cmp::Ge, 0);
        }
    }

    /// `target <= v` pour chaque `v` ; vaut `min(vars)` à l'optimum si
    /// l'objectif pousse `target` vers le haut.
    pub fn add_min_bound(&mut self, target: VarId, vars: &[VarId]) {
        for v in vars {
            self.add_linear(LinearExpr::from(target).term(*v, -1), Cmp::Le, 0);
        }
    }

    pub fn minimise(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.0]
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Liste les contraintes violées par une affectation (vide si elle est valide).
    pub fn violated<'a>(&'a self, values: &'a Assignment) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| !c.is_satisfied(values))
    }
}

/// Valeurs de toutes les variables d'un modèle résolu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    /// # Panics
    ///
    /// Si `var` n'appartient pas au modèle qui a produit cette affectation.
    /// Voir [`Assignment::get`].
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.0]
    }

    pub fn get(&self, var: VarId) -> Option<i64> {
        self.values.get(var.0).copied()
    }

    pub fn is_true(&self, var: VarId) -> bool {
        self.value(var) != 0
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    NoSolutionWithinBudget,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::NoSolutionWithinBudget => "NO_SOLUTION_WITHIN_BUDGET",
        })
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Présent si et seulement si `status.has_solution()`.
    pub solution: Option<Assignment>,
    pub objective: Option<i64>,
}

impl SolveOutcome {
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            solution: None,
            objective: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("solver backend failure: {0}")]
    Backend(String),
}

/// Moteur de résolution : un appel bloquant borné par `budget`.
///
/// À l'expiration du budget, la meilleure solution trouvée est rendue avec le
/// statut `Feasible` ; sans solution, le statut est `NoSolutionWithinBudget`.
pub trait SolverBackend {
    fn name(&self) -> &'static str;
    fn solve(&self, model: &ConstraintModel, budget: Duration) -> Result<SolveOutcome, SolverError>;
}
