use super::{
    Assignment, Cmp, Constraint, ConstraintModel, LinearExpr, SolveOutcome, SolveStatus,
    SolverBackend, SolverError, VarKind,
};
use good_lp::solvers::highs::highs;
use good_lp::*;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Marge sur la mesure du temps de HiGHS pour reconnaître un arrêt au budget.
const BUDGET_SLACK: Duration = Duration::from_millis(50);

/// Moteur PLNE via `good_lp` + HiGHS.
///
/// Le budget est transmis à HiGHS comme limite de temps : la résolution
/// s'arrête d'elle-même et rend la meilleure solution entière connue
/// (statut `Feasible`). Aucun thread ne survit à l'appel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LpBackend;

impl LpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for LpBackend {
    fn name(&self) -> &'static str {
        "good_lp/highs"
    }

    fn solve(&self, model: &ConstraintModel, budget: Duration) -> Result<SolveOutcome, SolverError> {
        let started = Instant::now();

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .vars()
            .iter()
            .map(|decl| match decl.kind {
                VarKind::Bool => vars.add(variable().binary().name(decl.name.clone())),
                VarKind::Int { lo, hi } => vars.add(
                    variable()
                        .integer()
                        .min(lo as f64)
                        .max(hi as f64)
                        .name(decl.name.clone()),
                ),
            })
            .collect();

        let objective = to_expression(model.objective(), &handles);
        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .with_time_limit(budget.as_secs_f64());

        for c in model.constraints() {
            for lp in translate(c, &handles) {
                problem = problem.with(lp);
            }
        }

        let result = problem.solve();
        let elapsed = started.elapsed();
        let out_of_time = elapsed + BUDGET_SLACK >= budget;

        let solution = match result {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                return Ok(SolveOutcome::without_solution(SolveStatus::Infeasible));
            }
            // HiGHS arrêté (temps, interruption) sans solution entière
            Err(ResolutionError::Other("NoSolutionFound")) => {
                warn!(budget_s = budget.as_secs(), "no integer solution within the time budget");
                return Ok(SolveOutcome::without_solution(
                    SolveStatus::NoSolutionWithinBudget,
                ));
            }
            Err(e) if out_of_time => {
                warn!(budget_s = budget.as_secs(), error = %e, "lp solve stopped at its time budget");
                return Ok(SolveOutcome::without_solution(
                    SolveStatus::NoSolutionWithinBudget,
                ));
            }
            Err(e) => return Err(SolverError::Backend(e.to_string())),
        };

        let stopped_early = matches!(solution.status(), SolutionStatus::TimeLimit);
        let values = Assignment::new(
            handles
                .iter()
                .map(|v| solution.value(*v).round() as i64)
                .collect(),
        );

        let broken = model.violated(&values).count();
        if broken > 0 {
            // arrêt au budget avant toute solution entière
            if stopped_early || out_of_time {
                warn!(budget_s = budget.as_secs(), "no integer solution within the time budget");
                return Ok(SolveOutcome::without_solution(
                    SolveStatus::NoSolutionWithinBudget,
                ));
            }
            return Err(SolverError::Backend(format!(
                "rounded solution violates {broken} constraint(s)"
            )));
        }

        // GapLimit : écart relatif sous la tolérance HiGHS, l'objectif entier est atteint
        let status = if stopped_early {
            warn!(budget_s = budget.as_secs(), "time budget reached, keeping best solution found");
            SolveStatus::Feasible
        } else {
            SolveStatus::Optimal
        };
        let objective = model.objective().eval(&values);
        debug!(elapsed_ms = elapsed.as_millis() as u64, %status, objective, "lp solve finished");

        Ok(SolveOutcome {
            status,
            solution: Some(values),
            objective: Some(objective),
        })
    }
}

fn affine(terms: &[(Variable, f64)], constant: f64) -> Expression {
    terms
        .iter()
        .fold(Expression::from(constant), |acc, &(v, c)| acc + c * v)
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let terms: Vec<(Variable, f64)> = expr
        .terms()
        .iter()
        .map(|(v, c)| (handles[v.index()], *c as f64))
        .collect();
    affine(&terms, expr.constant() as f64)
}

fn bound(expr: Expression, cmp: Cmp, rhs: f64) -> good_lp::Constraint {
    match cmp {
        Cmp::Eq => constraint!(expr == rhs),
        Cmp::Le => constraint!(expr <= rhs),
        Cmp::Ge => constraint!(expr >= rhs),
    }
}

fn translate(c: &Constraint, handles: &[Variable]) -> Vec<good_lp::Constraint> {
    match c {
        Constraint::Linear { expr, cmp, rhs } => {
            vec![bound(to_expression(expr, handles), *cmp, *rhs as f64)]
        }
        Constraint::AndIndicator { target, inputs } => {
            let t = handles[target.index()];
            let mut out: Vec<good_lp::Constraint> = inputs
                .iter()
                .map(|x| bound(affine(&[(t, 1.0), (handles[x.index()], -1.0)], 0.0), Cmp::Le, 0.0))
                .collect();
            // t >= Σx - (n - 1)
            let mut terms = vec![(t, 1.0)];
            terms.extend(inputs.iter().map(|x| (handles[x.index()], -1.0)));
            out.push(bound(affine(&terms, 0.0), Cmp::Ge, 1.0 - inputs.len() as f64));
            out
        }
    }
}
