#![forbid(unsafe_code)]
use astreinte_ra::solver::{
    Cmp, ConstraintModel, LinearExpr, SolveOutcome, SolverError,
};
use astreinte_ra::model::is_weekend;
use astreinte_ra::{
    resolve_preassignments, Horizon, LpBackend, PreassignRow, PrefLevel, Ra, RaId, Roster,
    SchedError, SchedulerConfig, Scheduler, SlotKey, SolveOptions, SolveStatus, SolverBackend,
};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use std::time::{Duration, Instant};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Jeudi 2 → samedi 4 octobre 2025, six RA avec quelques indisponibilités.
fn small_roster() -> Roster {
    let mut ras: Vec<Ra> = [
        "Alice Martin",
        "Bruno Petit",
        "Chloé Roux",
        "Diane Blanc",
        "Emile Noir",
        "Fanny Gris",
    ]
    .iter()
    .map(|n| Ra::new(*n))
    .collect();
    ras[0].blackout_dates.insert(d(2025, 10, 3));
    ras[1].weekend_unavailable.insert(d(2025, 10, 4));
    ras[2].weekday_prefs.thu = PrefLevel::NotAvailable;
    ras[3].block_pref = true;
    Roster::new(ras).unwrap()
}

fn small_horizon() -> Horizon {
    Horizon::new(d(2025, 10, 2), d(2025, 10, 4), None).unwrap()
}

#[test]
fn small_instance_respects_hard_constraints() {
    let roster = small_roster();
    let rows = vec![PreassignRow::new(d(2025, 10, 2)).with(SlotKey::Area1Primary, "Diane Blanc")];
    let fixes = resolve_preassignments(&roster, &rows);
    let scheduler = Scheduler::new(&roster, small_horizon()).with_options(SolveOptions {
        time_budget: Duration::from_secs(30),
    });

    let report = scheduler.run(&LpBackend::new(), &fixes).unwrap();
    assert!(report.status.has_solution());
    assert_eq!(report.schedule.rows.len(), 3);
    assert_eq!(report.schedule.shift_count(), 12);

    for row in &report.schedule.rows {
        let ids: Vec<&RaId> = row.cells.iter().map(|c| c.as_ref().unwrap()).collect();
        let distinct: HashSet<_> = ids.iter().collect();
        assert_eq!(distinct.len(), 4, "one shift per RA per day on {}", row.date);
    }

    let alice = RaId::new("amartin");
    let bruno = RaId::new("bpetit");
    let chloe = RaId::new("croux");
    assert!(report.schedule.shifts_of(&alice).all(|(date, _)| date != d(2025, 10, 3)));
    assert!(report.schedule.shifts_of(&bruno).all(|(date, _)| date != d(2025, 10, 4)));
    assert!(report.schedule.shifts_of(&chloe).all(|(date, _)| date != d(2025, 10, 2)));
    assert_eq!(
        report.schedule.assigned(d(2025, 10, 2), SlotKey::Area1Primary),
        Some(&RaId::new("dblanc"))
    );

    let totals = report.loads.totals();
    assert_eq!(totals.primaries, 6);
    assert_eq!(totals.secondaries, 6);
    // vendredi + samedi
    assert_eq!(totals.weekend_primaries, 4);
    assert_eq!(totals.weekend_secondaries, 4);

    assert!(scheduler.audit(&report.schedule, &fixes).is_empty());
}

#[test]
fn extraction_is_repeatable() {
    let roster = small_roster();
    let scheduler = Scheduler::new(&roster, small_horizon());
    let fixes = resolve_preassignments(&roster, &[]);
    let model = scheduler.build_model(&fixes);

    let outcome = LpBackend::new()
        .solve(model.model(), Duration::from_secs(30))
        .unwrap();
    let solution = outcome.solution.unwrap();
    assert_eq!(solution.len(), model.model().var_count());

    let first = scheduler.extract(&model, &solution);
    let second = scheduler.extract(&model, &solution);
    assert_eq!(first, second);
}

#[test]
fn too_few_ras_is_infeasible() {
    let roster = Roster::new(vec![
        Ra::new("Alice Martin"),
        Ra::new("Bruno Petit"),
        Ra::new("Chloé Roux"),
    ])
    .unwrap();
    let horizon = Horizon::new(d(2025, 10, 2), d(2025, 10, 2), None).unwrap();
    let err = Scheduler::new(&roster, horizon)
        .run(&LpBackend::new(), &resolve_preassignments(&roster, &[]))
        .unwrap_err();
    assert!(matches!(err, SchedError::Infeasible(SolveStatus::Infeasible)));
}

struct OutOfTime;

impl SolverBackend for OutOfTime {
    fn name(&self) -> &'static str {
        "out-of-time"
    }

    fn solve(&self, _: &ConstraintModel, _: Duration) -> Result<SolveOutcome, SolverError> {
        Ok(SolveOutcome::without_solution(SolveStatus::NoSolutionWithinBudget))
    }
}

#[test]
fn exhausted_budget_yields_no_partial_schedule() {
    let roster = small_roster();
    let err = Scheduler::new(&roster, small_horizon())
        .run(&OutOfTime, &resolve_preassignments(&roster, &[]))
        .unwrap_err();
    assert!(matches!(
        err,
        SchedError::Infeasible(SolveStatus::NoSolutionWithinBudget)
    ));
}

#[test]
fn lp_backend_tightens_max_min_bounds_and_indicators() {
    let mut m = ConstraintModel::new();
    let a = m.new_int("a", 0, 5);
    let b = m.new_int("b", 0, 5);
    m.add_linear(LinearExpr::sum([a, b]), Cmp::Eq, 6);
    m.add_linear(LinearExpr::from(a), Cmp::Ge, 4);
    let hi = m.new_int("hi", 0, 5);
    let lo = m.new_int("lo", 0, 5);
    m.add_max_bound(hi, &[a, b]);
    m.add_min_bound(lo, &[a, b]);

    let x = m.new_bool("x");
    let y = m.new_bool("y");
    let t = m.new_bool("t");
    m.add_and_indicator(t, vec![x, y]);
    m.fix(y, 0);
    // t ne peut pas valoir 1 tant que y = 0
    m.minimise(LinearExpr::from(hi).term(lo, -1).term(t, -1));

    let outcome = LpBackend::new().solve(&m, Duration::from_secs(10)).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    let values = outcome.solution.unwrap();
    assert_eq!(values.value(a), 4);
    assert_eq!(values.value(b), 2);
    assert_eq!(values.value(hi), 4);
    assert_eq!(values.value(lo), 2);
    assert!(!values.is_true(t));
    assert_eq!(outcome.objective, Some(2));

    let mut other = ConstraintModel::new();
    let foreign = (0..10).map(|i| other.new_bool(format!("z{i}"))).last().unwrap();
    assert_eq!(values.get(t), Some(0));
    assert_eq!(values.get(foreign), None);
}

#[test]
fn lp_backend_reports_infeasible_models() {
    let mut m = ConstraintModel::new();
    let x = m.new_bool("x");
    m.add_linear(LinearExpr::from(x), Cmp::Eq, 2);
    let outcome = LpBackend::new().solve(&m, Duration::from_secs(10)).unwrap();
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.solution.is_none());
}

/// Trimestre de référence (77 jours), douze RA.
fn term_roster() -> Roster {
    let mut ras: Vec<Ra> = [
        "Alice Martin",
        "Bruno Petit",
        "Chloé Roux",
        "Diane Blanc",
        "Emile Noir",
        "Fanny Gris",
        "Gaspard Leroy",
        "Hélène Faure",
        "Inès Morel",
        "Jules Girard",
        "Karim Benali",
        "Léa Fontaine",
    ]
    .iter()
    .map(|n| Ra::new(*n))
    .collect();
    ras[0].blackout_dates.insert(d(2025, 10, 1));
    ras[0].blackout_dates.insert(d(2025, 10, 2));
    ras[1].weekend_unavailable.insert(d(2025, 10, 3));
    ras[1].weekend_unavailable.insert(d(2025, 10, 4));
    ras[2].weekday_prefs.wed = PrefLevel::NotAvailable;
    ras[3].weekday_prefs.sun = PrefLevel::NotAvailable;
    ras[4].block_pref = true;
    ras[5].block_pref = true;
    Roster::new(ras).unwrap()
}

#[test]
fn reference_term_is_fully_covered_within_budget() {
    let roster = term_roster();
    let horizon = SchedulerConfig::default().horizon().unwrap();
    let rows = vec![PreassignRow::new(d(2025, 10, 15)).with(SlotKey::Area2Secondary, "Karim")];
    let fixes = resolve_preassignments(&roster, &rows);
    let scheduler = Scheduler::new(&roster, horizon).with_options(SolveOptions {
        time_budget: Duration::from_secs(60),
    });

    let report = scheduler.run(&LpBackend::new(), &fixes).unwrap();
    assert!(report.status.has_solution());

    let dates: Vec<NaiveDate> = horizon.dates().collect();
    assert_eq!(report.schedule.rows.len(), 77);
    assert_eq!(report.schedule.shift_count(), 308);
    for (row, date) in report.schedule.rows.iter().zip(&dates) {
        assert_eq!(row.date, *date);
        let distinct: HashSet<_> = row.cells.iter().map(|c| c.as_ref().unwrap()).collect();
        assert_eq!(distinct.len(), 4, "one shift per RA per day on {}", row.date);
    }

    let alice = RaId::new("amartin");
    assert!(report
        .schedule
        .shifts_of(&alice)
        .all(|(date, _)| date != d(2025, 10, 1) && date != d(2025, 10, 2)));
    let chloe = RaId::new("croux");
    assert!(report
        .schedule
        .shifts_of(&chloe)
        .all(|(date, _)| date.weekday() != Weekday::Wed));
    assert_eq!(
        report.schedule.assigned(d(2025, 10, 15), SlotKey::Area2Secondary),
        Some(&RaId::new("kbenali"))
    );

    let weekend_days = dates.iter().filter(|d| is_weekend(**d)).count() as u32;
    let totals = report.loads.totals();
    assert_eq!(totals.primaries, 2 * 77);
    assert_eq!(totals.secondaries, 2 * 77);
    assert_eq!(totals.weekend_primaries, 2 * weekend_days);
    assert_eq!(totals.weekend_secondaries, 2 * weekend_days);

    assert!(scheduler.audit(&report.schedule, &fixes).is_empty());
}

#[test]
fn short_budget_returns_control_to_the_caller() {
    let roster = term_roster();
    let horizon = SchedulerConfig::default().horizon().unwrap();
    let scheduler = Scheduler::new(&roster, horizon);
    let model = scheduler.build_model(&resolve_preassignments(&roster, &[]));

    let started = Instant::now();
    let outcome = LpBackend::new()
        .solve(model.model(), Duration::from_secs(2))
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(20));
    // une solution rendue est toujours complète et valide
    if let Some(solution) = &outcome.solution {
        assert!(outcome.status.has_solution());
        assert_eq!(model.model().violated(solution).count(), 0);
    } else {
        assert_eq!(outcome.status, SolveStatus::NoSolutionWithinBudget);
    }
}
