#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use astreinte_ra::{
    io,
    preassign::{resolve_preassignments, Preassignments},
    scheduler::{SchedError, Scheduler},
    solver::LpBackend,
    storage::{JsonReportStorage, ReportStorage},
    survey::normalize_survey_csv,
    SchedulerConfig,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification des astreintes RA
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de configuration (horizon, zones, budget)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

/// Surcharges de l'horizon
#[derive(Args, Debug, Default)]
struct HorizonArgs {
    /// Premier jour (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Dernier jour inclus
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Début de la plage exclue
    #[arg(long)]
    exclude_start: Option<NaiveDate>,
    /// Fin de la plage exclue (incluse)
    #[arg(long)]
    exclude_end: Option<NaiveDate>,
}

impl HorizonArgs {
    fn apply(&self, cfg: &mut SchedulerConfig) {
        if let Some(d) = self.start {
            cfg.start = d;
        }
        if let Some(d) = self.end {
            cfg.end = d;
        }
        if let Some(d) = self.exclude_start {
            cfg.exclude_start = Some(d);
        }
        if let Some(d) = self.exclude_end {
            cfg.exclude_end = Some(d);
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Résoudre le planning et écrire schedule.csv / schedule_metrics.csv
    Solve {
        /// CSV des préférences normalisées
        #[arg(long)]
        prefs: PathBuf,
        /// CSV des pré-affectations (optionnel)
        #[arg(long)]
        preassign: Option<PathBuf>,
        /// Répertoire de sortie
        #[arg(long)]
        outdir: PathBuf,
        /// Budget de résolution en secondes
        #[arg(long)]
        time_budget_secs: Option<u64>,
        /// Rapport JSON complet (optionnel)
        #[arg(long)]
        out_json: Option<PathBuf>,
        #[command(flatten)]
        horizon: HorizonArgs,
    },

    /// Lister les jours de l'horizon
    Calendar {
        #[command(flatten)]
        horizon: HorizonArgs,
    },

    /// Résoudre les noms des pré-affectations
    Resolve {
        #[arg(long)]
        prefs: PathBuf,
        #[arg(long)]
        preassign: PathBuf,
    },

    /// Vérifier un rapport JSON contre les préférences
    Check {
        #[arg(long)]
        prefs: PathBuf,
        #[arg(long)]
        report: PathBuf,
        #[arg(long)]
        preassign: Option<PathBuf>,
        /// Export CSV des violations (optionnel)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Normaliser l'export brut du formulaire
    Normalize {
        #[arg(long)]
        survey: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Année des dates de week-end
        #[arg(long, default_value_t = 2025)]
        year: i32,
    },
}

fn load_preassignments(
    path: Option<&Path>,
    roster: &astreinte_ra::Roster,
    cfg: &SchedulerConfig,
) -> Result<Preassignments> {
    match path {
        Some(path) => {
            let rows = io::import_preassignments_csv(path, &cfg.areas)?;
            Ok(resolve_preassignments(roster, &rows))
        }
        None => Ok(Preassignments::new()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let mut cfg = match &cli.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::default(),
    };

    let code = match cli.cmd {
        Commands::Solve {
            prefs,
            preassign,
            outdir,
            time_budget_secs,
            out_json,
            horizon,
        } => {
            horizon.apply(&mut cfg);
            if let Some(secs) = time_budget_secs {
                cfg.time_budget_secs = secs;
            }
            let roster = io::import_roster_csv(&prefs)?;
            let fixes = load_preassignments(preassign.as_deref(), &roster, &cfg)?;
            for w in fixes.warnings() {
                eprintln!("warning: {w}");
            }

            let scheduler = Scheduler::new(&roster, cfg.horizon()?)
                .with_options(cfg.solve_options());
            let report = match scheduler.run(&LpBackend::new(), &fixes) {
                Ok(report) => report,
                Err(SchedError::Infeasible(status)) => {
                    eprintln!("No feasible schedule found ({status})");
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };

            fs::create_dir_all(&outdir)
                .with_context(|| format!("creating {}", outdir.display()))?;
            let sched_file = outdir.join("schedule.csv");
            io::export_schedule_csv(
                File::create(&sched_file)?,
                &report.schedule,
                &roster,
                &cfg.areas,
            )?;
            io::export_metrics_csv(
                File::create(outdir.join("schedule_metrics.csv"))?,
                &report.loads,
            )?;
            if let Some(path) = out_json {
                JsonReportStorage::open(path).save(&report)?;
            }

            let totals = report.loads.totals();
            println!("=== Summary ({}) ===", report.status);
            println!("Total primary shifts: {}", totals.primaries);
            println!("Total secondary shifts: {}", totals.secondaries);
            println!("Total weekend primaries: {}", totals.weekend_primaries);
            println!("Total weekend secondaries: {}", totals.weekend_secondaries);
            0
        }
        Commands::Calendar { horizon } => {
            horizon.apply(&mut cfg);
            let horizon = cfg.horizon()?;
            let mut days = 0usize;
            for date in horizon.dates() {
                println!("{date} {}", date.format("%a"));
                days += 1;
            }
            println!("{days} days, {} shifts", horizon.shifts().len());
            0
        }
        Commands::Resolve { prefs, preassign } => {
            let roster = io::import_roster_csv(&prefs)?;
            let fixes = load_preassignments(Some(preassign.as_path()), &roster, &cfg)?;
            for ((date, slot), ra) in fixes.fixes() {
                println!("{date} | {} → {ra}", cfg.areas.column(*slot));
            }
            for w in fixes.warnings() {
                eprintln!("warning: {w}");
            }
            if fixes.warnings().is_empty() {
                0
            } else {
                2
            }
        }
        Commands::Check {
            prefs,
            report,
            preassign,
            out,
        } => {
            let roster = io::import_roster_csv(&prefs)?;
            let fixes = load_preassignments(preassign.as_deref(), &roster, &cfg)?;
            let report = JsonReportStorage::open(report).load()?;
            let scheduler = Scheduler::new(&roster, report.horizon);
            let violations = scheduler.audit(&report.schedule, &fixes);
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                if let Some(path) = out {
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["date", "slot", "ra_id", "kind"])?;
                    for v in &violations {
                        w.write_record([
                            v.date.to_string().as_str(),
                            cfg.areas.column(v.slot).as_str(),
                            v.ra.as_ref().map(|r| r.as_str()).unwrap_or(""),
                            v.kind.as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Normalize { survey, out, year } => {
            let input =
                File::open(&survey).with_context(|| format!("reading {}", survey.display()))?;
            let records = normalize_survey_csv(input, year)?;
            io::export_prefs_csv(File::create(&out)?, &records)?;
            println!("Export complete: {} ({} RAs)", out.display(), records.len());
            0
        }
    };

    std::process::exit(code);
}
