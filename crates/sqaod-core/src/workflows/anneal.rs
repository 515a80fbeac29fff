use crate::core::models::bits::BitsPair;
use crate::core::real::Real;
use crate::engine::annealer::BipartiteGraphAnnealer;
use crate::engine::config::{self, AnnealerConfig, ConfigError};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Geometric annealing schedule: `G` starts at `g_initial` and is multiplied by `tau`
/// after every step while it stays above `g_final`; `kt` is held fixed.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnealSchedule {
    pub g_initial: f64,
    pub g_final: f64,
    pub tau: f64,
    pub kt: f64,
}

impl AnnealSchedule {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let schedule: Self = config::load_toml(path)?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let schedule: Self = config::parse_toml(content, "<string>")?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |parameter, reason: &str| ConfigError::Invalid {
            parameter,
            reason: reason.to_string(),
        };
        if !(self.g_final.is_finite() && self.g_final > 0.0) {
            return Err(invalid("g_final", "must be positive and finite"));
        }
        if !(self.g_initial.is_finite() && self.g_initial > self.g_final) {
            return Err(invalid("g_initial", "must be finite and greater than g_final"));
        }
        if !(self.tau > 0.0 && self.tau < 1.0) {
            return Err(invalid("tau", "must lie strictly between 0 and 1"));
        }
        if !(self.kt.is_finite() && self.kt > 0.0) {
            return Err(invalid("kt", "must be positive and finite"));
        }
        Ok(())
    }

    /// Transverse-field values visited by the schedule, in order.
    pub fn fields(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::successors(Some(self.g_initial), move |g| Some(g * self.tau))
            .take_while(move |&g| g > self.g_final)
    }

    pub fn num_steps(&self) -> u64 {
        self.fields().count() as u64
    }
}

/// Solver settings and schedule read together from one TOML document with `[solver]`
/// and `[schedule]` tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub solver: AnnealerConfig,
    pub schedule: AnnealSchedule,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let run: Self = config::load_toml(path)?;
        run.validate()?;
        Ok(run)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let run: Self = config::parse_toml(content, "<string>")?;
        run.validate()?;
        Ok(run)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()?;
        self.schedule.validate()
    }

    pub fn build_annealer<R: Real>(&self) -> Result<BipartiteGraphAnnealer<R>, EngineError> {
        BipartiteGraphAnnealer::with_config(&self.solver)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnealOutcome<R> {
    pub steps: u64,
    /// Final energy of every replica, in the problem's direction.
    pub energies: Vec<R>,
    pub best_replica: usize,
    pub best_energy: R,
    pub best_x: BitsPair,
}

/// Runs `schedule` on an annealer whose problem is already set.
///
/// Whatever was not configured beforehand is defaulted by `init_anneal`. The annealer is
/// left finalized, so its snapshots and energies can still be read afterwards.
#[instrument(skip_all, name = "anneal_workflow")]
pub fn run<R: Real>(
    annealer: &mut BipartiteGraphAnnealer<R>,
    schedule: &AnnealSchedule,
    reporter: &ProgressReporter,
) -> Result<AnnealOutcome<R>, EngineError> {
    schedule.validate()?;

    // === Phase 1: Initialization ===
    reporter.report(Progress::PhaseStart {
        name: "Initialization",
    });
    annealer.init_anneal()?;
    let (n0, n1, num_trotters) = annealer.get_problem_size()?;
    reporter.report(Progress::Initialized {
        n0,
        n1,
        num_trotters,
    });
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Annealing ===
    let total_steps = schedule.num_steps();
    reporter.report(Progress::PhaseStart { name: "Annealing" });
    reporter.report(Progress::TaskStart { total_steps });
    info!(
        total_steps,
        g_initial = schedule.g_initial,
        g_final = schedule.g_final,
        tau = schedule.tau,
        kt = schedule.kt,
        "Starting annealing schedule."
    );

    let kt = R::from_constant(schedule.kt);
    let mut steps = 0u64;
    for g in schedule.fields() {
        annealer.anneal_one_step(R::from_constant(g), kt)?;
        reporter.report(Progress::Step { index: steps, g });
        reporter.report(Progress::TaskIncrement);
        steps += 1;
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Finalization ===
    reporter.report(Progress::PhaseStart {
        name: "Finalization",
    });
    annealer.fin_anneal()?;
    let energies = annealer.get_e()?.to_vec();
    let direction = annealer.get_hjc()?.direction;
    let best_replica = direction
        .best(&energies)
        .ok_or(EngineError::Uninitialized("trotter replicas"))?;
    let best_x = annealer
        .get_x()
        .get(best_replica)
        .cloned()
        .ok_or(EngineError::Uninitialized("result snapshot"))?;
    let best_energy = energies[best_replica];
    reporter.report(Progress::PhaseFinish);

    info!(steps, best_replica, best_energy = %best_energy, "Annealing schedule complete.");
    Ok(AnnealOutcome {
        steps,
        energies,
        best_replica,
        best_energy,
        best_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formulation::OptimizeDirection;
    use crate::core::models::matrix::{Matrix, Vector};
    use crate::engine::config::Backend;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn schedule() -> AnnealSchedule {
        AnnealSchedule {
            g_initial: 5.0,
            g_final: 0.01,
            tau: 0.9,
            kt: 0.02,
        }
    }

    #[test]
    fn schedule_validation_rejects_bad_values() {
        let bad = [
            AnnealSchedule { g_final: 0.0, ..schedule() },
            AnnealSchedule { g_initial: 0.005, ..schedule() },
            AnnealSchedule { tau: 1.0, ..schedule() },
            AnnealSchedule { tau: 0.0, ..schedule() },
            AnnealSchedule { kt: -1.0, ..schedule() },
            AnnealSchedule { kt: f64::INFINITY, ..schedule() },
        ];
        for s in bad {
            assert!(matches!(s.validate(), Err(ConfigError::Invalid { .. })), "{:?}", s);
        }
        assert!(schedule().validate().is_ok());
    }

    #[test]
    fn fields_follow_geometric_decay() {
        let s = AnnealSchedule {
            g_initial: 1.0,
            g_final: 0.2,
            tau: 0.5,
            kt: 1.0,
        };
        assert_eq!(s.fields().collect::<Vec<_>>(), vec![1.0, 0.5, 0.25]);
        assert_eq!(s.num_steps(), 3);
    }

    #[test]
    fn schedule_loads_from_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        fs::write(&path, "g_initial = 5.0\ng_final = 0.01\ntau = 0.9\nkt = 0.02\n").unwrap();
        assert_eq!(AnnealSchedule::load(&path).unwrap(), schedule());
    }

    #[test]
    fn schedule_load_reports_invalid_values_and_bad_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.toml");
        fs::write(&path, "g_initial = 5.0\ng_final = 0.01\ntau = 1.5\nkt = 0.02\n").unwrap();
        assert!(matches!(
            AnnealSchedule::load(&path),
            Err(ConfigError::Invalid { parameter: "tau", .. })
        ));

        fs::write(&path, "g_initial = ").unwrap();
        assert!(matches!(AnnealSchedule::load(&path), Err(ConfigError::Toml { .. })));
        assert!(matches!(
            AnnealSchedule::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn run_config_reads_solver_and_schedule_tables() {
        let run = RunConfig::from_toml_str(
            "[solver]\nbackend = \"blas\"\nseed = 9\nnum_trotters = 2\n\n\
             [schedule]\ng_initial = 5.0\ng_final = 0.01\ntau = 0.9\nkt = 0.02\n",
        )
        .unwrap();
        assert_eq!(run.solver.backend, Backend::Blas);
        assert_eq!(run.solver.num_trotters, Some(2));
        assert_eq!(run.schedule, schedule());

        let annealer = run.build_annealer::<f32>().unwrap();
        assert_eq!(annealer.backend_name(), "blas");
        assert!(matches!(
            RunConfig::from_toml_str("[solver]\nseed = 1\n"),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn run_reports_progress_and_picks_best_replica() {
        let mut annealer = BipartiteGraphAnnealer::<f64>::new(Backend::Host);
        let b0 = Vector::from_vec(vec![-1.0, 2.0]);
        let b1 = Vector::from_vec(vec![1.0, -1.0]);
        let w = Matrix::from_rows(&[vec![-2.0, 1.0], vec![0.5, -1.0]]).unwrap();
        annealer
            .set_problem(&b0, &b1, &w, OptimizeDirection::Minimize)
            .unwrap();
        annealer.seed(3);
        annealer.set_num_trotters(4).unwrap();

        let increments = Mutex::new(0u64);
        let phases = Mutex::new(Vec::new());
        let sizes = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskIncrement => *increments.lock().unwrap() += 1,
            Progress::PhaseStart { name } => phases.lock().unwrap().push(name),
            Progress::Initialized {
                n0,
                n1,
                num_trotters,
            } => sizes.lock().unwrap().push((n0, n1, num_trotters)),
            _ => {}
        }));

        let s = schedule();
        let outcome = run(&mut annealer, &s, &reporter).unwrap();
        drop(reporter);

        assert_eq!(outcome.steps, s.num_steps());
        assert_eq!(increments.into_inner().unwrap(), s.num_steps());
        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Initialization", "Annealing", "Finalization"]
        );
        assert_eq!(sizes.into_inner().unwrap(), vec![(2, 2, 4)]);
        assert_eq!(outcome.energies.len(), 4);
        assert!(outcome.energies.iter().all(|&e| e >= outcome.best_energy));
        assert_eq!(&outcome.best_x, &annealer.get_x()[outcome.best_replica]);
    }

    #[test]
    fn run_rejects_invalid_schedule_before_touching_annealer() {
        let mut annealer = BipartiteGraphAnnealer::<f64>::new(Backend::Host);
        let bad = AnnealSchedule { tau: 2.0, ..schedule() };
        let result = run(&mut annealer, &bad, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }
}
