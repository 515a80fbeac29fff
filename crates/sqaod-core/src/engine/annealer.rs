use super::config::{AnnealerConfig, Backend};
use super::error::EngineError;
use super::result::ResultView;
use super::state::{InitState, LifecycleFlags, TrotterReplicaState};
use crate::core::formulation::{self, IsingParameters, OptimizeDirection};
use crate::core::linalg::error::LinalgError;
use crate::core::linalg::{LinearAlgebra, MatrixOp};
use crate::core::models::bits::{BitsPair, BitsPairArray, is_bit_vector};
use crate::core::models::matrix::{Dim, Matrix, Vector};
use crate::core::random::Random;
use crate::core::real::Real;
use tracing::{debug, info, instrument, trace};

/// Metropolis acceptance threshold: `1` for a downhill move, `exp(-dE / kT)` otherwise.
#[inline]
pub fn metropolis_threshold<R: Real>(delta_e: R, inv_kt: R) -> R {
    if delta_e < R::zero() {
        R::one()
    } else {
        (-delta_e * inv_kt).exp()
    }
}

/// Whether a flip with energy change `delta_e` is taken against the uniform draw `u`.
/// Ties are rejected.
#[inline]
pub fn metropolis_accepts<R: Real>(delta_e: R, inv_kt: R, u: R) -> bool {
    metropolis_threshold(delta_e, inv_kt) > u
}

/// Simulated quantum annealer for bipartite QUBO problems.
///
/// The transverse field is handled by a path-integral decomposition into `m` Trotter
/// replicas, coupled ring-wise along the replica axis. Each solver owns its random
/// source, its linear-algebra engine and its state; nothing is shared between
/// instances.
///
/// Typical use:
///
/// 1. [`set_problem`](Self::set_problem), then optionally [`seed`](Self::seed),
///    [`set_num_trotters`](Self::set_num_trotters), [`set_x`](Self::set_x) or
///    [`randomize_q`](Self::randomize_q);
/// 2. [`init_anneal`](Self::init_anneal) fills in whatever was not configured;
/// 3. [`anneal_one_step`](Self::anneal_one_step) along a schedule of `(G, kT)`;
/// 4. [`fin_anneal`](Self::fin_anneal), then read [`get_x`](Self::get_x) and
///    [`get_e`](Self::get_e).
pub struct BipartiteGraphAnnealer<R: Real> {
    la: Box<dyn LinearAlgebra<R> + Send>,
    random: Random,
    problem: Option<IsingParameters<R>>,
    num_trotters: Option<usize>,
    replicas: Option<TrotterReplicaState<R>>,
    pending_x: Option<BitsPair>,
    flags: LifecycleFlags,
    result: ResultView,
}

impl<R: Real> BipartiteGraphAnnealer<R> {
    pub fn new(backend: Backend) -> Self {
        Self::with_engine(backend.create())
    }

    pub fn with_engine(la: Box<dyn LinearAlgebra<R> + Send>) -> Self {
        Self {
            la,
            random: Random::default(),
            problem: None,
            num_trotters: None,
            replicas: None,
            pending_x: None,
            flags: LifecycleFlags::default(),
            result: ResultView::default(),
        }
    }

    /// Builds an annealer from a validated configuration. A configured replica count is
    /// applied when the problem is set.
    pub fn with_config(config: &AnnealerConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mut annealer = Self::new(config.backend);
        if let Some(seed) = config.seed {
            annealer.seed(seed);
        }
        if let Some(m) = config.num_trotters {
            annealer.num_trotters = Some(m);
            annealer.flags.trotters = InitState::Explicit;
        }
        Ok(annealer)
    }

    pub fn backend_name(&self) -> &'static str {
        self.la.name()
    }

    pub fn seed(&mut self, seed: u64) {
        self.random.seed(seed);
        self.flags.seed = InitState::Explicit;
    }

    /// Sets the QUBO `(b0, b1, W)` with `W` of shape `len(b1) x len(b0)`.
    ///
    /// A previously chosen replica count is kept and the replicas are reallocated for
    /// the new sizes; spins, snapshots and any pattern from [`set_x`](Self::set_x) are
    /// discarded.
    #[instrument(skip_all, name = "set_problem", fields(n0 = b0.len(), n1 = b1.len()))]
    pub fn set_problem(
        &mut self,
        b0: &Vector<R>,
        b1: &Vector<R>,
        w: &Matrix<R>,
        direction: OptimizeDirection,
    ) -> Result<(), EngineError> {
        let params = formulation::calculate_hjc(self.la.as_mut(), b0, b1, w, direction)?;
        let (n0, n1) = (params.n0(), params.n1());

        self.replicas = self.num_trotters.map(|m| TrotterReplicaState::new(n0, n1, m));
        self.problem = Some(params);
        self.pending_x = None;
        self.flags.spins = InitState::Unset;
        self.result.clear();

        info!(?direction, "Problem set.");
        Ok(())
    }

    /// Sets the number of Trotter replicas and reallocates them.
    pub fn set_num_trotters(&mut self, m: usize) -> Result<(), EngineError> {
        if m == 0 {
            return Err(EngineError::InvalidArgument(
                "the number of trotters must be a positive integer".to_string(),
            ));
        }
        let (n0, n1) = self.problem_dims()?;
        self.allocate_replicas(n0, n1, m);
        self.flags.trotters = InitState::Explicit;
        debug!(m, "Trotter replicas allocated.");
        Ok(())
    }

    /// Sets every replica to the spin pattern of `(x0, x1)`. Before the replicas exist
    /// the pattern is kept and applied when they are allocated.
    pub fn set_x(&mut self, x0: &[i8], x1: &[i8]) -> Result<(), EngineError> {
        let (n0, n1) = self.problem_dims()?;
        if x0.len() != n0 || x1.len() != n1 {
            return Err(EngineError::InvalidArgument(format!(
                "bit vectors of length ({}, {}) do not match problem size ({}, {})",
                x0.len(),
                x1.len(),
                n0,
                n1
            )));
        }
        if !is_bit_vector(x0) || !is_bit_vector(x1) {
            return Err(EngineError::InvalidArgument(
                "bit vectors may only contain 0 and 1".to_string(),
            ));
        }

        let pattern = BitsPair::new(x0.to_vec(), x1.to_vec());
        if let Some(replicas) = self.replicas.as_mut() {
            replicas.broadcast_bits(&pattern.x0, &pattern.x1);
        }
        self.pending_x = Some(pattern);
        self.flags.spins = InitState::Explicit;
        Ok(())
    }

    /// Draws every spin of every replica independently.
    pub fn randomize_q(&mut self) -> Result<(), EngineError> {
        self.randomize_spins()?;
        self.flags.spins = InitState::Explicit;
        Ok(())
    }

    /// Fills in every unconfigured piece of state: a time-derived seed,
    /// `max(1, (N0 + N1) / 4)` replicas and random spins. Configured pieces are kept.
    #[instrument(skip_all, name = "init_anneal")]
    pub fn init_anneal(&mut self) -> Result<(), EngineError> {
        let (n0, n1) = self.problem_dims()?;

        if !self.flags.seed.is_set() {
            let seed = self.random.seed_from_time();
            self.flags.seed = InitState::Defaulted;
            debug!(seed, "Using default seed.");
        }
        if !self.flags.trotters.is_set() {
            let m = ((n0 + n1) / 4).max(1);
            self.allocate_replicas(n0, n1, m);
            self.flags.trotters = InitState::Defaulted;
            debug!(m, "Using default number of trotters.");
        }
        if !self.flags.spins.is_set() {
            self.randomize_spins()?;
            self.flags.spins = InitState::Defaulted;
            debug!("Spins initialized randomly.");
        }

        let (_, _, m) = self.get_problem_size()?;
        info!(n0, n1, m, "Annealer initialized.");
        Ok(())
    }

    /// One Monte Carlo sweep at transverse field `g` and temperature `kt`: a half-step
    /// over `q1` with `q0` fixed, then over `q0` with the updated `q1` fixed.
    #[instrument(level = "trace", skip(self))]
    pub fn anneal_one_step(&mut self, g: R, kt: R) -> Result<(), EngineError> {
        validate_schedule_point(g, kt)?;
        if !self.flags.is_ready() {
            return Err(EngineError::Uninitialized("annealer (call init_anneal first)"));
        }
        let params = self
            .problem
            .as_ref()
            .ok_or(EngineError::Uninitialized("problem"))?;
        let replicas = self
            .replicas
            .as_mut()
            .ok_or(EngineError::Uninitialized("trotter replicas"))?;

        anneal_half_step(
            self.la.as_mut(),
            &mut self.random,
            &mut replicas.q1,
            &params.h1,
            &params.j,
            MatrixOp::None,
            &replicas.q0,
            g,
            kt,
        )?;
        anneal_half_step(
            self.la.as_mut(),
            &mut self.random,
            &mut replicas.q0,
            &params.h0,
            &params.j,
            MatrixOp::Transpose,
            &replicas.q1,
            g,
            kt,
        )?;
        replicas.invalidate_energies();
        trace!("Annealing step finished.");
        Ok(())
    }

    /// Synchronizes the snapshots and recomputes the energies.
    #[instrument(skip_all, name = "fin_anneal")]
    pub fn fin_anneal(&mut self) -> Result<(), EngineError> {
        self.sync_bits()?;
        self.calculate_e()?;
        info!("Annealing finished.");
        Ok(())
    }

    /// Recomputes the per-replica energies in the problem's direction.
    pub fn calculate_e(&mut self) -> Result<(), EngineError> {
        let params = self
            .problem
            .as_ref()
            .ok_or(EngineError::Uninitialized("problem"))?;
        let replicas = self
            .replicas
            .as_mut()
            .ok_or(EngineError::Uninitialized("trotter replicas"))?;
        formulation::calculate_ising_energies(
            self.la.as_mut(),
            params,
            &replicas.q0,
            &replicas.q1,
            &mut replicas.e,
        )?;
        replicas.mark_energies_valid();
        Ok(())
    }

    /// Rebuilds the bit and spin snapshots from the current replicas.
    pub fn sync_bits(&mut self) -> Result<(), EngineError> {
        let replicas = self
            .replicas
            .as_ref()
            .ok_or(EngineError::Uninitialized("trotter replicas"))?;
        self.result.rebuild(&replicas.q0, &replicas.q1);
        Ok(())
    }

    /// Bit snapshot of every replica as of the last sync.
    pub fn get_x(&self) -> &BitsPairArray {
        self.result.x()
    }

    /// Spin snapshot of every replica as of the last sync.
    pub fn get_q(&self) -> &BitsPairArray {
        self.result.q()
    }

    /// Energies as of the last [`calculate_e`](Self::calculate_e); see
    /// [`energies_valid`](Self::energies_valid).
    pub fn get_e(&self) -> Result<&Vector<R>, EngineError> {
        self.replicas
            .as_ref()
            .map(|r| &r.e)
            .ok_or(EngineError::Uninitialized("trotter replicas"))
    }

    pub fn energies_valid(&self) -> bool {
        self.replicas
            .as_ref()
            .is_some_and(TrotterReplicaState::energies_valid)
    }

    /// `(N0, N1, m)`; `m` is `0` until a replica count is chosen.
    pub fn get_problem_size(&self) -> Result<(usize, usize, usize), EngineError> {
        let (n0, n1) = self.problem_dims()?;
        Ok((n0, n1, self.num_trotters.unwrap_or(0)))
    }

    pub fn get_hjc(&self) -> Result<&IsingParameters<R>, EngineError> {
        self.problem
            .as_ref()
            .ok_or(EngineError::Uninitialized("problem"))
    }

    pub fn lifecycle(&self) -> LifecycleFlags {
        self.flags
    }

    fn problem_dims(&self) -> Result<(usize, usize), EngineError> {
        self.problem
            .as_ref()
            .map(|p| (p.n0(), p.n1()))
            .ok_or(EngineError::Uninitialized("problem"))
    }

    fn allocate_replicas(&mut self, n0: usize, n1: usize, m: usize) {
        let mut replicas = TrotterReplicaState::new(n0, n1, m);
        match &self.pending_x {
            Some(pattern) => replicas.broadcast_bits(&pattern.x0, &pattern.x1),
            None => self.flags.spins = InitState::Unset,
        }
        self.replicas = Some(replicas);
        self.num_trotters = Some(m);
        self.result.clear();
    }

    fn randomize_spins(&mut self) -> Result<(), EngineError> {
        let replicas = self
            .replicas
            .as_mut()
            .ok_or(EngineError::Uninitialized("trotter replicas"))?;
        replicas.randomize(&mut self.random);
        self.pending_x = None;
        Ok(())
    }
}

fn validate_schedule_point<R: Real>(g: R, kt: R) -> Result<(), EngineError> {
    let positive_finite = |v: R| v.is_finite() && v > R::zero();
    if !positive_finite(g) {
        return Err(EngineError::InvalidArgument(format!(
            "transverse field G must be positive and finite, got {}",
            g
        )));
    }
    if !positive_finite(kt) {
        return Err(EngineError::InvalidArgument(format!(
            "temperature kT must be positive and finite, got {}",
            kt
        )));
    }
    Ok(())
}

/// Metropolis sweep over one partition.
///
/// `q_anneal` is `m x N`, `q_fixed` is `m x K` and `op(j)` is `N x K`, so that
/// `op(j) q_fixedᵗ` holds the coupling field of every site in every replica.
#[allow(clippy::too_many_arguments)]
fn anneal_half_step<R: Real>(
    la: &mut dyn LinearAlgebra<R>,
    random: &mut Random,
    q_anneal: &mut Matrix<R>,
    h: &Vector<R>,
    j: &Matrix<R>,
    op_j: MatrixOp,
    q_fixed: &Matrix<R>,
    g: R,
    kt: R,
) -> Result<(), LinalgError> {
    let (m, n) = (q_anneal.rows(), q_anneal.cols());
    let mut de_mat = la.scratch().matrix(Dim::new(n, m));
    if let Err(e) = la.mm_product(&mut de_mat, R::one(), j, op_j, q_fixed, MatrixOp::Transpose) {
        la.scratch().recycle_matrix(de_mat);
        return Err(e);
    }

    let m_real = R::from_count(m);
    let two_div_m = R::from_constant(2.0) / m_real;
    let temp_coef = (g / kt / m_real).tanh().ln() / kt;
    let inv_kt = R::one() / kt;

    for _ in 0..n * m {
        let iq = random.rand_int(n);
        let im = random.rand_int(m);
        let q = q_anneal[(im, iq)];
        let mut delta_e = -two_div_m * q * (h[iq] + de_mat[(iq, im)]);
        let prev = (im + m - 1) % m;
        let next = (im + 1) % m;
        delta_e -= q * (q_anneal[(prev, iq)] + q_anneal[(next, iq)]) * temp_coef;
        if metropolis_accepts(delta_e, inv_kt, random.random()) {
            q_anneal[(im, iq)] = -q;
        }
    }
    la.scratch().recycle_matrix(de_mat);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::linalg::host::HostMath;

    fn annealer() -> BipartiteGraphAnnealer<f64> {
        BipartiteGraphAnnealer::with_engine(Box::new(HostMath::<f64>::new()))
    }

    fn small_problem() -> (Vector<f64>, Vector<f64>, Matrix<f64>) {
        (
            Vector::from_vec(vec![1.0, -1.0, 0.5]),
            Vector::from_vec(vec![-0.5, 2.0]),
            Matrix::from_rows(&[vec![1.0, -2.0, 0.0], vec![0.5, 1.0, -1.0]]).unwrap(),
        )
    }

    fn with_problem() -> BipartiteGraphAnnealer<f64> {
        let (b0, b1, w) = small_problem();
        let mut a = annealer();
        a.set_problem(&b0, &b1, &w, OptimizeDirection::Minimize).unwrap();
        a
    }

    #[test]
    fn metropolis_threshold_boundaries() {
        assert_eq!(metropolis_threshold(-1e-9, 1.0), 1.0);
        assert_eq!(metropolis_threshold(0.0, 1.0), 1.0);
        assert!((metropolis_threshold(2.0, 0.5) - (-1.0f64).exp()).abs() < 1e-15);
        assert!(!metropolis_accepts(0.0, 1.0, 1.0));
        assert!(metropolis_accepts(-1.0, 1.0, 0.999));
        assert!(!metropolis_accepts(1.0, 1.0, (-1.0f64).exp()));
    }

    #[test]
    fn zero_trotters_is_rejected() {
        let mut a = with_problem();
        assert!(matches!(a.set_num_trotters(0), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn operations_before_problem_are_uninitialized() {
        let mut a = annealer();
        assert!(matches!(a.set_num_trotters(2), Err(EngineError::Uninitialized(_))));
        assert!(matches!(a.init_anneal(), Err(EngineError::Uninitialized(_))));
        assert!(matches!(a.randomize_q(), Err(EngineError::Uninitialized(_))));
        assert!(matches!(a.get_hjc(), Err(EngineError::Uninitialized("problem"))));
    }

    #[test]
    fn anneal_before_init_is_uninitialized() {
        let mut a = with_problem();
        a.set_num_trotters(2).unwrap();
        assert!(matches!(a.anneal_one_step(1.0, 1.0), Err(EngineError::Uninitialized(_))));
    }

    #[test]
    fn non_positive_schedule_point_is_rejected() {
        let mut a = with_problem();
        a.init_anneal().unwrap();
        assert!(matches!(a.anneal_one_step(0.0, 1.0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(a.anneal_one_step(1.0, -1.0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(a.anneal_one_step(f64::NAN, 1.0), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn mismatched_problem_shape_leaves_state_untouched() {
        let (b0, b1, _) = small_problem();
        let mut a = with_problem();
        let wrong = Matrix::zeros(3, 2);
        let err = a.set_problem(&b0, &b1, &wrong, OptimizeDirection::Minimize);
        assert!(matches!(err, Err(EngineError::Linalg { .. })));
        assert_eq!(a.get_problem_size().unwrap(), (3, 2, 0));
    }

    #[test]
    fn set_x_validates_and_broadcasts_each_partition() {
        let mut a = with_problem();
        assert!(matches!(a.set_x(&[1, 0], &[1, 0]), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(a.set_x(&[1, 0, 2], &[1, 0]), Err(EngineError::InvalidArgument(_))));

        a.set_x(&[1, 0, 1], &[0, 1]).unwrap();
        a.set_num_trotters(3).unwrap();
        a.init_anneal().unwrap();
        a.sync_bits().unwrap();
        assert_eq!(a.get_x().len(), 3);
        for pair in a.get_x() {
            assert_eq!(pair, &BitsPair::new(vec![1, 0, 1], vec![0, 1]));
        }
        assert_eq!(a.lifecycle().spins, InitState::Explicit);
    }

    #[test]
    fn init_anneal_picks_defaults_and_is_idempotent() {
        let mut a = with_problem();
        a.init_anneal().unwrap();
        // max(1, (3 + 2) / 4) = 1
        assert_eq!(a.get_problem_size().unwrap(), (3, 2, 1));
        let flags = a.lifecycle();
        assert_eq!(flags.seed, InitState::Defaulted);
        assert_eq!(flags.trotters, InitState::Defaulted);
        assert_eq!(flags.spins, InitState::Defaulted);

        a.sync_bits().unwrap();
        let before = a.get_q().clone();
        a.init_anneal().unwrap();
        a.sync_bits().unwrap();
        assert_eq!(a.get_q(), &before);
    }

    #[test]
    fn set_problem_keeps_trotter_count_and_resets_spins() {
        let mut a = with_problem();
        a.seed(5);
        a.set_num_trotters(4).unwrap();
        a.init_anneal().unwrap();

        let b0 = Vector::from_vec(vec![1.0]);
        let b1 = Vector::from_vec(vec![1.0, 1.0]);
        let w = Matrix::zeros(2, 1);
        a.set_problem(&b0, &b1, &w, OptimizeDirection::Maximize).unwrap();
        assert_eq!(a.get_problem_size().unwrap(), (1, 2, 4));
        assert_eq!(a.lifecycle().spins, InitState::Unset);
        assert_eq!(a.lifecycle().trotters, InitState::Explicit);
        assert!(a.get_x().is_empty());
        assert!(matches!(a.anneal_one_step(1.0, 1.0), Err(EngineError::Uninitialized(_))));
    }

    #[test]
    fn configured_trotters_are_allocated_with_the_problem() {
        let config = crate::engine::config::AnnealerConfigBuilder::new()
            .backend(Backend::Host)
            .num_trotters(3)
            .build()
            .unwrap();
        let mut a = BipartiteGraphAnnealer::<f64>::with_config(&config).unwrap();
        assert!(a.get_e().is_err());

        let (b0, b1, w) = small_problem();
        a.set_problem(&b0, &b1, &w, OptimizeDirection::Minimize).unwrap();
        assert_eq!(a.get_e().unwrap().len(), 3);

        a.init_anneal().unwrap();
        assert_eq!(a.get_problem_size().unwrap(), (3, 2, 3));
        assert_eq!(a.lifecycle().trotters, InitState::Explicit);
        a.fin_anneal().unwrap();
        assert_eq!(a.get_q().len(), 3);
    }

    #[test]
    fn energies_track_spin_mutations() {
        let mut a = with_problem();
        a.seed(1);
        a.set_num_trotters(2).unwrap();
        a.init_anneal().unwrap();
        assert!(!a.energies_valid());

        a.fin_anneal().unwrap();
        assert!(a.energies_valid());
        assert_eq!(a.get_e().unwrap().len(), 2);

        a.anneal_one_step(0.5, 0.1).unwrap();
        assert!(!a.energies_valid());
        a.calculate_e().unwrap();
        assert!(a.energies_valid());
    }

    #[test]
    fn reported_energy_matches_qubo_energy_of_snapshot() {
        let (b0, b1, w) = small_problem();
        for direction in [OptimizeDirection::Minimize, OptimizeDirection::Maximize] {
            let mut a = annealer();
            a.set_problem(&b0, &b1, &w, direction).unwrap();
            a.seed(17);
            a.set_num_trotters(3).unwrap();
            a.init_anneal().unwrap();
            for _ in 0..5 {
                a.anneal_one_step(0.7, 0.3).unwrap();
            }
            a.fin_anneal().unwrap();

            let mut la = HostMath::<f64>::new();
            let energies = a.get_e().unwrap().to_vec();
            for (k, pair) in a.get_x().iter().enumerate() {
                let expected =
                    formulation::calculate_qubo_energy(&mut la, &b0, &b1, &w, &pair.x0, &pair.x1)
                        .unwrap();
                assert!((energies[k] - expected).abs() < 1e-12);
            }
        }
    }
}
