//! Multi-start fitting.
//!
//! Oscillation and resonance fits are sensitive to the starting point. We
//! fit each start independently (parallel) and pick the best one
//! deterministically, so results do not depend on thread scheduling.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;

use crate::domain::{Dataset, FitResult, Parameters};
use crate::error::{FitError, Result};
use crate::fit::fitter::fit;
use crate::fit::solver::SolverOptions;
use crate::models::Model;

/// All per-start results and the index of the best one.
#[derive(Debug, Clone)]
pub struct MultiStartResult {
    pub results: Vec<FitResult>,
    /// Successful fit with the lowest chi-square (ties go to the lower index).
    pub best: Option<usize>,
}

impl MultiStartResult {
    pub fn best_result(&self) -> Option<&FitResult> {
        self.best.map(|i| &self.results[i])
    }
}

/// Fit every start in `starts` and select the best.
pub fn fit_multi_start(
    model: &Model,
    data: &Dataset,
    starts: &[Parameters],
    opts: &SolverOptions,
) -> MultiStartResult {
    let results: Vec<FitResult> = starts
        .par_iter()
        .map(|params| fit(model, data, params, opts))
        .collect();
    let best = select_best(&results);
    MultiStartResult { results, best }
}

fn select_best(results: &[FitResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, r) in results.iter().enumerate() {
        if !r.success || !r.quality.chi_square.is_finite() {
            continue;
        }
        match best {
            None => best = Some(idx),
            Some(b) if r.quality.chi_square < results[b].quality.chi_square => best = Some(idx),
            Some(_) => {}
        }
    }
    best
}

/// `count` starts around `base`: the first is `base` itself, the rest perturb
/// every free parameter by a relative Gaussian jitter of width `spread`.
///
/// Zero-valued parameters are jittered on an absolute scale of `spread`.
/// Perturbed values are clamped into bounds. Same seed, same starts.
pub fn jittered_starts(base: &Parameters, count: usize, spread: f64, seed: u64) -> Result<Vec<Parameters>> {
    let normal = Normal::new(0.0, spread)
        .map_err(|e| FitError::InvalidInput(format!("invalid jitter spread {spread}: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut starts = Vec::with_capacity(count);
    if count == 0 {
        return Ok(starts);
    }
    starts.push(base.clone());

    for _ in 1..count {
        let values: Vec<f64> = base
            .items()
            .iter()
            .map(|p| {
                if !p.vary {
                    return p.value;
                }
                let scale = if p.value == 0.0 { 1.0 } else { p.value.abs() };
                let jittered = p.value + scale * rng.sample(normal);
                jittered.clamp(p.min, p.max)
            })
            .collect();
        let mut start = base.clone();
        start.set_values(&values);
        starts.push(start);
    }
    Ok(starts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    fn decay_data() -> Dataset {
        let t: Vec<f64> = (0..60).map(|i| i as f64 * 0.5e-6).collect();
        let y = ModelKind::ExpDecayFunc.eval(&t, &[8e-6, 1.0, 0.05, 1.0]);
        Dataset { x: t, y }
    }

    #[test]
    fn best_start_is_the_lowest_chi_square() {
        let model = Model::catalog(ModelKind::ExpDecayFunc);
        let data = decay_data();
        let good = model.guess(&data);
        // An out-of-bounds start fails validation and must not be selected.
        let bad = good.clone().with_value("tau", -1.0).unwrap();

        let out = fit_multi_start(&model, &data, &[bad, good], &SolverOptions::default());
        assert_eq!(out.results.len(), 2);
        assert!(!out.results[0].success);
        assert_eq!(out.best, Some(1));
        let best = out.best_result().unwrap();
        assert!((best.value("tau").unwrap() - 8e-6).abs() < 1e-10);
    }

    #[test]
    fn ties_go_to_the_first_start() {
        let model = Model::catalog(ModelKind::ExpDecayFunc);
        let data = decay_data();
        let p = model.guess(&data);
        let out = fit_multi_start(&model, &data, &[p.clone(), p], &SolverOptions::default());
        assert_eq!(out.best, Some(0));
    }

    #[test]
    fn no_successful_start_means_no_best() {
        let model = Model::catalog(ModelKind::ExpDecayFunc);
        let empty = Dataset::real(Vec::new(), Vec::new());
        let out = fit_multi_start(&model, &empty, &[model.make_params()], &SolverOptions::default());
        assert_eq!(out.best, None);
        assert!(out.best_result().is_none());
    }

    #[test]
    fn jitter_is_seeded_and_respects_bounds() {
        let model = Model::catalog(ModelKind::RandomizedBenchmarkingDecay);
        let mut base = model.make_params();
        base.fix("offset").unwrap();

        let a = jittered_starts(&base, 8, 0.5, 7).unwrap();
        let b = jittered_starts(&base, 8, 0.5, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_eq!(a[0], base);
        for start in &a {
            assert!(start.iter().all(|p| p.in_bounds()));
            assert_eq!(start.value("offset"), Some(0.5));
        }
    }

    #[test]
    fn negative_spread_is_rejected() {
        let base = Model::catalog(ModelKind::CosFunc).make_params();
        assert!(jittered_starts(&base, 3, -1.0, 0).is_err());
    }
}
