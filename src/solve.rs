use crate::anneal::{random_state, Annealer};
use crate::compiled::CompiledModel;
use crate::VarType;
use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
	#[error("model has no variables to anneal")]
	EmptyModel,
	#[error("reads must be at least 1")]
	NoReads,
}

/// Best decoded sample of a solver run: energy, assignment, and the labels of
/// the constraints the assignment violates.
#[derive(Clone, Debug)]
pub struct Solution<Tq>
where
	Tq: VarType,
{
	pub energy: f64,
	pub assignment: HashMap<Tq, bool>,
	pub broken: Vec<String>,
}

/// Simulated-annealing sampler over a [`CompiledModel`].
///
/// Runs `reads` independent anneals in parallel and keeps the lowest-energy
/// decoded sample. `sweeps` is the total sweep budget per read, spread over a
/// geometric inverse-temperature schedule of `beta_count` steps.
pub struct SimpleSolver<'a, Tq>
where
	Tq: VarType,
{
	model: &'a CompiledModel<Tq>,
	pub reads: usize,
	pub sweeps: usize,
	pub beta_count: usize,
	pub seed: Option<u64>,
}

impl<'a, Tq> SimpleSolver<'a, Tq>
where
	Tq: VarType,
{
	pub fn new(model: &'a CompiledModel<Tq>) -> Self {
		Self {
			model,
			reads: 10,
			sweeps: 3000,
			beta_count: 100,
			seed: None,
		}
	}

	fn beta_schedule(beta_min: f64, beta_max: f64, count: usize) -> Vec<f64> {
		if count <= 1 {
			return vec![beta_max];
		}
		let r = f64::ln(beta_max / beta_min) / (count as f64 - 1.0);
		(0..count)
			.map(|index| beta_min * f64::exp(index as f64 * r))
			.collect()
	}

	fn beta_range(h: &[f64], neighbors: &[Vec<(usize, f64)>]) -> (f64, f64) {
		let mut min_mag = f64::INFINITY;
		let mut max_flip = f64::NEG_INFINITY;
		for (i, hi) in h.iter().enumerate() {
			let row: f64 = neighbors[i].iter().map(|(_, w)| w.abs()).sum();
			max_flip = max_flip.max(hi.abs() + row);
			for mag in Some(hi.abs())
				.into_iter()
				.chain(neighbors[i].iter().map(|(_, w)| w.abs()))
			{
				if mag > 1.0e-12 && mag < min_mag {
					min_mag = mag;
				}
			}
		}
		if min_mag.is_finite() && max_flip > 0.0 {
			// hottest: the largest flip is accepted with p = 1/2;
			// coldest: the smallest flip survives with p = 1/100
			(f64::ln(2.0) / max_flip, f64::ln(100.0) / min_mag)
		} else {
			(0.1, 1.0)
		}
	}
}

impl<'a, Tq> SimpleSolver<'a, Tq>
where
	Tq: VarType + Send + Sync,
{
	pub fn solve(&self) -> Result<Solution<Tq>, SolveError> {
		let n = self.model.num_variables();
		if n == 0 {
			return Err(SolveError::EmptyModel);
		}
		if self.reads == 0 {
			return Err(SolveError::NoReads);
		}
		let h = self.model.linear().to_vec();
		let neighbors = self.model.neighbors();
		let (beta_min, beta_max) = Self::beta_range(&h, &neighbors);
		let schedule = Self::beta_schedule(beta_min, beta_max, self.beta_count.max(1));
		let sweeps_per_beta = (self.sweeps / self.beta_count.max(1)).max(1);
		let annealer = Annealer::new(sweeps_per_beta, schedule);
		debug!(
			"annealing {} qubits: {} reads, {} sweeps, beta {:.3e}..{:.3e}",
			n, self.reads, self.sweeps, beta_min, beta_max
		);
		let results: Vec<(f64, Vec<bool>)> = (0..self.reads)
			.into_par_iter()
			.map(|read| {
				let mut rng = match self.seed {
					Some(s) => SmallRng::seed_from_u64(
						s ^ (read as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15),
					),
					None => SmallRng::from_entropy(),
				};
				let mut state = random_state(n, &mut rng);
				annealer.run(&mut state, &mut rng, &h, &neighbors);
				(self.model.energy(&state), state)
			})
			.collect();
		let mut best: Option<(f64, Vec<bool>)> = None;
		for (energy, state) in results {
			if best.as_ref().map_or(true, |(e, _)| energy < *e) {
				best = Some((energy, state));
			}
		}
		let (energy, state) = best.ok_or(SolveError::NoReads)?;
		let assignment = self.model.decode(&state);
		let broken = self
			.model
			.unsatisfied(&assignment)
			.into_iter()
			.map(str::to_string)
			.collect();
		Ok(Solution {
			energy,
			assignment,
			broken,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Expr;

	#[test]
	fn finds_the_penalized_optimum() {
		// 3a + 2b + 2c + 2ac with exactly two of a, b, c set (placeholder M)
		let m = Expr::Placeholder("M".to_string());
		let h: Expr<&str> = Expr::Binary("a") * 3
			+ Expr::Binary("b") * 2
			+ Expr::Binary("c") * 2
			+ Expr::Binary("a") * Expr::Binary("c") * 2
			+ m * Expr::Constraint {
				label: "a+b+c=2".to_string(),
				expr: Box::new(
					(Expr::Binary("a") + Expr::Binary("b") + Expr::Binary("c") - 2) ^ 2,
				),
			};
		let dict = vec![("M".to_string(), 20.0)].into_iter().collect();
		let compiled = h.feed_dict(&dict).compile().unwrap();
		let mut solver = SimpleSolver::new(&compiled);
		solver.seed = Some(1);
		let best = solver.solve().unwrap();
		assert!(best.broken.is_empty());
		assert!((best.energy - 4.0).abs() < 1e-9);
		assert_eq!(best.assignment[&"a"], false);
		assert_eq!(best.assignment[&"b"], true);
		assert_eq!(best.assignment[&"c"], true);
	}

	#[test]
	fn empty_model_is_rejected() {
		let compiled = Expr::<&str>::Number(3).compile().unwrap();
		let solver = SimpleSolver::new(&compiled);
		assert_eq!(solver.solve().unwrap_err(), SolveError::EmptyModel);
	}
}
