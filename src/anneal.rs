use rand::Rng;

// exp(-x) underflows to a never-accepted probability around here
const FLIP_CUTOFF: f64 = 44.36142;

pub(crate) fn random_state<R: Rng>(len: usize, rng: &mut R) -> Vec<bool> {
	(0..len).map(|_| rng.gen::<bool>()).collect()
}

/// Single-flip Metropolis annealer over a QUBO given as linear terms plus a
/// symmetric neighbor list. Flip costs are maintained incrementally, so one
/// sweep is O(variables + couplings touched).
#[derive(Clone)]
pub(crate) struct Annealer {
	pub sweeps_per_beta: usize,
	pub beta_schedule: Vec<f64>,
}

impl Annealer {
	pub fn new(sweeps_per_beta: usize, beta_schedule: Vec<f64>) -> Self {
		Self {
			sweeps_per_beta,
			beta_schedule,
		}
	}

	pub fn run<R: Rng>(
		&self,
		state: &mut [bool],
		rng: &mut R,
		h: &[f64],
		neighbors: &[Vec<(usize, f64)>],
	) {
		assert_eq!(state.len(), h.len());
		assert_eq!(state.len(), neighbors.len());
		// flip_cost[i] is the energy change of flipping qubit i right now
		let mut flip_cost: Vec<f64> = (0..state.len())
			.map(|i| {
				let mut d = h[i];
				for (j, w) in neighbors[i].iter() {
					if state[*j] {
						d += w;
					}
				}
				if state[i] {
					-d
				} else {
					d
				}
			})
			.collect();
		for beta in self.beta_schedule.iter() {
			let threshold = FLIP_CUTOFF / beta;
			for _ in 0..self.sweeps_per_beta {
				for i in 0..state.len() {
					let d = flip_cost[i];
					if d > threshold {
						continue;
					}
					if d <= 0.0 || f64::exp(-d * beta) > rng.gen_range(0.0, 1.0) {
						state[i] = !state[i];
						for &(j, w) in neighbors[i].iter() {
							if state[i] != state[j] {
								flip_cost[j] += w;
							} else {
								flip_cost[j] -= w;
							}
						}
						flip_cost[i] = -flip_cost[i];
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::SmallRng;
	use rand::SeedableRng;

	#[test]
	fn descends_to_the_unique_minimum() {
		// E = -2 q0 - 2 q1 + 3 q0 q1, minimized at exactly one qubit set
		let h = vec![-2.0, -2.0];
		let neighbors = vec![vec![(1, 3.0)], vec![(0, 3.0)]];
		let annealer = Annealer::new(10, vec![0.1, 1.0, 10.0, 100.0]);
		let mut rng = SmallRng::seed_from_u64(42);
		let mut state = random_state(2, &mut rng);
		annealer.run(&mut state, &mut rng, &h, &neighbors);
		assert_ne!(state[0], state[1]);
	}
}
