use crate::expr::Expr;
use crate::instance::Instance;
use std::fmt;
use thiserror::Error;

/// One binary decision variable of the placement grid: `x[cell][position]`
/// is 1 iff the cell is assigned to the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaceVar {
	pub cell: usize,
	pub position: usize,
}

impl fmt::Display for PlaceVar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "x[{}][{}]", self.cell, self.position)
	}
}

#[derive(Debug, Error, PartialEq)]
pub enum AssembleError {
	#[error("cell_pad edge references q[{index}] but the grid has {len} variables")]
	PadEdgeOutOfRange { index: usize, len: usize },
	#[error("cell_cell edge references q[{index}] but the grid has {len} variables")]
	NetEdgeOutOfRange { index: usize, len: usize },
}

/// The assembled decision-variable grid for an instance, with the objective
/// and penalty terms of the placement Hamiltonian.
///
/// The grid is flattened row-major into `q`; edge directives address `q`
/// directly by flat index. Every edge is bounds-checked once at construction,
/// so the term builders cannot fault.
#[derive(Debug)]
pub struct Placement<'a> {
	instance: &'a Instance,
	q: Vec<PlaceVar>,
}

impl<'a> Placement<'a> {
	pub fn new(instance: &'a Instance) -> Result<Self, AssembleError> {
		let mut q = Vec::with_capacity(instance.cells * instance.positions);
		for cell in 0..instance.cells {
			for position in 0..instance.positions {
				q.push(PlaceVar { cell, position });
			}
		}
		for e in instance.cell_pad.iter() {
			if e.cell >= q.len() {
				return Err(AssembleError::PadEdgeOutOfRange {
					index: e.cell,
					len: q.len(),
				});
			}
		}
		for e in instance.cell_cell.iter() {
			for index in [e.a, e.b].iter().copied() {
				if index >= q.len() {
					return Err(AssembleError::NetEdgeOutOfRange {
						index,
						len: q.len(),
					});
				}
			}
		}
		Ok(Self { instance, q })
	}

	/// Row-major flattened view of the grid.
	pub fn flat(&self) -> &[PlaceVar] {
		&self.q
	}

	pub fn grid(&self, cell: usize, position: usize) -> PlaceVar {
		self.q[cell * self.instance.positions + position]
	}

	fn var(&self, flat: usize) -> Expr<PlaceVar> {
		Expr::Binary(self.q[flat])
	}

	// constraint scale: twice the instance's max edge weight
	fn penalty(&self) -> f64 {
		2.0 * self.instance.max_weight
	}

	/// Cell-to-pad objective: weighted sum over flat indices. `q^2 = q` for
	/// binaries, so the variable is used directly.
	pub fn ha(&self) -> Expr<PlaceVar> {
		self.instance
			.cell_pad
			.iter()
			.fold(Expr::Number(0), |h, e| h + e.weight.0 * self.var(e.cell))
	}

	/// Cell-to-cell objective: weighted products over flat index pairs.
	pub fn hb(&self) -> Expr<PlaceVar> {
		self.instance
			.cell_cell
			.iter()
			.fold(Expr::Number(0), |h, e| {
				h + e.weight.0 * self.var(e.a) * self.var(e.b)
			})
	}

	/// One-position-per-cell penalty: for every cell, `(sum_j x[i][j] - 1)^2`
	/// is zero iff the cell occupies exactly one position.
	pub fn hc(&self) -> Expr<PlaceVar> {
		(0..self.instance.cells).fold(Expr::Number(0), |h, cell| {
			let row = (0..self.instance.positions).fold(Expr::Number(-1), |e, position| {
				e + Expr::Binary(self.grid(cell, position))
			});
			h + self.penalty()
				* Expr::Constraint {
					label: format!("cell{} in different positions", cell),
					expr: Box::new(row ^ 2),
				}
		})
	}

	/// At-most-one-cell-per-position penalty: for every position, the sum of
	/// pairwise products down the column is zero iff no two cells share it.
	pub fn hd(&self) -> Expr<PlaceVar> {
		(0..self.instance.positions).fold(Expr::Number(0), |h, position| {
			let mut column = Expr::Number(0);
			for j in 0..self.instance.cells {
				for k in j + 1..self.instance.cells {
					column += Expr::Binary(self.grid(j, position))
						* Expr::Binary(self.grid(k, position));
				}
			}
			h + self.penalty()
				* Expr::Constraint {
					label: format!("number of cell for position{}", position),
					expr: Box::new(column),
				}
		})
	}

	/// The full objective handed to the compiler: `HA + HB + HC + HD`.
	pub fn hamiltonian(&self) -> Expr<PlaceVar> {
		self.ha() + self.hb() + self.hc() + self.hd()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::instance::ParseMode;
	use std::collections::HashMap;

	fn parse(text: &str) -> Instance {
		Instance::from_reader(text.as_bytes(), ParseMode::Tagged).unwrap()
	}

	fn small() -> Instance {
		parse("CellNum: 2\nPositionNum: 2\nmax_weight: 10\ncell_pad: 1.0 0\ncell_pad: 2.0 3\n")
	}

	#[test]
	fn grid_flattens_row_major() {
		let inst = parse("CellNum: 3\nPositionNum: 4\nmax_weight: 1\n");
		let placement = Placement::new(&inst).unwrap();
		assert_eq!(placement.flat().len(), 12);
		for cell in 0..3 {
			for position in 0..4 {
				assert_eq!(
					placement.flat()[cell * 4 + position],
					placement.grid(cell, position)
				);
			}
		}
		assert_eq!(placement.grid(1, 2).to_string(), "x[1][2]");
	}

	#[test]
	fn ha_is_the_weighted_flat_sum() {
		let inst = small();
		let placement = Placement::new(&inst).unwrap();
		// HA = 1.0 * q0 + 2.0 * q3
		let compiled = placement.ha().compile().unwrap();
		assert_eq!(
			compiled.variables(),
			&[
				PlaceVar {
					cell: 0,
					position: 0
				},
				PlaceVar {
					cell: 1,
					position: 1
				},
			]
		);
		assert_eq!(compiled.linear(), &[1.0, 2.0]);
		assert!(compiled.quadratic().is_empty());
	}

	#[test]
	fn hc_vanishes_when_each_cell_sits_in_one_position() {
		let inst = small();
		let placement = Placement::new(&inst).unwrap();
		let mut map = HashMap::new();
		for cell in 0..2 {
			for position in 0..2 {
				map.insert(placement.grid(cell, position), cell == position);
			}
		}
		assert_eq!(placement.hc().evaluate(&map), Some(0.0));
		// cell 0 in two positions at once
		map.insert(placement.grid(0, 1), true);
		let violated = placement.hc().evaluate(&map).unwrap();
		assert!(violated > 0.0);
	}

	#[test]
	fn hd_vanishes_when_no_position_is_shared() {
		let inst = small();
		let placement = Placement::new(&inst).unwrap();
		let mut map = HashMap::new();
		for cell in 0..2 {
			for position in 0..2 {
				map.insert(placement.grid(cell, position), cell == position);
			}
		}
		assert_eq!(placement.hd().evaluate(&map), Some(0.0));
		// both cells on position 0
		map.insert(placement.grid(1, 0), true);
		map.insert(placement.grid(1, 1), false);
		assert_eq!(placement.hd().evaluate(&map), Some(20.0));
	}

	#[test]
	fn constraint_labels_match_the_report_format() {
		let inst = small();
		let placement = Placement::new(&inst).unwrap();
		let compiled = placement.hamiltonian().compile().unwrap();
		let labels: Vec<&str> = compiled.constraints().iter().map(|c| c.label.as_str()).collect();
		assert_eq!(
			labels,
			vec![
				"cell0 in different positions",
				"cell1 in different positions",
				"number of cell for position0",
				"number of cell for position1",
			]
		);
	}

	#[test]
	fn out_of_range_edges_are_rejected() {
		let inst = parse("CellNum: 2\nPositionNum: 2\nmax_weight: 1\ncell_pad: 1.0 4\n");
		assert_eq!(
			Placement::new(&inst).unwrap_err(),
			AssembleError::PadEdgeOutOfRange { index: 4, len: 4 }
		);
		let inst = parse("CellNum: 2\nPositionNum: 2\nmax_weight: 1\ncell_cell: 1.0 0 7\n");
		assert_eq!(
			Placement::new(&inst).unwrap_err(),
			AssembleError::NetEdgeOutOfRange { index: 7, len: 4 }
		);
	}

	#[test]
	fn model_energy_agrees_with_expression_value() {
		let inst = parse(
			"CellNum: 2\nPositionNum: 2\nmax_weight: 3\ncell_pad: 1.5 0\ncell_cell: 2.0 0 3\n",
		);
		let placement = Placement::new(&inst).unwrap();
		let h = placement.hamiltonian();
		let compiled = h.clone().compile().unwrap();
		// walk a few assignments through both evaluation paths
		for bits in 0..16u32 {
			let state: Vec<bool> = (0..4).map(|i| bits & (1 << i) != 0).collect();
			let map: HashMap<PlaceVar, bool> = compiled.decode(&state);
			let direct = h.evaluate(&map).unwrap();
			assert!((direct - compiled.energy(&state)).abs() < 1e-9);
		}
	}
}
