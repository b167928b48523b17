use crate::expr::{CompileError, Expr};
use crate::poly::Poly;
use crate::VarType;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A labeled constraint sub-expression. The expression evaluates to zero
/// exactly when the constraint is satisfied.
#[derive(Clone, Debug)]
pub struct Constraint<Tq>
where
	Tq: VarType,
{
	pub label: String,
	expr: Expr<Tq>,
}

impl<Tq> Constraint<Tq>
where
	Tq: VarType,
{
	pub(crate) fn new(label: String, expr: Expr<Tq>) -> Self {
		Self { label, expr }
	}

	pub fn is_satisfied(&self, map: &HashMap<Tq, bool>) -> bool {
		match self.expr.evaluate(map) {
			Some(v) => v.abs() < 1.0e-4,
			// indeterminate constraints are not reported as broken
			None => true,
		}
	}
}

/// Quadratic model produced by [`Expr::compile`].
///
/// Variables are kept in sorted order, so the index of a given label is
/// stable across compilations of the same expression and a sampled state can
/// be decoded back to labels.
#[derive(Clone, Debug)]
pub struct CompiledModel<Tq>
where
	Tq: VarType,
{
	vars: Vec<Tq>,
	index: HashMap<Tq, usize>,
	offset: f64,
	linear: Vec<f64>,
	quadratic: BTreeMap<(usize, usize), f64>,
	constraints: Vec<Constraint<Tq>>,
}

impl<Tq> CompiledModel<Tq>
where
	Tq: VarType,
{
	pub(crate) fn new(
		poly: Poly<Tq>,
		constraints: Vec<Constraint<Tq>>,
	) -> Result<Self, CompileError> {
		let vars: Vec<Tq> = poly
			.iter()
			.flat_map(|(m, _)| m.iter().cloned())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();
		let index: HashMap<Tq, usize> = vars
			.iter()
			.cloned()
			.enumerate()
			.map(|(i, v)| (v, i))
			.collect();
		let mut offset = 0.0;
		let mut linear = vec![0.0; vars.len()];
		let mut quadratic = BTreeMap::new();
		for (m, c) in poly.iter() {
			let mut ix = m.iter().map(|v| index[v]);
			match m.len() {
				0 => offset += c,
				1 => {
					if let Some(i) = ix.next() {
						linear[i] += c;
					}
				}
				2 => {
					if let (Some(i), Some(j)) = (ix.next(), ix.next()) {
						let key = (i.min(j), i.max(j));
						*quadratic.entry(key).or_insert(0.0) += c;
					}
				}
				d => return Err(CompileError::DegreeTooHigh(d)),
			}
		}
		Ok(Self {
			vars,
			index,
			offset,
			linear,
			quadratic,
			constraints,
		})
	}

	pub fn variables(&self) -> &[Tq] {
		&self.vars
	}

	pub fn num_variables(&self) -> usize {
		self.vars.len()
	}

	pub fn index_of(&self, v: &Tq) -> Option<usize> {
		self.index.get(v).copied()
	}

	pub fn offset(&self) -> f64 {
		self.offset
	}

	pub fn linear(&self) -> &[f64] {
		&self.linear
	}

	pub fn quadratic(&self) -> &BTreeMap<(usize, usize), f64> {
		&self.quadratic
	}

	pub fn constraints(&self) -> &[Constraint<Tq>] {
		&self.constraints
	}

	/// Energy of a raw state indexed like [`CompiledModel::variables`].
	pub fn energy(&self, state: &[bool]) -> f64 {
		let mut energy = self.offset;
		for (i, h) in self.linear.iter().enumerate() {
			if state[i] {
				energy += h;
			}
		}
		for ((i, j), c) in self.quadratic.iter() {
			if state[*i] && state[*j] {
				energy += c;
			}
		}
		energy
	}

	/// Map a raw state back to the variable labels.
	pub fn decode(&self, state: &[bool]) -> HashMap<Tq, bool> {
		self.vars
			.iter()
			.cloned()
			.zip(state.iter().copied())
			.collect()
	}

	/// Labels of constraints violated by the assignment.
	pub fn unsatisfied(&self, map: &HashMap<Tq, bool>) -> Vec<&str> {
		self.constraints
			.iter()
			.filter(|c| !c.is_satisfied(map))
			.map(|c| c.label.as_str())
			.collect()
	}

	/// Symmetric adjacency view of the quadratic part, sorted by neighbor
	/// index, for the annealing kernel.
	pub(crate) fn neighbors(&self) -> Vec<Vec<(usize, f64)>> {
		let mut ret = vec![Vec::new(); self.vars.len()];
		for ((i, j), c) in self.quadratic.iter() {
			ret[*i].push((*j, *c));
			ret[*j].push((*i, *c));
		}
		for v in ret.iter_mut() {
			v.sort_by_key(|(j, _)| *j);
		}
		ret
	}
}
