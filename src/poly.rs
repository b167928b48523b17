use crate::VarType;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign, Mul};

const EPS: f64 = 1.0e-12;

/// A monomial is a set of variable labels: `q * q = q` for binary variables,
/// so multiplicity never matters.
pub(crate) type Monomial<Tq> = BTreeSet<Tq>;

/// Expanded multilinear polynomial with plain `f64` coefficients.
///
/// The map is ordered so that variable collection and QUBO emission are
/// deterministic for a given input expression.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Poly<Tq>
where
	Tq: VarType,
{
	terms: BTreeMap<Monomial<Tq>, f64>,
}

impl<Tq> Poly<Tq>
where
	Tq: VarType,
{
	pub fn new() -> Self {
		Self {
			terms: BTreeMap::new(),
		}
	}

	pub fn constant(c: f64) -> Self {
		let mut p = Self::new();
		p.add_term(Monomial::new(), c);
		p
	}

	pub fn var(v: Tq) -> Self {
		let mut p = Self::new();
		p.add_term(Some(v).into_iter().collect(), 1.0);
		p
	}

	pub fn add_term(&mut self, m: Monomial<Tq>, c: f64) {
		use std::collections::btree_map::Entry;
		match self.terms.entry(m) {
			Entry::Occupied(mut e) => {
				*e.get_mut() += c;
				if e.get().abs() < EPS {
					e.remove();
				}
			}
			Entry::Vacant(e) => {
				if c.abs() >= EPS {
					e.insert(c);
				}
			}
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Monomial<Tq>, f64)> {
		self.terms.iter().map(|(m, c)| (m, *c))
	}
}

impl<Tq> Add for Poly<Tq>
where
	Tq: VarType,
{
	type Output = Self;
	fn add(mut self, other: Self) -> Self {
		self += other;
		self
	}
}

impl<Tq> AddAssign for Poly<Tq>
where
	Tq: VarType,
{
	fn add_assign(&mut self, other: Self) {
		for (m, c) in other.terms {
			self.add_term(m, c);
		}
	}
}

impl<Tq> Mul for Poly<Tq>
where
	Tq: VarType,
{
	type Output = Self;
	fn mul(self, other: Self) -> Self {
		let mut ret = Self::new();
		for (ma, ca) in self.terms.iter() {
			for (mb, cb) in other.terms.iter() {
				let m = ma.union(mb).cloned().collect();
				ret.add_term(m, ca * cb);
			}
		}
		ret
	}
}

impl<Tq> Mul<f64> for Poly<Tq>
where
	Tq: VarType,
{
	type Output = Self;
	fn mul(mut self, other: f64) -> Self {
		for c in self.terms.values_mut() {
			*c *= other;
		}
		self
	}
}
