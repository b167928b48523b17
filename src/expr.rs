use crate::compiled::{CompiledModel, Constraint};
use crate::poly::Poly;
use crate::VarType;
use std::collections::HashMap;
use std::ops::{Add, AddAssign, BitXor, Mul, MulAssign, Neg, Sub, SubAssign};
use thiserror::Error;

/// A symbolic polynomial over binary/spin decision variables.
///
/// Expressions are built with the usual arithmetic operators (plus `^` for an
/// integer power) and compiled down to a [`CompiledModel`]. Constraint
/// sub-expressions carry a label and the convention that they evaluate to zero
/// exactly when the constraint is satisfied.
#[derive(PartialEq, Clone, Debug)]
pub enum Expr<Tq>
where
	Tq: VarType,
{
	Number(i32),
	Float(f64),
	/// Qubit taking values 0 / 1.
	Binary(Tq),
	/// Qubit taking values -1 / +1.
	Spin(Tq),
	/// Named scalar resolved by [`Expr::feed_dict`] before compilation.
	Placeholder(String),
	Add(Box<Self>, Box<Self>),
	Mul(Box<Self>, Box<Self>),
	Constraint { label: String, expr: Box<Self> },
}

#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
	#[error("placeholder `{0}` has no value; feed it before compiling")]
	UnresolvedPlaceholder(String),
	#[error("expression expands to a degree-{0} term; the quadratic model supports at most degree 2")]
	DegreeTooHigh(usize),
}

impl<Tq> Expr<Tq>
where
	Tq: VarType,
{
	/// Substitute placeholder values into the expression tree.
	pub fn feed_dict(self, dict: &HashMap<String, f64>) -> Self {
		match self {
			Self::Placeholder(name) => {
				if let Some(val) = dict.get(&name) {
					Self::Float(*val)
				} else {
					Self::Placeholder(name)
				}
			}
			Self::Add(a, b) => Self::Add(
				Box::new(a.feed_dict(dict)),
				Box::new(b.feed_dict(dict)),
			),
			Self::Mul(a, b) => Self::Mul(
				Box::new(a.feed_dict(dict)),
				Box::new(b.feed_dict(dict)),
			),
			Self::Constraint { label, expr } => Self::Constraint {
				label,
				expr: Box::new(expr.feed_dict(dict)),
			},
			o => o,
		}
	}

	/// Value of the expression under a complete assignment, or `None` when a
	/// placeholder is unfed or a variable is missing from the map.
	pub fn evaluate(&self, map: &HashMap<Tq, bool>) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n as f64),
			Self::Float(f) => Some(*f),
			Self::Binary(v) => map.get(v).map(|b| if *b { 1.0 } else { 0.0 }),
			Self::Spin(v) => map.get(v).map(|b| if *b { 1.0 } else { -1.0 }),
			Self::Placeholder(_) => None,
			Self::Add(a, b) => match (a.evaluate(map), b.evaluate(map)) {
				(Some(a), Some(b)) => Some(a + b),
				_ => None,
			},
			Self::Mul(a, b) => match (a.evaluate(map), b.evaluate(map)) {
				(Some(a), Some(b)) => Some(a * b),
				// a known zero factor settles the product
				(Some(f), None) | (None, Some(f)) if f.abs() < 1.0e-9 => Some(0.0),
				_ => None,
			},
			Self::Constraint { expr, .. } => expr.evaluate(map),
		}
	}

	pub(crate) fn to_poly(
		&self,
		constraints: &mut Vec<Constraint<Tq>>,
	) -> Result<Poly<Tq>, CompileError> {
		match self {
			Self::Number(n) => Ok(Poly::constant(*n as f64)),
			Self::Float(f) => Ok(Poly::constant(*f)),
			Self::Binary(v) => Ok(Poly::var(v.clone())),
			Self::Spin(v) => Ok(Poly::var(v.clone()) * 2.0 + Poly::constant(-1.0)),
			Self::Placeholder(name) => Err(CompileError::UnresolvedPlaceholder(name.clone())),
			Self::Add(a, b) => Ok(a.to_poly(constraints)? + b.to_poly(constraints)?),
			Self::Mul(a, b) => Ok(a.to_poly(constraints)? * b.to_poly(constraints)?),
			Self::Constraint { label, expr } => {
				constraints.push(Constraint::new(label.clone(), (**expr).clone()));
				expr.to_poly(constraints)
			}
		}
	}

	/// Expand to a quadratic model, collecting labeled constraints along the
	/// way. Fails when a placeholder is unfed or the expansion exceeds
	/// degree 2.
	pub fn compile(self) -> Result<CompiledModel<Tq>, CompileError> {
		let mut constraints = Vec::new();
		let poly = self.to_poly(&mut constraints)?;
		CompiledModel::new(poly, constraints)
	}

	#[inline]
	fn add(self, other: Self) -> Self {
		Self::Add(Box::new(self), Box::new(other))
	}

	#[inline]
	fn sub(self, other: Self) -> Self {
		self.add(-other)
	}

	#[inline]
	fn mul(self, other: Self) -> Self {
		Self::Mul(Box::new(self), Box::new(other))
	}
}

impl<Tq> From<i32> for Expr<Tq>
where
	Tq: VarType,
{
	#[inline]
	fn from(n: i32) -> Self {
		Expr::Number(n)
	}
}

impl<Tq> From<f64> for Expr<Tq>
where
	Tq: VarType,
{
	#[inline]
	fn from(f: f64) -> Self {
		Expr::Float(f)
	}
}

impl<Tq> Neg for Expr<Tq>
where
	Tq: VarType,
{
	type Output = Self;
	#[inline]
	fn neg(self) -> Self::Output {
		Self::Mul(Box::new(Expr::Number(-1)), Box::new(self))
	}
}

macro_rules! impl_binary_op_inner {
	($trait:ident, $fun:ident, $lhs:ty, $rhs:ty) => {
		impl<Tq> $trait<$rhs> for $lhs
		where
			Tq: VarType,
		{
			type Output = Expr<Tq>;
			#[inline]
			fn $fun(self, other: $rhs) -> Self::Output {
				Expr::$fun(
					<$lhs as Into<Self::Output>>::into(self),
					<$rhs as Into<Self::Output>>::into(other),
				)
			}
		}
	};
}

macro_rules! impl_binary_op {
	($trait:ident, $fun:ident) => {
		impl_binary_op_inner!($trait, $fun, Expr<Tq>, Self);
		impl_binary_op_inner!($trait, $fun, Expr<Tq>, i32);
		impl_binary_op_inner!($trait, $fun, Expr<Tq>, f64);
		impl_binary_op_inner!($trait, $fun, i32, Expr<Tq>);
		impl_binary_op_inner!($trait, $fun, f64, Expr<Tq>);
	};
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl<Tq> BitXor<usize> for Expr<Tq>
where
	Tq: VarType,
{
	type Output = Self;
	#[inline]
	fn bitxor(self, other: usize) -> Self {
		let mut hmlt = Expr::Number(1);
		for _ in 0..other {
			hmlt *= self.clone();
		}
		hmlt
	}
}

macro_rules! impl_assign_op {
	($trait:ident, $fun:ident, $op_trait:ident, $op_fun:ident) => {
		impl<Tq, R> $trait<R> for Expr<Tq>
		where
			Tq: VarType,
			R: Into<Expr<Tq>>,
		{
			#[inline]
			fn $fun(&mut self, other: R) {
				let lhs = std::mem::replace(self, Expr::Number(0));
				*self = $op_trait::$op_fun(lhs, other.into());
			}
		}
	};
}

impl_assign_op!(AddAssign, add_assign, Add, add);
impl_assign_op!(SubAssign, sub_assign, Sub, sub);
impl_assign_op!(MulAssign, mul_assign, Mul, mul);
