//! `ucplace` formulates the unconstrained cell placement (UCP) problem as a
//! QUBO and solves it with a simulated annealer.
//!
//! An instance file declares cell/position counts and weighted relations; the
//! loader turns it into an [`instance::Instance`], the assembler folds the
//! relations into a penalty-weighted polynomial over a cell x position grid of
//! binary variables, and the compiled quadratic model is handed to the
//! annealing solver.
//!
//! # Examples
//!
//! ## Expressions
//! ```
//! # use ucplace::Expr;
//! let hmlt: Expr<&str> = (Expr::Binary("a") + Expr::Binary("b") - 1) ^ 2;
//! let compiled = hmlt.compile().unwrap();
//! assert_eq!(compiled.variables(), &["a", "b"]);
//! ```
//!
//! ## End to end
//! ```
//! # use ucplace::instance::{Instance, ParseMode};
//! # use ucplace::placement::Placement;
//! # use ucplace::solve::SimpleSolver;
//! let text = "CellNum: 2\nPositionNum: 2\nmax_weight: 10\ncell_pad: 3.0 0\n";
//! let inst = Instance::from_reader(text.as_bytes(), ParseMode::Tagged).unwrap();
//! let placement = Placement::new(&inst).unwrap();
//! let compiled = placement.hamiltonian().compile().unwrap();
//! let mut solver = SimpleSolver::new(&compiled);
//! solver.seed = Some(7);
//! let best = solver.solve().unwrap();
//! assert!(best.broken.is_empty());
//! ```

use std::fmt::Debug;
use std::hash::Hash;

/// Bound for types usable as decision-variable labels.
pub trait VarType: Clone + Eq + Hash + Ord + Debug {}
impl<T> VarType for T where T: Clone + Eq + Hash + Ord + Debug {}

mod anneal;
mod compiled;
mod expr;
pub mod instance;
pub mod placement;
mod poly;
pub mod solve;

pub use compiled::{CompiledModel, Constraint};
pub use expr::{CompileError, Expr};
