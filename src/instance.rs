use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Edge weight with total order and hash, so weighted edges live in sets and
/// duplicate directive lines collapse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight(pub f64);

impl Eq for Weight {}

impl PartialOrd for Weight {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Weight {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.0.total_cmp(&other.0)
	}
}

impl Hash for Weight {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.to_bits().hash(state);
	}
}

impl From<f64> for Weight {
	fn from(f: f64) -> Self {
		Self(f)
	}
}

impl fmt::Display for Weight {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Weighted cell-to-pad relation. `cell` addresses the flattened variable
/// sequence of the placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PadEdge {
	pub weight: Weight,
	pub cell: usize,
}

/// Weighted cell-to-cell relation, again over flattened indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetEdge {
	pub weight: Weight,
	pub a: usize,
	pub b: usize,
}

/// Line format of the instance file.
///
/// `Tagged` requires every line to start with a known directive tag. `Mixed`
/// is the benchmark variant where a line without a recognized tag is an
/// untagged cell-to-cell edge (`weight a b`). The fallback only exists in
/// `Mixed`; in `Tagged` an unknown tag is an error rather than a silently
/// misparsed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
	Tagged,
	Mixed,
}

#[derive(Debug, Error)]
pub enum ParseError {
	#[error("line {line}: `{tag}` needs at least {needed} fields")]
	MissingField {
		line: usize,
		tag: String,
		needed: usize,
	},
	#[error("line {line}: bad number `{token}` in `{tag}` directive")]
	BadNumber {
		line: usize,
		tag: String,
		token: String,
	},
	#[error("line {line}: unknown directive `{tag}`")]
	UnknownTag { line: usize, tag: String },
	#[error(transparent)]
	Io(#[from] io::Error),
}

/// A parsed cell-placement instance. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
	pub cells: usize,
	pub positions: usize,
	pub pads: usize,
	pub max_weight: f64,
	pub cell_pad: BTreeSet<PadEdge>,
	pub cell_cell: BTreeSet<NetEdge>,
}

fn field<'a>(
	tokens: &'a [&str],
	pos: usize,
	line: usize,
	tag: &str,
) -> Result<&'a str, ParseError> {
	tokens.get(pos).copied().ok_or_else(|| ParseError::MissingField {
		line,
		tag: tag.to_string(),
		needed: pos,
	})
}

fn number<T: FromStr>(token: &str, line: usize, tag: &str) -> Result<T, ParseError> {
	token.parse().map_err(|_| ParseError::BadNumber {
		line,
		tag: tag.to_string(),
		token: token.to_string(),
	})
}

impl Instance {
	/// Parse an instance from a line-oriented reader. Directives update one
	/// running accumulator; the loader stops at end of stream.
	///
	/// Edge indices are not validated against the declared counts here; the
	/// assembler reports out-of-range references.
	pub fn from_reader<R: BufRead>(reader: R, mode: ParseMode) -> Result<Self, ParseError> {
		let mut inst = Self::default();
		for (lineno, line) in reader.lines().enumerate() {
			let line = line?;
			let lineno = lineno + 1;
			let tokens: Vec<&str> = line.split_whitespace().collect();
			let tag = match tokens.first() {
				Some(t) => *t,
				None => continue,
			};
			match tag {
				"CellNum:" => inst.cells = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?,
				"PositionNum:" => {
					inst.positions = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?
				}
				"PadNum:" => inst.pads = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?,
				"max_weight:" => {
					inst.max_weight = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?
				}
				"cell_pad:" => {
					let weight = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?;
					let cell = number(field(&tokens, 2, lineno, tag)?, lineno, tag)?;
					inst.cell_pad.insert(PadEdge {
						weight: Weight(weight),
						cell,
					});
				}
				"cell_cell:" => {
					let weight = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?;
					let a = number(field(&tokens, 2, lineno, tag)?, lineno, tag)?;
					let b = number(field(&tokens, 3, lineno, tag)?, lineno, tag)?;
					inst.cell_cell.insert(NetEdge {
						weight: Weight(weight),
						a,
						b,
					});
				}
				_ => match mode {
					ParseMode::Tagged => {
						return Err(ParseError::UnknownTag {
							line: lineno,
							tag: tag.to_string(),
						})
					}
					ParseMode::Mixed => {
						let weight = number(field(&tokens, 0, lineno, tag)?, lineno, tag)?;
						let a = number(field(&tokens, 1, lineno, tag)?, lineno, tag)?;
						let b = number(field(&tokens, 2, lineno, tag)?, lineno, tag)?;
						inst.cell_cell.insert(NetEdge {
							weight: Weight(weight),
							a,
							b,
						});
					}
				},
			}
		}
		debug!(
			"parsed instance: {} cells, {} positions, {} pads, {} pad edges, {} net edges",
			inst.cells,
			inst.positions,
			inst.pads,
			inst.cell_pad.len(),
			inst.cell_cell.len()
		);
		Ok(inst)
	}

	/// Parse an instance file; the handle is released on every exit path.
	pub fn from_path<P: AsRef<Path>>(path: P, mode: ParseMode) -> Result<Self, ParseError> {
		let file = File::open(path)?;
		Self::from_reader(BufReader::new(file), mode)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SMALL: &str = "CellNum: 2\n\
		PositionNum: 2\n\
		max_weight: 10\n\
		cell_pad: 1.0 0\n\
		cell_pad: 2.0 3\n";

	#[test]
	fn parses_the_tagged_format() {
		let inst = Instance::from_reader(SMALL.as_bytes(), ParseMode::Tagged).unwrap();
		assert_eq!(inst.cells, 2);
		assert_eq!(inst.positions, 2);
		assert_eq!(inst.max_weight, 10.0);
		let edges: Vec<PadEdge> = inst.cell_pad.iter().copied().collect();
		assert_eq!(
			edges,
			vec![
				PadEdge {
					weight: Weight(1.0),
					cell: 0
				},
				PadEdge {
					weight: Weight(2.0),
					cell: 3
				},
			]
		);
	}

	#[test]
	fn parsing_is_idempotent() {
		let a = Instance::from_reader(SMALL.as_bytes(), ParseMode::Tagged).unwrap();
		let b = Instance::from_reader(SMALL.as_bytes(), ParseMode::Tagged).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn duplicate_edge_lines_collapse() {
		let text = "cell_pad: 1.5 2\ncell_pad: 1.5 2\ncell_cell: 1.0 0 1\ncell_cell: 1.0 0 1\n";
		let inst = Instance::from_reader(text.as_bytes(), ParseMode::Tagged).unwrap();
		assert_eq!(inst.cell_pad.len(), 1);
		assert_eq!(inst.cell_cell.len(), 1);
	}

	#[test]
	fn bad_number_is_a_structured_error() {
		let err = Instance::from_reader("cell_pad: abc 1\n".as_bytes(), ParseMode::Tagged)
			.unwrap_err();
		match err {
			ParseError::BadNumber { line, tag, token } => {
				assert_eq!(line, 1);
				assert_eq!(tag, "cell_pad:");
				assert_eq!(token, "abc");
			}
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[test]
	fn short_line_is_a_structured_error() {
		let err =
			Instance::from_reader("cell_cell: 1.0 2\n".as_bytes(), ParseMode::Tagged).unwrap_err();
		match err {
			ParseError::MissingField { line: 1, tag, .. } => assert_eq!(tag, "cell_cell:"),
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[test]
	fn unknown_tag_is_rejected_in_tagged_mode() {
		let err = Instance::from_reader("3.5 0 1\n".as_bytes(), ParseMode::Tagged).unwrap_err();
		match err {
			ParseError::UnknownTag { line: 1, tag } => assert_eq!(tag, "3.5"),
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[test]
	fn untagged_lines_are_net_edges_in_mixed_mode() {
		let text = "CellNum: 2\n3.5 0 1\n";
		let inst = Instance::from_reader(text.as_bytes(), ParseMode::Mixed).unwrap();
		assert_eq!(
			inst.cell_cell.iter().copied().collect::<Vec<_>>(),
			vec![NetEdge {
				weight: Weight(3.5),
				a: 0,
				b: 1
			}]
		);
	}

	#[test]
	fn blank_lines_are_skipped() {
		let text = "CellNum: 3\n\n   \nPositionNum: 4\n";
		let inst = Instance::from_reader(text.as_bytes(), ParseMode::Mixed).unwrap();
		assert_eq!((inst.cells, inst.positions), (3, 4));
	}
}
