use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use ucplace::instance::{Instance, ParseMode};
use ucplace::placement::Placement;
use ucplace::solve::SimpleSolver;

/// Anneal a UCP cell-placement instance and print the best decoded sample.
#[derive(Parser)]
#[command(name = "ucp", version)]
struct Args {
	/// Instance file
	input: PathBuf,
	/// Line format of the instance file
	#[arg(long, value_enum, default_value_t = Format::Tagged)]
	format: Format,
	/// Number of annealing reads
	#[arg(long, default_value_t = 10)]
	reads: usize,
	/// Total sweeps per read; defaults to 10 * cells^(4/3)
	#[arg(long)]
	sweeps: Option<usize>,
	/// Seed for reproducible runs
	#[arg(long)]
	seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
	Tagged,
	Mixed,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
	let start = Instant::now();
	let mode = match args.format {
		Format::Tagged => ParseMode::Tagged,
		Format::Mixed => ParseMode::Mixed,
	};
	info!("parsing {}", args.input.display());
	let instance = Instance::from_path(&args.input, mode)?;
	info!("assembling hamiltonian");
	let placement = Placement::new(&instance)?;
	let compiled = placement.hamiltonian().compile()?;
	info!("solving over {} variables", compiled.num_variables());
	let mut solver = SimpleSolver::new(&compiled);
	solver.reads = args.reads;
	solver.sweeps = args
		.sweeps
		.unwrap_or_else(|| (10.0 * (instance.cells as f64).powf(4.0 / 3.0)).ceil() as usize);
	solver.seed = args.seed;
	let best = solver.solve()?;
	println!("{}", best.energy);
	println!("{:?}", best.broken);
	println!(
		"Execution time: {} seconds",
		start.elapsed().as_secs_f64()
	);
	Ok(())
}

fn main() {
	env_logger::init();
	let args = Args::parse();
	if let Err(err) = run(&args) {
		eprintln!("error: {}", err);
		process::exit(1);
	}
}
