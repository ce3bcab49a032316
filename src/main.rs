mod baseline;
mod bench;
mod config;
mod ext;
mod format;
mod registry;
mod run;
mod stats;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{builder::TypedValueParser, Parser};
use tracing_subscriber::EnvFilter;

use self::{
  bench::Bench,
  config::{Config, DEFAULT_BENCHMARK_DIR, DEFAULT_TRIALS},
};

/// Run the benchmarks.
#[derive(Parser, Debug)]
struct Args {
  /// The benchmark to run.
  #[arg(default_value = "all")]
  benchmark: String,
  /// Generate a baseline file.
  #[arg(long)]
  generate_baseline: bool,
  /// Display graph results.
  #[arg(long)]
  graph: bool,
  /// Which language(s) to run benchmarks for.
  #[arg(short, long)]
  language: Vec<String>,
  /// Output the results chart as HTML.
  #[arg(long)]
  output_html: bool,
  /// Directory containing one subdirectory per benchmark.
  #[arg(long, default_value = DEFAULT_BENCHMARK_DIR)]
  benchmark_dir: PathBuf,
  /// Baseline file. Defaults to `baseline.txt` in the benchmark directory.
  #[arg(long)]
  baseline: Option<PathBuf>,
  /// Number of trials per benchmark and language.
  #[arg(short = 'n', long, default_value_t = DEFAULT_TRIALS, value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
  trials: usize,
  /// Disable colored output.
  #[arg(long)]
  no_color: bool,
}

impl Args {
  fn config(&self) -> Config {
    let mut config = Config::new(self.benchmark_dir.clone());
    if let Some(baseline) = &self.baseline {
      config.baseline_file = baseline.clone();
    }
    config.trials = self.trials;
    config.color &= !self.no_color;

    config
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();
  let config = args.config();
  colored::control::set_override(config.color);

  let benchmarks = registry::benchmarks().context("benchmarks")?;
  let mut bench = Bench::new(config, benchmarks, registry::languages(), io::stdout());

  if args.generate_baseline {
    return bench.generate_baseline().context("generate baseline");
  }

  bench.read_baseline()?;
  bench.run(&args.benchmark, &args.language, args.graph).context("run")?;

  if args.output_html {
    bench.output_html().context("output html")?;
  }

  Ok(())
}
