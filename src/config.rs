use std::path::PathBuf;

/// Every benchmark directory holds one `benchmark.<ext>` file per language.
const BENCHMARK_STEM: &str = "benchmark";
const BASELINE_FILE: &str = "baseline.txt";

pub const DEFAULT_BENCHMARK_DIR: &str = "tests/benchmarks";
pub const DEFAULT_TRIALS: usize = 10;

/// Settings for a single invocation, built once from the command line.
#[derive(Debug, Clone)]
pub struct Config {
  /// Root directory containing one subdirectory per benchmark.
  pub benchmark_dir: PathBuf,
  pub baseline_file: PathBuf,
  /// Number of trials per benchmark and language.
  pub trials: usize,
  /// Whether to emit ANSI color escapes. Never on Windows.
  pub color: bool,
}

impl Config {
  pub fn new(benchmark_dir: PathBuf) -> Self {
    Self {
      baseline_file: benchmark_dir.join(BASELINE_FILE),
      benchmark_dir,
      trials: DEFAULT_TRIALS,
      color: cfg!(not(windows)),
    }
  }

  /// Path of the source file for `benchmark` under a language with `extension`.
  pub fn benchmark_path(&self, benchmark: &str, extension: &str) -> PathBuf {
    self.benchmark_dir.join(benchmark).join(format!("{BENCHMARK_STEM}{extension}"))
  }
}
