use std::io::Write;

use anyhow::{Context, Result};

use crate::{
  baseline,
  config::Config,
  format::{self, Comparison},
  registry::{Benchmark, Language, Languages},
  run,
  stats::{self, BenchmarkResults, LanguageResult, ResultStore},
};

/// Runs every selected benchmark under every selected language, writing progress
/// to `out` and accumulating results for the final report.
pub struct Bench<W> {
  config: Config,
  benchmarks: Vec<Benchmark>,
  languages: Languages,
  /// Results collected so far in this run.
  pub store: ResultStore,
  out: W,
}

impl<W: Write> Bench<W> {
  pub fn new(config: Config, benchmarks: Vec<Benchmark>, languages: Languages, out: W) -> Self {
    Self {
      config,
      benchmarks,
      languages,
      store: ResultStore::default(),
      out,
    }
  }

  #[cfg(test)]
  pub fn into_output(self) -> W {
    self.out
  }

  /// Loads baseline scores for the reference language, if a baseline file exists.
  pub fn read_baseline(&mut self) -> Result<()> {
    baseline::read(&self.config.baseline_file, &mut self.benchmarks)
      .with_context(|| format!("read baseline {:?}", self.config.baseline_file))
  }

  /// Runs the benchmark named `selection` (or every benchmark, for `"all"`) under
  /// the languages named in `filter` (or every language, if it is empty).
  pub fn run(&mut self, selection: &str, filter: &[String], graph: bool) -> Result<()> {
    self.check_filter(filter)?;

    let selected = self
      .benchmarks
      .iter()
      .filter(|benchmark| selection == "all" || benchmark.name == selection)
      .cloned()
      .collect::<Vec<_>>();

    if selected.is_empty() {
      let known = self.benchmarks.iter().map(|b| b.name.as_str()).collect::<Vec<_>>();
      anyhow::bail!("unknown benchmark {selection:?}, expected \"all\" or one of {known:?}");
    }

    for benchmark in &selected {
      self
        .run_benchmark(benchmark, filter, graph)
        .with_context(|| format!("benchmark {}", benchmark.name))?;
    }

    Ok(())
  }

  /// A filter must keep the reference language if it keeps any other, since
  /// every other language is compared against it.
  fn check_filter(&self, filter: &[String]) -> Result<()> {
    for name in filter {
      if !self.languages.contains(name) {
        tracing::warn!(language = %name, "no such language, ignoring");
      }
    }

    let reference = &self.languages.reference.name;
    let excludes_reference = !filter.is_empty() && !filter.contains(reference);
    if excludes_reference && self.languages.others.iter().any(|l| filter.contains(&l.name)) {
      anyhow::bail!("language filter excludes {reference:?}, which other languages are compared against");
    }

    Ok(())
  }

  pub fn run_benchmark(&mut self, benchmark: &Benchmark, filter: &[String], graph: bool) -> Result<()> {
    let languages = self
      .languages
      .iter()
      .filter(|language| filter.is_empty() || filter.contains(&language.name))
      .cloned()
      .collect::<Vec<_>>();

    let mut results = BenchmarkResults::default();
    for language in &languages {
      self.run_benchmark_language(benchmark, language, &mut results)?;
    }

    if languages.len() > 1 && graph {
      write!(self.out, "{}", format::graph(&results).context("graph")?).context("write graph")?;
    }

    self.store.insert(&benchmark.name, results);

    Ok(())
  }

  /// Runs all trials of `benchmark` under `language`, recording the result in
  /// `results` and returning its score. Returns `Ok(None)` if there is no
  /// implementation for the language or any trial fails.
  pub fn run_benchmark_language(
    &mut self,
    benchmark: &Benchmark,
    language: &Language,
    results: &mut BenchmarkResults,
  ) -> Result<Option<f64>> {
    let description = stats::description(&benchmark.name, &language.name);
    write!(self.out, "{}", format::progress_label(&description))?;

    let path = self.config.benchmark_path(&benchmark.name, &language.extension);
    if !path.exists() {
      writeln!(self.out, "No implementation for this language")?;
      tracing::debug!(?path, "skipping missing benchmark source");
      return Ok(None);
    }

    let mut times = Vec::with_capacity(self.config.trials);
    for _ in 0..self.config.trials {
      self.out.flush()?;

      match run::run_trial(benchmark, language, &path) {
        Ok(time) => times.push(time),
        Err(err) => {
          writeln!(self.out, "{err}")?;
          tracing::warn!(benchmark = %benchmark.name, language = %language.name, "trial failed, abandoning language");
          return Ok(None);
        }
      }

      write!(self.out, ".")?;
    }

    let result = LanguageResult::new(&benchmark.name, &language.name, times).context("no trials were run")?;

    let comparison = if self.languages.is_reference(language) {
      Comparison::against_baseline(result.score, benchmark.baseline)
    } else {
      let reference = &self.languages.reference.name;
      let reference_score = results
        .get(reference)
        .with_context(|| format!("no {reference:?} result for {:?} to compare {:?} against", benchmark.name, language.name))?
        .score;

      Comparison::against_reference(result.score, reference_score)
    };

    writeln!(
      self.out,
      "{}",
      format::summary(result.best(), result.standard_deviation(), comparison)
    )?;

    let score = result.score;
    results.insert(result);

    Ok(Some(score))
  }

  /// Runs every benchmark under the reference language alone and overwrites the
  /// baseline file with the scores.
  pub fn generate_baseline(&mut self) -> Result<()> {
    writeln!(self.out, "generating baseline")?;

    let reference = self.languages.reference.clone();
    let mut scores = Vec::with_capacity(self.benchmarks.len());
    for benchmark in self.benchmarks.clone() {
      let score = self
        .run_benchmark_language(&benchmark, &reference, &mut BenchmarkResults::default())
        .with_context(|| format!("benchmark {}", benchmark.name))?;

      scores.push((benchmark.name, score));
    }

    let path = self.config.baseline_file.clone();
    baseline::write(&path, scores.iter().map(|(name, score)| (name.as_str(), *score)))
      .with_context(|| format!("write baseline {path:?}"))?;
    tracing::info!(?path, "wrote baseline");

    Ok(())
  }

  /// Writes HTML bar charts for the curated benchmarks.
  pub fn output_html(&mut self) -> Result<()> {
    let html = format::html(&self.store, &self.languages.reference.name).context("html")?;
    write!(self.out, "{html}")?;

    Ok(())
  }
}

#[cfg(all(test, unix))]
mod tests {
  use std::{fs, path::Path};

  use tempfile::TempDir;

  use super::*;

  const TRIALS: usize = 3;

  fn languages() -> Languages {
    Languages {
      reference: Language::new("sh", &["sh"], ".sh"),
      others: vec![Language::new("dash", &["sh"], ".dash")],
    }
  }

  fn benchmarks() -> Vec<Benchmark> {
    vec![
      Benchmark::new("for", r"499999500000\n").unwrap(),
      Benchmark::new("fib", "").unwrap(),
    ]
  }

  fn source(root: &Path, benchmark: &str, extension: &str, body: &str) {
    let dir = root.join(benchmark);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("benchmark{extension}")), body).unwrap();
  }

  fn bench(root: &TempDir) -> Bench<Vec<u8>> {
    let mut config = Config::new(root.path().to_path_buf());
    config.trials = TRIALS;
    config.color = false;

    Bench::new(config, benchmarks(), languages(), Vec::new())
  }

  fn output(bench: Bench<Vec<u8>>) -> String {
    String::from_utf8(bench.into_output()).unwrap()
  }

  #[test]
  fn records_every_trial_and_compares_against_reference() {
    let root = TempDir::new().unwrap();
    source(root.path(), "for", ".sh", "echo 499999500000\necho 'elapsed: 0.50'\n");
    source(root.path(), "for", ".dash", "echo 499999500000\necho 'elapsed: 1.00'\n");

    let mut bench = bench(&root);
    bench.run("for", &[], true).unwrap();

    let results = bench.store.get("for").unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.get("sh").unwrap().times, [0.5; TRIALS]);
    assert_eq!(results.get("dash").unwrap().score, 1000.0);

    let output = output(bench);
    assert!(output.contains(&format!("{:30} ... 0.50s 0.0000 no baseline\n", "for - sh")));
    assert!(output.contains(&format!("{:30} ... 1.00s 0.0000 ", "for - dash")));
    assert!(output.contains("200.00%"));
    assert!(output.contains(&format!("{:30}{}0{}\n", "for - dash", "-".repeat(33), "-".repeat(34))));
  }

  #[test]
  fn missing_source_is_skipped() {
    let root = TempDir::new().unwrap();
    source(root.path(), "fib", ".sh", "echo 'elapsed: 0.25'\n");

    let mut bench = bench(&root);
    bench.run("fib", &[], false).unwrap();

    let results = bench.store.get("fib").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.get("sh").unwrap().times.len(), TRIALS);
    assert!(output(bench).contains(&format!("{:30} No implementation for this language\n", "fib - dash")));
  }

  #[test]
  fn failed_trial_discards_earlier_trials() {
    let root = TempDir::new().unwrap();
    let count = root.path().join("count");
    let body = format!(
      "n=$(cat '{count}' 2>/dev/null || echo 0)\nn=$((n + 1))\necho $n > '{count}'\nif [ $n -ge 3 ]; then echo broken; else echo \"elapsed: 1.2$n\"; fi\n",
      count = count.display()
    );
    source(root.path(), "fib", ".sh", &body);

    let mut bench = bench(&root);
    let mut results = BenchmarkResults::default();
    let benchmark = benchmarks().remove(1);
    let score = bench
      .run_benchmark_language(&benchmark, &languages().reference, &mut results)
      .unwrap();

    assert_eq!(score, None);
    assert!(results.is_empty());
    assert!(output(bench).contains("..Incorrect output:\nbroken\n"));
  }

  #[test]
  fn missing_interpreter_abandons_language() {
    let root = TempDir::new().unwrap();
    source(root.path(), "fib", ".sh", "echo 'elapsed: 0.25'\n");

    let mut config = Config::new(root.path().to_path_buf());
    config.trials = TRIALS;
    let languages = Languages {
      reference: Language::new("ghost", &["definitely-not-an-interpreter-on-path"], ".sh"),
      others: vec![],
    };
    let mut bench = Bench::new(config, benchmarks(), languages, Vec::new());
    bench.run("fib", &[], false).unwrap();

    assert!(bench.store.get("fib").unwrap().is_empty());
    assert!(output(bench).contains("Interpreter was not found"));
  }

  #[test]
  fn filter_excluding_reference_fails_before_running() {
    let root = TempDir::new().unwrap();
    let mut bench = bench(&root);

    let err = bench.run("all", &["dash".to_string()], false).unwrap_err();

    assert!(err.to_string().contains("excludes \"sh\""));
    assert!(bench.store.benchmarks.is_empty());
  }

  #[test]
  fn filter_of_unknown_languages_runs_nothing() {
    let root = TempDir::new().unwrap();
    source(root.path(), "fib", ".sh", "echo 'elapsed: 0.25'\n");

    let mut bench = bench(&root);
    bench.run("fib", &["cobol".to_string()], true).unwrap();

    assert!(bench.store.get("fib").unwrap().is_empty());
    assert_eq!(output(bench), "");
  }

  #[test]
  fn missing_reference_result_fails_comparison() {
    let root = TempDir::new().unwrap();
    source(root.path(), "fib", ".dash", "echo 'elapsed: 0.25'\n");

    let mut bench = bench(&root);

    assert!(bench.run("fib", &[], false).is_err());
  }

  #[test]
  fn unknown_benchmark_is_an_error() {
    let root = TempDir::new().unwrap();
    let mut bench = bench(&root);

    assert!(bench.run("delta_blue", &[], false).is_err());
  }

  #[test]
  fn generated_baseline_reads_back() {
    let root = TempDir::new().unwrap();
    source(root.path(), "for", ".sh", "echo 499999500000\necho 'elapsed: 0.40'\n");

    let mut bench = bench(&root);
    bench.generate_baseline().unwrap();

    let written = fs::read_to_string(root.path().join("baseline.txt")).unwrap();
    assert_eq!(written, "for,2500\nfib,None\n");

    let mut bench = self::bench(&root);
    bench.read_baseline().unwrap();
    bench.run("for", &["sh".to_string()], false).unwrap();
    assert!(output(bench).contains("100.00% relative to baseline"));
  }

  #[test]
  fn html_uses_collected_results() {
    let root = TempDir::new().unwrap();
    source(root.path(), "fib", ".sh", "echo 'elapsed: 0.25'\n");

    let mut bench = bench(&root);
    bench.run("fib", &[], false).unwrap();
    bench.output_html().unwrap();

    assert!(output(bench).contains(r#"<th>sh</th><td><div class="chart-bar lit" style="width: 100%;">0.25s&nbsp;</div></td>"#));
  }
}
