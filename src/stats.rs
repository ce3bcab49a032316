use std::collections::BTreeMap;

/// Arbitrary scale applied to inverse time so scores land in a readable range.
const SCORE_SCALE: f64 = 1000.0;

/// Converts a time in seconds into a score, where faster is bigger.
pub fn score(time: f64) -> f64 {
  SCORE_SCALE / time
}

/// Smallest time, or `None` if there are no times.
pub fn best(times: &[f64]) -> Option<f64> {
  times.iter().copied().reduce(f64::min)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn standard_deviation(times: &[f64]) -> f64 {
  if times.is_empty() {
    return 0.0;
  }

  let n = times.len() as f64;
  let mean = times.iter().sum::<f64>() / n;
  let variance = times.iter().map(|time| (time - mean).powi(2)).sum::<f64>() / n;

  variance.sqrt()
}

/// Row label for a benchmark run under a language.
pub fn description(benchmark: &str, language: &str) -> String {
  format!("{benchmark} - {language}")
}

/// Aggregated trials of one benchmark under one language.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageResult {
  pub language: String,
  /// `"<benchmark> - <language>"`, used as the row label.
  pub description: String,
  /// Seconds for each trial, in the order they ran.
  pub times: Vec<f64>,
  pub score: f64,
}

impl LanguageResult {
  /// Returns `None` when there are no times to aggregate.
  pub fn new(benchmark: &str, language: &str, times: Vec<f64>) -> Option<Self> {
    let score = score(best(&times)?);

    Some(Self {
      language: language.to_string(),
      description: description(benchmark, language),
      times,
      score,
    })
  }

  pub fn best(&self) -> f64 {
    best(&self.times).unwrap_or(f64::INFINITY)
  }

  pub fn standard_deviation(&self) -> f64 {
    standard_deviation(&self.times)
  }
}

/// Results for one benchmark, keyed by language in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkResults {
  results: Vec<LanguageResult>,
}

impl BenchmarkResults {
  pub fn get(&self, language: &str) -> Option<&LanguageResult> {
    self.results.iter().find(|result| result.language == language)
  }

  /// Records a result, replacing any previous one for the same language.
  pub fn insert(&mut self, result: LanguageResult) {
    match self.results.iter_mut().find(|r| r.language == result.language) {
      Some(existing) => *existing = result,
      None => self.results.push(result),
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &LanguageResult> {
    self.results.iter()
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.results.len()
  }

  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }
}

/// Every benchmark's results for a single run.
#[derive(Debug, Default)]
pub struct ResultStore {
  pub benchmarks: BTreeMap<String, BenchmarkResults>,
}

impl ResultStore {
  /// Stores the results of a finished benchmark, replacing any earlier run of it.
  pub fn insert(&mut self, benchmark: &str, results: BenchmarkResults) {
    self.benchmarks.insert(benchmark.to_string(), results);
  }

  pub fn get(&self, benchmark: &str) -> Option<&BenchmarkResults> {
    self.benchmarks.get(benchmark)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-4
  }

  #[test]
  fn score_is_inverse_of_best_time() {
    let times = vec![2.0, 1.5, 1.8, 2.2, 1.9, 1.7, 2.0, 1.6, 2.1, 1.55];
    let result = LanguageResult::new("fib", "lua", times).unwrap();

    assert_eq!(result.times.len(), 10);
    assert_eq!(result.best(), 1.5);
    assert!(close(result.score, 666.6667));
    assert_eq!(result.description, "fib - lua");
  }

  #[test]
  fn standard_deviation_divides_by_n() {
    assert!(close(standard_deviation(&[1.0, 2.0, 3.0]), 0.8165));
    assert_eq!(standard_deviation(&[4.0, 4.0]), 0.0);
    assert_eq!(standard_deviation(&[]), 0.0);
  }

  #[test]
  fn no_times_no_result() {
    assert_eq!(LanguageResult::new("fib", "lua", vec![]), None);
  }

  #[test]
  fn results_keep_insertion_order() {
    let mut results = BenchmarkResults::default();
    results.insert(LanguageResult::new("fib", "lua", vec![1.0]).unwrap());
    results.insert(LanguageResult::new("fib", "lit", vec![2.0]).unwrap());
    results.insert(LanguageResult::new("fib", "lua", vec![3.0]).unwrap());

    let languages: Vec<_> = results.iter().map(|r| r.language.as_str()).collect();
    assert_eq!(languages, ["lua", "lit"]);
    assert_eq!(results.get("lua").unwrap().times, [3.0]);
  }

  #[test]
  fn insert_replaces_previous_run() {
    let mut store = ResultStore::default();
    let mut results = BenchmarkResults::default();
    results.insert(LanguageResult::new("fib", "lua", vec![1.0]).unwrap());

    store.insert("fib", results);
    store.insert("fib", BenchmarkResults::default());

    assert!(store.get("fib").unwrap().is_empty());
    assert!(store.get("sort").is_none());
  }
}
