use std::fmt::Write;

use anyhow::Result;
use colored::Colorize;

use crate::stats::{score, BenchmarkResults, ResultStore};

/// Ratios above this are slower than the comparison point.
const REGRESSION_THRESHOLD: f64 = 105.0;
/// Ratios below this are faster than the comparison point.
const IMPROVEMENT_THRESHOLD: f64 = 95.0;

const LABEL_WIDTH: usize = 30;
const GRAPH_WIDTH: usize = 68;

/// Benchmarks shown in the HTML chart, with their headings.
const HTML_BENCHMARKS: &[(&str, &str)] = &[
  ("method_call", "Method Call"),
  ("delta_blue", "DeltaBlue"),
  ("binary_trees", "Binary Trees"),
  ("fib", "Recursive Fibonacci"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Regression,
  Improvement,
  Unchanged,
}

impl Verdict {
  /// Both thresholds are exclusive.
  pub fn of(ratio: f64) -> Self {
    if ratio > REGRESSION_THRESHOLD {
      Verdict::Regression
    } else if ratio < IMPROVEMENT_THRESHOLD {
      Verdict::Improvement
    } else {
      Verdict::Unchanged
    }
  }
}

/// What a language's score is compared against on its summary line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
  /// Reference language without a stored baseline.
  NoBaseline,
  /// Reference language: `100 * score / baseline`.
  Baseline(f64),
  /// Other languages: `100 * reference score / score`.
  Reference(f64),
}

impl Comparison {
  /// A baseline of zero stands for "no baseline" in the baseline file.
  pub fn against_baseline(score: f64, baseline: Option<f64>) -> Self {
    match baseline {
      Some(baseline) if baseline > 0.0 => Comparison::Baseline(100.0 * score / baseline),
      _ => Comparison::NoBaseline,
    }
  }

  pub fn against_reference(score: f64, reference_score: f64) -> Self {
    Comparison::Reference(100.0 * reference_score / score)
  }

  pub fn verdict(&self) -> Verdict {
    match self {
      Comparison::NoBaseline => Verdict::Unchanged,
      Comparison::Baseline(ratio) | Comparison::Reference(ratio) => Verdict::of(*ratio),
    }
  }

  /// Colored red for a regression, green for an improvement. Whether escapes are
  /// emitted at all is decided once, through `colored::control`.
  pub fn render(&self) -> String {
    let text = match self {
      Comparison::NoBaseline => return "no baseline".to_string(),
      Comparison::Baseline(ratio) => format!("{ratio:6.2}% relative to baseline"),
      Comparison::Reference(ratio) => format!("{ratio:6.2}%"),
    };

    match self.verdict() {
      Verdict::Regression => text.red().to_string(),
      Verdict::Improvement => text.green().to_string(),
      Verdict::Unchanged => text,
    }
  }
}

/// The padded `"<benchmark> - <language>"` label that starts a progress line.
pub fn progress_label(description: &str) -> String {
  format!("{description:<LABEL_WIDTH$} ")
}

/// Completes a progress line once every trial has run.
pub fn summary(best: f64, standard_deviation: f64, comparison: Comparison) -> String {
  format!(" {best:4.2}s {standard_deviation:4.4} {}", comparison.render())
}

/// Marks one more hit on a graph cell.
fn escalate(cell: char) -> char {
  match cell {
    '-' => 'o',
    'o' => 'O',
    _ => '0',
  }
}

/// Plots a score `ratio` in `[0, 1]` onto `line`. Out of range ratios are clamped.
fn plot(line: &mut [char], ratio: f64) {
  let last = line.len() - 1;
  let index = ((ratio * last as f64) as usize).min(last);

  line[index] = escalate(line[index]);
}

/// ASCII scatter of every trial's score, scaled to the best score in `results`.
pub fn graph(results: &BenchmarkResults) -> Result<String> {
  let highest = results.iter().map(|result| score(result.best())).fold(0.0, f64::max);

  let mut graph = String::new();
  if results.is_empty() || highest <= 0.0 {
    return Ok(graph);
  }

  writeln!(graph)?;
  writeln!(graph, "{:LABEL_WIDTH$}0 {highest:66.0}", "")?;

  for result in results.iter() {
    let mut line = vec!['-'; GRAPH_WIDTH];
    for time in &result.times {
      plot(&mut line, score(*time) / highest);
    }

    writeln!(
      graph,
      "{:<LABEL_WIDTH$}{}",
      result.description,
      line.into_iter().collect::<String>()
    )?;
  }

  writeln!(graph)?;

  Ok(graph)
}

fn format_html_benchmark(html: &mut String, results: &BenchmarkResults, title: &str, reference: &str) -> Result<()> {
  writeln!(html, "<h3>{title}</h3>")?;
  writeln!(html, r#"<table class="chart">"#)?;

  // Bars are scaled by the slowest time.
  let highest = results.iter().map(|result| result.best()).fold(0.0, f64::max);

  let mut sorted = results.iter().collect::<Vec<_>>();
  sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

  for result in sorted {
    let time = result.best();
    let width = (100.0 * time / highest) as u32;
    let class = if result.language == reference {
      "chart-bar lit"
    } else {
      "chart-bar"
    };

    writeln!(html, "  <tr>")?;
    writeln!(
      html,
      r#"    <th>{}</th><td><div class="{class}" style="width: {width}%;">{time:4.2}s&nbsp;</div></td>"#,
      result.language
    )?;
    writeln!(html, "  </tr>")?;
  }

  writeln!(html, "</table>")?;

  Ok(())
}

/// HTML bar charts for the curated benchmarks that have results in `store`.
pub fn html(store: &ResultStore, reference: &str) -> Result<String> {
  let mut html = String::new();

  for (benchmark, title) in HTML_BENCHMARKS {
    match store.get(benchmark) {
      Some(results) if !results.is_empty() => format_html_benchmark(&mut html, results, title, reference)?,
      _ => tracing::debug!(benchmark, "no results for html chart"),
    }
  }

  Ok(html)
}
