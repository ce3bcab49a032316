use anyhow::{Context, Result};
use regex::Regex;

/// Every benchmark must end its expected output with this line.
const ELAPSED_SUFFIX: &str = r"elapsed: (?P<elapsed>\d+\.\d+)";

/// A named benchmark program, along with the pattern its stdout must match.
#[derive(Debug, Clone)]
pub struct Benchmark {
  pub name: String,
  /// Anchored at the start of stdout; anything after the elapsed line is ignored.
  pub pattern: Regex,
  /// Reference language score recorded in the baseline file, if any.
  pub baseline: Option<f64>,
}

impl Benchmark {
  /// `expected` is the output the program prints before its elapsed line. It is a
  /// regex fragment, so it doubles as a correctness check.
  pub fn new(name: &str, expected: &str) -> Result<Self> {
    let pattern = Regex::new(&format!(r"(?m)\A{expected}{ELAPSED_SUFFIX}")).with_context(|| format!("pattern for {name}"))?;

    Ok(Self {
      name: name.to_string(),
      pattern,
      baseline: None,
    })
  }

  /// Returns the elapsed seconds reported in `stdout`, if it has the expected shape.
  pub fn elapsed(&self, stdout: &str) -> Option<f64> {
    self.pattern.captures(stdout)?.name("elapsed")?.as_str().parse().ok()
  }
}

/// A runtime that benchmarks are executed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
  /// Display label, also used as the key in the result store.
  pub name: String,
  /// Program followed by fixed flags. The benchmark path is appended last.
  pub invocation: Vec<String>,
  pub extension: String,
}

impl Language {
  pub fn new(name: &str, invocation: &[&str], extension: &str) -> Self {
    Self {
      name: name.to_string(),
      invocation: invocation.iter().map(|s| s.to_string()).collect(),
      extension: extension.to_string(),
    }
  }
}

/// The language registry. The reference language is held apart from the others so
/// that it is always aggregated first, whatever order a filter names languages in.
#[derive(Debug, Clone)]
pub struct Languages {
  pub reference: Language,
  pub others: Vec<Language>,
}

impl Languages {
  /// Reference language first, then the others in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &Language> {
    std::iter::once(&self.reference).chain(&self.others)
  }

  pub fn is_reference(&self, language: &Language) -> bool {
    language.name == self.reference.name
  }

  pub fn contains(&self, name: &str) -> bool {
    self.iter().any(|language| language.name == name)
  }
}

pub fn benchmarks() -> Result<Vec<Benchmark>> {
  Ok(vec![
    Benchmark::new("sort_custom", "")?,
    Benchmark::new("sort", "")?,
    Benchmark::new("for", r"499999500000\n")?,
    Benchmark::new(
      "binary_trees",
      concat!(
        r"stretch tree of depth 13 check: -1\n",
        r"8192 trees of depth 4 check: -8192\n",
        r"2048 trees of depth 6 check: -2048\n",
        r"512 trees of depth 8 check: -512\n",
        r"128 trees of depth 10 check: -128\n",
        r"32 trees of depth 12 check: -32\n",
        r"long lived tree of depth 12 check: -1\n",
      ),
    )?,
    Benchmark::new("fib", r"317811\n317811\n317811\n317811\n317811\n")?,
    Benchmark::new("lit_call", "")?,
    Benchmark::new("c_call", "")?,
  ])
}

pub fn languages() -> Languages {
  Languages {
    reference: Language::new("lit", &["./dist/lit", "-Oall"], ".lit"),
    others: vec![
      Language::new("lit (-Ono-all)", &["./dist/lit", "-Ono-all"], ".lit"),
      Language::new("python", &["python2.7"], ".py"),
      Language::new("lua", &["lua"], ".lua"),
      Language::new("luajit (-joff)", &["luajit", "-joff"], ".lua"),
      Language::new("luajit", &["luajit"], ".lua"),
    ],
  }
}
