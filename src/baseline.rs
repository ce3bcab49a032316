use std::{fs, io, num::ParseFloatError, path::Path};

use thiserror::Error;

use crate::registry::Benchmark;

/// Written in place of a score when the reference language produced none.
const NO_SCORE: &str = "None";

#[derive(Debug, Error)]
pub enum BaselineError {
  #[error("reading baseline file")]
  Io(#[from] io::Error),
  #[error("line {line}: expected `name,score`, got {text:?}")]
  Malformed { line: usize, text: String },
  #[error("line {line}: invalid score {text:?}")]
  Score {
    line: usize,
    text: String,
    #[source]
    source: ParseFloatError,
  },
}

/// Parses one `name,score` line. The `None` sentinel parses as `0.0`.
fn parse_line(line: usize, text: &str) -> Result<(&str, f64), BaselineError> {
  let mut fields = text.split(',');
  let (Some(name), Some(score), None) = (fields.next(), fields.next(), fields.next()) else {
    return Err(BaselineError::Malformed {
      line,
      text: text.to_string(),
    });
  };

  if score.starts_with(NO_SCORE) {
    return Ok((name, 0.0));
  }

  let score = score.trim().parse().map_err(|source| BaselineError::Score {
    line,
    text: score.to_string(),
    source,
  })?;

  Ok((name, score))
}

/// Applies baseline `contents` to matching benchmarks. Unknown names are ignored.
pub fn apply(contents: &str, benchmarks: &mut [Benchmark]) -> Result<(), BaselineError> {
  for (i, text) in contents.lines().enumerate() {
    let (name, score) = parse_line(i + 1, text)?;

    match benchmarks.iter_mut().find(|benchmark| benchmark.name == name) {
      Some(benchmark) => benchmark.baseline = Some(score),
      None => tracing::debug!(name, "baseline for unknown benchmark"),
    }
  }

  Ok(())
}

/// Reads the baseline file at `path`, if there is one, into `benchmarks`.
pub fn read(path: &Path, benchmarks: &mut [Benchmark]) -> Result<(), BaselineError> {
  if !path.exists() {
    tracing::debug!(?path, "no baseline file");
    return Ok(());
  }

  let contents = fs::read_to_string(path)?;
  apply(&contents, benchmarks)?;
  tracing::debug!(?path, "read baseline");

  Ok(())
}

/// One `name,score` line per benchmark, in the given order.
pub fn format<'a, I: IntoIterator<Item = (&'a str, Option<f64>)>>(scores: I) -> String {
  scores
    .into_iter()
    .map(|(name, score)| match score {
      Some(score) => format!("{name},{score}\n"),
      None => format!("{name},{NO_SCORE}\n"),
    })
    .collect()
}

/// Overwrites the baseline file at `path`.
pub fn write<'a, I: IntoIterator<Item = (&'a str, Option<f64>)>>(path: &Path, scores: I) -> io::Result<()> {
  fs::write(path, format(scores))
}
