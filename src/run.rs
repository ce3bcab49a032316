use std::{
  io::{self, Write},
  path::Path,
  process::{Command, ExitStatus},
};

use thiserror::Error;

use crate::{
  ext::{CommandExt, TextOutput},
  registry::{Benchmark, Language},
};

/// Why a trial produced no elapsed time. Any of these abandons the language for
/// the benchmark being run.
#[derive(Debug, Error)]
pub enum TrialError {
  #[error("Interpreter was not found: {program}")]
  InterpreterNotFound { program: String },
  #[error("Language has an empty invocation")]
  EmptyInvocation,
  #[error("Could not launch interpreter: {0}")]
  Spawn(#[source] io::Error),
  #[error("Exited with {status}, output:\n{stdout}")]
  ExitStatus { status: ExitStatus, stdout: String },
  #[error("Incorrect output:\n{stdout}")]
  IncorrectOutput { stdout: String },
  #[error("Reported an elapsed time of zero")]
  NoElapsed,
}

/// Builds `invocation... path`.
fn command(language: &Language, path: &Path) -> Result<Command, TrialError> {
  let (program, flags) = language.invocation.split_first().ok_or(TrialError::EmptyInvocation)?;

  let mut command = Command::new(program);
  command.args(flags).arg(path);

  Ok(command)
}

/// Runs the program at `path` once under `language`, returning the elapsed
/// seconds it reports. There is no timeout: a hung program blocks here.
pub fn run_trial(benchmark: &Benchmark, language: &Language, path: &Path) -> Result<f64, TrialError> {
  let mut command = command(language, path)?;
  tracing::debug!(command = %command.display(), "running trial");

  let TextOutput { status, stdout, stderr } = command.status_stdout_text().map_err(|err| match err.kind() {
    io::ErrorKind::NotFound => TrialError::InterpreterNotFound {
      program: command.get_program().to_string_lossy().into_owned(),
    },
    _ => TrialError::Spawn(err),
  })?;

  if let Err(err) = io::stderr().write_all(&stderr) {
    tracing::warn!(%err, "could not forward interpreter stderr");
  }

  if !status.success() {
    return Err(TrialError::ExitStatus { status, stdout });
  }

  match benchmark.elapsed(&stdout) {
    Some(elapsed) if elapsed > 0.0 => Ok(elapsed),
    Some(_) => Err(TrialError::NoElapsed),
    None => Err(TrialError::IncorrectOutput { stdout }),
  }
}
