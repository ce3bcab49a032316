use std::{
  io,
  process::{Command, ExitStatus},
};

/// A finished child process, with stdout decoded as text.
#[derive(Debug)]
pub struct TextOutput {
  /// Not checked by `status_stdout_text`.
  pub status: ExitStatus,
  /// Lossily decoded, with `\r\n` and lone `\r` turned into `\n`.
  pub stdout: String,
  pub stderr: Vec<u8>,
}

/// Translates `\r\n` and lone `\r` line endings into `\n`.
pub fn normalize_newlines(text: &str) -> String {
  text.replace("\r\n", "\n").replace('\r', "\n")
}

#[extend::ext]
pub impl Command {
  /// Runs the command to completion, capturing stdout and stderr. The only error
  /// is failing to spawn or wait on the child.
  fn status_stdout_text(&mut self) -> io::Result<TextOutput> {
    let output = self.output()?;

    Ok(TextOutput {
      status: output.status,
      stdout: normalize_newlines(&String::from_utf8_lossy(&output.stdout)),
      stderr: output.stderr,
    })
  }

  /// The program and its arguments, space separated, for diagnostics.
  fn display(&self) -> String {
    std::iter::once(self.get_program())
      .chain(self.get_args())
      .map(|arg| arg.to_string_lossy())
      .collect::<Vec<_>>()
      .join(" ")
  }
}
