//! Structured shell command building.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command build error.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command program is empty")]
    EmptyProgram,
    #[error("Failed to quote argument: {0}")]
    Quote(#[from] shlex::QuoteError),
}

/// A remote shell command assembled from a program and arguments.
///
/// Arguments stay structured until render time, where each word is quoted
/// individually, so callers never interpolate values into a command line
/// themselves. Pipelines, stdout redirection, and detached launch cover the
/// shapes the operator needs (`ps -ef | grep pat | grep -v grep`,
/// `crontab -l > file`, `nohup sh script &`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCommand {
    program: String,
    args: Vec<String>,
    stdout_to: Option<String>,
    pipe_to: Option<Box<RemoteCommand>>,
    detached: bool,
}

impl RemoteCommand {
    /// Create a new command for `program`.
    #[must_use]
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_to: None,
            pipe_to: None,
            detached: false,
        }
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Pipe this command's stdout into `next`, appending at the end of an
    /// existing pipeline.
    #[must_use]
    pub fn pipe(mut self, next: Self) -> Self {
        self.pipe_to = match self.pipe_to.take() {
            Some(tail) => Some(Box::new(tail.pipe(next))),
            None => Some(Box::new(next)),
        };
        self
    }

    /// Redirect stdout of the pipeline into `path`.
    #[must_use]
    pub fn stdout_to<S: Into<String>>(mut self, path: S) -> Self {
        self.stdout_to = Some(path.into());
        self
    }

    /// Launch detached (`nohup … &`), without waiting for the command to exit.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Render the full shell line with every word quoted.
    ///
    /// # Errors
    /// Returns an error if the program is empty or a word cannot be quoted.
    pub fn render(&self) -> Result<String, CommandError> {
        let mut line = self.render_stage()?;
        if let Some(path) = &self.stdout_to {
            line = format!("{line} > {}", quote(path)?);
        }
        if self.detached {
            line = format!("nohup {line} &");
        }
        Ok(line)
    }

    fn render_stage(&self) -> Result<String, CommandError> {
        if self.program.is_empty() {
            return Err(CommandError::EmptyProgram);
        }
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(quote(&self.program)?);
        for arg in &self.args {
            words.push(quote(arg)?);
        }
        let mut line = words.join(" ");
        if let Some(next) = &self.pipe_to {
            line.push_str(" | ");
            line.push_str(&next.render_stage()?);
        }
        Ok(line)
    }
}

fn quote(word: &str) -> Result<String, CommandError> {
    Ok(shlex::try_quote(word)?.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_program_and_args() {
        let cmd = RemoteCommand::new("mkdir").arg("-pv").arg("/opt/app");
        assert_eq!(cmd.render().unwrap(), "mkdir -pv /opt/app");
    }

    #[test]
    fn quotes_arguments_with_metacharacters() {
        let cmd = RemoteCommand::new("ls").arg("-l").arg("/opt/my app");
        let expected = format!("ls -l {}", shlex::try_quote("/opt/my app").unwrap());
        assert_eq!(cmd.render().unwrap(), expected);
    }

    #[test]
    fn renders_pipeline_in_order() {
        let cmd = RemoteCommand::new("ps")
            .arg("-ef")
            .pipe(RemoteCommand::new("grep").arg("myapp"))
            .pipe(RemoteCommand::new("grep").arg("-v").arg("grep"));
        assert_eq!(cmd.render().unwrap(), "ps -ef | grep myapp | grep -v grep");
    }

    #[test]
    fn renders_stdout_redirection() {
        let cmd = RemoteCommand::new("crontab")
            .arg("-l")
            .stdout_to("/ws/crontab.save");
        assert_eq!(cmd.render().unwrap(), "crontab -l > /ws/crontab.save");
    }

    #[test]
    fn renders_detached_launch() {
        let cmd = RemoteCommand::new("sh").arg("/opt/app/start.sh").detached();
        assert_eq!(cmd.render().unwrap(), "nohup sh /opt/app/start.sh &");
    }

    #[test]
    fn empty_program_is_an_error() {
        let err = RemoteCommand::new("").render().unwrap_err();
        assert!(matches!(err, CommandError::EmptyProgram));
    }
}
