use std::io::{
  self,
  BufRead,
  Write
};

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  instrument
};

use crate::cli::Invocation;
use crate::commands;
use crate::confirm::Prompt;
use crate::datetime::today_in;
use crate::render::Renderer;
use crate::store::{
  Effect,
  Outcome,
  TaskStore
};
use crate::view::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit
}

/// An interactive run: one store, one
/// view, one input stream that carries
/// both commands and prompt answers.
pub struct Session<R, W> {
  pub(crate) store:    TaskStore,
  pub(crate) view:     ViewState,
  pub(crate) renderer: Renderer,
  pub(crate) out:      W,
  input:               R,
  timezone:            Tz,
  assume_yes:          bool,
  interactive:         bool
}

impl<R: BufRead, W: Write> Session<R, W> {
  pub fn new(
    input: R,
    out: W,
    renderer: Renderer,
    view: ViewState
  ) -> Self {
    Self {
      store: TaskStore::new(),
      view,
      renderer,
      out,
      input,
      timezone: Tz::UTC,
      assume_yes: false,
      interactive: false
    }
  }

  /// Answer every prompt with yes.
  pub fn assume_yes(
    mut self,
    yes: bool
  ) -> Self {
    self.assume_yes = yes;
    self
  }

  /// Zone used to decide which day
  /// "today" is.
  pub fn timezone(
    mut self,
    tz: Tz
  ) -> Self {
    self.timezone = tz;
    self
  }

  /// Show a command prompt and banner.
  pub fn interactive(
    mut self,
    on: bool
  ) -> Self {
    self.interactive = on;
    self
  }

  pub fn store(&self) -> &TaskStore {
    &self.store
  }

  pub fn view(&self) -> &ViewState {
    &self.view
  }

  pub fn into_output(self) -> W {
    self.out
  }

  pub(crate) fn tz(&self) -> Tz {
    self.timezone
  }

  pub(crate) fn today(&self) -> NaiveDate {
    today_in(self.timezone)
  }

  #[instrument(skip(self))]
  pub fn run(&mut self) -> anyhow::Result<()> {
    info!(
      assume_yes = self.assume_yes,
      interactive = self.interactive,
      timezone = %self.timezone,
      "session started"
    );

    if self.interactive {
      writeln!(
        self.out,
        "taskpad: stay organized, stay \
         productive. Type `help` for \
         commands."
      )?;
    }

    loop {
      if self.interactive {
        write!(self.out, "taskpad> ")?;
        self.out.flush()?;
      }

      let Some(line) = self.read_line()?
      else {
        debug!("end of input");
        break;
      };
      if !self.interactive {
        debug!(line = %line, "script line");
      }

      let result = Invocation::parse(&line)
        .and_then(|inv| match inv {
          | Some(inv) => {
            commands::dispatch(self, inv)
          }
          | None => Ok(Flow::Continue)
        });

      match result {
        | Ok(Flow::Continue) => {}
        | Ok(Flow::Quit) => break,
        | Err(err)
          if err
            .downcast_ref::<io::Error>()
            .is_some() =>
        {
          return Err(err);
        }
        | Err(err) => {
          writeln!(self.out, "error: {err:#}")?;
        }
      }
    }

    info!(
      tasks = self.store.len(),
      "session finished"
    );
    Ok(())
  }

  /// Walks `outcome` through any
  /// prompts; returns the effect if the
  /// mutation was applied.
  pub(crate) fn settle(
    &mut self,
    mut outcome: Outcome
  ) -> anyhow::Result<Option<Effect>> {
    loop {
      match outcome {
        | Outcome::Pending(pending) => {
          let accepted =
            self.ask(&pending.prompt)?;
          outcome = self
            .store
            .resolve(pending.id, accepted)?;
        }
        | Outcome::Applied(effect) => {
          return Ok(Some(effect));
        }
        | Outcome::Discarded => {
          writeln!(self.out, "Cancelled.")?;
          return Ok(None);
        }
        | Outcome::Unchanged => {
          writeln!(
            self.out,
            "No such task; nothing changed."
          )?;
          return Ok(None);
        }
      }
    }
  }

  pub(crate) fn alert(
    &mut self,
    title: &str,
    message: &str
  ) -> anyhow::Result<()> {
    self.renderer.print_notice(
      &mut self.out,
      title,
      message
    )
  }

  fn ask(
    &mut self,
    prompt: &Prompt
  ) -> anyhow::Result<bool> {
    self
      .renderer
      .print_prompt(&mut self.out, prompt)?;

    if self.assume_yes {
      writeln!(self.out, "y")?;
      return Ok(true);
    }

    let Some(answer) = self.read_line()?
    else {
      writeln!(self.out)?;
      return Ok(false);
    };
    if !self.interactive {
      writeln!(self.out, "{}", answer.trim())?;
    }

    let accepted =
      is_accept(&answer, &prompt.accept);
    debug!(
      kind = ?prompt.kind,
      accepted,
      "prompt answered"
    );
    Ok(accepted)
  }

  fn read_line(
    &mut self
  ) -> anyhow::Result<Option<String>> {
    let mut buf = String::new();
    let read = self
      .input
      .read_line(&mut buf)
      .context("failed to read input")?;
    if read == 0 {
      return Ok(None);
    }
    Ok(Some(
      buf
        .trim_end_matches(['\n', '\r'])
        .to_string()
    ))
  }
}

fn is_accept(
  answer: &str,
  accept_label: &str
) -> bool {
  let answer = answer.trim();
  matches!(
    answer.to_ascii_lowercase().as_str(),
    "y" | "yes"
  ) || answer.eq_ignore_ascii_case(accept_label)
}
