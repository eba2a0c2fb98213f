pub mod cli;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod datetime;
pub mod duplicates;
pub mod error;
pub mod filter;
pub mod render;
pub mod session;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::fs::File;
use std::io::{
  self,
  BufRead,
  BufReader,
  IsTerminal
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use confirm::{
  ConfirmationId,
  PendingConfirmation,
  Prompt
};
pub use duplicates::duplicate_rank;
pub use error::{
  StoreError,
  StoreResult
};
pub use filter::{
  TaskFilter,
  filter
};
pub use store::{
  Effect,
  Outcome,
  TaskStore
};
pub use task::{
  Task,
  TaskDraft,
  TaskId
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskpad"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.taskpadrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let theme = match cli.theme {
    | Some(theme) => theme,
    | None => cfg.theme()?
  };
  let view = view::ViewState::new(
    theme,
    cfg.default_filter()?
  );
  let timezone = cfg.timezone()?;
  let renderer =
    render::Renderer::new(&cfg, theme)?;
  let assume_yes = cli.yes
    || !cfg
      .get_bool("confirm")
      .unwrap_or(true);

  let interactive = cli.script.is_none()
    && io::stdin().is_terminal();
  let input: Box<dyn BufRead> =
    match cli.script.as_deref() {
      | Some(path) => {
        let file = File::open(path)
          .with_context(|| {
            format!(
              "failed to open script {}",
              path.display()
            )
          })?;
        Box::new(BufReader::new(file))
      }
      | None => Box::new(io::stdin().lock())
    };

  let stdout = io::stdout();
  let mut session = session::Session::new(
    input,
    stdout.lock(),
    renderer,
    view
  )
  .timezone(timezone)
  .assume_yes(assume_yes)
  .interactive(interactive);

  session.run()?;

  info!("done");
  Ok(())
}
