use std::io::{
  BufRead,
  Write
};

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use tracing::{
  debug,
  info,
  instrument
};

use crate::cli::Invocation;
use crate::datetime::parse_date_expr;
use crate::filter::TaskFilter;
use crate::session::{
  Flow,
  Session
};
use crate::store::Effect;
use crate::task::TaskId;
use crate::view::{
  Theme,
  ViewState
};

pub fn known_command_names()
-> Vec<&'static str> {
  vec![
    "add", "edit", "done", "toggle",
    "delete", "filter", "clear", "list",
    "info", "theme", "export", "help",
    "quit", "exit",
  ]
}

pub fn expand_command_abbrev<'a>(
  token: &'a str,
  known: &[&'a str]
) -> Option<&'a str> {
  if known.contains(&token) {
    return Some(token);
  }

  let mut matches = known
    .iter()
    .copied()
    .filter(|name| name.starts_with(token));
  let first = matches.next()?;
  if matches.next().is_some() {
    None
  } else {
    Some(first)
  }
}

/// Form fields typed after a command:
/// `start:<date>` anywhere, `desc:`
/// swallowing the rest of the line,
/// and every other word as the name.
#[derive(Debug, Default, PartialEq, Eq)]
struct Fields {
  name:        Option<String>,
  description: Option<String>,
  start:       Option<String>
}

fn parse_fields(raw: &str) -> Fields {
  let desc_at = raw
    .match_indices("desc:")
    .map(|(idx, _)| idx)
    .find(|idx| {
      *idx == 0
        || raw[..*idx]
          .ends_with(char::is_whitespace)
    });

  let (head, description) = match desc_at {
    | Some(idx) => (
      &raw[..idx],
      Some(raw[idx + "desc:".len()..].to_string())
    ),
    | None => (raw, None)
  };

  let mut start = None;
  let mut words = Vec::new();
  for word in head.split_whitespace() {
    if let Some(expr) = word
      .strip_prefix("start:")
      .or_else(|| word.strip_prefix("date:"))
    {
      start = Some(expr.to_string());
    } else {
      words.push(word);
    }
  }

  Fields {
    name: (!words.is_empty())
      .then(|| words.join(" ")),
    description,
    start
  }
}

/// Copies `fields` into the open form,
/// routing the start date through the
/// date picker.
fn fill_form(
  view: &mut ViewState,
  fields: Fields,
  start: Option<NaiveDate>
) {
  if let Some(date) = start {
    view.date_picker.open();
    view.date_picker.pick(date);
  }

  let Some(form) = view.form.as_mut() else {
    return;
  };
  if let Some(name) = fields.name {
    form.draft.name = name;
  }
  if let Some(description) =
    fields.description
  {
    form.draft.description =
      Some(description);
  }
  view.date_picker.confirm(&mut form.draft);
}

fn parse_id(token: Option<&str>) -> anyhow::Result<TaskId> {
  let token = token.ok_or_else(|| {
    anyhow!("a task id is required")
  })?;
  token
    .parse::<TaskId>()
    .with_context(|| {
      format!("invalid task id: {token}")
    })
}

fn split_first_word(
  raw: &str
) -> (Option<&str>, &str) {
  let raw = raw.trim_start();
  if raw.is_empty() {
    return (None, "");
  }
  match raw.split_once(char::is_whitespace)
  {
    | Some((first, rest)) => {
      (Some(first), rest)
    }
    | None => (Some(raw), "")
  }
}

fn print_form_title<R: BufRead, W: Write>(
  session: &mut Session<R, W>
) -> anyhow::Result<()> {
  if let Some(form) = &session.view.form {
    writeln!(session.out, "{}", form.title())?;
  }
  Ok(())
}

#[instrument(skip(session, inv), fields(command = %inv.command))]
pub(crate) fn dispatch<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: Invocation
) -> anyhow::Result<Flow> {
  let today = session.today();
  debug!(
    args = ?inv.args,
    %today,
    "dispatching command"
  );

  match inv.command.as_str() {
    | "add" => cmd_add(session, &inv, today)?,
    | "edit" => {
      cmd_edit(session, &inv, today)?
    }
    | "done" | "toggle" => {
      cmd_toggle(session, &inv)?
    }
    | "delete" => cmd_delete(session, &inv)?,
    | "filter" => cmd_filter(session, &inv)?,
    | "clear" => cmd_clear(session, &inv)?,
    | "list" => cmd_list(session)?,
    | "info" => cmd_info(session, &inv)?,
    | "theme" => cmd_theme(session, &inv)?,
    | "export" => cmd_export(session)?,
    | "help" => cmd_help(session)?,
    | "quit" | "exit" => {
      return Ok(Flow::Quit);
    }
    | other => {
      return Err(anyhow!(
        "unknown command: {other}"
      ));
    }
  }

  Ok(Flow::Continue)
}

#[instrument(skip(session, inv, today))]
fn cmd_add<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation,
  today: NaiveDate
) -> anyhow::Result<()> {
  info!("command add");

  let fields = parse_fields(&inv.raw_args);
  let start = fields
    .start
    .as_deref()
    .map(|expr| {
      parse_date_expr(expr, today, session.tz())
    })
    .transpose()?;

  session.view.open_add_form();
  print_form_title(session)?;
  fill_form(&mut session.view, fields, start);
  let Some(form) = session.view.close_form()
  else {
    return Ok(());
  };

  let outcome = match session
    .store
    .create(form.draft, today)
  {
    | Ok(outcome) => outcome,
    | Err(err) => {
      return session.alert(
        err.title(),
        &err.message()
      );
    }
  };

  if let Some(Effect::Created(id)) =
    session.settle(outcome)?
  {
    writeln!(
      session.out,
      "Created task {id}."
    )?;
  }
  Ok(())
}

#[instrument(skip(session, inv, today))]
fn cmd_edit<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation,
  today: NaiveDate
) -> anyhow::Result<()> {
  info!("command edit");

  let (id_token, rest) =
    split_first_word(&inv.raw_args);
  let id = parse_id(id_token)?;
  let Some(task) =
    session.store.get(id).cloned()
  else {
    writeln!(
      session.out,
      "No task with id {id}."
    )?;
    return Ok(());
  };

  let fields = parse_fields(rest);
  let start = fields
    .start
    .as_deref()
    .map(|expr| {
      parse_date_expr(expr, today, session.tz())
    })
    .transpose()?;

  session.view.open_edit_form(&task);
  print_form_title(session)?;
  fill_form(&mut session.view, fields, start);
  let Some(form) = session.view.close_form()
  else {
    return Ok(());
  };

  let outcome = match session
    .store
    .update(id, form.draft, today)
  {
    | Ok(outcome) => outcome,
    | Err(err) => {
      return session.alert(
        err.title(),
        &err.message()
      );
    }
  };

  if let Some(Effect::Updated(id)) =
    session.settle(outcome)?
  {
    writeln!(
      session.out,
      "Updated task {id}."
    )?;
  }
  Ok(())
}

#[instrument(skip(session, inv))]
fn cmd_toggle<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation
) -> anyhow::Result<()> {
  let id = parse_id(
    inv.args.first().map(String::as_str)
  )?;

  match session.store.toggle_complete(id) {
    | Some(toggled) => {
      if let Some(notice) = toggled.notice {
        session
          .alert(notice.title, notice.message)?;
      } else {
        writeln!(
          session.out,
          "Task {id} marked incomplete."
        )?;
      }
    }
    | None => {
      writeln!(
        session.out,
        "No task with id {id}."
      )?;
    }
  }
  Ok(())
}

#[instrument(skip(session, inv))]
fn cmd_delete<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation
) -> anyhow::Result<()> {
  let id = parse_id(
    inv.args.first().map(String::as_str)
  )?;

  let outcome = session.store.delete(id);
  if let Some(Effect::Deleted(id)) =
    session.settle(outcome)?
  {
    if session.view.selected == Some(id) {
      session.view.clear_selection();
    }
    writeln!(
      session.out,
      "Deleted task {id}."
    )?;
  }
  Ok(())
}

#[instrument(skip(session, inv))]
fn cmd_filter<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation
) -> anyhow::Result<()> {
  let Some(raw) = inv.args.first() else {
    writeln!(
      session.out,
      "Filter: {}",
      session.view.filter
    )?;
    return Ok(());
  };

  let filter: TaskFilter = raw.parse()?;
  session.view.set_filter(filter);
  cmd_list(session)
}

#[instrument(skip(session, inv))]
fn cmd_clear<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation
) -> anyhow::Result<()> {
  let filter = match inv.args.first() {
    | Some(raw) => raw.parse()?,
    | None => session.view.filter
  };

  let outcome =
    session.store.clear_filtered(filter);
  if let Some(Effect::Cleared {
    removed,
    ..
  }) = session.settle(outcome)?
  {
    if let Some(selected) =
      session.view.selected
      && session.store.get(selected).is_none()
    {
      session.view.clear_selection();
    }
    writeln!(
      session.out,
      "Cleared {removed} task(s)."
    )?;
  }
  Ok(())
}

#[instrument(skip(session))]
fn cmd_list<R: BufRead, W: Write>(
  session: &mut Session<R, W>
) -> anyhow::Result<()> {
  let filter = session.view.filter;
  let visible =
    session.store.filtered(filter);
  session.renderer.print_task_list(
    &mut session.out,
    &visible,
    filter
  )
}

#[instrument(skip(session, inv))]
fn cmd_info<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation
) -> anyhow::Result<()> {
  let id = match inv.args.first() {
    | Some(raw) => {
      parse_id(Some(raw.as_str()))?
    }
    | None => session
      .view
      .selected
      .ok_or_else(|| {
        anyhow!(
          "no task selected; use `info \
           <id>`"
        )
      })?
  };

  let Some(task) = session.store.get(id)
  else {
    writeln!(
      session.out,
      "No task with id {id}."
    )?;
    return Ok(());
  };

  session.view.select(id);
  session
    .renderer
    .print_task_info(&mut session.out, task)
}

#[instrument(skip(session, inv))]
fn cmd_theme<R: BufRead, W: Write>(
  session: &mut Session<R, W>,
  inv: &Invocation
) -> anyhow::Result<()> {
  let theme = match inv.args.first() {
    | Some(raw) => {
      let theme: Theme = raw.parse()?;
      session.view.theme = theme;
      theme
    }
    | None => session.view.toggle_theme()
  };

  session.renderer.set_theme(theme);
  writeln!(session.out, "Theme: {theme}")?;
  Ok(())
}

#[instrument(skip(session))]
fn cmd_export<R: BufRead, W: Write>(
  session: &mut Session<R, W>
) -> anyhow::Result<()> {
  let visible =
    session.store.filtered(session.view.filter);
  let json = serde_json::to_string_pretty(
    &visible
  )
  .context("failed to serialize tasks")?;
  writeln!(session.out, "{json}")?;
  Ok(())
}

fn cmd_help<R: BufRead, W: Write>(
  session: &mut Session<R, W>
) -> anyhow::Result<()> {
  writeln!(
    session.out,
    "commands:\n  \
     add <name> [start:<date>] [desc:<text>]\n  \
     edit <id> [name] [start:<date>] [desc:<text>]\n  \
     done <id>            toggle completion\n  \
     delete <id>\n  \
     filter [all|completed|incomplete]\n  \
     clear [filter]       remove tasks matching the filter\n  \
     list\n  \
     info [id]\n  \
     theme [light|dark]\n  \
     export               print shown tasks as JSON\n  \
     quit\n\
     dates: today, tomorrow, monday, march, +3d, -1w, YYYY-MM-DD"
  )?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::{
    Fields,
    expand_command_abbrev,
    known_command_names,
    parse_fields,
    split_first_word
  };

  #[test]
  fn description_takes_rest_of_line() {
    assert_eq!(
      parse_fields(
        "Buy milk start:tomorrow desc:two  liters start:x"
      ),
      Fields {
        name:        Some(
          "Buy milk".to_string()
        ),
        description: Some(
          "two  liters start:x".to_string()
        ),
        start:       Some(
          "tomorrow".to_string()
        )
      }
    );
  }

  #[test]
  fn desc_inside_a_word_is_part_of_name() {
    let fields =
      parse_fields("nodesc:here please");
    assert_eq!(
      fields.name.as_deref(),
      Some("nodesc:here please")
    );
    assert_eq!(fields.description, None);
  }

  #[test]
  fn no_words_means_no_name() {
    let fields = parse_fields("date:monday");
    assert_eq!(fields.name, None);
    assert_eq!(
      fields.start.as_deref(),
      Some("monday")
    );
  }

  #[test]
  fn ambiguous_abbreviation_is_rejected() {
    let known = known_command_names();
    assert_eq!(
      expand_command_abbrev("d", &known),
      None
    );
    assert_eq!(
      expand_command_abbrev("ed", &known),
      Some("edit")
    );
    assert_eq!(
      expand_command_abbrev("done", &known),
      Some("done")
    );
  }

  #[test]
  fn splits_id_from_rest() {
    assert_eq!(
      split_first_word("  12 New name"),
      (Some("12"), "New name")
    );
    assert_eq!(
      split_first_word(""),
      (None, "")
    );
  }
}
