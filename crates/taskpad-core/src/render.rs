use std::io::{
  self,
  IsTerminal,
  Write
};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::confirm::Prompt;
use crate::datetime::format_date;
use crate::duplicates::duplicate_rank;
use crate::filter::TaskFilter;
use crate::task::Task;
use crate::view::Theme;

#[derive(Debug, Clone, Copy)]
enum Role {
  Id,
  Heading,
  Complete,
  Incomplete,
  Alert
}

fn palette(
  theme: Theme,
  role: Role
) -> &'static str {
  match (theme, role) {
    | (Theme::Light, Role::Id) => "33",
    | (Theme::Light, Role::Heading) => "1;30",
    | (Theme::Light, Role::Complete) => "32",
    | (Theme::Light, Role::Incomplete) => {
      "31"
    }
    | (Theme::Light, Role::Alert) => "1;34",
    | (Theme::Dark, Role::Id) => "93",
    | (Theme::Dark, Role::Heading) => "1;97",
    | (Theme::Dark, Role::Complete) => "92",
    | (Theme::Dark, Role::Incomplete) => {
      "91"
    }
    | (Theme::Dark, Role::Alert) => "1;96"
  }
}

#[derive(Debug, Clone)]
pub struct Renderer {
  color: bool,
  theme: Theme
}

impl Renderer {
  pub fn new(
    cfg: &Config,
    theme: Theme
  ) -> anyhow::Result<Self> {
    let color_cfg = cfg
      .get("color")
      .unwrap_or_else(|| "on".to_string());
    let color = match color_cfg
      .to_ascii_lowercase()
      .as_str()
    {
      | "on" | "yes" | "true" | "1" => {
        io::stdout().is_terminal()
      }
      | "off" | "no" | "false" | "0" => {
        false
      }
      | other => {
        return Err(anyhow!(
          "invalid color setting: \
           {other}"
        ));
      }
    };

    Ok(Self {
      color,
      theme
    })
  }

  /// A renderer that never emits ANSI
  /// escapes.
  pub fn plain(theme: Theme) -> Self {
    Self {
      color: false,
      theme
    }
  }

  pub fn set_theme(&mut self, theme: Theme) {
    self.theme = theme;
  }

  /// Prints the displayed tasks. Name
  /// badges are ranked within `tasks`,
  /// i.e. the filtered list.
  #[tracing::instrument(skip(self, out, tasks))]
  pub fn print_task_list<W: Write>(
    &self,
    out: &mut W,
    tasks: &[&Task],
    filter: TaskFilter
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{} ({filter})",
      self.paint("My Tasks", Role::Heading)
    )?;

    if tasks.is_empty() {
      writeln!(out, "No tasks yet.")?;
      return Ok(());
    }

    let headers = vec![
      "ID".to_string(),
      "Name".to_string(),
      "Status".to_string(),
      "Start".to_string(),
      "Description".to_string(),
    ];

    let mut rows =
      Vec::with_capacity(tasks.len());
    for task in tasks {
      let rank = duplicate_rank(
        tasks.iter().copied(),
        &task.name,
        task.id
      );
      let name = if rank > 0 {
        format!("{} ({rank})", task.name)
      } else {
        task.name.clone()
      };

      rows.push(vec![
        self.paint(
          &task.id.to_string(),
          Role::Id
        ),
        name,
        self.status(task),
        format_date(task.start_date),
        format_description(
          &task.description
        ),
      ]);
    }

    write_table(out, headers, rows)?;
    Ok(())
  }

  #[tracing::instrument(skip(self, out, task), fields(id = %task.id))]
  pub fn print_task_info<W: Write>(
    &self,
    out: &mut W,
    task: &Task
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{}",
      self.paint(
        "Task Details",
        Role::Heading
      )
    )?;
    writeln!(out, "id           {}", task.id)?;
    writeln!(out, "name         {}", task.name)?;
    writeln!(
      out,
      "status       {}",
      self.status(task)
    )?;
    writeln!(
      out,
      "description  {}",
      format_description(
        &task.description
      )
    )?;
    writeln!(
      out,
      "start date   {}",
      format_date(task.start_date)
    )?;
    Ok(())
  }

  pub fn print_prompt<W: Write>(
    &self,
    out: &mut W,
    prompt: &Prompt
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{}",
      self.paint(&prompt.title, Role::Alert)
    )?;
    writeln!(out, "{}", prompt.message)?;
    write!(
      out,
      "[y] {} / [n] {} > ",
      prompt.accept, prompt.cancel
    )?;
    out.flush()?;
    Ok(())
  }

  pub fn print_notice<W: Write>(
    &self,
    out: &mut W,
    title: &str,
    message: &str
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{}: {message}",
      self.paint(title, Role::Alert)
    )?;
    Ok(())
  }

  fn status(&self, task: &Task) -> String {
    if task.completed {
      self.paint("Complete", Role::Complete)
    } else {
      self.paint(
        "Incomplete",
        Role::Incomplete
      )
    }
  }

  fn paint(
    &self,
    text: &str,
    role: Role
  ) -> String {
    if !self.color {
      return text.to_string();
    }
    let code = palette(self.theme, role);
    format!("\x1b[{code}m{text}\x1b[0m")
  }
}

/// Collapses whitespace runs for
/// display; the stored text is left
/// alone.
pub fn format_description(
  description: &str
) -> String {
  description
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

fn write_table<W: Write>(
  mut writer: W,
  headers: Vec<String>,
  rows: Vec<Vec<String>>
) -> anyhow::Result<()> {
  let column_count = headers.len();
  let mut widths = vec![0usize; column_count];

  for (idx, header) in
    headers.iter().enumerate()
  {
    widths[idx] = widths[idx].max(
      UnicodeWidthStr::width(
        header.as_str()
      )
    );
  }

  for row in &rows {
    for (idx, cell) in
      row.iter().enumerate()
    {
      widths[idx] = widths[idx].max(
        UnicodeWidthStr::width(
          strip_ansi(cell).as_str()
        )
      );
    }
  }

  for idx in 0..column_count {
    write!(
      writer,
      "{:width$} ",
      headers[idx],
      width = widths[idx]
    )?;
  }
  writeln!(writer)?;

  for width in &widths {
    write!(
      writer,
      "{:-<width$} ",
      "",
      width = *width
    )?;
  }
  writeln!(writer)?;

  for row in rows {
    for (idx, cell) in
      row.iter().enumerate()
    {
      let visible_width =
        UnicodeWidthStr::width(
          strip_ansi(cell).as_str()
        );
      let padding = widths[idx]
        .saturating_sub(visible_width);
      write!(
        writer,
        "{}{} ",
        cell,
        " ".repeat(padding)
      )?;
    }
    writeln!(writer)?;
  }

  Ok(())
}

fn strip_ansi(s: &str) -> String {
  let mut out =
    String::with_capacity(s.len());
  let mut escaped = false;

  for ch in s.chars() {
    if escaped {
      if ch == 'm' {
        escaped = false;
      }
      continue;
    }

    if ch == '\x1b' {
      escaped = true;
      continue;
    }

    out.push(ch);
  }

  out
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    Renderer,
    format_description,
    strip_ansi
  };
  use crate::filter::TaskFilter;
  use crate::task::{
    Task,
    TaskDraft,
    TaskId
  };
  use crate::view::Theme;

  fn task(id: u64, name: &str) -> Task {
    Task::from_draft(
      TaskId::new(id),
      TaskDraft::new(name).with_description(
        "  lots   of\n space "
      ),
      NaiveDate::from_ymd_opt(2026, 4, 9)
        .expect("valid date")
    )
  }

  fn render_list(tasks: &[Task]) -> String {
    let refs: Vec<&Task> =
      tasks.iter().collect();
    let mut out = Vec::new();
    Renderer::plain(Theme::Light)
      .print_task_list(
        &mut out,
        &refs,
        TaskFilter::All
      )
      .expect("render");
    String::from_utf8(out).expect("utf8")
  }

  #[test]
  fn collapses_description_whitespace() {
    assert_eq!(
      format_description(
        "  a \n\t b   c "
      ),
      "a b c"
    );
  }

  #[test]
  fn badges_duplicate_names_only() {
    let text = render_list(&[
      task(1, "Buy milk"),
      task(2, "buy milk"),
      task(3, "Walk dog"),
    ]);
    assert!(text.contains("Buy milk (1)"));
    assert!(text.contains("buy milk (2)"));
    assert!(text.contains("Walk dog "));
    assert!(!text.contains("Walk dog ("));
    assert!(text.contains("lots of space"));
    assert!(text.contains("2026-04-09"));
  }

  #[test]
  fn empty_list_message() {
    let text = render_list(&[]);
    assert!(text.contains("No tasks yet."));
  }

  #[test]
  fn strip_ansi_removes_sequences() {
    assert_eq!(
      strip_ansi("\x1b[92mok\x1b[0m"),
      "ok"
    );
  }
}
