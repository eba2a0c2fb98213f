use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::filter::TaskFilter;
use crate::task::{
  Task,
  TaskDraft,
  TaskId
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark
}

impl Theme {
  pub fn toggled(self) -> Self {
    match self {
      | Theme::Light => Theme::Dark,
      | Theme::Dark => Theme::Light
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | Theme::Light => "light",
      | Theme::Dark => "dark"
    }
  }
}

impl fmt::Display for Theme {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Theme {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "light" => Ok(Theme::Light),
      | "dark" => Ok(Theme::Dark),
      | other => {
        Err(anyhow!(
          "invalid theme: {other} \
           (expected light or dark)"
        ))
      }
    }
  }
}

/// The add/edit form buffer. Nothing
/// here touches the store until the
/// form is submitted.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct TaskForm {
  pub editing: Option<TaskId>,
  pub draft:   TaskDraft
}

impl TaskForm {
  pub fn add() -> Self {
    Self {
      editing: None,
      draft:   TaskDraft::default()
    }
  }

  pub fn edit(task: &Task) -> Self {
    Self {
      editing: Some(task.id),
      draft:   TaskDraft::from_task(task)
    }
  }

  pub fn title(&self) -> &'static str {
    if self.editing.is_some() {
      "Edit Task"
    } else {
      "Add New Task"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct DatePicker {
  pub visible:   bool,
  pub tentative: Option<NaiveDate>
}

impl DatePicker {
  pub fn open(&mut self) {
    self.visible = true;
  }

  pub fn pick(&mut self, date: NaiveDate) {
    self.tentative = Some(date);
  }

  /// Moves the picked date into
  /// `draft` and closes the picker.
  /// Returns false when nothing was
  /// picked.
  pub fn confirm(
    &mut self,
    draft: &mut TaskDraft
  ) -> bool {
    let Some(date) = self.tentative.take()
    else {
      return false;
    };
    draft.start_date = Some(date);
    self.visible = false;
    true
  }

  pub fn cancel(&mut self) {
    self.visible = false;
    self.tentative = None;
  }
}

/// Presentation state, kept apart from
/// the task store.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct ViewState {
  pub theme:       Theme,
  pub filter:      TaskFilter,
  pub form:        Option<TaskForm>,
  pub selected:    Option<TaskId>,
  pub date_picker: DatePicker
}

impl ViewState {
  pub fn new(
    theme: Theme,
    filter: TaskFilter
  ) -> Self {
    Self {
      theme,
      filter,
      ..Self::default()
    }
  }

  pub fn toggle_theme(&mut self) -> Theme {
    self.theme = self.theme.toggled();
    debug!(theme = %self.theme, "theme toggled");
    self.theme
  }

  pub fn set_filter(
    &mut self,
    filter: TaskFilter
  ) {
    debug!(filter = %filter, "filter changed");
    self.filter = filter;
  }

  pub fn open_add_form(
    &mut self
  ) -> &mut TaskForm {
    self.date_picker.cancel();
    self.form.insert(TaskForm::add())
  }

  pub fn open_edit_form(
    &mut self,
    task: &Task
  ) -> &mut TaskForm {
    self.date_picker.cancel();
    self.selected = Some(task.id);
    self.form.insert(TaskForm::edit(task))
  }

  /// Takes the form for submission,
  /// leaving the view without one.
  pub fn close_form(
    &mut self
  ) -> Option<TaskForm> {
    self.date_picker.cancel();
    self.form.take()
  }

  pub fn select(&mut self, id: TaskId) {
    self.selected = Some(id);
  }

  pub fn clear_selection(&mut self) {
    self.selected = None;
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    DatePicker,
    Theme,
    ViewState
  };
  use crate::filter::TaskFilter;
  use crate::task::{
    Task,
    TaskDraft,
    TaskId
  };

  #[test]
  fn theme_toggles_back_and_forth() {
    let mut view = ViewState::default();
    assert_eq!(
      view.toggle_theme(),
      Theme::Dark
    );
    assert_eq!(
      view.toggle_theme(),
      Theme::Light
    );
  }

  #[test]
  fn date_picker_confirm_fills_draft() {
    let date =
      NaiveDate::from_ymd_opt(2026, 6, 1)
        .expect("valid date");
    let mut picker = DatePicker::default();
    let mut draft = TaskDraft::new("x");

    picker.open();
    assert!(!picker.confirm(&mut draft));
    assert!(picker.visible);

    picker.pick(date);
    assert!(picker.confirm(&mut draft));
    assert_eq!(draft.start_date, Some(date));
    assert!(!picker.visible);
    assert_eq!(picker.tentative, None);
  }

  #[test]
  fn edit_form_starts_from_task() {
    let date =
      NaiveDate::from_ymd_opt(2026, 6, 1)
        .expect("valid date");
    let task = Task::from_draft(
      TaskId::new(3),
      TaskDraft::new("Paint")
        .with_description("fence"),
      date
    );
    let mut view = ViewState::default();
    let form = view.open_edit_form(&task);
    assert_eq!(form.title(), "Edit Task");
    assert_eq!(form.draft.name, "Paint");
    assert_eq!(
      form.draft.start_date,
      Some(date)
    );
    assert_eq!(view.selected, Some(task.id));
    assert!(view.close_form().is_some());
    assert!(view.form.is_none());
  }

  #[test]
  fn view_state_serializes() {
    let mut view = ViewState::new(
      Theme::Dark,
      TaskFilter::Completed
    );
    view.open_add_form().draft.name =
      "draft".to_string();
    let json = serde_json::to_string(&view)
      .expect("serialize view");
    let back: ViewState =
      serde_json::from_str(&json)
        .expect("deserialize view");
    assert_eq!(back, view);
    assert!(json.contains("\"dark\""));
  }
}
