use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};

/// Stored in place of a blank
/// description.
pub const NO_DESCRIPTION: &str =
  "No description provided";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize
)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
  pub fn new(raw: u64) -> Self {
    Self(raw)
  }

  pub fn get(self) -> u64 {
    self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for TaskId {
  type Err = ParseIntError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    s.trim().parse::<u64>().map(Self)
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:          TaskId,
  pub name:        String,
  pub description: String,
  pub start_date:  NaiveDate,
  pub completed:   bool
}

impl Task {
  /// Builds a fresh, incomplete task
  /// from a draft. Blank descriptions
  /// become [`NO_DESCRIPTION`] and a
  /// missing start date becomes
  /// `today`.
  pub fn from_draft(
    id: TaskId,
    draft: TaskDraft,
    today: NaiveDate
  ) -> Self {
    Self {
      id,
      name: draft.name,
      description:
        normalize_description(
          draft.description
        ),
      start_date: draft
        .start_date
        .unwrap_or(today),
      completed: false
    }
  }

  pub fn name_matches(
    &self,
    name: &str
  ) -> bool {
    same_name(&self.name, name)
  }
}

/// Candidate fields for a create or
/// an edit, before validation.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct TaskDraft {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub start_date:  Option<NaiveDate>
}

impl TaskDraft {
  pub fn new(
    name: impl Into<String>
  ) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Pre-fills a draft with the
  /// current values of `task`.
  pub fn from_task(task: &Task) -> Self {
    Self {
      name:        task.name.clone(),
      description: Some(
        task.description.clone()
      ),
      start_date:  Some(task.start_date)
    }
  }

  pub fn with_description(
    mut self,
    description: impl Into<String>
  ) -> Self {
    self.description =
      Some(description.into());
    self
  }

  pub fn with_start_date(
    mut self,
    date: NaiveDate
  ) -> Self {
    self.start_date = Some(date);
    self
  }

  pub fn has_name(&self) -> bool {
    !self.name.trim().is_empty()
  }
}

pub fn normalize_description(
  raw: Option<String>
) -> String {
  match raw {
    | Some(text)
      if !text.trim().is_empty() =>
    {
      text
    }
    | _ => NO_DESCRIPTION.to_string()
  }
}

pub fn same_name(
  a: &str,
  b: &str
) -> bool {
  a.to_lowercase() == b.to_lowercase()
}
