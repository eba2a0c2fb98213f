use std::fmt;

use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

use crate::filter::TaskFilter;
use crate::task::{
  TaskDraft,
  TaskId
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize
)]
#[serde(transparent)]
pub struct ConfirmationId(Uuid);

impl ConfirmationId {
  pub(crate) fn fresh() -> Self {
    Self(Uuid::new_v4())
  }
}

impl fmt::Display for ConfirmationId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
  DuplicateName,
  ConfirmEdit,
  ConfirmDeletion,
  ConfirmClear
}

/// A yes/no question for the user.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct Prompt {
  pub kind:    PromptKind,
  pub title:   String,
  pub message: String,
  pub cancel:  String,
  pub accept:  String
}

impl Prompt {
  pub fn duplicate_name(
    name: &str
  ) -> Self {
    Self {
      kind:    PromptKind::DuplicateName,
      title:   "Duplicate Task Name"
        .to_string(),
      message: format!(
        "A task with the name \
         \"{name}\" already exists. \
         Would you like to create it \
         anyway?"
      ),
      cancel:  "Cancel".to_string(),
      accept:  "Create Anyway".to_string()
    }
  }

  pub fn confirm_edit() -> Self {
    Self {
      kind:    PromptKind::ConfirmEdit,
      title:   "Confirm Edit".to_string(),
      message: "Are you sure you want to \
                save these changes?"
        .to_string(),
      cancel:  "Cancel".to_string(),
      accept:  "Save".to_string()
    }
  }

  pub fn confirm_deletion() -> Self {
    Self {
      kind:    PromptKind::ConfirmDeletion,
      title:   "Confirm Deletion"
        .to_string(),
      message: "Are you sure you want to \
                delete this task?"
        .to_string(),
      cancel:  "Cancel".to_string(),
      accept:  "Delete".to_string()
    }
  }

  pub fn confirm_clear() -> Self {
    Self {
      kind:    PromptKind::ConfirmClear,
      title:   "Confirm Clear Filtered \
                Tasks"
        .to_string(),
      message: "Are you sure you want to \
                clear all tasks in the \
                current filter?"
        .to_string(),
      cancel:  "Cancel".to_string(),
      accept:  "Clear".to_string()
    }
  }
}

/// One-way acknowledgment shown after
/// an operation; nothing to answer.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct Notice {
  pub title:   &'static str,
  pub message: &'static str
}

pub const TASK_COMPLETED: Notice =
  Notice {
    title:   "Task Completed",
    message: "Great job! Task marked as \
              complete."
  };

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
  pub id:     ConfirmationId,
  pub prompt: Prompt
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateStage {
  Duplicate,
  Edit
}

/// A mutation held back until the user
/// answers its prompt.
#[derive(Debug, Clone)]
pub(crate) enum Staged {
  Create {
    draft: TaskDraft,
    today: NaiveDate
  },
  Update {
    id:    TaskId,
    draft: TaskDraft,
    today: NaiveDate,
    stage: UpdateStage
  },
  Delete(TaskId),
  Clear(TaskFilter)
}

impl Staged {
  pub(crate) fn label(
    &self
  ) -> &'static str {
    match self {
      | Staged::Create { .. } => "create",
      | Staged::Update { .. } => "update",
      | Staged::Delete(_) => "delete",
      | Staged::Clear(_) => "clear"
    }
  }
}
