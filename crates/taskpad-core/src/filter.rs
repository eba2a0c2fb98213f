use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::task::Task;

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
pub enum TaskFilter {
  #[default]
  All,
  Completed,
  Incomplete
}

impl TaskFilter {
  pub const VARIANTS: [TaskFilter; 3] = [
    TaskFilter::All,
    TaskFilter::Completed,
    TaskFilter::Incomplete
  ];

  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | TaskFilter::All => true,
      | TaskFilter::Completed => {
        task.completed
      }
      | TaskFilter::Incomplete => {
        !task.completed
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | TaskFilter::All => "all",
      | TaskFilter::Completed => {
        "completed"
      }
      | TaskFilter::Incomplete => {
        "incomplete"
      }
    }
  }
}

impl fmt::Display for TaskFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TaskFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let lower =
      s.trim().to_ascii_lowercase();
    TaskFilter::VARIANTS
      .into_iter()
      .find(|f| f.as_str() == lower)
      .ok_or_else(|| {
        anyhow!(
          "unknown filter: {s} \
           (expected all, completed \
           or incomplete)"
        )
      })
  }
}

/// Read-only projection of `tasks`
/// onto `filter`, in store order.
pub fn filter(
  tasks: &[Task],
  filter: TaskFilter
) -> Vec<&Task> {
  let out: Vec<&Task> = tasks
    .iter()
    .filter(|task| filter.matches(task))
    .collect();
  trace!(
    filter = %filter,
    total = tasks.len(),
    kept = out.len(),
    "filtered tasks"
  );
  out
}
