use chrono::NaiveDate;
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::confirm::{
  ConfirmationId,
  Notice,
  PendingConfirmation,
  Prompt,
  Staged,
  TASK_COMPLETED,
  UpdateStage
};
use crate::duplicates::find_duplicate;
use crate::error::{
  StoreError,
  StoreResult
};
use crate::filter::{
  self,
  TaskFilter
};
use crate::task::{
  Task,
  TaskDraft,
  TaskId
};

/// What an applied mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
  Created(TaskId),
  Updated(TaskId),
  Deleted(TaskId),
  Cleared {
    filter:  TaskFilter,
    removed: usize
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Applied(Effect),
  Pending(PendingConfirmation),
  Discarded,
  /// Accepted, but the target id was
  /// gone.
  Unchanged
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
  pub id:        TaskId,
  pub completed: bool,
  pub notice:    Option<Notice>
}

/// The ordered, in-memory task list.
///
/// Mutations that need the user's
/// approval are staged and come back
/// as [`Outcome::Pending`]; answer them
/// with [`TaskStore::resolve`]. At most
/// one confirmation is outstanding.
#[derive(Debug)]
pub struct TaskStore {
  tasks:   Vec<Task>,
  next_id: u64,
  staged:  Option<(
    PendingConfirmation,
    Staged
  )>
}

impl Default for TaskStore {
  fn default() -> Self {
    Self::new()
  }
}

impl TaskStore {
  pub fn new() -> Self {
    Self {
      tasks:   Vec::new(),
      next_id: 1,
      staged:  None
    }
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn get(
    &self,
    id: TaskId
  ) -> Option<&Task> {
    self
      .tasks
      .iter()
      .find(|task| task.id == id)
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  pub fn next_id(&self) -> TaskId {
    TaskId::new(self.next_id)
  }

  pub fn pending(
    &self
  ) -> Option<&PendingConfirmation> {
    self
      .staged
      .as_ref()
      .map(|(pending, _)| pending)
  }

  pub fn filtered(
    &self,
    active: TaskFilter
  ) -> Vec<&Task> {
    filter::filter(&self.tasks, active)
  }

  #[instrument(skip_all, fields(name = %draft.name))]
  pub fn create(
    &mut self,
    draft: TaskDraft,
    today: NaiveDate
  ) -> StoreResult<Outcome> {
    if !draft.has_name() {
      warn!("create rejected: empty name");
      return Err(
        StoreError::NameRequired
      );
    }

    if let Some(existing) = find_duplicate(
      &self.tasks,
      &draft.name,
      None
    ) {
      debug!(
        existing = %existing.id,
        "duplicate name on create"
      );
      let prompt =
        Prompt::duplicate_name(
          &draft.name
        );
      return Ok(self.stage(
        Staged::Create {
          draft,
          today
        },
        prompt
      ));
    }

    let id = self.insert(draft, today);
    Ok(Outcome::Applied(
      Effect::Created(id)
    ))
  }

  /// Stages an edit of `id`. Edits
  /// always ask "Confirm Edit"; a name
  /// clash with another task asks
  /// "Duplicate Task Name" first.
  #[instrument(skip_all, fields(id = %id, name = %draft.name))]
  pub fn update(
    &mut self,
    id: TaskId,
    draft: TaskDraft,
    today: NaiveDate
  ) -> StoreResult<Outcome> {
    if !draft.has_name() {
      warn!("update rejected: empty name");
      return Err(
        StoreError::NameRequired
      );
    }

    let duplicate = find_duplicate(
      &self.tasks,
      &draft.name,
      Some(id)
    )
    .is_some();

    let (stage, prompt) = if duplicate {
      debug!("duplicate name on update");
      (
        UpdateStage::Duplicate,
        Prompt::duplicate_name(
          &draft.name
        )
      )
    } else {
      (
        UpdateStage::Edit,
        Prompt::confirm_edit()
      )
    };

    Ok(self.stage(
      Staged::Update {
        id,
        draft,
        today,
        stage
      },
      prompt
    ))
  }

  #[instrument(skip_all, fields(id = %id))]
  pub fn toggle_complete(
    &mut self,
    id: TaskId
  ) -> Option<Toggled> {
    let Some(task) = self
      .tasks
      .iter_mut()
      .find(|task| task.id == id)
    else {
      debug!("toggle ignored: no such task");
      return None;
    };

    task.completed = !task.completed;
    info!(
      completed = task.completed,
      "toggled task"
    );

    Some(Toggled {
      id,
      completed: task.completed,
      notice: task
        .completed
        .then_some(TASK_COMPLETED)
    })
  }

  #[instrument(skip_all, fields(id = %id))]
  pub fn delete(
    &mut self,
    id: TaskId
  ) -> Outcome {
    self.stage(
      Staged::Delete(id),
      Prompt::confirm_deletion()
    )
  }

  #[instrument(skip_all, fields(filter = %active))]
  pub fn clear_filtered(
    &mut self,
    active: TaskFilter
  ) -> Outcome {
    self.stage(
      Staged::Clear(active),
      Prompt::confirm_clear()
    )
  }

  /// Applies (`accepted`) or drops the
  /// staged mutation behind
  /// `confirmation`. Accepting may
  /// return a follow-up prompt.
  #[instrument(skip(self, confirmation), fields(confirmation = %confirmation))]
  pub fn resolve(
    &mut self,
    confirmation: ConfirmationId,
    accepted: bool
  ) -> StoreResult<Outcome> {
    let staged = match self.staged.take()
    {
      | Some((pending, staged))
        if pending.id == confirmation =>
      {
        staged
      }
      | other => {
        self.staged = other;
        warn!("unknown confirmation");
        return Err(
          StoreError::UnknownConfirmation(
            confirmation
          )
        );
      }
    };

    if !accepted {
      info!(
        kind = staged.label(),
        "confirmation declined; discarded"
      );
      return Ok(Outcome::Discarded);
    }

    debug!(
      kind = staged.label(),
      "confirmation accepted"
    );
    Ok(self.apply(staged))
  }

  fn stage(
    &mut self,
    staged: Staged,
    prompt: Prompt
  ) -> Outcome {
    let pending = PendingConfirmation {
      id: ConfirmationId::fresh(),
      prompt
    };

    if let Some((previous, old)) =
      self.staged.take()
    {
      debug!(
        previous = %previous.id,
        kind = old.label(),
        "replacing unanswered confirmation"
      );
    }

    debug!(
      confirmation = %pending.id,
      kind = staged.label(),
      "staged mutation"
    );
    self.staged =
      Some((pending.clone(), staged));
    Outcome::Pending(pending)
  }

  fn apply(
    &mut self,
    staged: Staged
  ) -> Outcome {
    match staged {
      | Staged::Create {
        draft,
        today
      } => {
        let id = self.insert(draft, today);
        Outcome::Applied(Effect::Created(
          id
        ))
      }
      | Staged::Update {
        id,
        draft,
        today,
        stage: UpdateStage::Duplicate
      } => self.stage(
        Staged::Update {
          id,
          draft,
          today,
          stage: UpdateStage::Edit
        },
        Prompt::confirm_edit()
      ),
      | Staged::Update {
        id,
        draft,
        today,
        stage: UpdateStage::Edit
      } => self.replace(id, draft, today),
      | Staged::Delete(id) => {
        self.remove(id)
      }
      | Staged::Clear(active) => {
        self.clear(active)
      }
    }
  }

  fn insert(
    &mut self,
    draft: TaskDraft,
    today: NaiveDate
  ) -> TaskId {
    let id = TaskId::new(self.next_id);
    self.next_id += 1;
    self
      .tasks
      .push(Task::from_draft(
        id, draft, today
      ));
    info!(
      id = %id,
      count = self.tasks.len(),
      "task created"
    );
    id
  }

  fn replace(
    &mut self,
    id: TaskId,
    draft: TaskDraft,
    today: NaiveDate
  ) -> Outcome {
    let Some(slot) = self
      .tasks
      .iter_mut()
      .find(|task| task.id == id)
    else {
      debug!(id = %id, "edit target missing");
      return Outcome::Unchanged;
    };

    *slot =
      Task::from_draft(id, draft, today);
    info!(id = %id, "task updated");
    Outcome::Applied(Effect::Updated(id))
  }

  fn remove(
    &mut self,
    id: TaskId
  ) -> Outcome {
    let before = self.tasks.len();
    self
      .tasks
      .retain(|task| task.id != id);
    if self.tasks.len() == before {
      debug!(id = %id, "delete target missing");
      return Outcome::Unchanged;
    }
    info!(id = %id, "task deleted");
    Outcome::Applied(Effect::Deleted(id))
  }

  fn clear(
    &mut self,
    active: TaskFilter
  ) -> Outcome {
    let before = self.tasks.len();
    self
      .tasks
      .retain(|task| !active.matches(task));
    let removed = before - self.tasks.len();
    info!(
      filter = %active,
      removed,
      "cleared filtered tasks"
    );
    Outcome::Applied(Effect::Cleared {
      filter: active,
      removed
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    Effect,
    Outcome,
    TaskStore
  };
  use crate::confirm::{
    PendingConfirmation,
    PromptKind,
    TASK_COMPLETED
  };
  use crate::error::StoreError;
  use crate::filter::TaskFilter;
  use crate::task::{
    NO_DESCRIPTION,
    TaskDraft,
    TaskId
  };

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17)
      .expect("valid date")
  }

  fn pending(
    outcome: Outcome
  ) -> PendingConfirmation {
    match outcome {
      | Outcome::Pending(p) => p,
      | other => {
        panic!("expected prompt, got {other:?}")
      }
    }
  }

  fn add(
    store: &mut TaskStore,
    name: &str
  ) -> TaskId {
    match store
      .create(TaskDraft::new(name), today())
      .expect("create")
    {
      | Outcome::Applied(
        Effect::Created(id)
      ) => id,
      | other => {
        panic!("expected create, got {other:?}")
      }
    }
  }

  #[test]
  fn ids_increase_in_creation_order() {
    let mut store = TaskStore::new();
    let ids: Vec<TaskId> = ["a", "b", "c"]
      .iter()
      .map(|name| add(&mut store, name))
      .collect();

    assert_eq!(store.len(), 3);
    assert!(
      ids.windows(2).all(|w| w[0] < w[1])
    );
    assert_eq!(ids[0], TaskId::new(1));
    assert_eq!(
      store.next_id(),
      TaskId::new(4)
    );
  }

  #[test]
  fn empty_or_blank_name_is_rejected() {
    let mut store = TaskStore::new();
    add(&mut store, "keep");

    for name in ["", "   "] {
      let err = store
        .create(
          TaskDraft::new(name),
          today()
        )
        .expect_err("should reject");
      assert_eq!(
        err,
        StoreError::NameRequired
      );
    }
    assert_eq!(store.len(), 1);
    assert_eq!(
      store.next_id(),
      TaskId::new(2)
    );
  }

  #[test]
  fn create_applies_defaults() {
    let mut store = TaskStore::new();
    let id = add(&mut store, "Walk dog");
    let task =
      store.get(id).expect("task exists");
    assert_eq!(
      task.description,
      NO_DESCRIPTION
    );
    assert_eq!(task.start_date, today());
    assert!(!task.completed);
  }

  #[test]
  fn duplicate_create_needs_confirmation()
  {
    let mut store = TaskStore::new();
    add(&mut store, "A");

    let declined = pending(
      store
        .create(TaskDraft::new("a"), today())
        .expect("stage")
    );
    assert_eq!(
      declined.prompt.kind,
      PromptKind::DuplicateName
    );
    assert_eq!(
      store
        .resolve(declined.id, false)
        .expect("resolve"),
      Outcome::Discarded
    );
    assert_eq!(store.len(), 1);

    let accepted = pending(
      store
        .create(TaskDraft::new("A"), today())
        .expect("stage")
    );
    let outcome = store
      .resolve(accepted.id, true)
      .expect("resolve");
    assert_eq!(
      outcome,
      Outcome::Applied(Effect::Created(
        TaskId::new(2)
      ))
    );
    assert_eq!(store.len(), 2);
    assert!(store.pending().is_none());
  }

  #[test]
  fn toggle_twice_restores_flag() {
    let mut store = TaskStore::new();
    let id = add(&mut store, "Laundry");
    let before =
      store.get(id).cloned().expect("task");

    let first = store
      .toggle_complete(id)
      .expect("toggle");
    assert!(first.completed);
    assert_eq!(
      first.notice,
      Some(TASK_COMPLETED)
    );

    let second = store
      .toggle_complete(id)
      .expect("toggle");
    assert!(!second.completed);
    assert_eq!(second.notice, None);
    assert_eq!(store.get(id), Some(&before));
  }

  #[test]
  fn toggle_missing_id_is_noop() {
    let mut store = TaskStore::new();
    add(&mut store, "x");
    assert!(
      store
        .toggle_complete(TaskId::new(9))
        .is_none()
    );
  }

  #[test]
  fn update_resets_completed_in_place() {
    let mut store = TaskStore::new();
    let first = add(&mut store, "A");
    add(&mut store, "Other");
    store.toggle_complete(first);

    let prompt = pending(
      store
        .update(
          first,
          TaskDraft::new("B"),
          today()
        )
        .expect("stage")
    );
    assert_eq!(
      prompt.prompt.kind,
      PromptKind::ConfirmEdit
    );
    assert_eq!(
      store
        .resolve(prompt.id, true)
        .expect("resolve"),
      Outcome::Applied(Effect::Updated(
        first
      ))
    );

    let task = &store.tasks()[0];
    assert_eq!(task.id, first);
    assert_eq!(task.name, "B");
    assert!(!task.completed);
  }

  #[test]
  fn update_keeps_own_name_without_duplicate_prompt()
  {
    let mut store = TaskStore::new();
    let id = add(&mut store, "Same");
    let prompt = pending(
      store
        .update(
          id,
          TaskDraft::new("SAME"),
          today()
        )
        .expect("stage")
    );
    assert_eq!(
      prompt.prompt.kind,
      PromptKind::ConfirmEdit
    );
  }

  #[test]
  fn update_duplicate_chains_into_edit_prompt()
  {
    let mut store = TaskStore::new();
    add(&mut store, "Taken");
    let id = add(&mut store, "Mine");

    let dup = pending(
      store
        .update(
          id,
          TaskDraft::new("taken"),
          today()
        )
        .expect("stage")
    );
    assert_eq!(
      dup.prompt.kind,
      PromptKind::DuplicateName
    );

    let edit = pending(
      store
        .resolve(dup.id, true)
        .expect("resolve dup")
    );
    assert_eq!(
      edit.prompt.kind,
      PromptKind::ConfirmEdit
    );
    assert_eq!(
      store.get(id).map(|t| t.name.as_str()),
      Some("Mine")
    );

    store
      .resolve(edit.id, true)
      .expect("resolve edit");
    assert_eq!(
      store.get(id).map(|t| t.name.as_str()),
      Some("taken")
    );
  }

  #[test]
  fn confirmed_update_of_missing_id_is_unchanged()
  {
    let mut store = TaskStore::new();
    add(&mut store, "x");
    let prompt = pending(
      store
        .update(
          TaskId::new(42),
          TaskDraft::new("y"),
          today()
        )
        .expect("stage")
    );
    assert_eq!(
      store
        .resolve(prompt.id, true)
        .expect("resolve"),
      Outcome::Unchanged
    );
    assert_eq!(store.tasks()[0].name, "x");
  }

  #[test]
  fn delete_requires_confirmation() {
    let mut store = TaskStore::new();
    let id = add(&mut store, "gone");

    let no = pending(store.delete(id));
    store
      .resolve(no.id, false)
      .expect("decline");
    assert_eq!(store.len(), 1);

    let yes = pending(store.delete(id));
    assert_eq!(
      store
        .resolve(yes.id, true)
        .expect("accept"),
      Outcome::Applied(Effect::Deleted(id))
    );
    assert!(store.is_empty());

    let again = pending(store.delete(id));
    assert_eq!(
      store
        .resolve(again.id, true)
        .expect("accept"),
      Outcome::Unchanged
    );
  }

  #[test]
  fn clear_incomplete_keeps_completed() {
    let mut store = TaskStore::new();
    let first = add(&mut store, "one");
    add(&mut store, "two");
    add(&mut store, "three");
    store.toggle_complete(first);

    let prompt = pending(
      store.clear_filtered(
        TaskFilter::Incomplete
      )
    );
    assert_eq!(
      store
        .resolve(prompt.id, true)
        .expect("accept"),
      Outcome::Applied(Effect::Cleared {
        filter:  TaskFilter::Incomplete,
        removed: 2
      })
    );
    assert_eq!(store.len(), 1);
    assert_eq!(store.tasks()[0].id, first);
  }

  #[test]
  fn clear_completed_keeps_open_tasks() {
    let mut store = TaskStore::new();
    let first = add(&mut store, "one");
    let second = add(&mut store, "two");
    let third = add(&mut store, "three");
    store.toggle_complete(first);
    store.toggle_complete(third);

    let prompt = pending(
      store
        .clear_filtered(TaskFilter::Completed)
    );
    assert_eq!(
      prompt.prompt.kind,
      PromptKind::ConfirmClear
    );
    assert_eq!(
      store
        .resolve(prompt.id, true)
        .expect("accept"),
      Outcome::Applied(Effect::Cleared {
        filter:  TaskFilter::Completed,
        removed: 2
      })
    );
    let ids: Vec<TaskId> =
      store.tasks().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second]);
  }

  #[test]
  fn clear_all_empties_store_but_keeps_counter()
  {
    let mut store = TaskStore::new();
    add(&mut store, "one");
    let second = add(&mut store, "two");
    store.toggle_complete(second);

    let declined = pending(
      store.clear_filtered(TaskFilter::All)
    );
    assert_eq!(
      store
        .resolve(declined.id, false)
        .expect("decline"),
      Outcome::Discarded
    );
    assert_eq!(store.len(), 2);

    let prompt = pending(
      store.clear_filtered(TaskFilter::All)
    );
    assert_eq!(
      store
        .resolve(prompt.id, true)
        .expect("accept"),
      Outcome::Applied(Effect::Cleared {
        filter:  TaskFilter::All,
        removed: 2
      })
    );
    assert!(store.is_empty());
    assert_eq!(store.next_id(), TaskId::new(3));
  }

  #[test]
  fn update_with_blank_name_is_rejected() {
    let mut store = TaskStore::new();
    let id = add(&mut store, "keep me");
    store.toggle_complete(id);
    let before =
      store.get(id).cloned().expect("task");

    for blank in ["", "   "] {
      let draft = TaskDraft::new(blank)
        .with_description("changed");
      assert_eq!(
        store.update(id, draft, today()),
        Err(StoreError::NameRequired)
      );
      assert!(store.pending().is_none());
      assert_eq!(store.get(id), Some(&before));
    }
  }

  #[test]
  fn new_request_invalidates_old_confirmation()
  {
    let mut store = TaskStore::new();
    let id = add(&mut store, "x");
    let stale = pending(store.delete(id));
    let fresh = pending(
      store.clear_filtered(TaskFilter::All)
    );

    assert_eq!(
      store.resolve(stale.id, true),
      Err(StoreError::UnknownConfirmation(
        stale.id
      ))
    );
    assert_eq!(
      store.pending().map(|p| p.id),
      Some(fresh.id)
    );
    assert_eq!(store.len(), 1);
  }
}
