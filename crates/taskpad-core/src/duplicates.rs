use crate::task::{
  Task,
  TaskId,
  same_name
};

/// First task named `name`
/// (case-insensitively), skipping
/// `excluding` when editing.
pub fn find_duplicate<'a, I>(
  tasks: I,
  name: &str,
  excluding: Option<TaskId>
) -> Option<&'a Task>
where
  I: IntoIterator<Item = &'a Task>
{
  tasks.into_iter().find(|task| {
    task.name_matches(name)
      && Some(task.id) != excluding
  })
}

/// 1-based display number of `id`
/// among the tasks sharing `name`.
///
/// Same-named tasks are ordered by
/// their id *as text*, so `"10"` sorts
/// before `"2"`. Returns 0 when the
/// name is unique or `id` is not one
/// of them.
pub fn duplicate_rank<'a, I>(
  tasks: I,
  name: &str,
  id: TaskId
) -> usize
where
  I: IntoIterator<Item = &'a Task>
{
  let mut keys: Vec<String> = tasks
    .into_iter()
    .filter(|task| {
      same_name(&task.name, name)
    })
    .map(|task| task.id.to_string())
    .collect();

  if keys.len() < 2 {
    return 0;
  }

  keys.sort();
  let wanted = id.to_string();
  keys
    .iter()
    .position(|key| *key == wanted)
    .map(|idx| idx + 1)
    .unwrap_or(0)
}
