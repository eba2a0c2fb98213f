use thiserror::Error;

use crate::confirm::ConfirmationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  #[error(
    "Task Name Required: Please enter \
     a name for your task."
  )]
  NameRequired,

  #[error(
    "no pending confirmation with id \
     {0}"
  )]
  UnknownConfirmation(ConfirmationId)
}

impl StoreError {
  /// Alert heading shown to the user.
  pub fn title(&self) -> &'static str {
    match self {
      | StoreError::NameRequired => {
        "Task Name Required"
      }
      | StoreError::UnknownConfirmation(
        _
      ) => "Nothing To Confirm"
    }
  }

  pub fn message(&self) -> String {
    match self {
      | StoreError::NameRequired => {
        "Please enter a name for your \
         task."
          .to_string()
      }
      | StoreError::UnknownConfirmation(
        id
      ) => format!(
        "Confirmation {id} is no longer \
         pending."
      )
    }
  }
}

pub type StoreResult<T> =
  Result<T, StoreError>;
