use crate::{NameError, RepsError, SessionStatus, TargetSetsError, TimeError, WeightError};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("not found")]
    NotFound,
    #[error("not authorized")]
    Unauthorized,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxedError),
}

#[derive(thiserror::Error, Debug)]
pub enum CreateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("not found")]
    NotFound,
    #[error("not authorized")]
    Unauthorized,
    #[error("conflict")]
    Conflict,
    #[error("session is {0}")]
    InvalidState(SessionStatus),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxedError),
}

impl From<ReadError> for CreateError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => CreateError::NotFound,
            ReadError::Unauthorized => CreateError::Unauthorized,
            ReadError::Storage(storage) => CreateError::Storage(storage),
            ReadError::Other(other) => CreateError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("not found")]
    NotFound,
    #[error("not authorized")]
    Unauthorized,
    #[error("session is {0}")]
    InvalidState(SessionStatus),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxedError),
}

impl From<ReadError> for UpdateError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => UpdateError::NotFound,
            ReadError::Unauthorized => UpdateError::Unauthorized,
            ReadError::Storage(storage) => UpdateError::Storage(storage),
            ReadError::Other(other) => UpdateError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DeleteError {
    #[error("not found")]
    NotFound,
    #[error("not authorized")]
    Unauthorized,
    #[error("session is {0}")]
    InvalidState(SessionStatus),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] BoxedError),
}

impl From<ReadError> for DeleteError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => DeleteError::NotFound,
            ReadError::Unauthorized => DeleteError::Unauthorized,
            ReadError::Storage(storage) => DeleteError::Storage(storage),
            ReadError::Other(other) => DeleteError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Other(#[from] BoxedError),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Workout must contain at least one exercise")]
    NoExercises,
    #[error("Exercise \"{0}\" occurs more than once")]
    DuplicateExercise(String),
    #[error("Exercise \"{0}\" is not part of the workout")]
    UnknownExercise(String),
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Reps(#[from] RepsError),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error(transparent)]
    TargetSets(#[from] TargetSetsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_error_from_read_error() {
        assert!(matches!(
            CreateError::from(ReadError::NotFound),
            CreateError::NotFound
        ));
        assert!(matches!(
            CreateError::from(ReadError::Unauthorized),
            CreateError::Unauthorized
        ));
        assert!(matches!(
            CreateError::from(ReadError::Storage(StorageError::Poisoned)),
            CreateError::Storage(StorageError::Poisoned)
        ));
        assert!(matches!(
            CreateError::from(ReadError::Other("foo".into())),
            CreateError::Other(error) if error.to_string() == "foo"
        ));
    }

    #[test]
    fn test_update_error_from_read_error() {
        assert!(matches!(
            UpdateError::from(ReadError::NotFound),
            UpdateError::NotFound
        ));
        assert!(matches!(
            UpdateError::from(ReadError::Unauthorized),
            UpdateError::Unauthorized
        ));
        assert!(matches!(
            UpdateError::from(ReadError::Storage(StorageError::Poisoned)),
            UpdateError::Storage(StorageError::Poisoned)
        ));
    }

    #[test]
    fn test_delete_error_from_read_error() {
        assert!(matches!(
            DeleteError::from(ReadError::NotFound),
            DeleteError::NotFound
        ));
        assert!(matches!(
            DeleteError::from(ReadError::Unauthorized),
            DeleteError::Unauthorized
        ));
        assert!(matches!(
            DeleteError::from(ReadError::Other("foo".into())),
            DeleteError::Other(error) if error.to_string() == "foo"
        ));
    }

    #[test]
    fn test_invalid_state_display() {
        assert_eq!(
            UpdateError::InvalidState(SessionStatus::Completed).to_string(),
            "session is completed"
        );
        assert_eq!(
            CreateError::InvalidState(SessionStatus::Cancelled).to_string(),
            "session is cancelled"
        );
    }

    #[test]
    fn test_validation_error_from_name_error() {
        assert_eq!(
            ValidationError::from(NameError::Empty),
            ValidationError::Name(NameError::Empty)
        );
        assert_eq!(
            ValidationError::from(NameError::Empty).to_string(),
            "Name must not be empty"
        );
    }
}
