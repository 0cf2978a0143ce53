use chrono::Utc;
use log::{debug, error, info};

use crate::{
    CreateError, DeleteError, ExerciseSpec, Name, Outcome, Progress, ProgressService, ReadError,
    Reps, Session, SessionID, SessionRepository, SessionService, Set, SetID, SetPatch,
    SetRepository, SetService, UpdateError, UserID, Weight, Workout, WorkoutID, WorkoutRepository,
    WorkoutService, progress,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(_) | $error::Other(_) => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: WorkoutRepository> WorkoutService for Service<R> {
    async fn get_workouts(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError> {
        log_on_error!(
            self.repository.read_workouts(user_id),
            ReadError,
            "get",
            "workouts"
        )
    }

    async fn get_workout(&self, user_id: UserID, id: WorkoutID) -> Result<Workout, ReadError> {
        log_on_error!(
            self.repository.read_workout(user_id, id),
            ReadError,
            "get",
            "workout"
        )
    }

    async fn create_workout(
        &self,
        user_id: UserID,
        name: Name,
        description: Option<String>,
        exercises: Vec<ExerciseSpec>,
    ) -> Result<Workout, CreateError> {
        log_on_error!(
            self.repository
                .create_workout(user_id, name, description, exercises),
            CreateError,
            "create",
            "workout"
        )
    }

    async fn modify_workout(
        &self,
        user_id: UserID,
        id: WorkoutID,
        name: Option<Name>,
        description: Option<Option<String>>,
        exercises: Option<Vec<ExerciseSpec>>,
    ) -> Result<Workout, UpdateError> {
        log_on_error!(
            self.repository
                .modify_workout(user_id, id, name, description, exercises),
            UpdateError,
            "modify",
            "workout"
        )
    }

    async fn delete_workout(
        &self,
        user_id: UserID,
        id: WorkoutID,
    ) -> Result<WorkoutID, DeleteError> {
        log_on_error!(
            self.repository.delete_workout(user_id, id),
            DeleteError,
            "delete",
            "workout"
        )
    }
}

impl<R: SessionRepository> SessionService for Service<R> {
    async fn start_session(
        &self,
        user_id: UserID,
        workout_id: WorkoutID,
    ) -> Result<Session, CreateError> {
        let session = log_on_error!(
            self.repository
                .create_session(user_id, workout_id, Utc::now()),
            CreateError,
            "start",
            "session"
        )?;
        info!("started session {}", *session.id);
        Ok(session)
    }

    async fn complete_session(
        &self,
        user_id: UserID,
        id: SessionID,
        notes: Option<String>,
    ) -> Result<Session, UpdateError> {
        let session = log_on_error!(
            self.repository
                .finish_session(user_id, id, Outcome::Completed, Utc::now(), notes),
            UpdateError,
            "complete",
            "session"
        )?;
        info!("completed session {}", *session.id);
        Ok(session)
    }

    async fn cancel_session(
        &self,
        user_id: UserID,
        id: SessionID,
    ) -> Result<Session, UpdateError> {
        let session = log_on_error!(
            self.repository
                .finish_session(user_id, id, Outcome::Cancelled, Utc::now(), None),
            UpdateError,
            "cancel",
            "session"
        )?;
        info!("cancelled session {}", *session.id);
        Ok(session)
    }

    async fn get_session(&self, user_id: UserID, id: SessionID) -> Result<Session, ReadError> {
        log_on_error!(
            self.repository.read_session(user_id, id),
            ReadError,
            "get",
            "session"
        )
    }

    async fn get_active_session(&self, user_id: UserID) -> Result<Option<Session>, ReadError> {
        log_on_error!(
            self.repository.read_active_session(user_id),
            ReadError,
            "get",
            "active session"
        )
    }

    async fn get_sessions(&self, user_id: UserID) -> Result<Vec<Session>, ReadError> {
        log_on_error!(
            self.repository.read_sessions(user_id),
            ReadError,
            "get",
            "sessions"
        )
    }
}

impl<R: SetRepository> SetService for Service<R> {
    async fn get_sets(
        &self,
        user_id: UserID,
        session_id: SessionID,
    ) -> Result<Vec<Set>, ReadError> {
        log_on_error!(
            self.repository.read_sets(user_id, session_id),
            ReadError,
            "get",
            "sets"
        )
    }

    async fn record_set(
        &self,
        user_id: UserID,
        session_id: SessionID,
        exercise_name: Name,
        reps: Reps,
        weight: Option<Weight>,
        completed: bool,
    ) -> Result<Set, CreateError> {
        log_on_error!(
            self.repository.create_set(
                user_id,
                session_id,
                exercise_name,
                reps,
                weight,
                completed,
                Utc::now()
            ),
            CreateError,
            "record",
            "set"
        )
    }

    async fn update_set(
        &self,
        user_id: UserID,
        id: SetID,
        patch: SetPatch,
    ) -> Result<Set, UpdateError> {
        log_on_error!(
            self.repository.modify_set(user_id, id, patch, Utc::now()),
            UpdateError,
            "update",
            "set"
        )
    }

    async fn delete_set(&self, user_id: UserID, id: SetID) -> Result<SetID, DeleteError> {
        log_on_error!(
            self.repository.delete_set(user_id, id),
            DeleteError,
            "delete",
            "set"
        )
    }
}

impl<R> ProgressService for Service<R>
where
    R: WorkoutRepository + SessionRepository + SetRepository,
{
    async fn get_progress(
        &self,
        user_id: UserID,
        session_id: SessionID,
    ) -> Result<Progress, ReadError> {
        log_on_error!(
            async {
                let session = self.repository.read_session(user_id, session_id).await?;
                let workout = match self
                    .repository
                    .read_workout(user_id, session.workout_id)
                    .await
                {
                    Ok(workout) => Some(workout),
                    Err(ReadError::NotFound) => None,
                    Err(err) => return Err(err),
                };
                let sets = self.repository.read_sets(user_id, session_id).await?;
                Ok(progress(workout.as_ref(), &sets))
            },
            ReadError,
            "get",
            "progress"
        )
    }
}
