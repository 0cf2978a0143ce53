use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{DateTime, Utc};
use reptrack_domain as domain;
use uuid::Uuid;

/// Shared store for workouts, sessions and sets.
///
/// Every operation runs under one lock, so each check and the write depending on it form a
/// single step. Concurrent starts for one user, concurrent terminal transitions of one session
/// and the renumbering after a set deletion can therefore not interleave.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) tables: RwLock<Tables>,
}

#[derive(Default)]
pub(crate) struct Tables {
    pub(crate) workouts: BTreeMap<domain::WorkoutID, domain::Workout>,
    pub(crate) workouts_by_user: BTreeMap<domain::UserID, BTreeSet<domain::WorkoutID>>,
    pub(crate) sessions: BTreeMap<domain::SessionID, domain::Session>,
    pub(crate) sessions_by_user: BTreeMap<domain::UserID, BTreeSet<domain::SessionID>>,
    pub(crate) active_sessions: BTreeMap<domain::UserID, domain::SessionID>,
    pub(crate) ledgers: BTreeMap<domain::SessionID, domain::SetLedger>,
    pub(crate) set_sessions: BTreeMap<domain::SetID, domain::SessionID>,
}

impl Tables {
    fn workout(
        &self,
        user_id: domain::UserID,
        id: domain::WorkoutID,
    ) -> Result<&domain::Workout, domain::ReadError> {
        let workout = self.workouts.get(&id).ok_or(domain::ReadError::NotFound)?;
        if workout.user_id != user_id {
            return Err(domain::ReadError::Unauthorized);
        }
        Ok(workout)
    }

    fn workout_mut(
        &mut self,
        user_id: domain::UserID,
        id: domain::WorkoutID,
    ) -> Result<&mut domain::Workout, domain::ReadError> {
        let workout = self
            .workouts
            .get_mut(&id)
            .ok_or(domain::ReadError::NotFound)?;
        if workout.user_id != user_id {
            return Err(domain::ReadError::Unauthorized);
        }
        Ok(workout)
    }

    fn session(
        &self,
        user_id: domain::UserID,
        id: domain::SessionID,
    ) -> Result<&domain::Session, domain::ReadError> {
        let session = self.sessions.get(&id).ok_or(domain::ReadError::NotFound)?;
        if session.user_id != user_id {
            return Err(domain::ReadError::Unauthorized);
        }
        Ok(session)
    }

    fn session_mut(
        &mut self,
        user_id: domain::UserID,
        id: domain::SessionID,
    ) -> Result<&mut domain::Session, domain::ReadError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(domain::ReadError::NotFound)?;
        if session.user_id != user_id {
            return Err(domain::ReadError::Unauthorized);
        }
        Ok(session)
    }

    fn session_of_set(
        &self,
        user_id: domain::UserID,
        id: domain::SetID,
    ) -> Result<&domain::Session, domain::ReadError> {
        let session_id = self
            .set_sessions
            .get(&id)
            .ok_or(domain::ReadError::NotFound)?;
        self.session(user_id, *session_id)
    }

    pub(crate) fn insert_workout(&mut self, workout: domain::Workout) {
        self.workouts_by_user
            .entry(workout.user_id)
            .or_default()
            .insert(workout.id);
        self.workouts.insert(workout.id, workout);
    }

    /// Fails if the user already has another active session.
    pub(crate) fn insert_session(
        &mut self,
        session: domain::Session,
    ) -> Result<(), domain::Session> {
        if session.is_active() {
            if self
                .active_sessions
                .get(&session.user_id)
                .is_some_and(|id| *id != session.id)
            {
                return Err(session);
            }
            self.active_sessions.insert(session.user_id, session.id);
        }
        self.sessions_by_user
            .entry(session.user_id)
            .or_default()
            .insert(session.id);
        self.sessions.insert(session.id, session);
        Ok(())
    }

    pub(crate) fn insert_set(&mut self, set: domain::Set) -> Result<(), domain::Set> {
        let id = set.id;
        let session_id = set.session_id;
        if self.set_sessions.contains_key(&id) {
            return Err(set);
        }
        self.ledgers
            .entry(session_id)
            .or_insert_with(|| domain::SetLedger::new(session_id))
            .insert(set)?;
        self.set_sessions.insert(id, session_id);
        Ok(())
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, domain::StorageError> {
        self.tables
            .read()
            .map_err(|_| domain::StorageError::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, domain::StorageError> {
        self.tables
            .write()
            .map_err(|_| domain::StorageError::Poisoned)
    }
}

impl domain::WorkoutRepository for MemoryStore {
    async fn read_workouts(
        &self,
        user_id: domain::UserID,
    ) -> Result<Vec<domain::Workout>, domain::ReadError> {
        let tables = self.read()?;
        Ok(tables
            .workouts_by_user
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.workouts.get(id))
            .cloned()
            .collect())
    }

    async fn read_workout(
        &self,
        user_id: domain::UserID,
        id: domain::WorkoutID,
    ) -> Result<domain::Workout, domain::ReadError> {
        Ok(self.read()?.workout(user_id, id)?.clone())
    }

    async fn create_workout(
        &self,
        user_id: domain::UserID,
        name: domain::Name,
        description: Option<String>,
        exercises: Vec<domain::ExerciseSpec>,
    ) -> Result<domain::Workout, domain::CreateError> {
        domain::validate_exercises(&exercises)?;
        let workout = domain::Workout {
            id: Uuid::new_v4().into(),
            user_id,
            name,
            description,
            exercises,
        };
        self.write()?.insert_workout(workout.clone());
        Ok(workout)
    }

    async fn modify_workout(
        &self,
        user_id: domain::UserID,
        id: domain::WorkoutID,
        name: Option<domain::Name>,
        description: Option<Option<String>>,
        exercises: Option<Vec<domain::ExerciseSpec>>,
    ) -> Result<domain::Workout, domain::UpdateError> {
        if let Some(exercises) = &exercises {
            domain::validate_exercises(exercises)?;
        }
        let mut tables = self.write()?;
        let workout = tables.workout_mut(user_id, id)?;
        if let Some(name) = name {
            workout.name = name;
        }
        if let Some(description) = description {
            workout.description = description;
        }
        if let Some(exercises) = exercises {
            workout.exercises = exercises;
        }
        Ok(workout.clone())
    }

    async fn delete_workout(
        &self,
        user_id: domain::UserID,
        id: domain::WorkoutID,
    ) -> Result<domain::WorkoutID, domain::DeleteError> {
        let mut tables = self.write()?;
        tables.workout(user_id, id)?;
        tables.workouts.remove(&id);
        if let Some(ids) = tables.workouts_by_user.get_mut(&user_id) {
            ids.remove(&id);
        }
        Ok(id)
    }
}

impl domain::SessionRepository for MemoryStore {
    async fn read_sessions(
        &self,
        user_id: domain::UserID,
    ) -> Result<Vec<domain::Session>, domain::ReadError> {
        let tables = self.read()?;
        Ok(tables
            .sessions_by_user
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.sessions.get(id))
            .cloned()
            .collect())
    }

    async fn read_session(
        &self,
        user_id: domain::UserID,
        id: domain::SessionID,
    ) -> Result<domain::Session, domain::ReadError> {
        Ok(self.read()?.session(user_id, id)?.clone())
    }

    async fn read_active_session(
        &self,
        user_id: domain::UserID,
    ) -> Result<Option<domain::Session>, domain::ReadError> {
        let tables = self.read()?;
        Ok(tables
            .active_sessions
            .get(&user_id)
            .and_then(|id| tables.sessions.get(id))
            .cloned())
    }

    async fn create_session(
        &self,
        user_id: domain::UserID,
        workout_id: domain::WorkoutID,
        start_time: DateTime<Utc>,
    ) -> Result<domain::Session, domain::CreateError> {
        let mut tables = self.write()?;
        tables.workout(user_id, workout_id)?;
        let session =
            domain::Session::start(Uuid::new_v4().into(), user_id, workout_id, start_time);
        tables
            .insert_session(session.clone())
            .map_err(|_| domain::CreateError::Conflict)?;
        Ok(session)
    }

    async fn finish_session(
        &self,
        user_id: domain::UserID,
        id: domain::SessionID,
        outcome: domain::Outcome,
        end_time: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<domain::Session, domain::UpdateError> {
        let mut tables = self.write()?;
        let session = tables.session_mut(user_id, id)?;
        session
            .finish(outcome, end_time, notes)
            .map_err(domain::UpdateError::InvalidState)?;
        let session = session.clone();
        if tables.active_sessions.get(&user_id) == Some(&id) {
            tables.active_sessions.remove(&user_id);
        }
        Ok(session)
    }
}

impl domain::SetRepository for MemoryStore {
    async fn read_sets(
        &self,
        user_id: domain::UserID,
        session_id: domain::SessionID,
    ) -> Result<Vec<domain::Set>, domain::ReadError> {
        let tables = self.read()?;
        tables.session(user_id, session_id)?;
        Ok(tables
            .ledgers
            .get(&session_id)
            .map(|ledger| ledger.sets().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_set(
        &self,
        user_id: domain::UserID,
        session_id: domain::SessionID,
        exercise_name: domain::Name,
        reps: domain::Reps,
        weight: Option<domain::Weight>,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<domain::Set, domain::CreateError> {
        let mut guard = self.write()?;
        let tables = &mut *guard;
        let session = tables.session(user_id, session_id)?;
        session
            .ensure_active()
            .map_err(domain::CreateError::InvalidState)?;
        if let Some(workout) = tables.workouts.get(&session.workout_id) {
            if workout.exercise(&exercise_name).is_none() {
                return Err(
                    domain::ValidationError::UnknownExercise(exercise_name.to_string()).into(),
                );
            }
        }
        let id: domain::SetID = Uuid::new_v4().into();
        let set = tables
            .ledgers
            .entry(session_id)
            .or_insert_with(|| domain::SetLedger::new(session_id))
            .record(id, exercise_name, reps, weight, completed, now);
        tables.set_sessions.insert(id, session_id);
        Ok(set)
    }

    async fn modify_set(
        &self,
        user_id: domain::UserID,
        id: domain::SetID,
        patch: domain::SetPatch,
        now: DateTime<Utc>,
    ) -> Result<domain::Set, domain::UpdateError> {
        let mut tables = self.write()?;
        let session = tables.session_of_set(user_id, id)?;
        session
            .ensure_active()
            .map_err(domain::UpdateError::InvalidState)?;
        let session_id = session.id;
        tables
            .ledgers
            .get_mut(&session_id)
            .and_then(|ledger| ledger.update(id, &patch, now))
            .ok_or(domain::UpdateError::NotFound)
    }

    async fn delete_set(
        &self,
        user_id: domain::UserID,
        id: domain::SetID,
    ) -> Result<domain::SetID, domain::DeleteError> {
        let mut tables = self.write()?;
        let session = tables.session_of_set(user_id, id)?;
        session
            .ensure_active()
            .map_err(domain::DeleteError::InvalidState)?;
        let session_id = session.id;
        tables
            .ledgers
            .get_mut(&session_id)
            .and_then(|ledger| ledger.remove(id))
            .ok_or(domain::DeleteError::NotFound)?;
        tables.set_sessions.remove(&id);
        Ok(id)
    }
}
