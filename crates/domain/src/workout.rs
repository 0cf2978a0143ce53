use std::collections::BTreeSet;

use derive_more::Deref;
use uuid::Uuid;

use crate::{
    CreateError, DeleteError, Name, ReadError, Reps, TargetSets, Time, UpdateError, UserID,
    ValidationError, Weight,
};

#[allow(async_fn_in_trait)]
pub trait WorkoutService {
    async fn get_workouts(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError>;
    async fn get_workout(&self, user_id: UserID, id: WorkoutID) -> Result<Workout, ReadError>;
    async fn create_workout(
        &self,
        user_id: UserID,
        name: Name,
        description: Option<String>,
        exercises: Vec<ExerciseSpec>,
    ) -> Result<Workout, CreateError>;
    async fn modify_workout(
        &self,
        user_id: UserID,
        id: WorkoutID,
        name: Option<Name>,
        description: Option<Option<String>>,
        exercises: Option<Vec<ExerciseSpec>>,
    ) -> Result<Workout, UpdateError>;
    async fn delete_workout(&self, user_id: UserID, id: WorkoutID)
    -> Result<WorkoutID, DeleteError>;

    async fn get_workouts_by_name(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError> {
        let mut workouts = self.get_workouts(user_id).await?;
        workouts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(workouts)
    }

    fn validate_workout_name(&self, name: &str) -> Result<Name, ValidationError> {
        Ok(Name::new(name)?)
    }

    fn validate_exercise_name(&self, name: &str) -> Result<Name, ValidationError> {
        Ok(Name::new(name)?)
    }

    fn validate_target_sets(&self, target_sets: &str) -> Result<TargetSets, ValidationError> {
        Ok(TargetSets::try_from(target_sets)?)
    }

    fn validate_rest_time(&self, rest_time: &str) -> Result<Option<Time>, ValidationError> {
        if rest_time.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Time::try_from(rest_time)?))
    }
}

#[allow(async_fn_in_trait)]
pub trait WorkoutRepository {
    async fn read_workouts(&self, user_id: UserID) -> Result<Vec<Workout>, ReadError>;
    async fn read_workout(&self, user_id: UserID, id: WorkoutID) -> Result<Workout, ReadError>;
    async fn create_workout(
        &self,
        user_id: UserID,
        name: Name,
        description: Option<String>,
        exercises: Vec<ExerciseSpec>,
    ) -> Result<Workout, CreateError>;
    async fn modify_workout(
        &self,
        user_id: UserID,
        id: WorkoutID,
        name: Option<Name>,
        description: Option<Option<String>>,
        exercises: Option<Vec<ExerciseSpec>>,
    ) -> Result<Workout, UpdateError>;
    async fn delete_workout(&self, user_id: UserID, id: WorkoutID)
    -> Result<WorkoutID, DeleteError>;
}

/// A reusable template of exercises and targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutID,
    pub user_id: UserID,
    pub name: Name,
    pub description: Option<String>,
    pub exercises: Vec<ExerciseSpec>,
}

impl Workout {
    #[must_use]
    pub fn exercise(&self, name: &Name) -> Option<&ExerciseSpec> {
        self.exercises.iter().find(|e| e.name == *name)
    }

    #[must_use]
    pub fn num_sets(&self) -> u32 {
        self.exercises
            .iter()
            .map(|e| u32::from(e.target_sets))
            .sum()
    }
}

/// Exercise names key sets and progress within a session, so they must be unique per workout.
pub fn validate_exercises(exercises: &[ExerciseSpec]) -> Result<(), ValidationError> {
    if exercises.is_empty() {
        return Err(ValidationError::NoExercises);
    }

    let mut names = BTreeSet::new();
    for exercise in exercises {
        if !names.insert(&exercise.name) {
            return Err(ValidationError::DuplicateExercise(
                exercise.name.to_string(),
            ));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSpec {
    pub name: Name,
    pub target_sets: TargetSets,
    pub target_reps: Option<Reps>,
    pub target_weight: Option<Weight>,
    pub rest_time: Option<Time>,
}

impl ExerciseSpec {
    #[must_use]
    pub fn new(name: Name, target_sets: TargetSets) -> Self {
        Self {
            name,
            target_sets,
            target_reps: None,
            target_weight: None,
            rest_time: None,
        }
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkoutID(Uuid);

impl WorkoutID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for WorkoutID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
