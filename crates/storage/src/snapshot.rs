use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use chrono::{DateTime, Utc};
use log::{debug, info};
use reptrack_app::Settings;
use reptrack_domain as domain;
use uuid::Uuid;

use crate::memory::{MemoryStore, Tables};

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] domain::StorageError),
    #[error(transparent)]
    Invalid(#[from] domain::ValidationError),
    #[error("invalid session status \"{0}\"")]
    Status(String),
    #[error("end time of session {0} does not match its status")]
    EndTime(Uuid),
    #[error("completion time of set {0} does not match its completion flag")]
    CompletedAt(Uuid),
    #[error("duplicate id {0}")]
    DuplicateID(Uuid),
    #[error("set {0} refers to unknown session {1}")]
    DanglingSet(Uuid, Uuid),
    #[error("set {0} conflicts with another set of the same exercise and number")]
    DuplicateSet(Uuid),
    #[error("set numbers of session {0} are not contiguous")]
    NotContiguous(Uuid),
    #[error("user {0} has more than one active session")]
    MultipleActiveSessions(Uuid),
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Snapshot {
    pub workouts: Vec<Workout>,
    pub sessions: Vec<Session>,
    pub sets: Vec<Set>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub exercises: Vec<ExerciseSpec>,
}

impl From<&domain::Workout> for Workout {
    fn from(value: &domain::Workout) -> Self {
        Self {
            id: *value.id,
            user_id: *value.user_id,
            name: value.name.to_string(),
            description: value.description.clone(),
            exercises: value.exercises.iter().map(ExerciseSpec::from).collect(),
        }
    }
}

impl TryFrom<Workout> for domain::Workout {
    type Error = domain::ValidationError;

    fn try_from(value: Workout) -> Result<Self, Self::Error> {
        let exercises = value
            .exercises
            .into_iter()
            .map(domain::ExerciseSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        domain::validate_exercises(&exercises)?;
        Ok(Self {
            id: value.id.into(),
            user_id: value.user_id.into(),
            name: domain::Name::new(&value.name)?,
            description: value.description,
            exercises,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ExerciseSpec {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: Option<u32>,
    pub target_weight: Option<f32>,
    pub rest_time: Option<u32>,
}

impl From<&domain::ExerciseSpec> for ExerciseSpec {
    fn from(value: &domain::ExerciseSpec) -> Self {
        Self {
            name: value.name.to_string(),
            target_sets: u32::from(value.target_sets),
            target_reps: value.target_reps.map(u32::from),
            target_weight: value.target_weight.map(f32::from),
            rest_time: value.rest_time.map(u32::from),
        }
    }
}

impl TryFrom<ExerciseSpec> for domain::ExerciseSpec {
    type Error = domain::ValidationError;

    fn try_from(value: ExerciseSpec) -> Result<Self, Self::Error> {
        Ok(Self {
            name: domain::Name::new(&value.name)?,
            target_sets: domain::TargetSets::new(value.target_sets)?,
            target_reps: value.target_reps.map(domain::Reps::new),
            target_weight: value.target_weight.map(domain::Weight::new).transpose()?,
            rest_time: value.rest_time.map(domain::Time::new),
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: String,
    pub notes: Option<String>,
}

impl From<&domain::Session> for Session {
    fn from(value: &domain::Session) -> Self {
        Self {
            id: *value.id,
            workout_id: *value.workout_id,
            user_id: *value.user_id,
            start_time: value.start_time,
            end_time: value.end_time(),
            status: value.status().to_string(),
            notes: value.notes.clone(),
        }
    }
}

impl TryFrom<Session> for domain::Session {
    type Error = SnapshotError;

    fn try_from(value: Session) -> Result<Self, Self::Error> {
        let status = value
            .status
            .parse::<domain::SessionStatus>()
            .map_err(|_| SnapshotError::Status(value.status.clone()))?;
        let state = domain::SessionState::from_parts(status, value.end_time)
            .ok_or(SnapshotError::EndTime(value.id))?;
        Ok(Self {
            id: value.id.into(),
            workout_id: value.workout_id.into(),
            user_id: value.user_id.into(),
            start_time: value.start_time,
            state,
            notes: value.notes,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Set {
    pub id: Uuid,
    pub session_id: Uuid,
    pub exercise_name: String,
    pub set_number: u32,
    pub reps: u32,
    pub weight: Option<f32>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&domain::Set> for Set {
    fn from(value: &domain::Set) -> Self {
        Self {
            id: *value.id,
            session_id: *value.session_id,
            exercise_name: value.exercise_name.to_string(),
            set_number: value.set_number,
            reps: u32::from(value.reps),
            weight: value.weight.map(f32::from),
            completed: value.is_completed(),
            completed_at: value.completed_at,
        }
    }
}

impl TryFrom<Set> for domain::Set {
    type Error = SnapshotError;

    fn try_from(value: Set) -> Result<Self, Self::Error> {
        if value.completed != value.completed_at.is_some() {
            return Err(SnapshotError::CompletedAt(value.id));
        }
        Ok(Self {
            id: value.id.into(),
            session_id: value.session_id.into(),
            exercise_name: domain::Name::new(&value.exercise_name)
                .map_err(domain::ValidationError::from)?,
            set_number: value.set_number,
            reps: domain::Reps::new(value.reps),
            weight: value
                .weight
                .map(domain::Weight::new)
                .transpose()
                .map_err(domain::ValidationError::from)?,
            completed_at: value.completed_at,
        })
    }
}

impl MemoryStore {
    pub fn snapshot(&self) -> Result<Snapshot, domain::StorageError> {
        let tables = self.read()?;
        Ok(Snapshot {
            workouts: tables.workouts.values().map(Workout::from).collect(),
            sessions: tables.sessions.values().map(Session::from).collect(),
            sets: tables
                .ledgers
                .values()
                .flat_map(|ledger| ledger.sets())
                .map(Set::from)
                .collect(),
        })
    }

    /// Rebuilds a store, rejecting data that breaks any invariant a running store keeps.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let mut tables = Tables::default();

        for record in snapshot.workouts {
            let workout = domain::Workout::try_from(record)?;
            if tables.workouts.contains_key(&workout.id) {
                return Err(SnapshotError::DuplicateID(*workout.id));
            }
            tables.insert_workout(workout);
        }

        for record in snapshot.sessions {
            let session = domain::Session::try_from(record)?;
            if tables.sessions.contains_key(&session.id) {
                return Err(SnapshotError::DuplicateID(*session.id));
            }
            tables
                .insert_session(session)
                .map_err(|session| SnapshotError::MultipleActiveSessions(*session.user_id))?;
        }

        for record in snapshot.sets {
            let set = domain::Set::try_from(record)?;
            if !tables.sessions.contains_key(&set.session_id) {
                return Err(SnapshotError::DanglingSet(*set.id, *set.session_id));
            }
            tables
                .insert_set(set)
                .map_err(|set| SnapshotError::DuplicateSet(*set.id))?;
        }

        if let Some(ledger) = tables.ledgers.values().find(|l| !l.is_contiguous()) {
            return Err(SnapshotError::NotContiguous(*ledger.session_id()));
        }

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let snapshot = self.snapshot()?;
        let tmp_path = temp_sibling(path);
        fs::write(&tmp_path, serde_json::to_string_pretty(&snapshot)?)?;
        if let Err(err) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        debug!(
            "saved {} workouts, {} sessions and {} sets to {}",
            snapshot.workouts.len(),
            snapshot.sessions.len(),
            snapshot.sets.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::from_snapshot(snapshot)
    }

    /// Loads the configured snapshot, or starts empty if none is configured or present.
    pub fn open(settings: &Settings) -> Result<Self, SnapshotError> {
        match &settings.snapshot_path {
            Some(path) if path.exists() => {
                let store = Self::load(path)?;
                info!("loaded store from {}", path.display());
                Ok(store)
            }
            _ => Ok(Self::new()),
        }
    }

    pub fn persist(&self, settings: &Settings) -> Result<(), SnapshotError> {
        if let Some(path) = &settings.snapshot_path {
            self.save(path)?;
        }
        Ok(())
    }
}

/// The snapshot is written next to its target first, so a failed write never truncates it.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().map(OsString::from).unwrap_or_default();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}
