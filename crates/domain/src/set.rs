use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::Deref;
use uuid::Uuid;

use crate::{
    CreateError, DeleteError, Name, ReadError, Reps, SessionID, UpdateError, UserID,
    ValidationError, Weight,
};

#[allow(async_fn_in_trait)]
pub trait SetService {
    async fn get_sets(&self, user_id: UserID, session_id: SessionID)
    -> Result<Vec<Set>, ReadError>;
    async fn record_set(
        &self,
        user_id: UserID,
        session_id: SessionID,
        exercise_name: Name,
        reps: Reps,
        weight: Option<Weight>,
        completed: bool,
    ) -> Result<Set, CreateError>;
    async fn update_set(
        &self,
        user_id: UserID,
        id: SetID,
        patch: SetPatch,
    ) -> Result<Set, UpdateError>;
    async fn delete_set(&self, user_id: UserID, id: SetID) -> Result<SetID, DeleteError>;

    fn validate_reps(&self, reps: &str) -> Result<Reps, ValidationError> {
        Ok(Reps::try_from(reps)?)
    }

    fn validate_weight(&self, weight: &str) -> Result<Option<Weight>, ValidationError> {
        if weight.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Weight::try_from(weight)?))
    }
}

#[allow(async_fn_in_trait)]
pub trait SetRepository {
    async fn read_sets(&self, user_id: UserID, session_id: SessionID)
    -> Result<Vec<Set>, ReadError>;
    #[allow(clippy::too_many_arguments)]
    async fn create_set(
        &self,
        user_id: UserID,
        session_id: SessionID,
        exercise_name: Name,
        reps: Reps,
        weight: Option<Weight>,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Set, CreateError>;
    async fn modify_set(
        &self,
        user_id: UserID,
        id: SetID,
        patch: SetPatch,
        now: DateTime<Utc>,
    ) -> Result<Set, UpdateError>;
    async fn delete_set(&self, user_id: UserID, id: SetID) -> Result<SetID, DeleteError>;
}

/// One recorded unit of work for one exercise within a session.
///
/// A set is completed exactly when it carries a completion time.
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub id: SetID,
    pub session_id: SessionID,
    pub exercise_name: Name,
    pub set_number: u32,
    pub reps: Reps,
    pub weight: Option<Weight>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Set {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn apply(&mut self, patch: &SetPatch, now: DateTime<Utc>) {
        if let Some(reps) = patch.reps {
            self.reps = reps;
        }
        if let Some(weight) = patch.weight {
            self.weight = Some(weight);
        }
        match (patch.completed, self.completed_at) {
            (Some(true), None) => self.completed_at = Some(now),
            (Some(false), Some(_)) => self.completed_at = None,
            _ => {}
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SetPatch {
    pub reps: Option<Reps>,
    pub weight: Option<Weight>,
    pub completed: Option<bool>,
}

impl SetPatch {
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// The set log of a single session.
///
/// Set numbers of each exercise always form the sequence 1..=n.
#[derive(Debug, Clone, PartialEq)]
pub struct SetLedger {
    session_id: SessionID,
    sets: BTreeMap<(Name, u32), Set>,
}

impl SetLedger {
    #[must_use]
    pub fn new(session_id: SessionID) -> Self {
        Self {
            session_id,
            sets: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionID {
        self.session_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sets ordered by exercise name and set number.
    pub fn sets(&self) -> impl Iterator<Item = &Set> {
        self.sets.values()
    }

    pub fn sets_of<'a>(&'a self, exercise_name: &'a Name) -> impl Iterator<Item = &'a Set> {
        self.sets
            .values()
            .filter(move |s| s.exercise_name == *exercise_name)
    }

    #[must_use]
    pub fn get(&self, id: SetID) -> Option<&Set> {
        self.sets.values().find(|s| s.id == id)
    }

    #[must_use]
    pub fn next_set_number(&self, exercise_name: &Name) -> u32 {
        self.sets_of(exercise_name)
            .map(|s| s.set_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn record(
        &mut self,
        id: SetID,
        exercise_name: Name,
        reps: Reps,
        weight: Option<Weight>,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Set {
        let set = Set {
            id,
            session_id: self.session_id,
            set_number: self.next_set_number(&exercise_name),
            exercise_name,
            reps,
            weight,
            completed_at: completed.then_some(now),
        };
        self.sets
            .insert((set.exercise_name.clone(), set.set_number), set.clone());
        set
    }

    pub fn update(&mut self, id: SetID, patch: &SetPatch, now: DateTime<Utc>) -> Option<Set> {
        let set = self.sets.values_mut().find(|s| s.id == id)?;
        set.apply(patch, now);
        Some(set.clone())
    }

    /// Removes a set and closes the gap it leaves in the numbering of its exercise.
    pub fn remove(&mut self, id: SetID) -> Option<Set> {
        let key = self
            .sets
            .iter()
            .find(|(_, s)| s.id == id)
            .map(|(k, _)| k.clone())?;
        let removed = self.sets.remove(&key)?;
        self.reindex(&removed.exercise_name, removed.set_number);
        Some(removed)
    }

    /// Inserts a set as is, e.g. when restoring persisted data.
    ///
    /// Returns the set back if its key is already taken.
    pub fn insert(&mut self, set: Set) -> Result<(), Set> {
        let key = (set.exercise_name.clone(), set.set_number);
        if set.session_id != self.session_id || self.sets.contains_key(&key) {
            return Err(set);
        }
        self.sets.insert(key, set);
        Ok(())
    }

    /// Whether the set numbers of every exercise are exactly 1..=n.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        let mut previous: Option<(&Name, u32)> = None;
        for (name, number) in self.sets.keys() {
            let expected = match previous {
                Some((previous_name, previous_number)) if previous_name == name => {
                    previous_number + 1
                }
                _ => 1,
            };
            if *number != expected {
                return false;
            }
            previous = Some((name, *number));
        }
        true
    }

    fn reindex(&mut self, exercise_name: &Name, removed_set_number: u32) {
        let following = self
            .sets
            .range((exercise_name.clone(), removed_set_number + 1)..)
            .take_while(|((name, _), _)| name == exercise_name)
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();
        for key in following {
            if let Some(mut set) = self.sets.remove(&key) {
                set.set_number -= 1;
                self.sets
                    .insert((set.exercise_name.clone(), set.set_number), set);
            }
        }
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetID(Uuid);

impl SetID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for SetID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SetID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
