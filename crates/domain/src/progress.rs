use std::collections::{BTreeMap, BTreeSet};

use crate::{Name, ReadError, SessionID, Set, UserID, Workout};

#[allow(async_fn_in_trait)]
pub trait ProgressService {
    /// Recomputes the progress of a session from its sets and the workout it was started from.
    async fn get_progress(
        &self,
        user_id: UserID,
        session_id: SessionID,
    ) -> Result<Progress, ReadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseProgress {
    pub exercise_name: Name,
    pub completed_sets: u32,
    pub target_sets: u32,
}

impl ExerciseProgress {
    #[must_use]
    pub fn ratio(&self) -> f32 {
        ratio(self.completed_sets, self.target_sets)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completed_sets >= self.target_sets
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Progress {
    pub exercises: Vec<ExerciseProgress>,
}

impl Progress {
    #[must_use]
    pub fn completed_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.completed_sets).sum()
    }

    #[must_use]
    pub fn target_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.target_sets).sum()
    }

    #[must_use]
    pub fn ratio(&self) -> f32 {
        ratio(self.completed_sets(), self.target_sets())
    }

    #[must_use]
    pub fn exercise(&self, exercise_name: &Name) -> Option<&ExerciseProgress> {
        self.exercises
            .iter()
            .find(|e| e.exercise_name == *exercise_name)
    }
}

/// Template exercises come first in template order, followed by exercises that only occur in
/// the recorded sets. Without a matching template entry, the target is the number of distinct
/// set numbers recorded for the exercise.
#[must_use]
pub fn progress<'a>(
    workout: Option<&Workout>,
    sets: impl IntoIterator<Item = &'a Set>,
) -> Progress {
    let mut completed: BTreeMap<&Name, u32> = BTreeMap::new();
    let mut recorded: BTreeMap<&Name, BTreeSet<u32>> = BTreeMap::new();

    for set in sets {
        recorded
            .entry(&set.exercise_name)
            .or_default()
            .insert(set.set_number);
        if set.is_completed() {
            *completed.entry(&set.exercise_name).or_insert(0) += 1;
        }
    }

    let completed_sets = |name: &Name| completed.get(name).copied().unwrap_or(0);
    #[allow(clippy::cast_possible_truncation)]
    let recorded_sets = |name: &Name| recorded.get(name).map_or(0, |n| n.len() as u32);

    let mut exercises = vec![];

    if let Some(workout) = workout {
        for exercise in &workout.exercises {
            exercises.push(ExerciseProgress {
                exercise_name: exercise.name.clone(),
                completed_sets: completed_sets(&exercise.name),
                target_sets: u32::from(exercise.target_sets),
            });
        }
    }

    for name in recorded.keys().copied() {
        if workout.is_some_and(|w| w.exercise(name).is_some()) {
            continue;
        }
        exercises.push(ExerciseProgress {
            exercise_name: name.clone(),
            completed_sets: completed_sets(name),
            target_sets: recorded_sets(name),
        });
    }

    Progress { exercises }
}

fn ratio(completed: u32, target: u32) -> f32 {
    if target == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = completed as f32 / target as f32;
    ratio
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    use crate::{ExerciseSpec, Reps, TargetSets};

    use super::*;

    fn name(name: &str) -> Name {
        Name::new(name).unwrap()
    }

    fn set(id: u128, exercise_name: &str, set_number: u32, completed: bool) -> Set {
        Set {
            id: id.into(),
            session_id: 1.into(),
            exercise_name: name(exercise_name),
            set_number,
            reps: Reps::new(8),
            weight: None,
            completed_at: completed.then(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap()),
        }
    }

    static WORKOUT: std::sync::LazyLock<Workout> = std::sync::LazyLock::new(|| Workout {
        id: 1.into(),
        user_id: 1.into(),
        name: name("Legs"),
        description: None,
        exercises: vec![
            ExerciseSpec::new(name("Squat"), TargetSets::new(3).unwrap()),
            ExerciseSpec::new(name("Lunge"), TargetSets::new(2).unwrap()),
        ],
    });

    static SETS: std::sync::LazyLock<Vec<Set>> = std::sync::LazyLock::new(|| {
        vec![
            set(1, "Squat", 1, true),
            set(2, "Squat", 2, true),
            set(3, "Squat", 3, false),
            set(4, "Calf Raise", 1, true),
            set(5, "Calf Raise", 2, false),
        ]
    });

    #[test]
    fn test_progress_with_workout() {
        let progress = progress(Some(&*WORKOUT), SETS.iter());

        assert_eq!(
            progress.exercises,
            vec![
                ExerciseProgress {
                    exercise_name: name("Squat"),
                    completed_sets: 2,
                    target_sets: 3,
                },
                ExerciseProgress {
                    exercise_name: name("Lunge"),
                    completed_sets: 0,
                    target_sets: 2,
                },
                ExerciseProgress {
                    exercise_name: name("Calf Raise"),
                    completed_sets: 1,
                    target_sets: 2,
                },
            ]
        );
        assert_eq!(progress.completed_sets(), 3);
        assert_eq!(progress.target_sets(), 7);
        assert_approx_eq!(progress.ratio(), 3.0 / 7.0);
    }

    #[test]
    fn test_progress_without_workout() {
        let progress = progress(None, SETS.iter());

        assert_eq!(
            progress.exercises,
            vec![
                ExerciseProgress {
                    exercise_name: name("Calf Raise"),
                    completed_sets: 1,
                    target_sets: 2,
                },
                ExerciseProgress {
                    exercise_name: name("Squat"),
                    completed_sets: 2,
                    target_sets: 3,
                },
            ]
        );
        assert_approx_eq!(
            progress.exercise(&name("Squat")).unwrap().ratio(),
            2.0 / 3.0
        );
    }

    #[test]
    fn test_progress_empty() {
        let progress = progress(None, []);

        assert_eq!(progress, Progress::default());
        assert_approx_eq!(progress.ratio(), 0.0);
    }

    #[test]
    fn test_exercise_progress_is_done() {
        let progress = progress(
            Some(&*WORKOUT),
            [
                set(1, "Lunge", 1, true),
                set(2, "Lunge", 2, true),
                set(3, "Lunge", 3, true),
            ]
            .iter(),
        );

        let lunge = progress.exercise(&name("Lunge")).unwrap();
        assert!(lunge.is_done());
        assert_approx_eq!(lunge.ratio(), 1.5);
        assert!(!progress.exercise(&name("Squat")).unwrap().is_done());
    }
}
