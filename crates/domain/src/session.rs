use chrono::{DateTime, Duration, Utc};
use derive_more::Deref;
use uuid::Uuid;

use crate::{CreateError, ReadError, UpdateError, UserID, WorkoutID};

#[allow(async_fn_in_trait)]
pub trait SessionService {
    async fn start_session(
        &self,
        user_id: UserID,
        workout_id: WorkoutID,
    ) -> Result<Session, CreateError>;
    async fn complete_session(
        &self,
        user_id: UserID,
        id: SessionID,
        notes: Option<String>,
    ) -> Result<Session, UpdateError>;
    async fn cancel_session(&self, user_id: UserID, id: SessionID)
    -> Result<Session, UpdateError>;
    async fn get_session(&self, user_id: UserID, id: SessionID) -> Result<Session, ReadError>;
    async fn get_active_session(&self, user_id: UserID) -> Result<Option<Session>, ReadError>;
    async fn get_sessions(&self, user_id: UserID) -> Result<Vec<Session>, ReadError>;

    /// All sessions of the user, most recent start first.
    async fn get_session_history(&self, user_id: UserID) -> Result<Vec<Session>, ReadError> {
        let mut sessions = self.get_sessions(user_id).await?;
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn get_sessions_with_status(
        &self,
        user_id: UserID,
        status: SessionStatus,
    ) -> Result<Vec<Session>, ReadError> {
        Ok(self
            .get_session_history(user_id)
            .await?
            .into_iter()
            .filter(|s| s.status() == status)
            .collect())
    }
}

#[allow(async_fn_in_trait)]
pub trait SessionRepository {
    async fn read_sessions(&self, user_id: UserID) -> Result<Vec<Session>, ReadError>;
    async fn read_session(&self, user_id: UserID, id: SessionID) -> Result<Session, ReadError>;
    async fn read_active_session(&self, user_id: UserID) -> Result<Option<Session>, ReadError>;
    /// Fails with a conflict if the user already has an active session.
    async fn create_session(
        &self,
        user_id: UserID,
        workout_id: WorkoutID,
        start_time: DateTime<Utc>,
    ) -> Result<Session, CreateError>;
    /// Moves an active session into a terminal state.
    async fn finish_session(
        &self,
        user_id: UserID,
        id: SessionID,
        outcome: Outcome,
        end_time: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Session, UpdateError>;
}

/// One performance of a workout by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionID,
    pub workout_id: WorkoutID,
    pub user_id: UserID,
    pub start_time: DateTime<Utc>,
    pub state: SessionState,
    pub notes: Option<String>,
}

impl Session {
    #[must_use]
    pub fn start(
        id: SessionID,
        user_id: UserID,
        workout_id: WorkoutID,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workout_id,
            user_id,
            start_time,
            state: SessionState::Active,
            notes: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.state.end_time()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Returns the current status as error if the session is terminal.
    pub fn ensure_active(&self) -> Result<(), SessionStatus> {
        if self.is_active() {
            Ok(())
        } else {
            Err(self.status())
        }
    }

    /// Performs the transition from `active` into the terminal state given by `outcome`.
    ///
    /// Notes are only replaced if given. A terminal session is left untouched.
    pub fn finish(
        &mut self,
        outcome: Outcome,
        end_time: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), SessionStatus> {
        self.ensure_active()?;
        let end_time = end_time.max(self.start_time);
        self.state = match outcome {
            Outcome::Completed => SessionState::Completed { end_time },
            Outcome::Cancelled => SessionState::Cancelled { end_time },
        };
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    #[must_use]
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        self.end_time().unwrap_or(now) - self.start_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Completed { end_time: DateTime<Utc> },
    Cancelled { end_time: DateTime<Utc> },
}

impl SessionState {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Active => SessionStatus::Active,
            SessionState::Completed { .. } => SessionStatus::Completed,
            SessionState::Cancelled { .. } => SessionStatus::Cancelled,
        }
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionState::Active => None,
            SessionState::Completed { end_time } | SessionState::Cancelled { end_time } => {
                Some(*end_time)
            }
        }
    }

    /// Rebuilds a state from its flat representation.
    ///
    /// Returns `None` if the end time does not match the status.
    #[must_use]
    pub fn from_parts(status: SessionStatus, end_time: Option<DateTime<Utc>>) -> Option<Self> {
        match (status, end_time) {
            (SessionStatus::Active, None) => Some(SessionState::Active),
            (SessionStatus::Completed, Some(end_time)) => {
                Some(SessionState::Completed { end_time })
            }
            (SessionStatus::Cancelled, Some(end_time)) => {
                Some(SessionState::Cancelled { end_time })
            }
            _ => None,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Active
    }
}

/// Terminal state requested by `complete` or `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

#[derive(Deref, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionID(Uuid);

impl SessionID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for SessionID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SessionID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn time(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn session() -> Session {
        Session::start(1.into(), 2.into(), 3.into(), time(0))
    }

    #[test]
    fn test_session_start() {
        let session = session();
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.end_time(), None);
        assert_eq!(session.notes, None);
        assert!(session.is_active());
        assert_eq!(session.ensure_active(), Ok(()));
    }

    #[rstest]
    #[case(Outcome::Completed, SessionStatus::Completed)]
    #[case(Outcome::Cancelled, SessionStatus::Cancelled)]
    fn test_session_finish(#[case] outcome: Outcome, #[case] expected: SessionStatus) {
        let mut session = session();
        assert_eq!(session.finish(outcome, time(3600), None), Ok(()));
        assert_eq!(session.status(), expected);
        assert_eq!(session.end_time(), Some(time(3600)));
        assert_eq!(session.ensure_active(), Err(expected));
    }

    #[rstest]
    #[case(Outcome::Completed, Outcome::Completed, SessionStatus::Completed)]
    #[case(Outcome::Completed, Outcome::Cancelled, SessionStatus::Completed)]
    #[case(Outcome::Cancelled, Outcome::Completed, SessionStatus::Cancelled)]
    #[case(Outcome::Cancelled, Outcome::Cancelled, SessionStatus::Cancelled)]
    fn test_session_finish_terminal(
        #[case] first: Outcome,
        #[case] second: Outcome,
        #[case] status: SessionStatus,
    ) {
        let mut session = session();
        session.finish(first, time(60), None).unwrap();
        let before = session.clone();
        assert_eq!(
            session.finish(second, time(120), Some("again".to_string())),
            Err(status)
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_session_finish_notes() {
        let mut session = session();
        session.notes = Some("warmup skipped".to_string());
        session.finish(Outcome::Completed, time(60), None).unwrap();
        assert_eq!(session.notes, Some("warmup skipped".to_string()));

        let mut session = self::session();
        session
            .finish(Outcome::Completed, time(60), Some("felt strong".to_string()))
            .unwrap();
        assert_eq!(session.notes, Some("felt strong".to_string()));
    }

    #[test]
    fn test_session_finish_before_start() {
        let mut session = session();
        session.finish(Outcome::Completed, time(-60), None).unwrap();
        assert_eq!(session.end_time(), Some(time(0)));
    }

    #[test]
    fn test_session_duration() {
        let mut session = session();
        assert_eq!(session.duration(time(90)), Duration::seconds(90));
        session.finish(Outcome::Completed, time(60), None).unwrap();
        assert_eq!(session.duration(time(90)), Duration::seconds(60));
    }

    #[rstest]
    #[case(SessionStatus::Active, None, Some(SessionState::Active))]
    #[case(SessionStatus::Active, Some(time(1)), None)]
    #[case(
        SessionStatus::Completed,
        Some(time(1)),
        Some(SessionState::Completed { end_time: time(1) })
    )]
    #[case(SessionStatus::Completed, None, None)]
    #[case(
        SessionStatus::Cancelled,
        Some(time(1)),
        Some(SessionState::Cancelled { end_time: time(1) })
    )]
    #[case(SessionStatus::Cancelled, None, None)]
    fn test_session_state_from_parts(
        #[case] status: SessionStatus,
        #[case] end_time: Option<DateTime<Utc>>,
        #[case] expected: Option<SessionState>,
    ) {
        assert_eq!(SessionState::from_parts(status, end_time), expected);
        if let Some(state) = expected {
            assert_eq!(state.status(), status);
            assert_eq!(state.end_time(), end_time);
        }
    }

    #[rstest]
    #[case(SessionStatus::Active, "active", false)]
    #[case(SessionStatus::Completed, "completed", true)]
    #[case(SessionStatus::Cancelled, "cancelled", true)]
    fn test_session_status_string(
        #[case] status: SessionStatus,
        #[case] string: &str,
        #[case] terminal: bool,
    ) {
        assert_eq!(status.to_string(), string);
        assert_eq!(status.as_ref(), string);
        assert_eq!(SessionStatus::from_str(string), Ok(status));
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn test_session_id_nil() {
        assert!(SessionID::nil().is_nil());
        assert_eq!(SessionID::nil(), SessionID::default());
    }
}
