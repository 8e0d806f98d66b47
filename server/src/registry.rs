//! Session registry: the single owner of every live session
//!
//! The registry maps session codes to [`Session`]s and participants to the
//! code of the one session they are bound to. It keeps both maps in step:
//! - every bound participant resolves to a session that lists them
//! - every live session has one or two distinct participants
//! - codes are unique among live sessions
//!
//! Codes are drawn from a [`CodeSource`] and re-drawn until they do not
//! collide with a live session.

use crate::error::SessionError;
use crate::game::{Session, SessionView};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Mark, SessionCode, MAX_SESSION_CODE, MIN_SESSION_CODE};
use std::collections::HashMap;

/// Transport-assigned participant identifier
pub type ParticipantId = u32;

/// Supplies candidate session codes. Candidates may repeat; the registry
/// checks them against live sessions.
pub trait CodeSource: Send {
    fn next_code(&mut self) -> SessionCode;
}

impl<F> CodeSource for F
where
    F: FnMut() -> SessionCode + Send,
{
    fn next_code(&mut self) -> SessionCode {
        self()
    }
}

/// Uniformly random six-digit codes
pub struct RandomCodes {
    rng: StdRng,
}

impl RandomCodes {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSource for RandomCodes {
    fn next_code(&mut self) -> SessionCode {
        SessionCode::from_number(self.rng.gen_range(MIN_SESSION_CODE..=MAX_SESSION_CODE))
    }
}

pub struct SessionRegistry {
    sessions: HashMap<SessionCode, Session>,
    bindings: HashMap<ParticipantId, SessionCode>,
    codes: Box<dyn CodeSource>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_code_source(RandomCodes::new())
    }

    pub fn with_code_source(codes: impl CodeSource + 'static) -> Self {
        Self {
            sessions: HashMap::new(),
            bindings: HashMap::new(),
            codes: Box::new(codes),
        }
    }

    /// Opens a new session with `host` as its only participant.
    ///
    /// Fails with `AlreadyBound` if the host is already in a live session.
    pub fn create_session(&mut self, host: ParticipantId) -> Result<SessionCode, SessionError> {
        if let Some(code) = self.bindings.get(&host) {
            return Err(SessionError::AlreadyBound {
                participant: host,
                code: code.clone(),
            });
        }

        let code = self.allocate_code();
        self.sessions
            .insert(code.clone(), Session::new(code.clone(), host));
        self.bindings.insert(host, code.clone());

        info!("Participant {} created session {}", host, code);
        Ok(code)
    }

    /// Seats `participant` as the second player of session `code`.
    pub fn join_session(
        &mut self,
        code: &SessionCode,
        participant: ParticipantId,
    ) -> Result<SessionView, SessionError> {
        let session = self
            .sessions
            .get_mut(code)
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))?;

        if let Some(bound) = self.bindings.get(&participant) {
            return Err(SessionError::AlreadyBound {
                participant,
                code: bound.clone(),
            });
        }

        let mark = session.seat(participant)?;
        self.bindings.insert(participant, code.clone());

        info!(
            "Participant {} joined session {} as {}",
            participant, code, mark
        );
        Ok(session.view())
    }

    pub fn get_session(&self, code: &SessionCode) -> Result<&Session, SessionError> {
        self.sessions
            .get(code)
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))
    }

    pub fn get_session_mut(&mut self, code: &SessionCode) -> Result<&mut Session, SessionError> {
        self.sessions
            .get_mut(code)
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))
    }

    /// Deletes the session and unbinds its participants. Removing an unknown
    /// code is a no-op.
    pub fn remove_session(&mut self, code: &SessionCode) -> Option<Session> {
        let session = self.sessions.remove(code)?;
        for participant in session.participants() {
            self.bindings.remove(participant);
        }

        info!("Session {} removed", code);
        Some(session)
    }

    pub fn find_session_for(&self, participant: ParticipantId) -> Option<&SessionCode> {
        self.bindings.get(&participant)
    }

    /// Mark played by `participant` in their current session.
    pub fn mark_of(&self, participant: ParticipantId) -> Option<Mark> {
        let code = self.bindings.get(&participant)?;
        self.sessions.get(code)?.mark_of(participant)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Checks the cross-map invariants listed in the module docs.
    pub fn is_consistent(&self) -> bool {
        let bindings_resolve = self.bindings.iter().all(|(participant, code)| {
            self.sessions
                .get(code)
                .is_some_and(|session| session.has_participant(*participant))
        });

        let sessions_well_formed = self.sessions.iter().all(|(code, session)| {
            let participants = session.participants();
            let distinct = participants.len() < 2 || participants[0] != participants[1];

            session.code() == code
                && (1..=2).contains(&participants.len())
                && distinct
                && participants
                    .iter()
                    .all(|p| self.bindings.get(p) == Some(code))
        });

        bindings_resolve && sessions_well_formed
    }

    fn allocate_code(&mut self) -> SessionCode {
        loop {
            let candidate = self.codes.next_code();
            if !self.sessions.contains_key(&candidate) {
                return candidate;
            }
            debug!("Session code {} already in use, drawing again", candidate);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::SessionState;
    use std::collections::VecDeque;

    fn scripted(codes: &[u32]) -> impl CodeSource + 'static {
        let mut queue: VecDeque<u32> = codes.iter().copied().collect();
        move || SessionCode::from_number(queue.pop_front().unwrap_or(999_999))
    }

    #[test]
    fn test_create_session_binds_host() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456]));
        let code = registry.create_session(1).unwrap();

        assert_eq!(code.as_str(), "123456");
        assert_eq!(registry.find_session_for(1), Some(&code));

        let session = registry.get_session(&code).unwrap();
        assert_eq!(session.participants(), &[1]);
        assert_eq!(session.state(), SessionState::AwaitingSecondPlayer);
        assert!(session.board().is_empty());
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_code_collision_is_retried() {
        let mut registry =
            SessionRegistry::with_code_source(scripted(&[123456, 123456, 123456, 654321]));

        let first = registry.create_session(1).unwrap();
        let second = registry.create_session(2).unwrap();

        assert_eq!(first.as_str(), "123456");
        assert_eq!(second.as_str(), "654321");
        assert_eq!(registry.len(), 2);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_code_reusable_after_removal() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456, 123456]));

        let first = registry.create_session(1).unwrap();
        registry.remove_session(&first);
        let second = registry.create_session(2).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_random_codes_stay_in_range() {
        let mut codes = RandomCodes::seeded(42);
        for _ in 0..1000 {
            let code = codes.next_code();
            let number: u32 = code.as_str().parse().unwrap();
            assert!((MIN_SESSION_CODE..=MAX_SESSION_CODE).contains(&number));
            assert_eq!(code.as_str().len(), SessionCode::LEN);
        }
    }

    #[test]
    fn test_create_while_bound_rejected() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456, 222222]));
        let code = registry.create_session(1).unwrap();

        let result = registry.create_session(1);

        assert_eq!(
            result,
            Err(SessionError::AlreadyBound {
                participant: 1,
                code
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_join_session_activates() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456]));
        let code = registry.create_session(1).unwrap();

        let view = registry.join_session(&code, 2).unwrap();

        assert_eq!(view.participants, vec![1, 2]);
        assert_eq!(view.state, SessionState::Active);
        assert_eq!(registry.find_session_for(2), Some(&code));
        assert_eq!(registry.mark_of(1), Some(Mark::X));
        assert_eq!(registry.mark_of(2), Some(Mark::O));
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_join_unknown_session() {
        let mut registry = SessionRegistry::new();
        let code = SessionCode::from_number(123456);

        let result = registry.join_session(&code, 2);

        assert_eq!(result, Err(SessionError::RoomNotFound(code)));
        assert_eq!(registry.find_session_for(2), None);
    }

    #[test]
    fn test_join_full_session_leaves_participants() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456]));
        let code = registry.create_session(1).unwrap();
        registry.join_session(&code, 2).unwrap();

        let result = registry.join_session(&code, 3);

        assert_eq!(result, Err(SessionError::RoomFull(code.clone())));
        assert_eq!(registry.get_session(&code).unwrap().participants(), &[1, 2]);
        assert_eq!(registry.find_session_for(3), None);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_host_cannot_join_own_session() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456]));
        let code = registry.create_session(1).unwrap();

        let result = registry.join_session(&code, 1);

        assert!(matches!(result, Err(SessionError::AlreadyBound { .. })));
        assert_eq!(registry.get_session(&code).unwrap().participants(), &[1]);
    }

    #[test]
    fn test_remove_session_clears_bindings() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456]));
        let code = registry.create_session(1).unwrap();
        registry.join_session(&code, 2).unwrap();

        let removed = registry.remove_session(&code);

        assert!(removed.is_some());
        assert!(registry.is_empty());
        assert_eq!(registry.find_session_for(1), None);
        assert_eq!(registry.find_session_for(2), None);
        assert!(matches!(
            registry.get_session(&code),
            Err(SessionError::RoomNotFound(_))
        ));
    }

    #[test]
    fn test_remove_session_is_idempotent() {
        let mut registry = SessionRegistry::with_code_source(scripted(&[123456]));
        let code = registry.create_session(1).unwrap();

        assert!(registry.remove_session(&code).is_some());
        assert!(registry.remove_session(&code).is_none());
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_unbound_participant_has_no_session() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.find_session_for(42), None);
        assert_eq!(registry.mark_of(42), None);
    }
}
