//! Session coordinator: the authoritative state machine behind every game
//!
//! The coordinator accepts participant actions one at a time, drives the
//! board through the [`SessionRegistry`], and answers with the packets that
//! must be delivered. It never holds on to a session between actions; every
//! action starts from a fresh registry lookup.
//!
//! Accepted actions fan out to the whole session. Rejected actions produce a
//! single `ActionRejected` addressed to the acting participant and leave all
//! state exactly as it was.

use crate::error::SessionError;
use crate::registry::{ParticipantId, SessionRegistry};
use log::{debug, info, warn};
use shared::{Mark, Outcome, Packet, RejectReason, SessionCode};

/// Participant actions understood by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateSession,
    JoinSession {
        code: SessionCode,
    },
    MakeMove {
        code: SessionCode,
        cell: usize,
        mark: Mark,
    },
    RestartSession {
        code: SessionCode,
    },
    Leave,
}

/// A packet together with who should receive it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Direct {
        to: ParticipantId,
        packet: Packet,
    },
    Broadcast {
        to: Vec<ParticipantId>,
        packet: Packet,
    },
}

impl Outbound {
    pub fn recipients(&self) -> &[ParticipantId] {
        match self {
            Outbound::Direct { to, .. } => std::slice::from_ref(to),
            Outbound::Broadcast { to, .. } => to,
        }
    }

    pub fn packet(&self) -> &Packet {
        match self {
            Outbound::Direct { packet, .. } | Outbound::Broadcast { packet, .. } => packet,
        }
    }
}

pub struct Coordinator {
    registry: SessionRegistry,
}

impl Coordinator {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Runs one action to completion and returns the packets to deliver.
    pub fn handle(&mut self, participant: ParticipantId, action: Action) -> Vec<Outbound> {
        let result = match action {
            Action::CreateSession => self.create_session(participant),
            Action::JoinSession { code } => self.join_session(participant, &code),
            Action::MakeMove { code, cell, mark } => {
                self.make_move(participant, &code, cell, mark)
            }
            Action::RestartSession { code } => self.restart_session(participant, &code),
            Action::Leave => self.leave(participant),
        };

        result.unwrap_or_else(|error| {
            warn!("Rejected action from participant {}: {}", participant, error);
            vec![Outbound::Direct {
                to: participant,
                packet: Packet::ActionRejected {
                    reason: RejectReason::from(&error),
                },
            }]
        })
    }

    pub fn create_session(
        &mut self,
        participant: ParticipantId,
    ) -> Result<Vec<Outbound>, SessionError> {
        let code = self.registry.create_session(participant)?;
        Ok(vec![Outbound::Direct {
            to: participant,
            packet: Packet::SessionCreated { code },
        }])
    }

    pub fn join_session(
        &mut self,
        participant: ParticipantId,
        code: &SessionCode,
    ) -> Result<Vec<Outbound>, SessionError> {
        let view = self.registry.join_session(code, participant)?;

        Ok(vec![
            Outbound::Broadcast {
                to: view.participants.clone(),
                packet: Packet::SessionJoined { code: view.code },
            },
            Outbound::Broadcast {
                to: view.participants,
                packet: Packet::GameStarted { first: view.turn },
            },
        ])
    }

    pub fn make_move(
        &mut self,
        participant: ParticipantId,
        code: &SessionCode,
        cell: usize,
        mark: Mark,
    ) -> Result<Vec<Outbound>, SessionError> {
        let session = self.registry.get_session_mut(code)?;
        if !session.has_participant(participant) {
            return Err(SessionError::NotBound(participant));
        }

        let outcome = session.apply_move(participant, cell, mark)?;
        let everyone = session.participants().to_vec();
        debug!("Session {}: {} played cell {}", code, mark, cell);

        let follow_up = match outcome {
            Outcome::Won { mark, line } => {
                info!("Session {} won by {}", code, mark);
                Packet::GameWon { mark, line }
            }
            Outcome::Draw => {
                info!("Session {} ended in a draw", code);
                Packet::GameDraw
            }
            Outcome::InProgress => Packet::TurnChanged {
                mark: session.turn(),
            },
        };

        Ok(vec![
            Outbound::Broadcast {
                to: everyone.clone(),
                packet: Packet::MoveMade { cell, mark },
            },
            Outbound::Broadcast {
                to: everyone,
                packet: follow_up,
            },
        ])
    }

    pub fn restart_session(
        &mut self,
        participant: ParticipantId,
        code: &SessionCode,
    ) -> Result<Vec<Outbound>, SessionError> {
        let session = self.registry.get_session_mut(code)?;
        if !session.has_participant(participant) {
            return Err(SessionError::NotBound(participant));
        }

        session.restart();
        info!("Session {} restarted by participant {}", code, participant);

        Ok(vec![Outbound::Broadcast {
            to: session.participants().to_vec(),
            packet: Packet::Restarted,
        }])
    }

    /// Closes the participant's session and tells whoever is left.
    pub fn leave(&mut self, participant: ParticipantId) -> Result<Vec<Outbound>, SessionError> {
        let code = self
            .registry
            .find_session_for(participant)
            .cloned()
            .ok_or(SessionError::NotBound(participant))?;

        let mut session = self
            .registry
            .remove_session(&code)
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))?;
        session.close();
        info!("Participant {} left, session {} closed", participant, code);

        Ok(session
            .participants()
            .iter()
            .filter(|other| **other != participant)
            .map(|other| Outbound::Direct {
                to: *other,
                packet: Packet::OpponentLeft,
            })
            .collect())
    }

    /// Transport-level departure. Unbound participants are ignored silently.
    pub fn disconnect(&mut self, participant: ParticipantId) -> Vec<Outbound> {
        self.leave(participant).unwrap_or_default()
    }
}
