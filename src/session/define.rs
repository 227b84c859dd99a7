//! Define workflow: naming a command the parser did not get as a macro.
//!
//! The retained command is the one being accepted, or the latest pin.
//! Submitting a phrase asks the parser to register it. On success the
//! phrase lands in the command buffer and the pins are consumed.

use tracing::{debug, info, warn};

use crate::interpret::{Definition, InterpretError, wants_autocomplete};

use super::{Effect, Notice, Session, SessionError, Status, Ticket};

/// State of an open define sub-session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineState {
    command: String,
    phrase: String,
    pending: Option<Ticket>,
}

impl DefineState {
    pub(super) fn new(command: String) -> Self {
        Self {
            command,
            phrase: String::new(),
            pending: None,
        }
    }

    /// The command being defined.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The phrase typed so far.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Whether a define request is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Session {
    /// Ctrl+D: opens the define workflow for the current command or the latest pin.
    pub fn open_define(&mut self) -> Result<Vec<Effect>, SessionError> {
        let command = match &self.status {
            Status::Accept { command, .. } => command.clone(),
            Status::Try => match self.pins.last() {
                Some(pin) => pin.command.clone(),
                None => {
                    return Err(SessionError::DefineRejected(
                        "nothing to define yet, try a command first".to_string(),
                    ));
                }
            },
            Status::Loading { .. } | Status::Define(_) => return Ok(Vec::new()),
        };

        debug!(command = %command, "define opened");
        self.status = Status::Define(DefineState::new(command));
        Ok(vec![Effect::Autocomplete {
            prefix: String::new(),
        }])
    }

    /// Replaces the define phrase. Asks for suggestions after a separator.
    pub fn edit_define(&mut self, text: &str) -> Vec<Effect> {
        let Status::Define(state) = &mut self.status else {
            return Vec::new();
        };
        if state.is_pending() {
            return Vec::new();
        }
        state.phrase = text.to_string();
        if wants_autocomplete(text) {
            vec![Effect::Autocomplete {
                prefix: text.to_string(),
            }]
        } else {
            Vec::new()
        }
    }

    /// Enter while defining. Uses `text` when given, else the edited phrase.
    pub(super) fn submit_define(&mut self, text: &str) -> Result<Vec<Effect>, SessionError> {
        let phrase = match &self.status {
            Status::Define(state) if !state.is_pending() => {
                if text.trim().is_empty() {
                    state.phrase.trim().to_string()
                } else {
                    text.trim().to_string()
                }
            }
            _ => return Ok(Vec::new()),
        };
        if phrase.is_empty() {
            return Err(SessionError::DefineRejected(
                "the definition is empty".to_string(),
            ));
        }

        let ticket = self.issue_ticket();
        if let Status::Define(state) = &mut self.status {
            state.phrase.clone_from(&phrase);
            state.pending = Some(ticket);
        }
        Ok(vec![Effect::Define { ticket, phrase }])
    }

    /// Applies the parser's answer to a define request.
    pub fn on_defined(
        &mut self,
        ticket: Ticket,
        result: Result<Definition, InterpretError>,
    ) -> Result<Vec<Effect>, SessionError> {
        let Status::Define(state) = &mut self.status else {
            debug!(%ticket, "dropping stale definition");
            return Ok(Vec::new());
        };
        if state.pending != Some(ticket) {
            debug!(%ticket, "dropping stale definition");
            return Ok(Vec::new());
        }
        state.pending = None;

        let definition = result.map_err(|e| {
            warn!(%ticket, error = %e, "define failed");
            SessionError::DefineRejected(e.to_string())
        })?;
        if !definition.success {
            return Err(SessionError::DefineRejected(
                "the parser did not accept the definition".to_string(),
            ));
        }

        let phrase = definition
            .resolved_phrase
            .unwrap_or_else(|| state.phrase.clone());
        let command = state.command.clone();
        info!(command = %command, phrase = %phrase, "defined");

        self.status = Status::Try;
        self.pins.clear();
        self.input.clone_from(&phrase);
        Ok(vec![Effect::Notify(Notice::Defined { command, phrase })])
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::interpret::{Interpretation, SessionContext};
    use crate::model::{Candidate, CandidateValue, WorldState};
    use crate::session::StatusKind;

    use super::*;

    fn session() -> Session {
        Session::new(
            SessionContext {
                session_id: "define-test".into(),
            },
            WorldState::empty(),
            ChaCha8Rng::seed_from_u64(3),
        )
    }

    fn request_ticket(effects: &[Effect]) -> Ticket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Interpret { ticket, .. } | Effect::Define { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("no request effect")
    }

    fn pin(s: &mut Session, command: &str) {
        let ticket = request_ticket(&s.submit(command).unwrap());
        s.on_interpreted(ticket, Ok(Interpretation::default()))
            .unwrap();
    }

    fn defined(phrase: Option<&str>) -> Result<Definition, InterpretError> {
        Ok(Definition {
            success: true,
            resolved_phrase: phrase.map(String::from),
        })
    }

    #[test]
    fn open_without_anything_to_define_is_rejected() {
        let mut s = session();
        assert!(matches!(
            s.open_define(),
            Err(SessionError::DefineRejected(_))
        ));
        assert_eq!(s.status_kind(), StatusKind::Try);
    }

    #[test]
    fn open_retains_latest_pin_and_requests_defaults() {
        let mut s = session();
        pin(&mut s, "build a tower");
        let effects = s.open_define().unwrap();

        let Status::Define(state) = s.status() else {
            panic!("expected define");
        };
        assert_eq!(state.command(), "build a tower");
        assert_eq!(
            effects,
            vec![Effect::Autocomplete {
                prefix: String::new()
            }]
        );
    }

    #[test]
    fn open_from_accept_retains_command() {
        let mut s = session();
        let ticket = request_ticket(&s.submit("add yellow").unwrap());
        let candidate = Candidate {
            value: CandidateValue::Blocks(vec![]),
            pretty_string: String::new(),
            status: String::new(),
            error: false,
            path: vec![],
        };
        s.on_interpreted(
            ticket,
            Ok(Interpretation {
                candidates: vec![candidate],
                requires_define: None,
            }),
        )
        .unwrap();

        s.open_define().unwrap();
        let Status::Define(state) = s.status() else {
            panic!("expected define");
        };
        assert_eq!(state.command(), "add yellow");
    }

    #[test]
    fn edit_requests_autocomplete_after_separator() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();

        assert!(s.edit_define("add").is_empty());
        assert_eq!(
            s.edit_define("add "),
            vec![Effect::Autocomplete {
                prefix: "add ".into()
            }]
        );
    }

    #[test]
    fn empty_phrase_stays_in_define() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();

        let err = s.submit("   ").unwrap_err();
        assert!(matches!(err, SessionError::DefineRejected(_)));
        assert_eq!(s.status_kind(), StatusKind::Define);
    }

    #[test]
    fn success_surfaces_phrase_and_clears_pins() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();
        let ticket = request_ticket(&s.submit("repeat add red 3 times").unwrap());

        let effects = s.on_defined(ticket, defined(None)).unwrap();

        assert_eq!(s.status_kind(), StatusKind::Try);
        assert_eq!(s.input(), "repeat add red 3 times");
        assert!(s.pins().is_empty());
        assert!(matches!(&effects[..], [Effect::Notify(Notice::Defined { .. })]));
    }

    #[test]
    fn resolved_phrase_wins() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();
        let ticket = request_ticket(&s.submit("red tower").unwrap());

        s.on_defined(ticket, defined(Some("tower"))).unwrap();
        assert_eq!(s.input(), "tower");
    }

    #[test]
    fn failure_stays_in_define_and_allows_retry() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();
        let ticket = request_ticket(&s.submit("red tower").unwrap());

        let err = s
            .on_defined(
                ticket,
                Ok(Definition {
                    success: false,
                    resolved_phrase: None,
                }),
            )
            .unwrap_err();

        assert!(matches!(err, SessionError::DefineRejected(_)));
        assert_eq!(s.status_kind(), StatusKind::Define);
        assert_eq!(s.pins().len(), 1);
        assert!(!s.submit("").unwrap().is_empty());
    }

    #[test]
    fn double_submit_is_debounced() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();

        assert!(!s.submit("red tower").unwrap().is_empty());
        assert!(s.submit("red tower").unwrap().is_empty());
    }

    #[test]
    fn definition_after_cancel_is_stale() {
        let mut s = session();
        pin(&mut s, "tower");
        s.open_define().unwrap();
        let ticket = request_ticket(&s.submit("red tower").unwrap());
        s.cancel();

        assert!(s.on_defined(ticket, defined(None)).unwrap().is_empty());
        assert_eq!(s.input(), "");
        assert_eq!(s.pins().len(), 1);
    }
}
