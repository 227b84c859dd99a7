//! The session state machine.
//!
//! Turning typed text into a committed world change runs through phases:
//! try the command, pick one of the parser's candidates and accept it, or
//! define the command as a macro. Every transition mutates the session and
//! returns the side effects the caller has to carry out. The session itself
//! never does I/O.
//!
//! Requests to the parser are tagged with a [`Ticket`]. A response is only
//! applied while the session is still waiting on that exact ticket; anything
//! else is stale and dropped.

mod define;

use std::fmt;

use jiff::Timestamp;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::history::{HistoryJump, HistoryLog, JumpKind};
use crate::interpret::{InterpretError, Interpretation, SessionContext};
use crate::model::{Candidate, LogEvent, ScrollDirection, Task, WorldState};
use crate::target::{TargetPuzzle, WinEvaluator};

pub use define::DefineState;

/// Identifies one outbound request to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the session is in a command's round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Waiting for a command.
    Try,

    /// A parse request is in flight.
    Loading { ticket: Ticket, command: String },

    /// The user is choosing among candidates.
    Accept {
        command: String,
        candidates: Vec<Candidate>,
        selected: usize,
    },

    /// The user is naming a command as a macro.
    Define(DefineState),
}

/// The name of a [`Status`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Try,
    Loading,
    Accept,
    Define,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Try => "TRY",
            Self::Loading => "LOADING",
            Self::Accept => "ACCEPT",
            Self::Define => "DEFINE",
        })
    }
}

/// Something the caller must do on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the parser to interpret `command`, then call [`Session::on_interpreted`].
    Interpret { ticket: Ticket, command: String },

    /// Ask the parser to define `phrase`, then call [`Session::on_defined`].
    Define { ticket: Ticket, phrase: String },

    /// Fetch suggestions for the define input. Results go straight to the UI.
    Autocomplete { prefix: String },

    /// Write a product event. Fire and forget.
    Log(LogEvent),

    /// Tell the user something.
    Notify(Notice),

    /// Surface a recoverable error that came with follow-up effects.
    Fail(SessionError),
}

/// A message for the user that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The parser did not understand; the command was recorded as a pin.
    Pinned { command: String },

    /// The selected candidate carries a warning.
    CandidateStatus(String),

    /// The parser wants this command defined.
    DefineRequested(String),

    /// A macro was defined and is ready in the command buffer.
    Defined { command: String, phrase: String },

    /// A command typed while loading was put back in the command buffer.
    Requeued(String),

    /// A new target puzzle was drawn.
    TargetDrawn { target_id: usize, max_steps: usize },

    /// The world matches the target.
    Won { steps: usize },
}

/// Recoverable failures. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("could not interpret command: {0}")]
    InterpretationFailure(String),

    #[error("interpretation {0} cannot be executed")]
    CandidateError(usize),

    #[error(
        "you've reached the maximum number of steps of {max}, undo some steps in order to add more"
    )]
    StepBudgetExceeded { max: usize },

    #[error("definition rejected: {0}")]
    DefineRejected(String),
}

/// A command the parser did not understand, kept for a later definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub command: String,

    /// Log length when the pin was made.
    pub at_len: usize,

    pub pinned_at: Timestamp,
}

/// One user's session: status, history, pins, and the active puzzle.
pub struct Session {
    context: SessionContext,
    status: Status,
    history: HistoryLog,
    pins: Vec<Pin>,
    input: String,
    queued: Option<String>,
    parser_error: Option<String>,
    task: Task,
    evaluator: Option<WinEvaluator>,
    structure_id: Option<Uuid>,
    rng: ChaCha8Rng,
    next_ticket: u64,
}

impl Session {
    /// Starts a free-build session at `initial`.
    pub fn new(context: SessionContext, initial: WorldState, rng: ChaCha8Rng) -> Self {
        Self {
            context,
            status: Status::Try,
            history: HistoryLog::new(initial),
            pins: Vec::new(),
            input: String::new(),
            queued: None,
            parser_error: None,
            task: Task::World,
            evaluator: None,
            structure_id: Some(Uuid::new_v4()),
            rng,
            next_ticket: 0,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_kind(&self) -> StatusKind {
        match self.status {
            Status::Try => StatusKind::Try,
            Status::Loading { .. } => StatusKind::Loading,
            Status::Accept { .. } => StatusKind::Accept,
            Status::Define(_) => StatusKind::Define,
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// The command buffer: text the UI should put back in its input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Why the parser last failed. Cleared by the next answer it gives.
    pub fn parser_error(&self) -> Option<&str> {
        self.parser_error.as_deref()
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn puzzle(&self) -> Option<&TargetPuzzle> {
        self.evaluator.as_ref().map(WinEvaluator::puzzle)
    }

    /// Whether the current world matches the target.
    pub fn is_won(&self) -> bool {
        self.evaluator.as_ref().is_some_and(WinEvaluator::is_won)
    }

    /// Identifies the free-build structure. `None` while solving a puzzle.
    pub fn structure_id(&self) -> Option<Uuid> {
        self.structure_id
    }

    /// The step budget. Unbounded outside target mode.
    pub fn max_steps(&self) -> Option<usize> {
        self.puzzle().map(TargetPuzzle::max_steps)
    }

    /// The world the cursor points at.
    pub fn current_world(&self) -> &WorldState {
        &self.history.resolve().world
    }

    /// The selected candidate and its index, while accepting.
    pub fn selected_candidate(&self) -> Option<(usize, &Candidate)> {
        match &self.status {
            Status::Accept {
                candidates,
                selected,
                ..
            } => candidates.get(*selected).map(|c| (*selected, c)),
            _ => None,
        }
    }

    /// What the world would look like if the selected candidate were accepted.
    pub fn preview(&self) -> Option<WorldState> {
        self.selected_candidate()
            .filter(|(_, c)| !c.error)
            .map(|(_, c)| c.resulting_world(self.current_world()))
    }

    // ── Commands ──

    /// Enter: try a command, accept the selection, or submit a definition.
    pub fn submit(&mut self, text: &str) -> Result<Vec<Effect>, SessionError> {
        match &self.status {
            Status::Try => Ok(self.dispatch(text.trim())),
            Status::Loading { ticket, .. } => {
                let text = text.trim();
                if !text.is_empty() {
                    debug!(%ticket, queued = text, "command queued while loading");
                    self.queued = Some(text.to_string());
                }
                Ok(Vec::new())
            }
            Status::Accept { .. } => self.confirm(),
            Status::Define(_) => self.submit_define(text),
        }
    }

    /// Applies the parser's answer to a parse request.
    pub fn on_interpreted(
        &mut self,
        ticket: Ticket,
        result: Result<Interpretation, InterpretError>,
    ) -> Result<Vec<Effect>, SessionError> {
        let command = match &self.status {
            Status::Loading {
                ticket: pending,
                command,
            } if *pending == ticket => command.clone(),
            _ => {
                debug!(%ticket, status = %self.status_kind(), "dropping stale interpretation");
                return Ok(Vec::new());
            }
        };

        let interpretation = match result {
            Ok(i) => i,
            Err(e) => {
                warn!(%ticket, error = %e, "interpretation failed");
                let message = e.to_string();
                self.parser_error = Some(message.clone());
                self.status = Status::Try;
                let mut effects = vec![Effect::Fail(SessionError::InterpretationFailure(message))];
                if let Some(next) = self.queued.take() {
                    effects.extend(self.dispatch(&next));
                }
                return Ok(effects);
            }
        };
        self.parser_error = None;

        if let Some(message) = interpretation.requires_define {
            self.status = Status::Define(DefineState::new(command));
            let mut effects = vec![
                Effect::Notify(Notice::DefineRequested(message)),
                Effect::Autocomplete {
                    prefix: String::new(),
                },
            ];
            effects.extend(self.requeue());
            return Ok(effects);
        }

        if interpretation.candidates.is_empty() {
            info!(command = %command, "no interpretation, pinned");
            self.pins.push(Pin {
                command: command.clone(),
                at_len: self.history.len(),
                pinned_at: Timestamp::now(),
            });
            self.status = Status::Try;
            self.input.clear();
            let mut effects = vec![Effect::Notify(Notice::Pinned { command })];
            if let Some(next) = self.queued.take() {
                effects.extend(self.dispatch(&next));
            }
            return Ok(effects);
        }

        let mut effects = Vec::new();
        if let Some(status) = interpretation.candidates[0].status_message() {
            effects.push(Effect::Notify(Notice::CandidateStatus(status.to_string())));
        }
        self.status = Status::Accept {
            command,
            candidates: interpretation.candidates,
            selected: 0,
        };
        effects.extend(self.requeue());
        Ok(effects)
    }

    /// Moves the selection one candidate further down the ranking.
    pub fn select_next(&mut self) -> Vec<Effect> {
        self.move_selection(ScrollDirection::Down)
    }

    /// Moves the selection one candidate back up the ranking.
    pub fn select_prev(&mut self) -> Vec<Effect> {
        self.move_selection(ScrollDirection::Up)
    }

    /// Commits the selected candidate as a new history entry.
    ///
    /// Outside `Accept` there is nothing to commit and this does nothing.
    pub fn confirm(&mut self) -> Result<Vec<Effect>, SessionError> {
        let Status::Accept {
            command,
            candidates,
            selected,
        } = &self.status
        else {
            return Ok(Vec::new());
        };

        // Appending from the past truncates first, so count what would remain.
        let committed = self.history.current_index() + 1;
        if let Some(max) = self.max_steps()
            && committed >= max
        {
            return Err(SessionError::StepBudgetExceeded { max });
        }

        let candidate = &candidates[*selected];
        if candidate.error {
            return Err(SessionError::CandidateError(selected + 1));
        }

        let world = candidate.resulting_world(self.current_world());
        let path = candidate.path.clone();
        let command = command.clone();
        info!(command = %command, interpretation = selected + 1, "accepted");

        self.history.append(command, world, path);
        self.status = Status::Try;
        Ok(self.evaluate_target())
    }

    /// Esc: abandons the current phase. In-flight requests go stale.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.status, Status::Try) {
            return false;
        }
        debug!(status = %self.status_kind(), "cancelled");
        self.status = Status::Try;
        self.queued = None;
        true
    }

    // ── Time travel ──

    /// Ctrl+Z. Only while waiting for a command.
    pub fn undo(&mut self) -> Vec<Effect> {
        if !matches!(self.status, Status::Try) || !self.history.undo() {
            return Vec::new();
        }
        self.evaluate_target()
    }

    /// Ctrl+Shift+Z. Only while waiting for a command.
    pub fn redo(&mut self) -> Vec<Effect> {
        if !matches!(self.status, Status::Try) || !self.history.redo() {
            return Vec::new();
        }
        self.evaluate_target()
    }

    /// A click on an accepted or initial entry in the history view.
    pub fn jump(&mut self, jump: HistoryJump) -> Vec<Effect> {
        if !matches!(self.status, Status::Try) || jump.kind == JumpKind::Other {
            return Vec::new();
        }
        self.history.jump_back(jump.step_n);
        self.evaluate_target()
    }

    // ── Task ──

    /// Switches between free building and target puzzles.
    ///
    /// Entering target mode draws a new puzzle.
    pub fn set_task(&mut self, task: Task) -> Vec<Effect> {
        if task == self.task {
            return Vec::new();
        }
        self.task = task;
        match task {
            Task::World => {
                self.evaluator = None;
                self.structure_id = Some(Uuid::new_v4());
                Vec::new()
            }
            Task::Target => {
                let puzzle = TargetPuzzle::draw(&mut self.rng);
                info!(target_id = puzzle.target_id, "target drawn");
                let mut effects = vec![
                    Effect::Log(LogEvent::Start {
                        target_idx: puzzle.target_id,
                        target: puzzle.target.voxels().collect(),
                    }),
                    Effect::Notify(Notice::TargetDrawn {
                        target_id: puzzle.target_id,
                        max_steps: puzzle.max_steps(),
                    }),
                ];
                self.evaluator = Some(WinEvaluator::new(puzzle));
                self.structure_id = None;
                effects.extend(self.evaluate_target());
                effects
            }
        }
    }

    // ── Internals ──

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn dispatch(&mut self, command: &str) -> Vec<Effect> {
        if command.is_empty() {
            return Vec::new();
        }
        let ticket = self.issue_ticket();
        debug!(%ticket, command, "trying command");
        self.status = Status::Loading {
            ticket,
            command: command.to_string(),
        };
        self.input.clear();
        vec![Effect::Interpret {
            ticket,
            command: command.to_string(),
        }]
    }

    /// Puts a command typed while loading back into the command buffer.
    fn requeue(&mut self) -> Option<Effect> {
        let text = self.queued.take()?;
        self.input.clone_from(&text);
        Some(Effect::Notify(Notice::Requeued(text)))
    }

    fn move_selection(&mut self, dir: ScrollDirection) -> Vec<Effect> {
        let Status::Accept {
            candidates,
            selected,
            ..
        } = &mut self.status
        else {
            return Vec::new();
        };

        let next = match dir {
            ScrollDirection::Down if *selected + 1 < candidates.len() => *selected + 1,
            ScrollDirection::Up if *selected > 0 => *selected - 1,
            _ => return Vec::new(),
        };
        *selected = next;

        let mut effects = vec![Effect::Log(LogEvent::Scroll { dir })];
        if let Some(status) = candidates[next].status_message() {
            effects.push(Effect::Notify(Notice::CandidateStatus(status.to_string())));
        }
        effects
    }

    fn evaluate_target(&mut self) -> Vec<Effect> {
        let Some(evaluator) = self.evaluator.as_mut() else {
            return Vec::new();
        };
        let entry = self.history.resolve();
        if !evaluator.observe(&entry.world) {
            return Vec::new();
        }
        // Counted like the log length, initial entry included.
        let steps = entry.step + 1;
        info!(steps, "target reached");
        vec![
            Effect::Log(LogEvent::Win { steps }),
            Effect::Notify(Notice::Won { steps }),
        ]
    }
}
