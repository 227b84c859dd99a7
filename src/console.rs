//! Runs the session against real collaborators.
//!
//! The session only describes side effects. The console carries them out
//! one at a time: it calls the parser, feeds the answer back, writes
//! events to the sink, and collects what the user should see.

use std::collections::VecDeque;

use tracing::warn;

use crate::history::HistoryJump;
use crate::interpret::{DEFAULT_SUGGESTIONS, Interpreter};
use crate::logbook::{EventSink, stamp};
use crate::model::Task;
use crate::session::{Effect, Notice, Session, SessionError};

/// Something to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Notice(Notice),
    Error(SessionError),
    Suggestions(Vec<String>),
}

/// A session wired to a parser and an event sink.
pub struct Console<I, S> {
    session: Session,
    interpreter: I,
    sink: S,
}

impl<I: Interpreter, S: EventSink> Console<I, S> {
    pub fn new(session: Session, interpreter: I, sink: S) -> Self {
        Self {
            session,
            interpreter,
            sink,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn submit(&mut self, text: &str) -> Vec<Output> {
        let result = self.session.submit(text);
        self.settle(result)
    }

    /// Shift+Enter.
    pub fn accept(&mut self) -> Vec<Output> {
        let result = self.session.confirm();
        self.settle(result)
    }

    pub fn select_next(&mut self) -> Vec<Output> {
        let effects = self.session.select_next();
        self.run(effects)
    }

    pub fn select_prev(&mut self) -> Vec<Output> {
        let effects = self.session.select_prev();
        self.run(effects)
    }

    pub fn undo(&mut self) -> Vec<Output> {
        let effects = self.session.undo();
        self.run(effects)
    }

    pub fn redo(&mut self) -> Vec<Output> {
        let effects = self.session.redo();
        self.run(effects)
    }

    pub fn jump(&mut self, jump: HistoryJump) -> Vec<Output> {
        let effects = self.session.jump(jump);
        self.run(effects)
    }

    pub fn open_define(&mut self) -> Vec<Output> {
        let result = self.session.open_define();
        self.settle(result)
    }

    pub fn edit_define(&mut self, text: &str) -> Vec<Output> {
        let effects = self.session.edit_define(text);
        self.run(effects)
    }

    /// Esc.
    pub fn cancel(&mut self) -> bool {
        self.session.cancel()
    }

    pub fn set_task(&mut self, task: Task) -> Vec<Output> {
        let effects = self.session.set_task(task);
        self.run(effects)
    }

    fn settle(&mut self, result: Result<Vec<Effect>, SessionError>) -> Vec<Output> {
        match result {
            Ok(effects) => self.run(effects),
            Err(e) => vec![Output::Error(e)],
        }
    }

    /// Carries out effects in order, including any the answers produce.
    fn run(&mut self, effects: Vec<Effect>) -> Vec<Output> {
        let mut queue = VecDeque::from(effects);
        let mut outputs = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Interpret { ticket, command } => {
                    let answer = self
                        .interpreter
                        .interpret(&command, self.session.context());
                    match self.session.on_interpreted(ticket, answer) {
                        Ok(more) => queue.extend(more),
                        Err(e) => outputs.push(Output::Error(e)),
                    }
                }
                Effect::Define { ticket, phrase } => {
                    let answer = self.interpreter.define(&phrase, self.session.context());
                    match self.session.on_defined(ticket, answer) {
                        Ok(more) => queue.extend(more),
                        Err(e) => outputs.push(Output::Error(e)),
                    }
                }
                Effect::Autocomplete { prefix } => {
                    outputs.push(Output::Suggestions(self.suggestions(&prefix)));
                }
                Effect::Log(event) => {
                    let record = stamp(
                        &self.session.context().session_id,
                        self.session.structure_id(),
                        event,
                    );
                    self.sink.record(&record);
                }
                Effect::Notify(notice) => outputs.push(Output::Notice(notice)),
                Effect::Fail(error) => outputs.push(Output::Error(error)),
            }
        }

        outputs
    }

    /// Parser suggestions, falling back to the defaults for an empty prefix.
    fn suggestions(&self, prefix: &str) -> Vec<String> {
        let suggestions = self
            .interpreter
            .autocomplete(prefix, self.session.context())
            .unwrap_or_else(|e| {
                warn!(prefix, error = %e, "autocomplete failed");
                Vec::new()
            });
        if suggestions.is_empty() && prefix.is_empty() {
            return DEFAULT_SUGGESTIONS.iter().map(ToString::to_string).collect();
        }
        suggestions
    }
}
