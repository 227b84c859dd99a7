//! The semantic parser, as the session sees it.
//!
//! `Interpreter` is the seam: the session never talks to the network
//! itself. `SempreClient` is the HTTP implementation; tests substitute
//! scripted ones.

mod protocol;
mod sempre;

pub use protocol::{Query, Request, Response};
pub use sempre::SempreClient;

use crate::model::Candidate;

/// Suggestions offered when the parser has none for an empty prefix.
pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "remove if top red",
    "add yellow",
    "add brown if has red or row = 3",
    "add yellow if row = 3",
    "repeat add yellow 3 times",
];

/// Context sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Stable per user, generated once.
    pub session_id: String,
}

/// The parser's answer to a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpretation {
    /// Ranked best first. Empty means the parser did not understand.
    pub candidates: Vec<Candidate>,

    /// The parser asks the user to define the command instead.
    pub requires_define: Option<String>,
}

/// The parser's answer to a define request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub success: bool,

    /// The phrase the new macro is invoked by, when the parser reports one.
    pub resolved_phrase: Option<String>,
}

/// Why a request to the parser produced no usable answer.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("parser request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("parser returned HTTP {0}")]
    Status(u16),

    #[error("invalid parser response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("parser rejected the request: {0}")]
    Rejected(String),
}

/// Request/response access to the semantic parser.
///
/// `interpret` must return the same ranked candidates for the same
/// command and context within a session.
pub trait Interpreter {
    fn interpret(
        &self,
        command: &str,
        context: &SessionContext,
    ) -> Result<Interpretation, InterpretError>;

    fn define(&self, phrase: &str, context: &SessionContext)
    -> Result<Definition, InterpretError>;

    /// Must accept an empty prefix.
    fn autocomplete(
        &self,
        prefix: &str,
        context: &SessionContext,
    ) -> Result<Vec<String>, InterpretError>;
}

/// Whether edited define text should trigger an autocomplete request.
pub fn wants_autocomplete(text: &str) -> bool {
    text.is_empty() || text.ends_with(' ')
}
