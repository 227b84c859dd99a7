//! Wire format for the parser service.
//!
//! Every request is a single s-expression in `q` plus the session id.
//! One response shape covers parse, define, and autocomplete answers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Candidate;

use super::{Definition, InterpretError, Interpretation};

/// What to ask the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Parse(String),
    Autocomplete(String),
    Define(String),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, arg) = match self {
            Self::Parse(s) => ("parse", s),
            Self::Autocomplete(s) => ("autocomplete", s),
            Self::Define(s) => ("define", s),
        };
        write!(f, "({head} \"{}\")", escape(arg))
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Query parameters of one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub q: String,
    pub session_id: String,
}

impl Request {
    pub fn new(query: &Query, session_id: &str) -> Self {
        Self {
            q: query.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Everything the parser may send back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(default)]
    pub autocompletes: Option<Vec<String>>,

    #[serde(default)]
    pub requires_define: Option<String>,

    #[serde(default)]
    pub defined: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl Response {
    pub fn into_interpretation(self) -> Result<Interpretation, InterpretError> {
        if let Some(error) = self.error {
            return Err(InterpretError::Rejected(error));
        }
        Ok(Interpretation {
            candidates: self.candidates,
            requires_define: self.requires_define.filter(|s| !s.is_empty()),
        })
    }

    /// A define fails when the parser reports an error; transport errors never get here.
    pub fn into_definition(self) -> Definition {
        Definition {
            success: self.error.is_none(),
            resolved_phrase: self.defined.filter(|s| !s.is_empty()),
        }
    }

    pub fn into_autocompletes(self) -> Result<Vec<String>, InterpretError> {
        if let Some(error) = self.error {
            return Err(InterpretError::Rejected(error));
        }
        Ok(self.autocompletes.unwrap_or_default())
    }
}
