//! HTTP client for a SEMPRE-style parser service.
//!
//! Requests are `GET <server>/sempre?q=...&sessionId=...`. Calls block;
//! the console makes at most one at a time.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::{
    Definition, InterpretError, Interpretation, Interpreter, Query, Request, Response,
    SessionContext,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the parser over HTTP.
pub struct SempreClient {
    http: Client,
    endpoint: String,
}

impl SempreClient {
    /// Creates a client for the service at `server_url`.
    pub fn new(server_url: &str) -> Result<Self, InterpretError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint(server_url),
        })
    }

    fn query(&self, query: &Query, context: &SessionContext) -> Result<Response, InterpretError> {
        let request = Request::new(query, &context.session_id);
        debug!(q = %request.q, "querying parser");

        let response = self.http.get(&self.endpoint).query(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(InterpretError::Status(status.as_u16()));
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Interpreter for SempreClient {
    fn interpret(
        &self,
        command: &str,
        context: &SessionContext,
    ) -> Result<Interpretation, InterpretError> {
        self.query(&Query::Parse(command.to_string()), context)?
            .into_interpretation()
    }

    fn define(&self, phrase: &str, context: &SessionContext) -> Result<Definition, InterpretError> {
        Ok(self
            .query(&Query::Define(phrase.to_string()), context)?
            .into_definition())
    }

    fn autocomplete(
        &self,
        prefix: &str,
        context: &SessionContext,
    ) -> Result<Vec<String>, InterpretError> {
        self.query(&Query::Autocomplete(prefix.to_string()), context)?
            .into_autocompletes()
    }
}

fn endpoint(server_url: &str) -> String {
    format!("{}/sempre", server_url.trim_end_matches('/'))
}
