//! `RunVerifier` over HTTP (ureq)

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{FinishReceipt, FinishRequest, RunTicket, RunVerifier, ScoringError};

const USER_AGENT: &str = "perfect-fit";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Talks to `{base_url}/api/run/start` and `{base_url}/api/run/finish`
pub struct HttpVerifier {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpVerifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(10))
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn request(&self, path: &str, token: &str) -> ureq::Request {
        self.agent
            .post(&format!("{}{}", self.base_url, path))
            .set("User-Agent", USER_AGENT)
            .set("Authorization", &format!("Bearer {token}"))
    }
}

fn decode<T: DeserializeOwned>(result: Result<ureq::Response, ureq::Error>) -> Result<T, ScoringError> {
    match result {
        Ok(response) => response
            .into_json::<T>()
            .map_err(|e| ScoringError::Malformed(e.to_string())),
        Err(ureq::Error::Status(401, _)) => Err(ScoringError::Unauthorized),
        Err(ureq::Error::Status(code, response)) => {
            let message = response
                .into_json::<ErrorBody>()
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("HTTP {code}"));
            if (400..500).contains(&code) {
                Err(ScoringError::Rejected(message))
            } else {
                Err(ScoringError::Network(message))
            }
        }
        Err(ureq::Error::Transport(transport)) => Err(ScoringError::Network(transport.to_string())),
    }
}

impl RunVerifier for HttpVerifier {
    fn start_run(&self, token: &str) -> Result<RunTicket, ScoringError> {
        decode(self.request("/api/run/start", token).call())
    }

    fn finish_run(&self, token: &str, ticket: &RunTicket, score: f32) -> Result<FinishReceipt, ScoringError> {
        let body = FinishRequest {
            run_id: &ticket.run_id,
            score,
            signature: &ticket.signature,
        };
        decode(self.request("/api/run/finish", token).send_json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let verifier = HttpVerifier::new("https://scores.example/");
        assert_eq!(verifier.base_url, "https://scores.example");
    }
}
