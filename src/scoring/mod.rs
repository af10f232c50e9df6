//! Client side of the run-verification service
//!
//! A run is opened when a session starts and closed with the final score at
//! game over. The service re-validates timing and signature and answers with
//! the accepted best score. None of this ever blocks the frame loop: calls
//! are dispatched inline or on a worker thread, and their outcomes are
//! folded in by `ScoreSync::poll`. Failures become a status message and the
//! local best score stays on display.

#[cfg(all(feature = "remote", not(target_arch = "wasm32")))]
pub mod http;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("network error: {0}")]
    Network(String),
    /// Token missing, expired or revoked
    #[error("not authorized")]
    Unauthorized,
    #[error("run rejected: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Server-issued handle for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTicket {
    pub run_id: String,
    /// Unix ms after which the run can no longer be finished
    pub expires_at: i64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest<'a> {
    pub run_id: &'a str,
    pub score: f32,
    pub signature: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishReceipt {
    pub best_score: f32,
    #[serde(default)]
    pub leaderboard_top5: Vec<LeaderboardEntry>,
}

/// Remote boundary that opens runs and accepts final scores
pub trait RunVerifier: Send + Sync {
    fn start_run(&self, token: &str) -> Result<RunTicket, ScoringError>;
    fn finish_run(&self, token: &str, ticket: &RunTicket, score: f32) -> Result<FinishReceipt, ScoringError>;
}

/// How verifier calls are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Call immediately; the outcome is still only applied on `poll`
    Inline,
    /// Worker thread per call (falls back to inline on wasm32)
    Background,
}

#[derive(Debug)]
enum Outcome {
    Started(Result<RunTicket, ScoringError>),
    Finished(Result<FinishReceipt, ScoringError>),
}

type Task = Box<dyn FnOnce() -> Outcome + Send + 'static>;

const STATUS_EXPIRED: &str = "Session expired, sign in again to submit scores";

pub struct ScoreSync {
    verifier: Option<Arc<dyn RunVerifier>>,
    token: Option<String>,
    dispatch: Dispatch,
    ticket: Option<RunTicket>,
    /// Game ended before the run ticket arrived
    pending_finish: Option<f32>,
    starting: bool,
    #[cfg(not(target_arch = "wasm32"))]
    in_flight: Vec<std::thread::JoinHandle<Outcome>>,
    ready: Vec<Outcome>,
    remote_best: Option<f32>,
    leaderboard: Vec<LeaderboardEntry>,
    status: Option<String>,
}

impl std::fmt::Debug for ScoreSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreSync")
            .field("online", &self.is_online())
            .field("dispatch", &self.dispatch)
            .field("ticket", &self.ticket)
            .field("remote_best", &self.remote_best)
            .field("status", &self.status)
            .finish()
    }
}

impl ScoreSync {
    /// No verifier: scores stay local
    pub fn offline() -> Self {
        Self {
            verifier: None,
            token: None,
            dispatch: Dispatch::Inline,
            ticket: None,
            pending_finish: None,
            starting: false,
            #[cfg(not(target_arch = "wasm32"))]
            in_flight: Vec::new(),
            ready: Vec::new(),
            remote_best: None,
            leaderboard: Vec::new(),
            status: None,
        }
    }

    pub fn new(verifier: Arc<dyn RunVerifier>, token: impl Into<String>, dispatch: Dispatch) -> Self {
        Self {
            verifier: Some(verifier),
            token: Some(token.into()),
            dispatch,
            ..Self::offline()
        }
    }

    pub fn is_online(&self) -> bool {
        self.verifier.is_some() && self.token.is_some()
    }

    /// Replace the auth token (after the player signs in again)
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.status = None;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Best score the service last accepted
    pub fn remote_best(&self) -> Option<f32> {
        self.remote_best
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// True while calls are outstanding or outcomes await `poll`
    pub fn is_busy(&self) -> bool {
        #[cfg(not(target_arch = "wasm32"))]
        if !self.in_flight.is_empty() {
            return true;
        }
        !self.ready.is_empty()
    }

    /// Open a run for the session that just started
    pub fn on_session_start(&mut self) {
        self.ticket = None;
        self.pending_finish = None;
        let (Some(verifier), Some(token)) = (self.verifier.clone(), self.token.clone()) else {
            return;
        };
        self.starting = true;
        self.run_task(Box::new(move || Outcome::Started(verifier.start_run(&token))));
    }

    /// Submit the final score of the session that just ended
    pub fn on_game_over(&mut self, score: f32) {
        if !self.is_online() {
            return;
        }
        match self.ticket.take() {
            Some(ticket) => self.submit(ticket, score),
            None if self.starting => self.pending_finish = Some(score),
            None => {
                log::warn!("No open run, score {} kept locally", score);
                self.status = Some("Score not verified (no active run)".into());
            }
        }
    }

    fn submit(&mut self, ticket: RunTicket, score: f32) {
        let (Some(verifier), Some(token)) = (self.verifier.clone(), self.token.clone()) else {
            return;
        };
        log::debug!("Submitting score {} for run {}", score, ticket.run_id);
        self.run_task(Box::new(move || {
            Outcome::Finished(verifier.finish_run(&token, &ticket, score))
        }));
    }

    fn run_task(&mut self, task: Task) {
        match self.dispatch {
            #[cfg(not(target_arch = "wasm32"))]
            Dispatch::Background => self.in_flight.push(std::thread::spawn(task)),
            _ => self.ready.push(task()),
        }
    }

    /// Apply finished calls. Returns the service's accepted best score when
    /// a submission completed this poll.
    pub fn poll(&mut self) -> Option<f32> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let (done, running): (Vec<_>, Vec<_>) =
                self.in_flight.drain(..).partition(|h| h.is_finished());
            self.in_flight = running;
            for handle in done {
                let outcome = handle.join().unwrap_or_else(|_| {
                    Outcome::Finished(Err(ScoringError::Network("worker panicked".into())))
                });
                self.ready.push(outcome);
            }
        }

        let mut accepted = None;
        // Inline submissions made while applying outcomes land in `ready` too
        while !self.ready.is_empty() {
            for outcome in std::mem::take(&mut self.ready) {
                match outcome {
                    Outcome::Started(Ok(ticket)) => {
                        self.starting = false;
                        log::debug!("Run {} opened", ticket.run_id);
                        match self.pending_finish.take() {
                            Some(score) => self.submit(ticket, score),
                            None => self.ticket = Some(ticket),
                        }
                    }
                    Outcome::Started(Err(e)) => {
                        self.starting = false;
                        self.pending_finish = None;
                        self.fail(e);
                    }
                    Outcome::Finished(Ok(receipt)) => {
                        log::info!("Score accepted, best {}", receipt.best_score);
                        self.remote_best = Some(receipt.best_score);
                        self.leaderboard = receipt.leaderboard_top5;
                        self.status = None;
                        accepted = Some(receipt.best_score);
                    }
                    Outcome::Finished(Err(e)) => self.fail(e),
                }
            }
        }
        accepted
    }

    fn fail(&mut self, error: ScoringError) {
        log::warn!("Score sync failed: {}", error);
        match error {
            ScoringError::Unauthorized => {
                self.token = None;
                self.ticket = None;
                self.status = Some(STATUS_EXPIRED.into());
            }
            ScoringError::Rejected(reason) => {
                self.status = Some(format!("Score not accepted: {reason}"));
            }
            ScoringError::Network(_) | ScoringError::Malformed(_) => {
                self.status = Some("Could not reach the score service, best kept locally".into());
            }
        }
    }
}
