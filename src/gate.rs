use std::collections::HashMap;

use crate::api::RevealResponse;
use crate::models::{CandidateDetail, ViewCredits};

// Per-candidate reveal lifecycle: Idle -> Requesting -> Revealed/Denied/
// Failed. Failed keeps its message for the candidate's card and is
// retryable; Denied is not retryable until the company counter rises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Requesting,
    Revealed,
    Denied,
    Failed(String),
}

// What the caller should do with a reveal request. Only Fetch may be
// followed by a network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealDecision {
    Fetch,
    CachedToggle,
    AlreadyRequesting,
    Denied,
}

// Owns the cached credit counters, the per-candidate reveal states, and the
// session detail cache. All mutation happens on the UI thread through the
// transition methods below; complete_reveal is the only writer of the
// counters, and it copies the server's numbers verbatim.
pub struct CreditGate {
    credits: ViewCredits,
    states: HashMap<String, RevealState>,
    details: HashMap<String, CandidateDetail>,
}

impl CreditGate {
    pub fn new(credits: ViewCredits) -> Self {
        Self {
            credits,
            states: HashMap::new(),
            details: HashMap::new(),
        }
    }

    pub fn credits(&self) -> &ViewCredits {
        &self.credits
    }

    pub fn state(&self, candidate_id: &str) -> RevealState {
        self.states
            .get(candidate_id)
            .cloned()
            .unwrap_or(RevealState::Idle)
    }

    pub fn detail(&self, candidate_id: &str) -> Option<&CandidateDetail> {
        self.details.get(candidate_id)
    }

    // Entry point for a user reveal action. Decides locally, before any
    // network traffic: cached details are free, an in-flight request for the
    // same candidate blocks a duplicate, and a known-zero company counter is
    // an immediate denial. Requests for different candidates stay
    // independent.
    pub fn begin_reveal(&mut self, candidate_id: &str) -> RevealDecision {
        if self.details.contains_key(candidate_id) {
            return RevealDecision::CachedToggle;
        }

        if self.state(candidate_id) == RevealState::Requesting {
            tracing::debug!(candidate_id, "reveal already in flight");
            return RevealDecision::AlreadyRequesting;
        }

        if self.credits.company_remaining == 0 {
            tracing::debug!(candidate_id, "reveal denied, no company credits");
            self.states
                .insert(candidate_id.to_string(), RevealState::Denied);
            return RevealDecision::Denied;
        }

        self.states
            .insert(candidate_id.to_string(), RevealState::Requesting);
        RevealDecision::Fetch
    }

    // Applies the server's answer to a Fetch decision. On success the
    // counters are overwritten from the response (never computed locally),
    // the detail is cached for the rest of the session, and the caller gets
    // it back to merge into its list record and set viewed_by_me. A
    // success=false answer is a failure regardless of HTTP status.
    pub fn complete_reveal(
        &mut self,
        candidate_id: &str,
        response: RevealResponse,
    ) -> Result<&CandidateDetail, String> {
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "Server rejected the reveal request".to_string());
            self.fail_reveal(candidate_id, message.clone());
            return Err(message);
        }

        let Some(detail) = response.data else {
            let message = "Reveal response carried no candidate data".to_string();
            self.fail_reveal(candidate_id, message.clone());
            return Err(message);
        };

        self.credits.company_remaining = response.remaining_views;
        self.credits.personal_used = response.personal_view_count;

        tracing::debug!(
            candidate_id,
            company_remaining = self.credits.company_remaining,
            personal_used = self.credits.personal_used,
            viewed_before = response.viewed_before,
            "reveal completed"
        );

        self.states
            .insert(candidate_id.to_string(), RevealState::Revealed);
        Ok(self
            .details
            .entry(candidate_id.to_string())
            .or_insert(detail))
    }

    // Transport or server failure: counters untouched, message kept for the
    // candidate's card. begin_reveal treats Failed like Idle, so a retry is
    // one more user action away.
    pub fn fail_reveal(&mut self, candidate_id: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(candidate_id, message = %message, "reveal failed");
        self.states
            .insert(candidate_id.to_string(), RevealState::Failed(message));
    }

    // Denied -> Idle. The next attempt re-denies unless the company counter
    // has risen through a later server response.
    pub fn acknowledge_denial(&mut self, candidate_id: &str) {
        if self.state(candidate_id) == RevealState::Denied {
            self.states.remove(candidate_id);
        }
    }
}
