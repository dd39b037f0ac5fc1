use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{CandidateDetail, CandidateSummary};

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";

// --- Wire types ---

#[derive(Debug, Serialize)]
struct RevealRequest {
    recruiter: String,
}

// Answer to a detail-reveal call. The counters are the server's
// authoritative numbers after the request was processed; viewedBefore marks
// a free repeat reveal. success=false means the reveal was rejected,
// whatever the HTTP status said.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<CandidateDetail>,
    #[serde(default)]
    pub remaining_views: u32,
    #[serde(default)]
    pub personal_view_count: u32,
    #[serde(default)]
    pub viewed_before: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterUsage {
    pub fullname: String,
    pub view_count: u32,
    pub unique_candidates_viewed: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditStats {
    pub initial_view_count: u32,
    pub remaining_views: u32,
    #[serde(default)]
    pub recruiters: Vec<RecruiterUsage>,
}

// --- Token file ---

pub fn default_token_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "scout") {
        proj_dirs.config_dir().join("token.txt")
    } else {
        // Fallback to current directory
        PathBuf::from("scout-token.txt")
    }
}

pub fn token_from_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let token = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file: {:?}", path))?;
    let token = token.trim();
    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(token.to_string()))
    }
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    recruiter: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, recruiter: &str, token: Option<String>) -> Result<Self> {
        let recruiter = recruiter.trim();
        if recruiter.is_empty() {
            return Err(anyhow!(
                "No recruiter identity. Pass --user or set SCOUT_USER to your recruiter email."
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            recruiter: recruiter.to_string(),
            token,
            client: reqwest::blocking::Client::new(),
        })
    }

    pub fn recruiter(&self) -> &str {
        &self.recruiter
    }

    fn apply_auth(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    pub fn list_candidates(&self) -> Result<Vec<CandidateSummary>> {
        let url = format!("{}/candidates", self.base_url);
        tracing::debug!(url = %url, "fetching candidate list");

        let response = self
            .apply_auth(self.client.get(&url))
            .send()
            .context("Failed to fetch candidate list")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Candidate list request failed with status {}: {}",
                status,
                error_text
            ));
        }

        response.json().context("Failed to parse candidate list")
    }

    // One reveal call per Fetch decision from the gate. A rejection body
    // ({"success": false, ...}) is a normal answer here even on a 4xx
    // status; only transport problems and unrecognized bodies are errors.
    pub fn reveal_candidate(&self, candidate_id: &str) -> Result<RevealResponse> {
        let url = format!("{}/candidates/{}/view", self.base_url, candidate_id);
        tracing::debug!(url = %url, recruiter = %self.recruiter, "requesting detail reveal");

        let request = RevealRequest {
            recruiter: self.recruiter.clone(),
        };

        let response = self
            .apply_auth(self.client.post(&url))
            .json(&request)
            .send()
            .context("Failed to send reveal request")?;

        let status = response.status();
        let body = response.text().context("Failed to read reveal response")?;

        if let Ok(parsed) = serde_json::from_str::<RevealResponse>(&body) {
            return Ok(parsed);
        }

        if !status.is_success() {
            return Err(anyhow!(
                "Reveal request failed with status {}: {}",
                status,
                body
            ));
        }
        Err(anyhow!("Failed to parse reveal response: {}", body))
    }

    pub fn credit_stats(&self) -> Result<CreditStats> {
        let url = format!("{}/company/credits", self.base_url);
        tracing::debug!(url = %url, "fetching company credit stats");

        let response = self
            .apply_auth(self.client.get(&url))
            .send()
            .context("Failed to fetch company credit stats")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Credit stats request failed with status {}: {}",
                status,
                error_text
            ));
        }

        response.json().context("Failed to parse credit stats")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_response_parses_full_body() {
        let json = r#"{
            "success": true,
            "data": {
                "id": "c-1",
                "fullName": "Ada Okafor",
                "email": "ada@example.com",
                "phone": "+234 800 000 0000",
                "skills": ["Rust", "Kubernetes", "Postgres"],
                "resumeUrl": "https://cdn.example.com/resumes/c-1.pdf"
            },
            "remainingViews": 41,
            "personalViewCount": 9,
            "viewedBefore": false
        }"#;

        let r: RevealResponse = serde_json::from_str(json).unwrap();
        assert!(r.success);
        assert_eq!(r.remaining_views, 41);
        assert_eq!(r.personal_view_count, 9);
        assert!(!r.viewed_before);
        assert_eq!(r.message, None);
        let data = r.data.unwrap();
        assert_eq!(data.email, "ada@example.com");
        assert_eq!(data.skills.len(), 3);
    }

    #[test]
    fn test_reveal_rejection_parses_with_defaults() {
        let json = r#"{"success": false, "message": "view limit reached"}"#;

        let r: RevealResponse = serde_json::from_str(json).unwrap();
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.remaining_views, 0);
        assert_eq!(r.message.as_deref(), Some("view limit reached"));
    }

    #[test]
    fn test_unrecognized_body_does_not_parse_as_reveal() {
        // a generic error body must not be mistaken for a reveal answer
        assert!(serde_json::from_str::<RevealResponse>(r#"{"error": "boom"}"#).is_err());
    }

    #[test]
    fn test_credit_stats_parse() {
        let json = r#"{
            "initialViewCount": 100,
            "remainingViews": 37,
            "recruiters": [
                {"fullname": "Dana Cole", "viewCount": 40, "uniqueCandidatesViewed": 35},
                {"fullname": "Raj Patel", "viewCount": 23, "uniqueCandidatesViewed": 23}
            ]
        }"#;

        let stats: CreditStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.initial_view_count, 100);
        assert_eq!(stats.remaining_views, 37);
        assert_eq!(stats.recruiters.len(), 2);
        assert_eq!(stats.recruiters[0].fullname, "Dana Cole");
        assert_eq!(stats.recruiters[1].unique_candidates_viewed, 23);
    }

    #[test]
    fn test_client_requires_recruiter_identity() {
        let result = ApiClient::new(DEFAULT_API_URL, "", None);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SCOUT_USER"));

        let result = ApiClient::new(DEFAULT_API_URL, "   ", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:4000/api/", "dana@example.com", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:4000/api");
        assert_eq!(client.recruiter(), "dana@example.com");
    }

    #[test]
    fn test_token_from_file() {
        let path = std::env::temp_dir().join("scout-token-test.txt");

        let missing = std::env::temp_dir().join("scout-token-does-not-exist.txt");
        assert_eq!(token_from_file(&missing).unwrap(), None);

        fs::write(&path, "  secret-token\n").unwrap();
        assert_eq!(token_from_file(&path).unwrap(), Some("secret-token".to_string()));

        fs::write(&path, "   \n").unwrap();
        assert_eq!(token_from_file(&path).unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
