use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaStatus {
    Citizen,
    PermanentResident,
    WorkVisa,
    RequiresSponsorship,
}

impl FromStr for VisaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "citizen" => Ok(VisaStatus::Citizen),
            "permanent_resident" | "permanent-resident" => Ok(VisaStatus::PermanentResident),
            "work_visa" | "work-visa" => Ok(VisaStatus::WorkVisa),
            "requires_sponsorship" | "requires-sponsorship" | "sponsorship" => {
                Ok(VisaStatus::RequiresSponsorship)
            }
            other => Err(format!(
                "Unknown visa status '{}'. Available: citizen, permanent_resident, work_visa, requires_sponsorship",
                other
            )),
        }
    }
}

impl fmt::Display for VisaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VisaStatus::Citizen => "citizen",
            VisaStatus::PermanentResident => "permanent_resident",
            VisaStatus::WorkVisa => "work_visa",
            VisaStatus::RequiresSponsorship => "requires_sponsorship",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: String,
    pub full_name: String,
    pub job_title: String,
    pub location: String,
    pub visa_status: VisaStatus,
    #[serde(deserialize_with = "bool_or_string")]
    pub open_to_relocation: bool,
    pub job_domain: String,
    pub skills: Vec<String>, // truncated list in the summary projection
    #[serde(default)]
    pub viewed_by_me: bool,
    #[serde(default)]
    pub email: Option<String>, // present only after a reveal merges detail back
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetail {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>, // full list
    #[serde(default)]
    pub resume_url: Option<String>,
}

// Cached copy of the server-side counters. The company counter is shared
// across all recruiters of one company; the personal counter is scoped to
// the acting recruiter. Only gate::CreditGate::complete_reveal writes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCredits {
    pub company_remaining: u32,
    pub personal_used: u32,
}

// The relocation flag arrives as a bool from newer server builds and as a
// stringified bool ("true"/"false") from older ones.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Text(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid relocation flag: {}",
                other
            ))),
        },
    }
}
