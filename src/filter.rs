use std::str::FromStr;

use crate::models::{CandidateSummary, VisaStatus};
use crate::query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    All,
    Yes,
    No,
}

impl FromStr for TriState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TriState::All),
            "yes" | "true" => Ok(TriState::Yes),
            "no" | "false" => Ok(TriState::No),
            other => Err(format!("Unknown value '{}'. Available: all, yes, no", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewedFilter {
    #[default]
    All,
    Viewed,
    NotViewed,
}

impl FromStr for ViewedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ViewedFilter::All),
            "viewed" => Ok(ViewedFilter::Viewed),
            "not-viewed" | "not_viewed" | "unviewed" => Ok(ViewedFilter::NotViewed),
            other => Err(format!(
                "Unknown value '{}'. Available: all, viewed, not-viewed",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Listed, // server order, no re-sort
    Name,
    Title,
    Location,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "listed" => Ok(SortKey::Listed),
            "name" => Ok(SortKey::Name),
            "title" => Ok(SortKey::Title),
            "location" => Ok(SortKey::Location),
            other => Err(format!(
                "Unknown sort key '{}'. Available: listed, name, title, location",
                other
            )),
        }
    }
}

// Current query parameters for the candidate list. Mutated only by user
// interaction; Default is the reset state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub query: String,
    pub boolean_search: bool,
    pub location: String,
    pub visa: Option<VisaStatus>, // None = all
    pub relocation: TriState,
    pub title: String,
    pub viewed: ViewedFilter,
    pub sort: SortKey,
}

// Applies every filter as an independent AND-ed predicate on top of the
// query evaluator. Stable: result order is the input order. Pure: same
// inputs always give the same output.
pub fn filter(candidates: &[CandidateSummary], state: &FilterState) -> Vec<CandidateSummary> {
    let result: Vec<CandidateSummary> = candidates
        .iter()
        .filter(|c| {
            query::matches(&state.query, state.boolean_search, c)
                && substring_filter(&state.location, &c.location)
                && state.visa.is_none_or(|v| c.visa_status == v)
                && match state.relocation {
                    TriState::All => true,
                    TriState::Yes => c.open_to_relocation,
                    TriState::No => !c.open_to_relocation,
                }
                && substring_filter(&state.title, &c.job_title)
                && match state.viewed {
                    ViewedFilter::All => true,
                    ViewedFilter::Viewed => c.viewed_by_me,
                    ViewedFilter::NotViewed => !c.viewed_by_me,
                }
        })
        .cloned()
        .collect();

    tracing::debug!(
        total = candidates.len(),
        matched = result.len(),
        "filter applied"
    );

    result
}

// Vacuously true when the filter text is blank.
fn substring_filter(needle: &str, haystack: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

// Sorting is a separate pass so the filter itself stays order-preserving.
// Vec::sort_by is stable, so equal keys keep their listed order.
pub fn sort_candidates(candidates: &mut [CandidateSummary], key: SortKey) {
    match key {
        SortKey::Listed => {}
        SortKey::Name => {
            candidates.sort_by(|a, b| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()));
        }
        SortKey::Title => {
            candidates.sort_by(|a, b| a.job_title.to_lowercase().cmp(&b.job_title.to_lowercase()));
        }
        SortKey::Location => {
            candidates.sort_by(|a, b| a.location.to_lowercase().cmp(&b.location.to_lowercase()));
        }
    }
}

// One page of an already-filtered list. Pages are 1-based; a page past the
// end is empty, not an error.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if per_page == 0 {
        return &[];
    }
    let start = page.max(1).saturating_sub(1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}
