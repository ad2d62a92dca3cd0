//! Pre-score candidate filtering.
//!
//! Rejections happen before scoring and caching, so filtered candidates
//! never enter the cache or the result set. Reasons are tallied for
//! observability.

use metrics::counter;
use serde::{Deserialize, Serialize};
use vgen_models::ImageCandidate;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    BlockedDomain,
    LowResolution,
    Duplicate,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::BlockedDomain => "blocked_domain",
            FilterReason::LowResolution => "low_resolution",
            FilterReason::Duplicate => "duplicate",
        }
    }
}

/// Per-reason rejection counts for one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTally {
    pub blocked_domain: u32,
    pub low_resolution: u32,
    pub duplicate: u32,
}

impl FilterTally {
    pub fn record(&mut self, reason: FilterReason) {
        match reason {
            FilterReason::BlockedDomain => self.blocked_domain += 1,
            FilterReason::LowResolution => self.low_resolution += 1,
            FilterReason::Duplicate => self.duplicate += 1,
        }
        counter!("vgen_search_filtered_total", "reason" => reason.as_str()).increment(1);
    }

    pub fn total(&self) -> u32 {
        self.blocked_domain + self.low_resolution + self.duplicate
    }

    pub fn merge(&mut self, other: &FilterTally) {
        self.blocked_domain += other.blocked_domain;
        self.low_resolution += other.low_resolution;
        self.duplicate += other.duplicate;
    }
}

/// Dimension and domain gate applied to every raw candidate.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub min_width: u32,
    pub min_height: u32,
    /// Substring matches against the source domain
    pub blocked_domains: Vec<String>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            min_width: 400,
            min_height: 400,
            blocked_domains: vec![
                "lookaside.fbsbx.com".to_string(),
                "x-raw-image".to_string(),
                "gstatic.com".to_string(),
            ],
        }
    }
}

impl CandidateFilter {
    /// Check one candidate; `Err` carries the rejection reason.
    pub fn check(&self, candidate: &ImageCandidate) -> Result<(), FilterReason> {
        let domain = candidate.source_domain.to_lowercase();
        let url = candidate.source_url.to_lowercase();
        if self
            .blocked_domains
            .iter()
            .any(|b| domain.contains(b.as_str()) || url.contains(b.as_str()))
        {
            return Err(FilterReason::BlockedDomain);
        }
        if candidate.width < self.min_width || candidate.height < self.min_height {
            return Err(FilterReason::LowResolution);
        }
        Ok(())
    }
}
