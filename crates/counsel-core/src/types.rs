use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── User profile ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Moderate,
    Flexible,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

/// The applicant's profile as submitted to the recommendation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub occupation: String,
    pub industry: String,
    pub nationality: String,
    pub budget_range: BudgetRange,
    #[serde(default)]
    pub location_preference: Option<String>,
    pub timeline_urgency: Urgency,
    pub achievements: Vec<String>,
    #[serde(default)]
    pub publications: Option<u32>,
    #[serde(default)]
    pub citations: Option<u32>,
    #[serde(default)]
    pub awards: Option<Vec<String>>,
    /// What the applicant weighs most, e.g. ["success_rate", "cost", "location"].
    pub priority_factors: Vec<String>,
}

// ── Lawyer profile ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl ContactInfo {
    /// Number of contact channels actually present.
    pub fn field_count(&self) -> usize {
        [&self.email, &self.phone, &self.website]
            .iter()
            .filter(|f| f.as_ref().map(|s| !s.is_empty()).unwrap_or(false))
            .count()
    }

    /// Best available channel for a "reach out via …" suggestion.
    pub fn best_channel(&self) -> &str {
        self.email
            .as_deref()
            .or(self.website.as_deref())
            .or(self.phone.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("their website")
    }
}

/// A candidate lawyer as extracted from search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerProfile {
    pub name: String,
    pub firm: String,
    #[serde(default)]
    pub contact_info: ContactInfo,
}

// ── Recommendation ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position; assigned after parsing, not by the model.
    #[serde(default)]
    pub rank: u32,
    pub lawyer: LawyerProfile,
    /// Compatibility score (0-100), joined in from the scoring step.
    #[serde(default)]
    pub score: Option<f64>,
    pub reason: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub status: String,
    pub user: String,
    pub recommendations: Vec<Recommendation>,
    pub summary: String,
    /// Append-only log of what each step did (or fell back to).
    pub process_log: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

// ── Pipeline state ───────────────────────────────────────────────────────

/// One search call's raw textual reply, paired with the query that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub query: String,
    pub results: String,
}

/// Working state threaded through the five pipeline steps.
/// Constructed per request, dropped with the report.
#[derive(Debug, Clone)]
pub struct RunState {
    pub profile: UserProfile,
    pub queries: Vec<String>,
    pub hits: Vec<SearchHit>,
    pub profiles: Vec<LawyerProfile>,
    /// Lawyer name → compatibility score (0-100).
    pub scores: HashMap<String, f64>,
    pub recommendations: Vec<Recommendation>,
    pub reasoning: String,
    pub messages: Vec<String>,
}

impl RunState {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            queries: Vec::new(),
            hits: Vec::new(),
            profiles: Vec::new(),
            scores: HashMap::new(),
            recommendations: Vec::new(),
            reasoning: String::new(),
            messages: Vec::new(),
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}
