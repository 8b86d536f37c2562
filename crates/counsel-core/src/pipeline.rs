use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    backend::ChatBackend,
    extract, prompts,
    types::{
        LawyerProfile, Recommendation, RecommendationReport, RunState, SearchHit, UserProfile,
    },
};

/// The five-step recommendation chain:
/// generate queries → search → extract profiles → score → recommend.
///
/// Every step is one outbound chat call whose reply is scraped for JSON.
/// `run` never fails: each step degrades to its documented fallback and
/// records what happened in the run log.
pub struct Pipeline {
    /// Search-oriented endpoint (answers queries with sourced prose).
    search: Arc<dyn ChatBackend>,
    /// General-purpose endpoint (query generation, extraction, scoring,
    /// recommendation).
    chat: Arc<dyn ChatBackend>,
    top_n: usize,
    max_queries: usize,
}

impl Pipeline {
    pub fn new(search: Arc<dyn ChatBackend>, chat: Arc<dyn ChatBackend>) -> Self {
        Self {
            search,
            chat,
            top_n: 2,
            max_queries: 5,
        }
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn with_max_queries(mut self, n: usize) -> Self {
        self.max_queries = n;
        self
    }

    pub async fn run(&self, profile: UserProfile) -> RecommendationReport {
        let mut state = RunState::new(profile);

        self.generate_queries(&mut state).await;
        self.run_searches(&mut state).await;
        self.extract_profiles(&mut state).await;
        self.score_profiles(&mut state).await;
        self.recommend(&mut state).await;

        RecommendationReport {
            status: "success".into(),
            user: state.profile.name.clone(),
            recommendations: state.recommendations,
            summary: state.reasoning,
            process_log: state.messages,
            timestamp: Utc::now(),
        }
    }

    // ── Step 1: generate search queries ──────────────────────────────────

    async fn generate_queries(&self, state: &mut RunState) {
        let prompt = prompts::query_prompt(&state.profile);

        let queries = match self.chat.chat(prompts::QUERY_SYSTEM, &prompt).await {
            Ok(reply) => extract::parse_json_array::<String>(&reply).unwrap_or_else(|| {
                warn!("query reply had no parseable JSON array, using fallback queries");
                prompts::fallback_queries(&state.profile)
            }),
            Err(e) => {
                warn!("query generation failed: {e:#}");
                state.log(format!("Error generating queries: {e}"));
                prompts::fallback_queries(&state.profile)
            }
        };

        let mut queries = queries;
        queries.truncate(self.max_queries);

        info!(count = queries.len(), "search queries ready");
        state.log(format!("Generated {} search queries", queries.len()));
        state.queries = queries;
    }

    // ── Step 2: search fan-out ───────────────────────────────────────────

    /// One search call per query, spawned independently and gathered in
    /// input order. A failed call is captured per-query and replaced with
    /// placeholder text; there is no cancellation or aggregation beyond that.
    async fn run_searches(&self, state: &mut RunState) {
        let queries = state.queries.clone();
        let mut handles = Vec::with_capacity(queries.len());
        for query in &queries {
            let search = Arc::clone(&self.search);
            let query = query.clone();
            handles.push(tokio::spawn(async move {
                let prompt = prompts::search_prompt(&query);
                search.chat(prompts::SEARCH_SYSTEM, &prompt).await
            }));
        }

        for (query, handle) in queries.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(r) => r,
                Err(e) => Err(anyhow::anyhow!("search task aborted: {e}")),
            };
            match outcome {
                Ok(results) => state.hits.push(SearchHit { query, results }),
                Err(e) => {
                    warn!(query = %query, "search call failed: {e:#}");
                    state.log(format!("Error searching for \"{query}\": {e}"));
                    let results = format!("Search unavailable for: {query}");
                    state.hits.push(SearchHit { query, results });
                }
            }
        }

        info!(count = state.hits.len(), "searches complete");
        state.log(format!("Completed {} searches", state.hits.len()));
    }

    // ── Step 3: extract lawyer profiles ──────────────────────────────────

    async fn extract_profiles(&self, state: &mut RunState) {
        let prompt = prompts::extraction_prompt(&state.hits);

        let profiles = match self.chat.chat(prompts::EXTRACT_SYSTEM, &prompt).await {
            Ok(reply) => match extract::parse_json_array::<LawyerProfile>(&reply) {
                Some(profiles) => profiles,
                None => {
                    warn!("extraction reply had no parseable profile array");
                    state.log("Could not find any lawyer profiles in the search results");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("profile extraction failed: {e:#}");
                state.log(format!("Error extracting lawyer profiles: {e}"));
                Vec::new()
            }
        };

        info!(count = profiles.len(), "profiles extracted");
        state.log(format!(
            "Extracted {} qualified lawyer profiles",
            profiles.len()
        ));
        state.profiles = profiles;
    }

    // ── Step 4: compatibility scores ─────────────────────────────────────

    async fn score_profiles(&self, state: &mut RunState) {
        if state.profiles.is_empty() {
            state.log("No lawyer profiles to score");
            return;
        }

        let prompt = prompts::score_prompt(&state.profile, &state.profiles);

        let scores = match self.chat.chat(prompts::SCORE_SYSTEM, &prompt).await {
            Ok(reply) => extract::parse_json_object::<HashMap<String, f64>>(&reply)
                .unwrap_or_else(|| {
                    warn!("score reply had no parseable JSON object, using arithmetic fallback");
                    fallback_scores(&state.profiles)
                }),
            Err(e) => {
                warn!("scoring call failed: {e:#}");
                state.log(format!("Error scoring lawyer profiles: {e}"));
                fallback_scores(&state.profiles)
            }
        };

        info!(count = scores.len(), "profiles scored");
        state.log(format!("Scored {} lawyer profiles", scores.len()));
        state.scores = scores;
    }

    // ── Step 5: recommendations + summary ────────────────────────────────

    async fn recommend(&self, state: &mut RunState) {
        let prompt = prompts::recommendation_prompt(&state.profile, &state.profiles, self.top_n);

        let mut recommendations = match self.chat.chat(prompts::RECOMMEND_SYSTEM, &prompt).await {
            Ok(reply) => extract::parse_json_array::<Recommendation>(&reply).unwrap_or_else(|| {
                warn!("recommendation reply had no parseable array, using defaults");
                default_recommendations(&state.profiles, self.top_n)
            }),
            Err(e) => {
                warn!("recommendation call failed: {e:#}");
                state.log(format!("Error generating recommendations: {e}"));
                default_recommendations(&state.profiles, self.top_n)
            }
        };

        recommendations.truncate(self.top_n);
        for (i, rec) in recommendations.iter_mut().enumerate() {
            rec.rank = (i + 1) as u32;
            if rec.score.is_none() {
                rec.score = state.scores.get(&rec.lawyer.name).copied();
            }
        }

        let summary = self.summarize(state, &recommendations).await;
        state.reasoning = summary;

        info!(count = recommendations.len(), "recommendations ready");
        state.log(format!(
            "Generated {} lawyer recommendations",
            recommendations.len()
        ));
        state.recommendations = recommendations;
    }

    async fn summarize(&self, state: &mut RunState, recommendations: &[Recommendation]) -> String {
        if recommendations.is_empty() {
            return "No suitable lawyers were identified for this profile.".to_string();
        }

        let names: Vec<String> = recommendations
            .iter()
            .map(|r| r.lawyer.name.clone())
            .collect();
        let prompt = prompts::reasoning_prompt(&state.profile, &names);

        match self.chat.chat(prompts::RECOMMEND_SYSTEM, &prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!("summary call failed: {e:#}");
                state.log(format!("Error summarizing recommendations: {e}"));
                format!(
                    "Selected {} based on the stated priorities: {}.",
                    names.join(" and "),
                    state.profile.priority_factors.join(", ")
                )
            }
        }
    }
}

// ── Fallbacks ────────────────────────────────────────────────────────────

/// Arithmetic stand-in for model scoring: 40 points base plus 20 per
/// contact channel on record, capped at 100.
fn fallback_scores(profiles: &[LawyerProfile]) -> HashMap<String, f64> {
    profiles
        .iter()
        .map(|p| {
            let score = (40 + 20 * p.contact_info.field_count()).min(100) as f64;
            (p.name.clone(), score)
        })
        .collect()
}

/// Recommendations built straight from the extracted profiles when the
/// model's reply is unusable.
fn default_recommendations(profiles: &[LawyerProfile], top_n: usize) -> Vec<Recommendation> {
    profiles
        .iter()
        .take(top_n)
        .map(|lawyer| Recommendation {
            rank: 0,
            lawyer: lawyer.clone(),
            score: None,
            reason: format!(
                "Found profile for {} specializing in EB-1A cases, with contact \
                 information available to start the process.",
                lawyer.name
            ),
            next_steps: vec![
                format!(
                    "Schedule an initial consultation via {}",
                    lawyer.contact_info.best_channel()
                ),
                "Prepare your CV and list of achievements for discussion".to_string(),
                "Inquire about their specific experience with cases like yours".to_string(),
            ],
        })
        .collect()
}
