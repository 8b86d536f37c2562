//! Prompt construction for the five pipeline steps.
//!
//! Wording tracks what the production prompts converged on; the shapes the
//! model is asked for are exactly the serde types in [`crate::types`].

use crate::types::{LawyerProfile, SearchHit, UserProfile};

// ── System prompts ───────────────────────────────────────────────────────

pub const QUERY_SYSTEM: &str =
    "You are an expert at generating search queries for finding specialized lawyers.";

pub const SEARCH_SYSTEM: &str =
    "You are a helpful assistant finding information about immigration lawyers.";

pub const EXTRACT_SYSTEM: &str =
    "You are an expert at extracting and structuring lawyer information from text.";

pub const SCORE_SYSTEM: &str =
    "You are an expert at assessing how well an immigration lawyer fits a client's needs.";

pub const RECOMMEND_SYSTEM: &str =
    "You are an expert immigration consultant providing personalized lawyer recommendations.";

// ── Step prompts ─────────────────────────────────────────────────────────

fn urgency_label(profile: &UserProfile) -> String {
    serde_json::to_value(profile.timeline_urgency)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "moderate".to_string())
}

pub fn query_prompt(profile: &UserProfile) -> String {
    let top_achievements = profile
        .achievements
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are an expert at crafting search queries for finding EB-1A immigration lawyers.\n\
         \n\
         User Profile:\n\
         - Occupation: {occupation}\n\
         - Industry: {industry}\n\
         - Nationality: {nationality}\n\
         - Location Preference: {location}\n\
         - Budget: ${min} - ${max}\n\
         - Timeline: {urgency}\n\
         - Key Achievements: {achievements}\n\
         \n\
         Generate 5 specific search queries that will find:\n\
         1. EB-1A lawyers with high success rates (90%+)\n\
         2. Lawyers experienced with {nationality} nationals\n\
         3. Lawyers specializing in {industry}\n\
         4. Location-specific lawyers if applicable\n\
         5. Lawyers within the budget range\n\
         \n\
         Format your response as a JSON array of search query strings.\n\
         Focus on finding lawyers with verifiable success rates and specific EB-1A experience.",
        occupation = profile.occupation,
        industry = profile.industry,
        nationality = profile.nationality,
        location = profile.location_preference.as_deref().unwrap_or("Any"),
        min = profile.budget_range.min,
        max = profile.budget_range.max,
        urgency = urgency_label(profile),
        achievements = top_achievements,
    )
}

/// The 5 literal queries used when the model's reply yields no parseable array.
pub fn fallback_queries(profile: &UserProfile) -> Vec<String> {
    let location = profile.location_preference.as_deref().unwrap_or("USA");
    vec![
        format!(
            "EB-1A immigration lawyers 90% success rate {}",
            profile.industry
        ),
        format!(
            "Top EB-1A attorneys {} extraordinary ability visa",
            profile.nationality
        ),
        format!("Best EB-1A lawyers high approval rate {location}"),
        format!(
            "Immigration lawyers EB-1A {} cases statistics",
            profile.occupation
        ),
        "EB-1A visa attorneys success rate data verified results".to_string(),
    ]
}

pub fn search_prompt(query: &str) -> String {
    format!(
        "Search for information about EB-1A immigration lawyers with the following query:\n\
         \"{query}\"\n\
         \n\
         Focus on finding:\n\
         - Lawyer names and firms\n\
         - Contact information\n\
         - Client testimonials\n\
         \n\
         Provide detailed, factual information with sources when available."
    )
}

pub fn extraction_prompt(hits: &[SearchHit]) -> String {
    let results = serde_json::to_string_pretty(hits).unwrap_or_default();
    format!(
        "You are an expert at extracting structured information about lawyers from search results.\n\
         \n\
         Search Results:\n\
         {results}\n\
         \n\
         Extract information about EB-1A immigration lawyers and create detailed profiles.\n\
         \n\
         For each lawyer found, extract:\n\
         - Full name\n\
         - Law firm\n\
         - Contact information (email, phone, website)\n\
         \n\
         IMPORTANT RULES:\n\
         1. Verify the lawyer specializes in EB-1A specifically, not just general immigration.\n\
         2. Only include lawyers where you can find contact information.\n\
         \n\
         Return the profiles as a JSON array. Each profile should match this structure:\n\
         {{\n\
             \"name\": \"string\",\n\
             \"firm\": \"string\",\n\
             \"contact_info\": {{\"email\": \"string\", \"phone\": \"string\", \"website\": \"string\"}}\n\
         }}"
    )
}

pub fn score_prompt(profile: &UserProfile, profiles: &[LawyerProfile]) -> String {
    let user = serde_json::to_string_pretty(profile).unwrap_or_default();
    let lawyers = serde_json::to_string_pretty(profiles).unwrap_or_default();
    format!(
        "Assess how well each lawyer below fits this client.\n\
         \n\
         User Profile:\n\
         {user}\n\
         \n\
         Lawyer Profiles:\n\
         {lawyers}\n\
         \n\
         Weigh the client's priority factors ({factors}) against what is known\n\
         about each lawyer.\n\
         \n\
         Respond with a single JSON object mapping each lawyer's full name to a\n\
         compatibility score between 0 and 100. No other text.",
        factors = profile.priority_factors.join(", "),
    )
}

pub fn recommendation_prompt(
    profile: &UserProfile,
    profiles: &[LawyerProfile],
    top_n: usize,
) -> String {
    let user = serde_json::to_string_pretty(profile).unwrap_or_default();
    let lawyers = serde_json::to_string_pretty(profiles).unwrap_or_default();
    format!(
        "You are an expert at making personalized lawyer recommendations for EB-1A visa applications.\n\
         \n\
         User Profile:\n\
         {user}\n\
         \n\
         Lawyer Profiles:\n\
         {lawyers}\n\
         \n\
         Based on the available information, recommend the TOP {top_n} lawyers for this user.\n\
         \n\
         Your response MUST be a single, valid JSON array. Each object in the array represents one\n\
         lawyer recommendation and MUST conform to the exact structure below. Do not add any\n\
         introductory text or explanations outside of the JSON structure.\n\
         \n\
         ```json\n\
         [\n\
           {{\n\
             \"lawyer\": {{\n\
               \"name\": \"Lawyer's Full Name\",\n\
               \"firm\": \"Name of the Law Firm\",\n\
               \"contact_info\": {{\n\
                 \"email\": \"lawyer@example.com\",\n\
                 \"phone\": \"123-456-7890\",\n\
                 \"website\": \"www.lawfirm.com\"\n\
               }}\n\
             }},\n\
             \"reason\": \"A brief statement on why they are a good starting point for the user.\",\n\
             \"next_steps\": [\"Specific, actionable next steps the user should take.\"]\n\
           }}\n\
         ]\n\
         ```"
    )
}

pub fn reasoning_prompt(profile: &UserProfile, selected: &[String]) -> String {
    format!(
        "Summarize why these lawyers were selected for the user in 2-3 sentences.\n\
         User priorities: {priorities}\n\
         Selected lawyers: {selected}",
        priorities = profile.priority_factors.join(", "),
        selected = selected.join(", "),
    )
}
