use std::collections::HashMap;

use anyhow::Result;

/// Full application configuration.
/// Sensitive fields (API keys) come from env/.env only; everything else
/// has a working default.
#[derive(Debug, Clone)]
pub struct Config {
    // LLM endpoints
    pub search_api_key: String,
    pub search_base_url: String,
    pub search_model: String,
    pub chat_api_key: String,
    pub chat_base_url: String,
    pub chat_model: String,
    pub llm_timeout_s: u64,

    // Recommendation pipeline
    pub max_queries: usize,
    pub top_recommendations: usize,

    // Web server
    pub web_bind: String,
    pub web_port: u16,

    // Directory scraper
    pub directory_base_url: String,
    pub directory_query: String,
    pub directory_location: String,
    pub directory_practice_slug: String,
    pub directory_location_slug: String,
    pub scrape_pages: u32,
    pub scrape_max_matches: usize,
    pub listings_csv: String,
    pub expertise_csv: String,
}

fn parse_dotenv() -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return map;
    };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}

fn get(key: &str, dotenv: &HashMap<String, String>) -> Option<String> {
    std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
}

fn get_str(key: &str, dotenv: &HashMap<String, String>, default: &str) -> String {
    get(key, dotenv).unwrap_or_else(|| default.to_string())
}

fn get_u16(key: &str, dotenv: &HashMap<String, String>, default: u16) -> u16 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_u32(key: &str, dotenv: &HashMap<String, String>, default: u32) -> u32 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_u64(key: &str, dotenv: &HashMap<String, String>, default: u64) -> u64 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_usize(key: &str, dotenv: &HashMap<String, String>, default: usize) -> usize {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dotenv = parse_dotenv();

        Ok(Config {
            search_api_key: get_str("PERPLEXITY_API_KEY", &dotenv, ""),
            search_base_url: get_str("SEARCH_BASE_URL", &dotenv, "https://api.perplexity.ai"),
            search_model: get_str("SEARCH_MODEL", &dotenv, "sonar"),
            chat_api_key: get_str("OPENROUTER_API_KEY", &dotenv, ""),
            chat_base_url: get_str("CHAT_BASE_URL", &dotenv, "https://openrouter.ai/api/v1"),
            chat_model: get_str(
                "CHAT_MODEL",
                &dotenv,
                "mistralai/mistral-small-3.2-24b-instruct:free",
            ),
            llm_timeout_s: get_u64("LLM_TIMEOUT_S", &dotenv, 120),
            max_queries: get_usize("MAX_SEARCH_QUERIES", &dotenv, 5),
            top_recommendations: get_usize("TOP_RECOMMENDATIONS", &dotenv, 2),
            web_bind: get_str("WEB_BIND", &dotenv, "127.0.0.1"),
            web_port: get_u16("WEB_PORT", &dotenv, 8000),
            directory_base_url: get_str("DIRECTORY_BASE_URL", &dotenv, "https://www.avvo.com"),
            directory_query: get_str("DIRECTORY_QUERY", &dotenv, "Immigration"),
            directory_location: get_str("DIRECTORY_LOCATION", &dotenv, "New York, NY"),
            directory_practice_slug: get_str(
                "DIRECTORY_PRACTICE_SLUG",
                &dotenv,
                "immigration-lawyer",
            ),
            directory_location_slug: get_str("DIRECTORY_LOCATION_SLUG", &dotenv, "ny/new_york"),
            scrape_pages: get_u32("SCRAPE_PAGES", &dotenv, 5),
            scrape_max_matches: get_usize("SCRAPE_MAX_MATCHES", &dotenv, 20),
            listings_csv: get_str("LISTINGS_CSV", &dotenv, "lawyers.csv"),
            expertise_csv: get_str("EXPERTISE_CSV", &dotenv, "eb1_lawyers.csv"),
        })
    }
}
