use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::info;

/// Randomized pause between result-page fetches.
pub fn page_delay() {
    let mut rng = rand::thread_rng();
    let delay_secs = rng.gen_range(2..=6);
    info!("waiting {delay_secs}s before next page");
    thread::sleep(Duration::from_secs(delay_secs));
}

/// Fixed pause between profile checks.
pub fn profile_delay() {
    thread::sleep(Duration::from_secs(1));
}
