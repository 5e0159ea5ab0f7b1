//! Client fingerprint selection from a fixed user-agent pool.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::driver::{Fingerprint, Viewport};

pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.6; rv:131.0) Gecko/20100101 Firefox/131.0",
];

pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

/// Picks a user agent from `pool` (the default pool when empty) with the fixed desktop viewport.
pub fn choose_fingerprint<R: Rng + ?Sized>(rng: &mut R, pool: &[String]) -> Fingerprint {
    let user_agent = if pool.is_empty() {
        DEFAULT_USER_AGENTS
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_default()
    } else {
        pool.choose(rng).cloned().unwrap_or_default()
    };
    Fingerprint {
        user_agent,
        viewport: DEFAULT_VIEWPORT,
    }
}
