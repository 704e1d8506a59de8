//! Short-lived one-time login codes, held in memory with a TTL.

use moka::future::Cache;
use password_hash::rand_core::{OsRng, RngCore};
use std::time::Duration;

pub const OTP_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct OtpStore {
    inner: Cache<String, String>,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Generate a fresh code for `email`, replacing any pending one.
    pub async fn issue(&self, email: &str) -> String {
        let code = generate_code();
        self.inner.insert(email.to_string(), code.clone()).await;
        code
    }

    /// A matching code is consumed; a mismatch leaves it in place.
    pub async fn verify(&self, email: &str, code: &str) -> bool {
        match self.inner.get(email).await {
            Some(stored) if stored == code => {
                self.inner.invalidate(email).await;
                true
            }
            _ => false,
        }
    }
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new(OTP_TTL)
    }
}

fn generate_code() -> String {
    let n = 100_000 + OsRng.next_u32() % 900_000;
    n.to_string()
}
