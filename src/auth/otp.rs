use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

pub const OTP_TTL_MINUTES: i64 = 10;
const CODE_MIN: u32 = 10_000;
const CODE_MAX: u32 = 99_999;

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: DateTime<Utc>,
}

impl OtpEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// A phone number whose OTP is always the same code.
#[derive(Debug, Clone)]
pub struct FixedOtp {
    pub phone: String,
    pub code: String,
}

/// Active one-time passcodes keyed by canonical phone number.
///
/// Holds at most one entry per phone. Expired entries are not swept; they are
/// dropped or replaced the next time the same phone is touched, so each phone
/// costs at most one stale entry.
pub struct OtpRegistry {
    entries: DashMap<String, OtpEntry>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fixed: Option<FixedOtp>,
}

impl OtpRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            ttl: Duration::minutes(OTP_TTL_MINUTES),
            fixed: None,
        }
    }

    /// Pins the code for one phone number. Only wired up outside production.
    pub fn with_fixed_otp(mut self, fixed: FixedOtp) -> Self {
        self.fixed = Some(fixed);
        self
    }

    /// Returns the active code for `phone`, creating one if there is none.
    pub fn generate(&self, phone: &str) -> String {
        let now = self.clock.now();

        // the shard lock is held for the whole check-and-replace
        match self.entries.entry(phone.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(now) {
                    return occupied.get().code.clone();
                }
                let entry = self.new_entry(phone, now);
                let code = entry.code.clone();
                occupied.insert(entry);
                code
            }
            Entry::Vacant(vacant) => {
                let entry = self.new_entry(phone, now);
                let code = entry.code.clone();
                vacant.insert(entry);
                code
            }
        }
    }

    /// The active code for `phone`, or `None` when absent or expired.
    pub fn lookup(&self, phone: &str) -> Option<String> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(phone) {
            if !entry.is_expired(now) {
                return Some(entry.code.clone());
            }
        }
        self.evict_expired(phone, now);
        None
    }

    /// Exact comparison against the active code. Does not consume the entry.
    pub fn verify(&self, phone: &str, code: &str) -> bool {
        self.lookup(phone).map_or(false, |active| active == code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&self, phone: &str, now: DateTime<Utc>) {
        if self
            .entries
            .remove_if(phone, |_, entry| entry.is_expired(now))
            .is_some()
        {
            debug!("Dropped expired otp entry");
        }
    }

    fn new_entry(&self, phone: &str, now: DateTime<Utc>) -> OtpEntry {
        let code = match &self.fixed {
            Some(fixed) if fixed.phone == phone => fixed.code.clone(),
            _ => rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX).to_string(),
        };
        OtpEntry {
            code,
            expires_at: now + self.ttl,
        }
    }
}
