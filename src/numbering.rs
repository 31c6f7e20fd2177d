use std::sync::atomic::{AtomicU64, Ordering};

use crate::{account::AccountNumber, config::TellerConfig};

/// Source of fresh account numbers.
///
/// Implementations must never hand out the same number twice within a
/// process, and return `None` once they have nothing left to issue. Uniqueness against numbers already persisted is checked by the
/// account store on insert, so a generator may be restarted safely.
pub trait AccountNumberGenerator: Send + Sync {
    fn next_number(&self) -> Option<AccountNumber>;
}

/// Monotonic counter rendered as `<prefix><zero padded sequence>`.
#[derive(Debug)]
pub struct SequenceNumberGenerator {
    prefix: String,
    width: usize,
    last: AtomicU64,
}

impl SequenceNumberGenerator {
    /// The first number issued is `start + 1`.
    pub fn new(prefix: impl Into<String>, start: u64, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
            last: AtomicU64::new(start),
        }
    }

    pub fn from_config(config: &TellerConfig) -> Self {
        Self::new(
            config.account_number_prefix.clone(),
            config.account_number_start,
            config.account_number_width,
        )
    }
}

impl AccountNumberGenerator for SequenceNumberGenerator {
    fn next_number(&self) -> Option<AccountNumber> {
        let sequence = self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| last.checked_add(1))
            .ok()?
            + 1;
        Some(AccountNumber::new(format!(
            "{}{:0width$}",
            self.prefix,
            sequence,
            width = self.width
        )))
    }
}
