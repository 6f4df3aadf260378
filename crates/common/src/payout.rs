use serde::{Deserialize, Serialize};

use shareledger_errors::TransitionError;

use crate::record::{ShareKey, SpendingCondition};

/// A claimed payout: who gets paid (by spending condition, not by key) and
/// how much. The amount is never trusted as supplied; the validator
/// recomputes it from the authenticated score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutOutput {
    pub condition: SpendingCondition,
    pub amount: u64,
}

impl PayoutOutput {
    pub fn new(condition: SpendingCondition, amount: u64) -> Self {
        Self { condition, amount }
    }

    /// The directory key this output claims to settle.
    pub fn recipient_key(&self) -> ShareKey {
        self.condition.share_key()
    }
}

/// Scaling constants fixed when an epoch's directory is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpochParams {
    /// Denominator of the proportional payout rule. Must be non-zero.
    pub max_score: u64,
}

impl EpochParams {
    pub const fn new(max_score: u64) -> Self {
        Self { max_score }
    }

    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.max_score == 0 {
            return Err(TransitionError::InvalidMaxScore);
        }
        Ok(())
    }
}

/// The payable amount backing one epoch. Strictly decreasing, and only ever
/// by the exact sum of payouts accepted in a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardPool {
    value: u64,
}

impl RewardPool {
    pub const fn new(value: u64) -> Self {
        Self { value }
    }

    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Releases `amount` from the pool. Fails without mutating if the pool
    /// does not hold that much.
    pub fn drain(&mut self, amount: u64) -> Result<(), TransitionError> {
        self.value = self.value.checked_sub(amount).ok_or(TransitionError::PoolExhausted {
            requested: amount,
            available: self.value,
        })?;
        Ok(())
    }
}

/// The proportional payout rule: `floor(score * reward_total / max_score)`.
/// Computed in 128-bit arithmetic; floor division, never rounded up.
pub fn payout_amount(
    score: u64,
    reward_total: u64,
    max_score: u64,
) -> Result<u64, TransitionError> {
    if max_score == 0 {
        return Err(TransitionError::InvalidMaxScore);
    }
    let amount = (score as u128 * reward_total as u128) / max_score as u128;
    u64::try_from(amount).map_err(|_| TransitionError::PayoutOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_is_proportional_floor() {
        assert_eq!(payout_amount(1000, 500, 10000).unwrap(), 50);
        assert_eq!(payout_amount(3, 10, 7).unwrap(), 4);
        assert_eq!(payout_amount(0, 500, 10000).unwrap(), 0);
        // full share takes the whole pool
        assert_eq!(payout_amount(10000, 500, 10000).unwrap(), 500);
    }

    #[test]
    fn payout_never_rounds_up() {
        // 1 * 999 / 1000 = 0.999 -> 0
        assert_eq!(payout_amount(1, 999, 1000).unwrap(), 0);
    }

    #[test]
    fn payout_rejects_zero_max_score() {
        assert_eq!(
            payout_amount(1, 1, 0),
            Err(TransitionError::InvalidMaxScore)
        );
    }

    #[test]
    fn payout_survives_wide_intermediates() {
        // score * reward overflows u64 but not u128
        assert_eq!(
            payout_amount(u64::MAX, u64::MAX, u64::MAX).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn payout_detects_unrepresentable_amounts() {
        assert_eq!(
            payout_amount(u64::MAX, u64::MAX, 1),
            Err(TransitionError::PayoutOverflow)
        );
    }

    #[test]
    fn pool_drains_exactly_or_not_at_all() {
        let mut pool = RewardPool::new(500);
        pool.drain(54).unwrap();
        assert_eq!(pool.value(), 446);

        let err = pool.drain(1000).unwrap_err();
        assert_eq!(
            err,
            TransitionError::PoolExhausted {
                requested: 1000,
                available: 446
            }
        );
        // failed drain left the pool untouched
        assert_eq!(pool.value(), 446);
    }
}
