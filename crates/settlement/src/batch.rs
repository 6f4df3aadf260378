use serde::{Deserialize, Serialize};

use shareledger_common::{
    digest::Digest,
    payout::{EpochParams, PayoutOutput, payout_amount},
    record::{ShareKey, ShareRecord},
};
use shareledger_errors::{LedgerError, ProofError, TransitionError};
use shareledger_tree::BatchUpdateProof;

/// A candidate payout transition as submitted to the settlement layer: the
/// digest chain it claims, the record updates it performs, the proof
/// authenticating them, and the payouts it wants authorized.
///
/// The validator consuming this is deliberately stateless. Everything it
/// trusts comes from `prev_digest` (which the settlement layer has
/// committed) and the proof; every claimed value is checked against those
/// two, never the other way around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementBatch {
    /// The digest the settlement layer currently commits to.
    pub prev_digest: Digest,
    /// The digest this transition claims to advance to.
    pub next_digest: Digest,
    /// Claimed record updates, one per settled miner, in batch order.
    pub updates: Vec<(ShareKey, ShareRecord)>,
    /// Claimed payouts, positionally corresponding to `updates`.
    pub outputs: Vec<PayoutOutput>,
    /// Proof binding the updates to `prev_digest` and `next_digest`.
    pub proof: BatchUpdateProof,
    /// Reward pool value before this transition.
    pub reward_before: u64,
    /// Reward pool value the transition leaves behind.
    pub reward_after: u64,
    /// Epoch scaling constants, fixed when the epoch's directory was
    /// created.
    pub params: EpochParams,
}

impl SettlementBatch {
    /// Runs every settlement check. All checks are mandatory; the first
    /// failure voids the whole batch with no partial acceptance, so a
    /// rejected submission leaves nothing to roll back and resubmitting a
    /// corrected batch is always safe.
    ///
    /// On success returns the digest the settlement layer must commit to
    /// next; externally, the payouts are then authorized exactly as
    /// enumerated in `outputs`.
    ///
    /// Pure function of the batch: no state between calls, safe to run from
    /// any number of verifiers concurrently.
    pub fn verify(&self) -> Result<Digest, LedgerError> {
        self.params.validate()?;

        if self.updates.len() != self.outputs.len() {
            return Err(TransitionError::LengthMismatch {
                updates: self.updates.len(),
                outputs: self.outputs.len(),
            }
            .into());
        }

        // each output must pay the key it claims to settle
        for (index, ((key, _), output)) in
            self.updates.iter().zip(self.outputs.iter()).enumerate()
        {
            if output.recipient_key() != *key {
                return Err(TransitionError::OutputKeyMismatch { index }.into());
            }
        }

        // the proof is the only trusted source of old records; it also pins
        // the claimed updates to the proven transition, position by position
        let claimed: Vec<(ShareKey, Option<ShareRecord>)> =
            self.updates.iter().map(|(key, record)| (*key, Some(*record))).collect();
        let (next_digest, old_records) = self.proof.verify_from(self.prev_digest, &claimed)?;

        if next_digest != self.next_digest {
            return Err(ProofError::DigestMismatch {
                computed: next_digest.to_string(),
                claimed: self.next_digest.to_string(),
            }
            .into());
        }

        let mut paid_total: u128 = 0;
        for (index, (((key, new_record), output), old_record)) in self
            .updates
            .iter()
            .zip(self.outputs.iter())
            .zip(old_records)
            .enumerate()
        {
            let Some(old_record) = old_record else {
                return Err(TransitionError::MissingRecord(key.to_string()).into());
            };
            if old_record.paid {
                return Err(TransitionError::AlreadyPaid(key.to_string()).into());
            }
            if !new_record.paid {
                return Err(TransitionError::NotMarkedPaid(key.to_string()).into());
            }
            if new_record.score != old_record.score {
                return Err(TransitionError::ScoreChanged {
                    key: key.to_string(),
                    old: old_record.score,
                    new: new_record.score,
                }
                .into());
            }

            let expected =
                payout_amount(old_record.score, self.reward_before, self.params.max_score)?;
            if output.amount != expected {
                return Err(TransitionError::PayoutMismatch {
                    index,
                    expected,
                    claimed: output.amount,
                }
                .into());
            }
            paid_total += u128::from(output.amount);
        }

        // the pool must shrink by exactly the sum of the validated payouts
        let reward_delta = i128::from(self.reward_before) - i128::from(self.reward_after);
        if reward_delta != paid_total as i128 {
            return Err(TransitionError::ConservationViolation {
                expected: paid_total,
                claimed: reward_delta,
            }
            .into());
        }

        Ok(next_digest)
    }
}
