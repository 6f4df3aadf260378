use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::{
    payout::{PayoutOutput, payout_amount},
    record::{ShareKey, ShareRecord, SpendingCondition},
};

/// One simulated miner: the spending condition the pool would pay to, and
/// the record the directory is expected to hold.
#[derive(Debug, Clone)]
pub struct TestMiner {
    pub condition: SpendingCondition,
    pub record: ShareRecord,
}

impl TestMiner {
    pub fn key(&self) -> ShareKey {
        self.condition.share_key()
    }
}

/// Simulates the off-chain share collector: generates miners with random
/// spending conditions and tracks the record set a directory built from them
/// should contain. Deterministic for a given seed so failures reproduce.
pub struct MinerSetBuilder {
    rng: StdRng,
    miners: Vec<TestMiner>,
}

impl MinerSetBuilder {
    pub fn new() -> Self {
        Self::with_seed(7)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            miners: Vec::new(),
        }
    }

    /// Adds a miner with a fresh random spending condition and the given
    /// accumulated score. Returns the miner's directory key.
    pub fn add_miner(&mut self, score: u64) -> ShareKey {
        // 33 bytes, the width of a compressed public key encoding
        let mut condition = [0u8; 33];
        self.rng.fill_bytes(&mut condition);
        let condition = SpendingCondition::new(condition.to_vec());
        let key = condition.share_key();
        self.miners.push(TestMiner {
            condition,
            record: ShareRecord::posted(score),
        });
        key
    }

    pub fn miners(&self) -> &[TestMiner] {
        &self.miners
    }

    pub fn miner(&self, index: usize) -> &TestMiner {
        &self.miners[index]
    }

    /// The batch that seeds a directory with every miner's posted record.
    pub fn insert_updates(&self) -> Vec<(ShareKey, Option<ShareRecord>)> {
        self.miners.iter().map(|m| (m.key(), Some(m.record))).collect()
    }

    /// Builds a well-formed payout claim for the given miners: updates that
    /// flip each paid flag, and outputs carrying the exact proportional
    /// amounts. Tests tamper with the result to produce invalid claims.
    pub fn payout_claim(
        &self,
        indices: &[usize],
        reward_total: u64,
        max_score: u64,
    ) -> (Vec<(ShareKey, ShareRecord)>, Vec<PayoutOutput>) {
        let mut updates = Vec::with_capacity(indices.len());
        let mut outputs = Vec::with_capacity(indices.len());
        for &i in indices {
            let miner = &self.miners[i];
            let amount = payout_amount(miner.record.score, reward_total, max_score)
                .expect("test claim amounts must be representable");
            updates.push((miner.key(), miner.record.mark_paid()));
            outputs.push(PayoutOutput::new(miner.condition.clone(), amount));
        }
        (updates, outputs)
    }
}

impl Default for MinerSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
