use std::sync::Arc;

use shareledger_common::{
    payout::{EpochParams, RewardPool, payout_amount},
    record::{ShareKey, ShareRecord},
    test_utils::MinerSetBuilder,
};
use shareledger_errors::{LedgerError, ProofError, TransitionError};
use shareledger_storage::InMemoryDatabase;
use shareledger_tree::ShareDirectoryTree;

use crate::SettlementBatch;

/// Seeds a directory with the builder's miners and settles the given subset
/// in one batch, returning the well-formed claim a submitter would send.
fn settle(
    builder: &MinerSetBuilder,
    indices: &[usize],
    reward_before: u64,
    max_score: u64,
) -> SettlementBatch {
    let mut tree = ShareDirectoryTree::new(Arc::new(InMemoryDatabase::new()));
    tree.apply_batch(builder.insert_updates()).unwrap();
    settle_on(&mut tree, builder, indices, reward_before, max_score)
}

/// Settles against an existing directory, so tests can run several
/// transitions back to back.
fn settle_on(
    tree: &mut ShareDirectoryTree<InMemoryDatabase>,
    builder: &MinerSetBuilder,
    indices: &[usize],
    reward_before: u64,
    max_score: u64,
) -> SettlementBatch {
    let prev_digest = tree.commitment().unwrap();

    let (updates, outputs) = builder.payout_claim(indices, reward_before, max_score);
    let claimed: Vec<(ShareKey, Option<ShareRecord>)> =
        updates.iter().map(|(key, record)| (*key, Some(*record))).collect();
    let proof = tree.apply_batch(claimed).unwrap();
    let next_digest = tree.commitment().unwrap();

    let paid_sum: u64 = outputs.iter().map(|output| output.amount).sum();
    SettlementBatch {
        prev_digest,
        next_digest,
        updates,
        outputs,
        proof,
        reward_before,
        reward_after: reward_before - paid_sum,
        params: EpochParams::new(max_score),
    }
}

#[test]
fn accepts_valid_batch_and_returns_next_digest() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);
    builder.add_miner(250);
    builder.add_miner(3);

    let batch = settle(&builder, &[0, 1, 2], 500, 10000);
    let next = batch.verify().unwrap();
    assert_eq!(next, batch.next_digest);

    // pure function: a second run over the same batch agrees
    assert_eq!(batch.verify().unwrap(), next);
}

#[test]
fn pool_shrinks_by_exactly_the_payout_sum() {
    // amounts come out as {50, 4, 0} for these scores
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);
    builder.add_miner(90);
    builder.add_miner(10);

    let batch = settle(&builder, &[0, 1, 2], 500, 10000);
    assert_eq!(batch.outputs[0].amount, 50);
    assert_eq!(batch.outputs[1].amount, 4);
    assert_eq!(batch.outputs[2].amount, 0);
    assert_eq!(batch.reward_after, 446);

    batch.verify().unwrap();
}

#[test]
fn consistently_reordered_batch_still_validates() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);
    builder.add_miner(250);
    builder.add_miner(3);

    // same miners, settled in a different submission order
    let batch = settle(&builder, &[2, 0, 1], 500, 10000);
    batch.verify().unwrap();
}

#[test]
fn rejects_already_paid_record_regardless_of_proof_validity() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut tree = ShareDirectoryTree::new(Arc::new(InMemoryDatabase::new()));
    tree.apply_batch(builder.insert_updates()).unwrap();
    let mut pool = RewardPool::new(500);

    let first = settle_on(&mut tree, &builder, &[0], pool.value(), 10000);
    first.verify().unwrap();
    pool.drain(pool.value() - first.reward_after).unwrap();
    assert_eq!(pool.value(), first.reward_after);

    // the directory now holds paid=1; a second settlement of the same miner
    // carries a perfectly valid proof and must still be rejected
    let second = settle_on(&mut tree, &builder, &[0], pool.value(), 10000);
    let err = second.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::AlreadyPaid(_))
    ));
}

#[test]
fn rejects_record_left_unpaid() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut tree = ShareDirectoryTree::new(Arc::new(InMemoryDatabase::new()));
    tree.apply_batch(builder.insert_updates()).unwrap();
    let prev_digest = tree.commitment().unwrap();

    // updates that never flip the paid flag
    let (mut updates, outputs) = builder.payout_claim(&[0], 500, 10000);
    updates[0].1 = builder.miner(0).record;
    let claimed: Vec<(ShareKey, Option<ShareRecord>)> =
        updates.iter().map(|(key, record)| (*key, Some(*record))).collect();
    let proof = tree.apply_batch(claimed).unwrap();
    let next_digest = tree.commitment().unwrap();

    let batch = SettlementBatch {
        prev_digest,
        next_digest,
        updates,
        outputs,
        proof,
        reward_before: 500,
        reward_after: 450,
        params: EpochParams::new(10000),
    };
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::NotMarkedPaid(_))
    ));
}

#[test]
fn rejects_score_mutation() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut tree = ShareDirectoryTree::new(Arc::new(InMemoryDatabase::new()));
    tree.apply_batch(builder.insert_updates()).unwrap();
    let prev_digest = tree.commitment().unwrap();

    // paid flag flips, but the score is quietly inflated
    let (mut updates, outputs) = builder.payout_claim(&[0], 500, 10000);
    updates[0].1 = ShareRecord::posted(2000).mark_paid();
    let claimed: Vec<(ShareKey, Option<ShareRecord>)> =
        updates.iter().map(|(key, record)| (*key, Some(*record))).collect();
    let proof = tree.apply_batch(claimed).unwrap();
    let next_digest = tree.commitment().unwrap();

    let batch = SettlementBatch {
        prev_digest,
        next_digest,
        updates,
        outputs,
        proof,
        reward_before: 500,
        reward_after: 450,
        params: EpochParams::new(10000),
    };
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::ScoreChanged { .. })
    ));
}

#[test]
fn rejects_overstated_payout() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);
    builder.add_miner(250);

    let mut batch = settle(&builder, &[0, 1], 500, 10000);
    batch.outputs[1].amount += 1;
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::PayoutMismatch { index: 1, .. })
    ));
}

#[test]
fn rejects_reward_delta_mismatch() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut batch = settle(&builder, &[0], 500, 10000);
    // pool drained by more than the validated payouts
    batch.reward_after -= 1;
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::ConservationViolation { .. })
    ));

    // pool growing is just as invalid
    let mut batch = settle(&builder, &[0], 500, 10000);
    batch.reward_after = batch.reward_before + 1;
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::ConservationViolation { .. })
    ));
}

#[test]
fn rejects_replayed_proof() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut batch = settle(&builder, &[0], 500, 10000);
    // resubmission after the settlement layer already advanced
    batch.prev_digest = batch.next_digest;
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Proof(ProofError::ReplayedProof { .. })
    ));
}

#[test]
fn rejects_broken_digest_chain() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut batch = settle(&builder, &[0], 500, 10000);
    batch.next_digest = batch.prev_digest;
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Proof(ProofError::DigestMismatch { .. })
    ));
}

#[test]
fn rejects_output_paying_the_wrong_party() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);
    builder.add_miner(250);

    let mut batch = settle(&builder, &[0, 1], 500, 10000);
    batch.outputs.swap(0, 1);
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::OutputKeyMismatch { index: 0 })
    ));
}

#[test]
fn rejects_mismatched_lengths() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);
    builder.add_miner(250);

    let mut batch = settle(&builder, &[0, 1], 500, 10000);
    batch.outputs.pop();
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::LengthMismatch { .. })
    ));
}

#[test]
fn rejects_zero_max_score() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut batch = settle(&builder, &[0], 500, 10000);
    batch.params = EpochParams::new(0);
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::InvalidMaxScore)
    ));
}

#[test]
fn rejects_settlement_of_unknown_miner() {
    let mut builder = MinerSetBuilder::new();
    builder.add_miner(1000);

    let mut tree = ShareDirectoryTree::new(Arc::new(InMemoryDatabase::new()));
    tree.apply_batch(builder.insert_updates()).unwrap();

    // this miner's record was never posted to the directory
    builder.add_miner(250);
    let batch = settle_on(&mut tree, &builder, &[1], 500, 10000);
    let err = batch.verify().unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Transition(TransitionError::MissingRecord(_))
    ));
}

#[test]
fn settles_large_subset_with_single_aggregate_proof() {
    let mut builder = MinerSetBuilder::new();
    for i in 0..2239u64 {
        builder.add_miner(i + 1);
    }

    let reward_before = 1_000_000;
    let max_score = 10_000_000;
    let indices: Vec<usize> = (0..300).collect();
    let batch = settle(&builder, &indices, reward_before, max_score);

    assert_eq!(batch.outputs.len(), 300);
    assert_eq!(batch.proof.len(), 300);
    for (i, output) in batch.outputs.iter().enumerate() {
        let score = builder.miner(i).record.score;
        assert_eq!(
            output.amount,
            payout_amount(score, reward_before, max_score).unwrap()
        );
    }

    let next = batch.verify().unwrap();
    assert_eq!(next, batch.next_digest);
}
