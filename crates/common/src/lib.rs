pub mod digest;
pub mod payout;
pub mod record;

#[cfg(feature = "test_utils")]
pub mod test_utils;
