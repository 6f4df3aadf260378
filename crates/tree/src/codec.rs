//! Flat byte transport for proofs.
//!
//! Proofs travel through carriers with hard size limits (data availability
//! blobs, ledger extension registers), so besides plain encode/decode the
//! codec splits an encoding into bounded chunks. Reassembly is plain
//! concatenation in submission order; nothing is framed per chunk.

use shareledger_errors::{LedgerError, ProofError};
use shareledger_serde::binary::{FromBinary, ToBinary};

/// Carrier budget observed in practice; real proofs for a few hundred keys
/// span several carriers of this size.
pub const DEFAULT_CARRIER_BYTES: usize = 4096;

pub fn encode<P: ToBinary>(proof: &P) -> Result<Vec<u8>, LedgerError> {
    proof
        .encode_to_bytes()
        .map_err(|e| ProofError::EncodingError(e.to_string()).into())
}

pub fn decode<P: FromBinary>(bytes: &[u8]) -> Result<P, LedgerError> {
    P::decode_from_bytes(bytes).map_err(|e| ProofError::DecodingError(e.to_string()).into())
}

/// Encodes a proof and splits it into carriers of at most `carrier_bytes`
/// each. Every chunk except the last is exactly `carrier_bytes` long.
pub fn encode_chunked<P: ToBinary>(
    proof: &P,
    carrier_bytes: usize,
) -> Result<Vec<Vec<u8>>, LedgerError> {
    if carrier_bytes == 0 {
        return Err(ProofError::EncodingError("carrier size must be non-zero".to_string()).into());
    }
    let bytes = encode(proof)?;
    Ok(bytes.chunks(carrier_bytes).map(<[u8]>::to_vec).collect())
}

/// Reassembles carriers produced by [`encode_chunked`] and decodes the
/// result. Chunks must be passed in submission order.
pub fn decode_chunks<P: FromBinary>(chunks: &[Vec<u8>]) -> Result<P, LedgerError> {
    decode(&chunks.concat())
}
