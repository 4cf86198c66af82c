use txpool_types::{Address, H256, U256};

/// Information extracted from a serialized transaction, enough to manage it
/// inside the pool without keeping the payload around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TxSlot {
    /// Keccak-256 of the canonical transaction bytes, used as the
    /// transaction id.
    pub id_hash: H256,
    /// Sender address recovered from the signature. The parser leaves it
    /// zeroed; signature recovery fills it in.
    pub sender: Address,
    /// Nonce of the transaction.
    pub nonce: u64,
    /// Maximum tip the transaction gives to the block proposer. For legacy
    /// transactions this is the gas price.
    pub tip: u64,
    /// Maximum fee the transaction burns and gives to the block proposer.
    /// Equal to `tip` for anything older than dynamic-fee transactions.
    pub fee_cap: u64,
    /// Gas limit of the transaction.
    pub gas: u64,
    /// Value transferred by the transaction.
    pub value: U256,
    /// Set when the `to` field is empty, i.e. the transaction creates a
    /// contract.
    pub creation: bool,
    /// Length of the transaction's data, for intrinsic gas calculation. The
    /// data itself is not retained.
    pub data_len: usize,
    /// Number of addresses in the access list.
    pub al_addr_count: usize,
    /// Total number of storage keys in the access list.
    pub al_stor_count: usize,
}
