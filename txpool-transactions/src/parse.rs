use sha3::{Digest, Keccak256};
use txpool_types::{H256, U256};

use crate::rlp::{self, Error as RlpError};
use crate::{ParseError, TxSlot, TxType};

/// Reusable scratch state for [`parse_transaction`](Self::parse_transaction).
///
/// Holds the two Keccak accumulators and the fixed-size buffers the parser
/// needs, so that parsing allocates nothing beyond the returned [`TxSlot`].
/// A context is single-writer: share nothing, allocate one per worker. All
/// scratch state is overwritten on every call, so a context can be reused
/// indefinitely, including after a failed parse.
pub struct TxParseContext {
    keccak1: Keccak256,
    keccak2: Keccak256,
    v: U256,
    r: U256,
    s: U256,
    buf: [u8; 33],
    sighash: H256,
    sig: [u8; 65],
}

impl TxParseContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keccak1: Keccak256::new(),
            keccak2: Keccak256::new(),
            v: U256::zero(),
            r: U256::zero(),
            s: U256::zero(),
            buf: [0u8; 33],
            sighash: H256::zero(),
            sig: [0u8; 65],
        }
    }

    /// Keccak-256 of the signing pre-image of the last parsed transaction.
    /// Overwritten by the next parse call.
    #[must_use]
    pub fn sig_hash(&self) -> &H256 {
        &self.sighash
    }

    /// Signature of the last parsed transaction, packed as
    /// `r[32] ‖ s[32] ‖ parity[1]` in big-endian layout for sender
    /// recovery. Overwritten by the next parse call; copy it out first.
    #[must_use]
    pub fn sig(&self) -> &[u8; 65] {
        &self.sig
    }

    /// Extract from `payload` everything necessary to build a [`TxSlot`],
    /// performing syntactic validation along the way.
    ///
    /// `payload` must hold exactly one serialized transaction starting at
    /// `pos`: a bare RLP list for legacy transactions, or an RLP string
    /// wrapping an EIP-2718 typed envelope. On success the returned cursor
    /// equals `payload.len()`. The signing hash and the signature are left
    /// in the context; the transaction hash is written into the slot.
    pub fn parse_transaction(
        &mut self,
        payload: &[u8],
        pos: usize,
    ) -> Result<(TxSlot, usize), ParseError> {
        if payload.is_empty() {
            return Err(ParseError::Empty);
        }
        self.keccak1.reset();
        self.keccak2.reset();
        let mut slot = TxSlot::default();
        let payload_len = payload.len();

        // Legacy transactions have a list prefix, whereas EIP-2718
        // transactions are wrapped in a string.
        let (data_pos, data_len, legacy) =
            rlp::prefix(payload, pos).map_err(ParseError::at("size prefix"))?;
        let end = data_pos
            .checked_add(data_len)
            .ok_or(ParseError::Malformed {
                field: "size prefix",
                error: RlpError::UnexpectedEof,
            })?;
        if end != payload_len {
            // exactly one top-level item, ending at the end of the buffer
            return Err(ParseError::Malformed {
                field: "transaction",
                error: RlpError::TrailingBytes,
            });
        }
        let mut p = data_pos;

        let mut tx_type = TxType::Legacy;
        if !legacy {
            let type_byte = *payload.get(p).ok_or(ParseError::Malformed {
                field: "type",
                error: RlpError::UnexpectedEof,
            })?;
            tx_type = TxType::try_from(type_byte)?;
            self.keccak1.update(&payload[p..p + 1]);
            self.keccak2.update(&payload[p..p + 1]);
            p += 1;
            if p >= payload_len {
                return Err(ParseError::Malformed {
                    field: "envelope",
                    error: RlpError::UnexpectedEof,
                });
            }
            let (data_pos, data_len, is_list) =
                rlp::prefix(payload, p).map_err(ParseError::at("envelope"))?;
            if !is_list {
                return Err(ParseError::Malformed {
                    field: "envelope",
                    error: RlpError::ExpectedList,
                });
            }
            let envelope_end = data_pos
                .checked_add(data_len)
                .ok_or(ParseError::Malformed {
                    field: "envelope",
                    error: RlpError::UnexpectedEof,
                })?;
            if envelope_end > payload_len {
                return Err(ParseError::Malformed {
                    field: "envelope",
                    error: RlpError::UnexpectedEof,
                });
            }
            // the id hash covers the envelope, not the outer string framing
            self.keccak1.update(&payload[p..envelope_end]);
            p = data_pos;
        }

        // Everything from here to the start of the signature feeds the
        // signing hash.
        let sig_hash_pos = p;

        if !legacy {
            // chainId is skipped; its bytes are inside the signing range
            let (data_pos, data_len, is_list) =
                rlp::prefix(payload, p).map_err(ParseError::at("chain id"))?;
            if is_list {
                return Err(ParseError::Malformed {
                    field: "chain id",
                    error: RlpError::ExpectedString,
                });
            }
            let end = data_pos
                .checked_add(data_len)
                .ok_or(ParseError::Malformed {
                    field: "chain id",
                    error: RlpError::UnexpectedEof,
                })?;
            if end >= payload_len {
                return Err(ParseError::Malformed {
                    field: "chain id",
                    error: RlpError::UnexpectedEof,
                });
            }
            p = end;
        }

        let (next, nonce) = rlp::parse_u64(payload, p).map_err(ParseError::at("nonce"))?;
        slot.nonce = nonce;
        p = next;

        // Consensus rules allow 256-bit fee fields; the pool narrows them
        // to 64 bits and rejects anything wider.
        let (next, tip) = rlp::parse_u64(payload, p).map_err(ParseError::at("tip"))?;
        slot.tip = tip;
        p = next;

        if tx_type == TxType::DynamicFee {
            let (next, fee_cap) = rlp::parse_u64(payload, p).map_err(ParseError::at("fee cap"))?;
            slot.fee_cap = fee_cap;
            p = next;
        } else {
            slot.fee_cap = slot.tip;
        }

        let (next, gas) = rlp::parse_u64(payload, p).map_err(ParseError::at("gas"))?;
        slot.gas = gas;
        p = next;

        let (data_pos, data_len, is_list) =
            rlp::prefix(payload, p).map_err(ParseError::at("to"))?;
        if is_list {
            return Err(ParseError::Malformed {
                field: "to",
                error: RlpError::ExpectedString,
            });
        }
        let end = data_pos
            .checked_add(data_len)
            .ok_or(ParseError::Malformed {
                field: "to",
                error: RlpError::UnexpectedEof,
            })?;
        if end >= payload_len {
            return Err(ParseError::Malformed {
                field: "to",
                error: RlpError::UnexpectedEof,
            });
        }
        if data_len != 0 && data_len != 20 {
            return Err(ParseError::Malformed {
                field: "to",
                error: RlpError::WrongLength,
            });
        }
        // only note whether the To field is empty
        slot.creation = data_len == 0;
        p = end;

        p = rlp::parse_u256(payload, p, &mut slot.value).map_err(ParseError::at("value"))?;

        // data follows, but only its length is of interest
        let (data_pos, data_len, is_list) =
            rlp::prefix(payload, p).map_err(ParseError::at("data"))?;
        if is_list {
            return Err(ParseError::Malformed {
                field: "data",
                error: RlpError::ExpectedString,
            });
        }
        let end = data_pos
            .checked_add(data_len)
            .ok_or(ParseError::Malformed {
                field: "data",
                error: RlpError::UnexpectedEof,
            })?;
        if end >= payload_len {
            return Err(ParseError::Malformed {
                field: "data",
                error: RlpError::UnexpectedEof,
            });
        }
        slot.data_len = data_len;
        p = end;

        // Access list for non-legacy transactions; only the number of
        // addresses and storage keys is retained.
        if !legacy {
            let (data_pos, data_len, is_list) =
                rlp::prefix(payload, p).map_err(ParseError::at("access list"))?;
            if !is_list {
                return Err(ParseError::Malformed {
                    field: "access list",
                    error: RlpError::ExpectedList,
                });
            }
            let al_end = data_pos
                .checked_add(data_len)
                .ok_or(ParseError::Malformed {
                    field: "access list",
                    error: RlpError::UnexpectedEof,
                })?;
            if al_end >= payload_len {
                return Err(ParseError::Malformed {
                    field: "access list",
                    error: RlpError::UnexpectedEof,
                });
            }
            let mut tuple_pos = data_pos;
            while tuple_pos < al_end {
                let (t_pos, t_len, is_list) =
                    rlp::prefix(payload, tuple_pos).map_err(ParseError::at("tuple"))?;
                if !is_list {
                    return Err(ParseError::Malformed {
                        field: "tuple",
                        error: RlpError::ExpectedList,
                    });
                }
                let tuple_end = t_pos.checked_add(t_len).ok_or(ParseError::Malformed {
                    field: "tuple",
                    error: RlpError::UnexpectedEof,
                })?;
                if tuple_end > al_end {
                    return Err(ParseError::Malformed {
                        field: "tuple",
                        error: RlpError::UnexpectedEof,
                    });
                }

                let (a_pos, a_len, is_list) =
                    rlp::prefix(payload, t_pos).map_err(ParseError::at("tuple address"))?;
                if is_list {
                    return Err(ParseError::Malformed {
                        field: "tuple address",
                        error: RlpError::ExpectedString,
                    });
                }
                let addr_end = a_pos.checked_add(a_len).ok_or(ParseError::Malformed {
                    field: "tuple address",
                    error: RlpError::UnexpectedEof,
                })?;
                if addr_end > tuple_end {
                    return Err(ParseError::Malformed {
                        field: "tuple address",
                        error: RlpError::UnexpectedEof,
                    });
                }
                if a_len != 20 {
                    return Err(ParseError::Malformed {
                        field: "tuple address",
                        error: RlpError::WrongLength,
                    });
                }
                slot.al_addr_count += 1;

                let (k_pos, k_len, is_list) =
                    rlp::prefix(payload, addr_end).map_err(ParseError::at("storage key list"))?;
                if !is_list {
                    return Err(ParseError::Malformed {
                        field: "storage key list",
                        error: RlpError::ExpectedList,
                    });
                }
                let keys_end = k_pos.checked_add(k_len).ok_or(ParseError::Malformed {
                    field: "storage key list",
                    error: RlpError::UnexpectedEof,
                })?;
                if keys_end > tuple_end {
                    return Err(ParseError::Malformed {
                        field: "storage key list",
                        error: RlpError::UnexpectedEof,
                    });
                }
                let mut key_pos = k_pos;
                while key_pos < keys_end {
                    let (key_data_pos, key_len, is_list) =
                        rlp::prefix(payload, key_pos).map_err(ParseError::at("storage key"))?;
                    if is_list {
                        return Err(ParseError::Malformed {
                            field: "storage key",
                            error: RlpError::ExpectedString,
                        });
                    }
                    let key_end = key_data_pos.checked_add(key_len).ok_or(ParseError::Malformed {
                        field: "storage key",
                        error: RlpError::UnexpectedEof,
                    })?;
                    if key_end > keys_end {
                        return Err(ParseError::Malformed {
                            field: "storage key",
                            error: RlpError::UnexpectedEof,
                        });
                    }
                    if key_len != 32 {
                        return Err(ParseError::Malformed {
                            field: "storage key",
                            error: RlpError::WrongLength,
                        });
                    }
                    slot.al_stor_count += 1;
                    key_pos = key_end;
                }
                // a tuple holds exactly the address and its storage keys
                if keys_end != tuple_end {
                    return Err(ParseError::Malformed {
                        field: "tuple",
                        error: RlpError::TrailingBytes,
                    });
                }
                tuple_pos = tuple_end;
            }
            p = al_end;
        }

        // This is where the signing hash data ends; V follows.
        let sig_hash_end = p;
        let mut sig_hash_len = sig_hash_end - sig_hash_pos;
        let parity: u8;
        let mut chain_id_len = 0usize;
        let mut chain_id_bits = 0usize;
        if legacy {
            p = rlp::parse_u256(payload, p, &mut self.v).map_err(ParseError::at("v"))?;
            if self.v == U256::from(27u64) || self.v == U256::from(28u64) {
                // pre-EIP-155: no chain id in the pre-image
                parity = (self.v.low_u64() - 27) as u8;
            } else {
                // EIP-155: v = 35 + 2 * chain_id + parity
                self.v = self.v.overflowing_sub(U256::from(35u64)).0;
                parity = (self.v.low_u64() & 1) as u8;
                self.v = self.v >> 1;
                chain_id_bits = self.v.bits();
                if chain_id_bits <= 7 {
                    chain_id_len = 1;
                } else {
                    chain_id_len = (chain_id_bits + 7) / 8; // always < 56 bytes
                    sig_hash_len += 1; // chain id length prefix
                }
                // the chain id plus the two empty strings replacing r and s
                sig_hash_len += chain_id_len + 2;
            }
        } else {
            let (next, v) = rlp::parse_u64(payload, p).map_err(ParseError::at("v"))?;
            if v > 1 {
                return Err(ParseError::Malformed {
                    field: "v",
                    error: RlpError::OutOfRange,
                });
            }
            parity = v as u8;
            p = next;
        }

        p = rlp::parse_u256(payload, p, &mut self.r).map_err(ParseError::at("r"))?;
        p = rlp::parse_u256(payload, p, &mut self.s).map_err(ParseError::at("s"))?;

        if p != payload_len {
            return Err(ParseError::Malformed {
                field: "transaction",
                error: RlpError::TrailingBytes,
            });
        }

        // For legacy transactions the id hash covers the full canonical
        // range, list prefix included.
        if legacy {
            self.keccak1.update(&payload[pos..p]);
        }
        slot.id_hash = H256::from_slice(self.keccak1.finalize_reset().as_slice());

        // The signing pre-image is a synthetic list wrapping the
        // pre-signature fields; emit its prefix from scratch.
        if sig_hash_len < 56 {
            self.buf[0] = 0xc0 + sig_hash_len as u8;
            self.keccak2.update(&self.buf[..1]);
        } else {
            let bits = usize::BITS - sig_hash_len.leading_zeros();
            let be_len = ((bits + 7) / 8) as usize;
            self.buf[1..9].copy_from_slice(&(sig_hash_len as u64).to_be_bytes());
            self.buf[8 - be_len] = 0xf7 + be_len as u8;
            self.keccak2.update(&self.buf[8 - be_len..9]);
        }
        self.keccak2.update(&payload[sig_hash_pos..sig_hash_end]);
        if legacy && chain_id_len > 0 {
            if chain_id_bits <= 7 {
                self.buf[0] = self.v.low_u64() as u8;
                self.keccak2.update(&self.buf[..1]);
            } else {
                self.v.to_big_endian(&mut self.buf[1..33]);
                self.buf[32 - chain_id_len] = 0x80 + chain_id_len as u8;
                self.keccak2.update(&self.buf[32 - chain_id_len..33]);
            }
            // EIP-155 replaces r and s with two empty strings
            self.keccak2.update([0x80u8, 0x80]);
        }
        self.sighash = H256::from_slice(self.keccak2.finalize_reset().as_slice());

        self.r.to_big_endian(&mut self.sig[0..32]);
        self.s.to_big_endian(&mut self.sig[32..64]);
        self.sig[64] = parity;

        Ok((slot, p))
    }
}

impl Default for TxParseContext {
    fn default() -> Self {
        Self::new()
    }
}
