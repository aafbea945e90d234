//! ABI word codec for module predicate calls (panic-free).
//!
//! Layout:
//! - calldata: `selector(4) ‖ word(user) ‖ [word(jurisdiction)]`
//! - return: exactly one 32-byte word holding `0` or `1`
//!
//! Parsing rules:
//! - Never index past a `remaining()` check; read through `Buf`.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, VerityError};
use crate::primitives::{
    Address, Jurisdiction, Selector, ADDRESS_LEN, JURISDICTION_LEN, SELECTOR_LEN,
};

/// Width of one ABI word.
pub const WORD_LEN: usize = 32;

const ADDRESS_PAD: usize = WORD_LEN - ADDRESS_LEN;

/// Calldata for a general predicate: `selector(address)`.
pub fn encode_general_call(selector: Selector, user: &Address) -> Bytes {
    let mut buf = BytesMut::with_capacity(SELECTOR_LEN + WORD_LEN);
    buf.put_slice(selector.as_bytes());
    put_address(&mut buf, user);
    buf.freeze()
}

/// Calldata for a jurisdiction predicate: `selector(address,bytes32)`.
pub fn encode_jurisdiction_call(
    selector: Selector,
    user: &Address,
    jurisdiction: &Jurisdiction,
) -> Bytes {
    let mut buf = BytesMut::with_capacity(SELECTOR_LEN + 2 * WORD_LEN);
    buf.put_slice(selector.as_bytes());
    put_address(&mut buf, user);
    buf.put_slice(jurisdiction.as_bytes());
    buf.freeze()
}

fn put_address(buf: &mut BytesMut, addr: &Address) {
    buf.put_bytes(0, ADDRESS_PAD);
    buf.put_slice(addr.as_bytes());
}

/// Encode a boolean return word (module side).
pub fn encode_bool(value: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(WORD_LEN);
    buf.put_bytes(0, WORD_LEN - 1);
    buf.put_u8(u8::from(value));
    buf.freeze()
}

/// Decode a predicate return payload.
///
/// The payload must be exactly one word and that word must be `0` or `1`.
pub fn decode_bool(mut buf: Bytes) -> Result<bool> {
    if buf.remaining() != WORD_LEN {
        return Err(VerityError::BadRequest(format!(
            "return payload must be {WORD_LEN} bytes, got {}",
            buf.remaining()
        )));
    }
    let mut word = [0u8; WORD_LEN];
    buf.copy_to_slice(&mut word);

    let (high, low) = word.split_at(WORD_LEN - 1);
    if high.iter().any(|b| *b != 0) {
        return Err(VerityError::BadRequest("return word is not a boolean".into()));
    }
    match low {
        [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(VerityError::BadRequest("return word is not a boolean".into())),
    }
}

/// Decoded predicate call (module side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateCall {
    pub selector: Selector,
    pub user: Address,
    /// Present when the calldata carries a second word.
    pub jurisdiction: Option<Jurisdiction>,
}

/// Split the 4-byte selector off the front of calldata.
pub fn peek_selector(calldata: &[u8]) -> Result<Selector> {
    let mut buf = calldata;
    if buf.remaining() < SELECTOR_LEN {
        return Err(VerityError::BadRequest("calldata shorter than selector".into()));
    }
    let mut sel = [0u8; SELECTOR_LEN];
    buf.copy_to_slice(&mut sel);
    Ok(Selector::new(sel))
}

/// Decode `selector ‖ word(user) ‖ [word(jurisdiction)]`.
///
/// Address words with non-zero padding are rejected, as are trailing
/// bytes that do not form a whole word.
pub fn decode_predicate_call(mut buf: Bytes) -> Result<PredicateCall> {
    let selector = peek_selector(&buf)?;
    buf.advance(SELECTOR_LEN);

    if buf.remaining() < WORD_LEN {
        return Err(VerityError::BadRequest("calldata missing user word".into()));
    }
    let user = get_address(&mut buf)?;

    let jurisdiction = match buf.remaining() {
        0 => None,
        JURISDICTION_LEN => {
            let mut raw = [0u8; JURISDICTION_LEN];
            buf.copy_to_slice(&mut raw);
            Some(Jurisdiction::new(raw))
        }
        n => {
            return Err(VerityError::BadRequest(format!(
                "calldata has {n} trailing bytes after user word"
            )));
        }
    };

    Ok(PredicateCall {
        selector,
        user,
        jurisdiction,
    })
}

fn get_address(buf: &mut Bytes) -> Result<Address> {
    let pad = buf.split_to(ADDRESS_PAD);
    if pad.iter().any(|b| *b != 0) {
        return Err(VerityError::BadRequest("address word has dirty padding".into()));
    }
    let mut raw = [0u8; ADDRESS_LEN];
    buf.copy_to_slice(&mut raw);
    Ok(Address::new(raw))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn general_call_layout() {
        let user = Address::from_low_u8(0x42);
        let data = encode_general_call(Selector::IS_COMPLIANT, &user);
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &[0xa2, 0x00, 0xe5, 0xd0]);
        assert!(data[4..35].iter().all(|b| *b == 0));
        assert_eq!(data[35], 0x42);
    }

    #[test]
    fn jurisdiction_call_decodes_back() {
        let user = Address::from_low_u8(7);
        let us = Jurisdiction::from_code("US").unwrap();
        let data = encode_jurisdiction_call(Selector::IS_COMPLIANT_IN_JURISDICTION, &user, &us);
        let call = decode_predicate_call(data).unwrap();
        assert_eq!(call.selector, Selector::IS_COMPLIANT_IN_JURISDICTION);
        assert_eq!(call.user, user);
        assert_eq!(call.jurisdiction, Some(us));
    }

    #[test]
    fn bool_word_must_be_exact() {
        assert!(decode_bool(encode_bool(true)).unwrap());
        assert!(!decode_bool(encode_bool(false)).unwrap());
        assert!(decode_bool(Bytes::new()).is_err());
        assert!(decode_bool(Bytes::from(vec![0u8; 64])).is_err());

        let mut two = vec![0u8; 32];
        two[31] = 2;
        assert!(decode_bool(Bytes::from(two)).is_err());
    }

    #[test]
    fn truncated_calldata_is_rejected() {
        assert!(peek_selector(&[0xa2, 0x00]).is_err());
        let short = Bytes::from(vec![0xa2, 0x00, 0xe5, 0xd0, 0, 0]);
        assert!(decode_predicate_call(short).is_err());
    }
}
