//! # Ledger Wire Encoding
//!
//! Everything that crosses into the credential registry contract is encoded
//! here, and only here:
//!
//! - [`to_bytes32()`], the fixed-width hash rule for caller-supplied digests.
//! - Ethereum ABI calldata for the registry's four functions.
//! - Decoding of `bool` and `address` call results.
//!
//! ## Contract Interface
//!
//! ```solidity
//! function storeCredential(address _userAddress, bytes32 _credentialHash, string _credentialType) external;
//! function verifyCredential(address _userAddress, bytes32 _credentialHash) external view returns (bool);
//! function revokeCredential(address _userAddress, bytes32 _credentialHash) external;
//! function getCredentialOwner(bytes32 _credentialHash) external view returns (address);
//! ```

use idv_core::{CredentialType, OwnerAddress};
use sha3::{Digest, Keccak256};

use crate::error::AnchorError;

/// ABI word size.
const WORD: usize = 32;

pub const STORE_CREDENTIAL: &str = "storeCredential(address,bytes32,string)";
pub const VERIFY_CREDENTIAL: &str = "verifyCredential(address,bytes32)";
pub const REVOKE_CREDENTIAL: &str = "revokeCredential(address,bytes32)";
pub const GET_CREDENTIAL_OWNER: &str = "getCredentialOwner(bytes32)";

/// Convert a hex digest to the contract's `bytes32` parameter.
///
/// An optional `0x` prefix is stripped. Shorter input is zero-padded on the
/// right to 32 bytes; longer input keeps its first 32 bytes. Every ledger
/// call path goes through this function.
pub fn to_bytes32(digest_hex: &str) -> Result<[u8; 32], AnchorError> {
    let trimmed = digest_hex.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let decoded = hex::decode(body).map_err(|e| AnchorError::InvalidDigest {
        input: digest_hex.to_string(),
        reason: e.to_string(),
    })?;
    let mut out = [0u8; 32];
    let n = decoded.len().min(32);
    out[..n].copy_from_slice(&decoded[..n]);
    Ok(out)
}

/// 4-byte function selector: the first four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `0x`-prefixed lowercase hex, the JSON-RPC data encoding.
pub fn to_0x_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn address_word(addr: &OwnerAddress) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

fn uint_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

/// Calldata for `storeCredential(address,bytes32,string)`.
pub fn encode_store_credential(
    owner: &OwnerAddress,
    hash: &[u8; 32],
    credential_type: &CredentialType,
) -> Vec<u8> {
    let label = credential_type.as_str().as_bytes();
    let padded_len = label.len().div_ceil(WORD) * WORD;

    let mut out = Vec::with_capacity(4 + 4 * WORD + padded_len);
    out.extend_from_slice(&selector(STORE_CREDENTIAL));
    out.extend_from_slice(&address_word(owner));
    out.extend_from_slice(hash);
    // Dynamic argument: offset of the string tail from the start of the
    // argument block (three head words).
    out.extend_from_slice(&uint_word(3 * WORD));
    out.extend_from_slice(&uint_word(label.len()));
    out.extend_from_slice(label);
    out.resize(4 + 4 * WORD + padded_len, 0);
    out
}

/// Calldata for `verifyCredential(address,bytes32)`.
pub fn encode_verify_credential(owner: &OwnerAddress, hash: &[u8; 32]) -> Vec<u8> {
    encode_owner_hash(VERIFY_CREDENTIAL, owner, hash)
}

/// Calldata for `revokeCredential(address,bytes32)`.
pub fn encode_revoke_credential(owner: &OwnerAddress, hash: &[u8; 32]) -> Vec<u8> {
    encode_owner_hash(REVOKE_CREDENTIAL, owner, hash)
}

/// Calldata for `getCredentialOwner(bytes32)`.
pub fn encode_get_credential_owner(hash: &[u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD);
    out.extend_from_slice(&selector(GET_CREDENTIAL_OWNER));
    out.extend_from_slice(hash);
    out
}

fn encode_owner_hash(signature: &str, owner: &OwnerAddress, hash: &[u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 2 * WORD);
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&address_word(owner));
    out.extend_from_slice(hash);
    out
}

fn first_word(data: &[u8]) -> Result<&[u8], AnchorError> {
    data.get(..WORD).ok_or_else(|| {
        AnchorError::Rejected(format!(
            "call returned {} bytes, expected at least {WORD}",
            data.len()
        ))
    })
}

/// Decode an ABI `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, AnchorError> {
    let word = first_word(data)?;
    if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
        return Err(AnchorError::Rejected(format!(
            "not an ABI bool: {}",
            to_0x_hex(word)
        )));
    }
    Ok(word[WORD - 1] == 1)
}

/// Decode an ABI `address` return value.
pub fn decode_address(data: &[u8]) -> Result<OwnerAddress, AnchorError> {
    let word = first_word(data)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AnchorError::Rejected(format!(
            "not an ABI address: {}",
            to_0x_hex(word)
        )));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(OwnerAddress::from_bytes(bytes))
}

/// Decode a `0x`-prefixed hex data string from a JSON-RPC result.
pub fn decode_0x_hex(data: &str) -> Result<Vec<u8>, AnchorError> {
    let body = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(body).map_err(|e| AnchorError::Rejected(format!("malformed hex result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerAddress {
        OwnerAddress::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap()
    }

    #[test]
    fn bytes32_exact_width_passes_through() {
        let hex = "786991c584f2b95641bce4f987a33fdbf8d9aaee4a3708a0e5d11210c3d35fdd";
        let out = to_bytes32(hex).unwrap();
        assert_eq!(hex::encode(out), hex);
        assert_eq!(to_bytes32(&format!("0x{hex}")).unwrap(), out);
    }

    #[test]
    fn bytes32_short_input_right_padded() {
        let out = to_bytes32("abcd").unwrap();
        assert_eq!(&out[..2], &[0xab, 0xcd]);
        assert!(out[2..].iter().all(|b| *b == 0));
    }

    #[test]
    fn bytes32_long_input_truncated() {
        let long = format!("{}{}", "11".repeat(32), "22".repeat(8));
        assert_eq!(to_bytes32(&long).unwrap(), [0x11; 32]);
    }

    #[test]
    fn bytes32_empty_input_is_zero() {
        assert_eq!(to_bytes32("").unwrap(), [0u8; 32]);
        assert_eq!(to_bytes32("0x").unwrap(), [0u8; 32]);
    }

    #[test]
    fn bytes32_rejects_non_hex() {
        assert!(matches!(
            to_bytes32("not-a-hash"),
            Err(AnchorError::InvalidDigest { .. })
        ));
        assert!(to_bytes32("abc").is_err(), "odd digit count");
    }

    #[test]
    fn known_selectors() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(hex::encode(selector(STORE_CREDENTIAL)), "1e323f56");
        assert_eq!(hex::encode(selector(VERIFY_CREDENTIAL)), "5f889e17");
        assert_eq!(hex::encode(selector(REVOKE_CREDENTIAL)), "e5dca78e");
        assert_eq!(hex::encode(selector(GET_CREDENTIAL_OWNER)), "47eaa26d");
    }

    #[test]
    fn store_credential_layout() {
        let ty = CredentialType::new("passport").unwrap();
        let data = encode_store_credential(&owner(), &[0x42; 32], &ty);
        assert_eq!(data.len(), 4 + 5 * 32);
        assert_eq!(&data[..4], &selector(STORE_CREDENTIAL));
        assert_eq!(&data[4 + 12..4 + 32], owner().as_bytes());
        assert_eq!(&data[36..68], &[0x42; 32]);
        assert_eq!(data[4 + 3 * 32 - 1], 0x60);
        assert_eq!(data[4 + 4 * 32 - 1], 8);
        assert_eq!(&data[4 + 4 * 32..4 + 4 * 32 + 8], b"passport");
        assert!(data[4 + 4 * 32 + 8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn store_credential_label_of_exact_word() {
        let ty = CredentialType::new("a".repeat(32)).unwrap();
        let data = encode_store_credential(&owner(), &[0; 32], &ty);
        assert_eq!(data.len(), 4 + 5 * 32);
    }

    #[test]
    fn verify_and_owner_layouts() {
        let data = encode_verify_credential(&owner(), &[0x07; 32]);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(hex::encode(&data[..4]), "5f889e17");
        let data = encode_get_credential_owner(&[0x07; 32]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[4..], &[0x07; 32]);
    }

    #[test]
    fn decode_results() {
        let mut word = [0u8; 32];
        assert!(!decode_bool(&word).unwrap());
        word[31] = 1;
        assert!(decode_bool(&word).unwrap());
        word[31] = 2;
        assert!(decode_bool(&word).is_err());
        assert!(decode_bool(&[1u8; 4]).is_err());

        let mut word = [0u8; 32];
        word[12..].copy_from_slice(owner().as_bytes());
        assert_eq!(decode_address(&word).unwrap(), owner());
        assert!(decode_address(&[0u8; 32]).unwrap().is_zero());
        word[0] = 1;
        assert!(decode_address(&word).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bytes32_keeps_prefix_of_input(bytes in prop::collection::vec(any::<u8>(), 0..80)) {
            let out = to_bytes32(&hex::encode(&bytes)).unwrap();
            let n = bytes.len().min(32);
            prop_assert_eq!(&out[..n], &bytes[..n]);
            prop_assert!(out[n..].iter().all(|b| *b == 0));
        }
    }
}
