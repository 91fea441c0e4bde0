//! Recipient address encoding for the burn-and-mint bridge.
//!
//! The bridge identifies mint recipients by a canonical 32-byte value:
//!
//! - EVM hex addresses (20 bytes) are left-padded with zero bytes.
//! - Cosmos bech32 addresses are decoded to their raw payload and
//!   right-aligned in the 32-byte buffer (leading zero bytes).
//!
//! Both layouts place the payload at the end of the buffer; the encoding is
//! deterministic and always exactly 32 bytes.

use bech32::{self, FromBase32, ToBase32, Variant};

use crate::error::ChainError;

/// Parse a 0x-prefixed hex EVM address to 20 bytes.
pub fn parse_evm_address(addr: &str) -> Result<[u8; 20], ChainError> {
    let hex_str = addr.strip_prefix("0x").unwrap_or(addr);

    if hex_str.len() != 40 {
        return Err(ChainError::invalid_address(
            addr,
            format!("expected 40 hex chars, got {}", hex_str.len()),
        ));
    }

    let bytes = hex::decode(hex_str)?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Decode a bech32 address to its raw payload and prefix.
///
/// Accepts 20-byte (wallet) and 32-byte (module/contract) payloads.
pub fn decode_bech32_payload(addr: &str) -> Result<(Vec<u8>, String), ChainError> {
    let (hrp, data, _variant) = bech32::decode(addr)
        .map_err(|e| ChainError::invalid_address(addr, format!("invalid bech32: {}", e)))?;

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| ChainError::invalid_address(addr, format!("invalid base32 data: {}", e)))?;

    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(ChainError::invalid_address(
            addr,
            format!("expected 20 or 32 byte payload, got {}", bytes.len()),
        ));
    }

    Ok((bytes, hrp))
}

/// Re-encode a bech32 address under a different prefix.
///
/// Cosmos chains share key derivation, so the same account payload is valid
/// under any chain's prefix. Used to watch a hub-chain account given an
/// address typed for another Cosmos chain.
pub fn convert_bech32_prefix(addr: &str, hrp: &str) -> Result<String, ChainError> {
    let (payload, _) = decode_bech32_payload(addr)?;
    bech32::encode(hrp, payload.to_base32(), Variant::Bech32)
        .map_err(|e| ChainError::invalid_address(addr, format!("bech32 re-encode: {}", e)))
}

/// Normalize a recipient address to the bridge's canonical 32-byte form.
pub fn encode_mint_recipient(addr: &str) -> Result<[u8; 32], ChainError> {
    let mut out = [0u8; 32];

    if addr.starts_with("0x") || addr.len() == 40 && addr.chars().all(|c| c.is_ascii_hexdigit()) {
        let raw = parse_evm_address(addr)?;
        out[12..].copy_from_slice(&raw);
        return Ok(out);
    }

    let (payload, _hrp) = decode_bech32_payload(addr)?;
    out[32 - payload.len()..].copy_from_slice(&payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const NOBLE_ADDR: &str = "noble1k74p0mrdm2a94u7kqpcrfv5lxwnd5wh6uruqln";

    #[test]
    fn test_evm_recipient_left_padded() {
        let encoded = encode_mint_recipient(EVM_ADDR).unwrap();
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(&encoded[12..], &parse_evm_address(EVM_ADDR).unwrap());
    }

    #[test]
    fn test_bech32_recipient_right_aligned() {
        let (payload, hrp) = decode_bech32_payload(NOBLE_ADDR).unwrap();
        assert_eq!(hrp, "noble");
        assert_eq!(payload.len(), 20);

        let encoded = encode_mint_recipient(NOBLE_ADDR).unwrap();
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(&encoded[12..], payload.as_slice());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(
            encode_mint_recipient(EVM_ADDR).unwrap(),
            encode_mint_recipient(EVM_ADDR).unwrap()
        );
        assert_eq!(
            encode_mint_recipient(NOBLE_ADDR).unwrap(),
            encode_mint_recipient(NOBLE_ADDR).unwrap()
        );
    }

    #[test]
    fn test_prefix_conversion_preserves_payload() {
        let converted = convert_bech32_prefix(NOBLE_ADDR, "jolt").unwrap();
        assert!(converted.starts_with("jolt1"));

        let (original, _) = decode_bech32_payload(NOBLE_ADDR).unwrap();
        let (round_tripped, hrp) = decode_bech32_payload(&converted).unwrap();
        assert_eq!(hrp, "jolt");
        assert_eq!(original, round_tripped);

        let back = convert_bech32_prefix(&converted, "noble").unwrap();
        assert_eq!(back, NOBLE_ADDR);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(encode_mint_recipient("0x1234").is_err());
        assert!(encode_mint_recipient("noble1invalid").is_err());
        assert!(parse_evm_address("f39Fd6e51aad88F6F4ce6aB8827279cffFb9226").is_err());
    }
}
