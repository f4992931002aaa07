//! Address Format Codecs
//!
//! Parsing and format validation of the address encodings chain modules use:
//!
//! - `evm`: `0x` followed by 40 hex characters (20 bytes)
//! - `axelarnet`: bech32 with a valid checksum, 20-byte accounts or 32-byte contracts
//! - `wasm`: any non-empty address without whitespace, interpreted by the
//!   connection router on the other side

use bech32::{FromBase32, ToBase32, Variant};
use cosmwasm_std::{StdError, StdResult};

use nexus_common::CrossChainAddress;

// ============================================================================
// EVM
// ============================================================================

/// Parse a 0x-prefixed hex EVM address to 20 bytes
pub fn parse_evm_address(addr: &str) -> StdResult<[u8; 20]> {
    let hex_str = addr
        .strip_prefix("0x")
        .ok_or_else(|| StdError::generic_err("EVM address must start with 0x"))?;

    if hex_str.len() != 40 {
        return Err(StdError::generic_err(format!(
            "Invalid EVM address length: expected 40 hex chars, got {}",
            hex_str.len()
        )));
    }

    let bytes =
        hex::decode(hex_str).map_err(|e| StdError::generic_err(format!("Invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Encode 20 bytes to EVM hex string with 0x prefix
pub fn encode_evm_address(bytes: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// ============================================================================
// Bech32
// ============================================================================

/// Decode a bech32 address to its raw bytes (20 or 32) and prefix
pub fn decode_bech32_address(addr: &str) -> StdResult<(Vec<u8>, String)> {
    let (hrp, data, _variant) = bech32::decode(addr)
        .map_err(|e| StdError::generic_err(format!("Invalid bech32 address: {}", e)))?;

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| StdError::generic_err(format!("Invalid base32 data: {}", e)))?;

    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(StdError::generic_err(format!(
            "Invalid address length: expected 20 or 32 bytes, got {}",
            bytes.len()
        )));
    }

    Ok((bytes, hrp))
}

/// Encode raw bytes to a bech32 address with given prefix
pub fn encode_bech32_address(bytes: &[u8], hrp: &str) -> StdResult<String> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| StdError::generic_err(format!("Failed to encode bech32: {}", e)))
}

// ============================================================================
// Chain Module Validators
// ============================================================================

pub fn validate_evm_address(address: &CrossChainAddress) -> StdResult<()> {
    parse_evm_address(&address.address).map(|_| ())
}

pub fn validate_cosmos_address(address: &CrossChainAddress) -> StdResult<()> {
    decode_bech32_address(&address.address).map(|_| ())
}

pub fn validate_wasm_address(address: &CrossChainAddress) -> StdResult<()> {
    if address.address.is_empty() || address.address.chars().any(char::is_whitespace) {
        return Err(StdError::generic_err(
            "address must be non-empty and free of whitespace",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_address_parse() {
        let evm_addr = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        let bytes = parse_evm_address(evm_addr).unwrap();

        assert_eq!(
            encode_evm_address(&bytes),
            evm_addr.to_lowercase()
        );

        // missing prefix
        assert!(parse_evm_address("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_err());
        // too short
        assert!(parse_evm_address("0xf39Fd6e51aad88F6F4ce").is_err());
        // not hex
        assert!(parse_evm_address("0xz39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_err());
    }

    #[test]
    fn test_bech32_decode_encode() {
        let terra_addr = "terra1x46rqay4d3cssq8gxxvqz8xt6nwlz4td20k38v";
        let (bytes, hrp) = decode_bech32_address(terra_addr).unwrap();

        assert_eq!(hrp, "terra");
        assert_eq!(bytes.len(), 20);
        assert_eq!(encode_bech32_address(&bytes, &hrp).unwrap(), terra_addr);
    }

    #[test]
    fn test_bech32_rejects_bad_checksum() {
        assert!(decode_bech32_address("terra1x46rqay4d3cssq8gxxvqz8xt6nwlz4td20k38w").is_err());
        assert!(decode_bech32_address("not-an-address").is_err());
    }

    #[test]
    fn test_bech32_contract_address() {
        let contract = encode_bech32_address(&[7u8; 32], "axelar").unwrap();
        let (bytes, hrp) = decode_bech32_address(&contract).unwrap();

        assert_eq!(hrp, "axelar");
        assert_eq!(bytes, vec![7u8; 32]);
    }
}
