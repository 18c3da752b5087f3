//! Input validation for requests and tool arguments
//!
//! Every check here runs before any external process or network call, so a
//! malformed argument is reported without side effects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::protocol::{JsonRpcError, JsonRpcRequest, JSONRPC_VERSION};

/// Validation result
pub type ValidationResult<T> = Result<T, JsonRpcError>;

/// URI scheme for this server's resources
pub const RESOURCE_SCHEME: &str = "simplicity://";

/// Address prefixes for Liquid mainnet, testnet and regtest (segwit and confidential)
const LIQUID_ADDRESS_PREFIXES: &[&str] = &["ex1", "lq1", "tex1", "tlq1", "ert1", "el1"];

/// Upper bound for inline source text
pub const MAX_SOURCE_BYTES: usize = 256 * 1024;

// ============================================================================
// Protocol Invariants
// ============================================================================

/// Validate that a JSON-RPC request is well-formed
pub fn validate_request(request: &JsonRpcRequest) -> ValidationResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcError::invalid_request());
    }

    if request.method.is_empty() || request.method.starts_with("rpc.") {
        return Err(JsonRpcError::invalid_request());
    }

    Ok(())
}

/// Validate a resource URI; returns the path after the scheme
pub fn validate_resource_uri(uri: &str) -> ValidationResult<&str> {
    let path = uri.strip_prefix(RESOURCE_SCHEME).ok_or_else(|| {
        JsonRpcError::invalid_params(format!("Resource URI must start with '{}'", RESOURCE_SCHEME))
    })?;

    if path.is_empty() {
        return Err(JsonRpcError::invalid_params(
            "Resource URI must have a path after the scheme",
        ));
    }

    if path.contains("..") {
        return Err(JsonRpcError::invalid_params(
            "Resource URI must not contain '..'",
        ));
    }

    Ok(path)
}

// ============================================================================
// Tool Arguments
// ============================================================================

/// Require a non-blank string argument
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(JsonRpcError::invalid_params(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(trimmed)
}

/// Validate inline SimplicityHL source
pub fn validate_source(source: &str) -> ValidationResult<&str> {
    require_non_empty("source", source)?;
    if source.len() > MAX_SOURCE_BYTES {
        return Err(JsonRpcError::invalid_params(format!(
            "source exceeds {} bytes",
            MAX_SOURCE_BYTES
        )));
    }
    Ok(source)
}

/// Validate a filesystem path argument
pub fn validate_file_path<'a>(field: &str, path: &'a str) -> ValidationResult<&'a str> {
    let path = require_non_empty(field, path)?;
    if path.contains('\0') {
        return Err(JsonRpcError::invalid_params(format!(
            "{} contains a NUL byte",
            field
        )));
    }
    Ok(path)
}

/// Validate a base64-encoded compiled program
pub fn validate_program(program: &str) -> ValidationResult<&str> {
    let program = require_non_empty("program", program)?;
    STANDARD.decode(program).map_err(|e| {
        JsonRpcError::invalid_params(format!("program is not valid base64: {}", e))
    })?;
    Ok(program)
}

/// Validate a `txid:vout` UTXO reference
pub fn validate_utxo_ref(utxo: &str) -> ValidationResult<(String, u32)> {
    let utxo = require_non_empty("utxo", utxo)?;
    let (txid, vout) = utxo.split_once(':').ok_or_else(|| {
        JsonRpcError::invalid_params("utxo must have the form <txid>:<vout>")
    })?;

    let bytes = hex::decode(txid)
        .map_err(|e| JsonRpcError::invalid_params(format!("utxo txid is not hex: {}", e)))?;
    if bytes.len() != 32 {
        return Err(JsonRpcError::invalid_params(format!(
            "utxo txid must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    let vout: u32 = vout
        .parse()
        .map_err(|_| JsonRpcError::invalid_params("utxo vout must be a non-negative integer"))?;

    Ok((txid.to_ascii_lowercase(), vout))
}

/// Validate a positive decimal amount in BTC units (at most 8 decimals)
pub fn validate_amount(amount: &str) -> ValidationResult<&str> {
    let amount = require_non_empty("amount", amount)?;
    let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && frac.is_empty()
        || !digits_only(whole)
        || !digits_only(frac)
        || frac.len() > 8
    {
        return Err(JsonRpcError::invalid_params(
            "amount must be a decimal number with at most 8 decimal places",
        ));
    }

    if amount.chars().all(|c| c == '0' || c == '.') {
        return Err(JsonRpcError::invalid_params("amount must be positive"));
    }

    Ok(amount)
}

/// Validate a 32-byte hex asset id
pub fn validate_asset_id(asset: &str) -> ValidationResult<&str> {
    let asset = require_non_empty("asset", asset)?;
    let bytes = hex::decode(asset)
        .map_err(|e| JsonRpcError::invalid_params(format!("asset is not hex: {}", e)))?;
    if bytes.len() != 32 {
        return Err(JsonRpcError::invalid_params(format!(
            "asset id must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(asset)
}

/// Validate a hex script
pub fn validate_script(script: &str) -> ValidationResult<&str> {
    let script = require_non_empty("script", script)?;
    hex::decode(script)
        .map_err(|e| JsonRpcError::invalid_params(format!("script is not hex: {}", e)))?;
    Ok(script)
}

/// Validate a Liquid bech32/blech32 address
pub fn validate_liquid_address(address: &str) -> ValidationResult<&str> {
    let address = require_non_empty("address", address)?;
    let lower = address.to_ascii_lowercase();

    let Some(prefix) = LIQUID_ADDRESS_PREFIXES
        .iter()
        .find(|p| lower.starts_with(*p))
    else {
        return Err(JsonRpcError::invalid_params(format!(
            "address must be a Liquid address (prefixes: {})",
            LIQUID_ADDRESS_PREFIXES.join(", ")
        )));
    };

    // Mixed case is invalid in bech32
    if address != lower && address != address.to_ascii_uppercase() {
        return Err(JsonRpcError::invalid_params("address mixes upper and lower case"));
    }

    let data = &lower[prefix.len()..];
    if data.len() < 6 || !data.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(JsonRpcError::invalid_params("address payload is malformed"));
    }

    Ok(address)
}

/// Validate a JSON argument passed as a string (PSET inputs/outputs)
pub fn validate_json_array<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let value = require_non_empty(field, value)?;
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Array(items)) if !items.is_empty() => Ok(value),
        Ok(serde_json::Value::Array(_)) => Err(JsonRpcError::invalid_params(format!(
            "{} must contain at least one entry",
            field
        ))),
        Ok(_) => Err(JsonRpcError::invalid_params(format!(
            "{} must be a JSON array",
            field
        ))),
        Err(e) => Err(JsonRpcError::invalid_params(format!(
            "{} is not valid JSON: {}",
            field, e
        ))),
    }
}
