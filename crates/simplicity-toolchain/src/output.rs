//! Parsers for external tool output
//!
//! The compiler and hal-simplicity builds do not promise a stable output
//! format, so all scraping lives here. Parsers are tolerant: unknown lines
//! and keys are skipped, and missing fields stay `None`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::types::ProgramInfo;

/// Fields scraped from compiler stdout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOutput {
    pub program: Option<String>,
    pub witness: Option<String>,
    pub warnings: Vec<String>,
}

/// Parse `simc` output
///
/// Recognises `Program:` / `Witness:` headers with the value either inline or
/// on the following line. Without headers, the last base64-looking line is
/// taken as the program.
pub fn parse_compiler_output(stdout: &str) -> CompilerOutput {
    let mut output = CompilerOutput::default();
    let lines: Vec<&str> = stdout.lines().map(str::trim).collect();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let lower = line.to_ascii_lowercase();

        if lower.starts_with("warning") {
            output.warnings.push(line.to_string());
        } else if let Some((key, inline)) = line.split_once(':') {
            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "program" => Some(&mut output.program),
                "witness" => Some(&mut output.witness),
                _ => None,
            };
            if let Some(slot) = slot {
                let inline = inline.trim();
                if !inline.is_empty() {
                    *slot = Some(inline.to_string());
                } else if let Some(next) = lines[i + 1..].iter().find(|l| !l.is_empty()) {
                    *slot = Some(next.to_string());
                    i += 1;
                }
            }
        }
        i += 1;
    }

    if output.program.is_none() {
        output.program = lines
            .iter()
            .rev()
            .find(|l| looks_like_base64(l))
            .map(|l| l.to_string());
    }

    output
}

/// Whether a bare line is plausibly an encoded program
///
/// Short lines and plain words ("Finished", "Compiling") decode as base64
/// too, so require some length and at least one character outside A-Za-z.
fn looks_like_base64(s: &str) -> bool {
    s.len() >= 16
        && s.bytes().any(|b| b.is_ascii_digit() || matches!(b, b'+' | b'/' | b'='))
        && STANDARD.decode(s).is_ok()
}

/// Parse `hal-simplicity simplicity info` output
///
/// Accepts a JSON object (current releases) or `key: value` lines (older
/// builds).
pub fn parse_program_info(stdout: &str) -> ProgramInfo {
    let fields = match serde_json::from_str::<Value>(stdout.trim()) {
        Ok(Value::Object(map)) => map,
        _ => key_value_lines(stdout),
    };

    let mut info = ProgramInfo {
        success: true,
        raw: Some(stdout.trim().to_string()),
        ..Default::default()
    };

    for (key, value) in fields {
        match normalize_key(&key).as_str() {
            "address" | "liquid_address" | "liquid_address_unconf" => {
                info.address = value_string(&value);
            }
            "testnet_address" | "liquid_testnet_address" | "liquid_testnet_address_unconf" => {
                info.testnet_address = value_string(&value);
            }
            "cmr" | "program_hash" | "hash" | "commitment_merkle_root" => {
                info.program_hash = value_string(&value);
            }
            "jets" => info.jets = value_string(&value),
            "witness" | "witness_structure" | "witness_type" => {
                info.witness_structure = Some(structured(value));
            }
            _ => {}
        }
    }

    info
}

/// Parse decode output into structured data
pub fn parse_decoded(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value;
    }
    let fields = key_value_lines(trimmed);
    if fields.is_empty() {
        Value::String(trimmed.to_string())
    } else {
        Value::Object(fields)
    }
}

/// Extract the PSET token from a signer response
pub fn parse_pset(stdout: &str) -> Option<String> {
    extract_field(stdout, &["pset", "psbt"])
}

/// Extract the raw transaction from a signer response
pub fn parse_transaction(stdout: &str) -> Option<String> {
    extract_field(stdout, &["hex", "tx", "transaction", "raw_tx"])
}

fn extract_field(stdout: &str, keys: &[&str]) -> Option<String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => keys
            .iter()
            .find_map(|k| map.get(*k).and_then(value_string)),
        Ok(Value::String(s)) => Some(s),
        _ => trimmed
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string),
    }
}

fn key_value_lines(text: &str) -> Map<String, Value> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
        .map(|(k, v)| (normalize_key(k), Value::String(v.trim().to_string())))
        .collect()
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn structured(value: Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    }
}
