//! Compiler diagnostic → remediation hints

use crate::catalog::WORKING_JETS;

/// Known diagnostic signature
struct Signature {
    /// Lowercase substrings; any one matching triggers the entry
    needles: &'static [&'static str],
    hints: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        needles: &["expected end of input"],
        hints: &[
            "The parser stopped before the end of the file: check for statements outside fn main() \
             or a stray closing brace.",
            "Top-level let bindings are not supported; move them inside fn main().",
        ],
    },
    Signature {
        needles: &["unknown jet", "unknown primitive", "jet not found"],
        hints: &[
            "Use a jet from the working list (see simplicity_get_features).",
            "Jet names are width-suffixed, e.g. jet::eq_32 rather than jet::eq.",
        ],
    },
    Signature {
        needles: &["type mismatch", "expected type", "mismatched types"],
        hints: &[
            "Annotate every let binding with its exact width (u8, u16, u32, u64, u256).",
            "Jet arguments must match the jet's width: jet::eq_32 takes two u32 values.",
        ],
    },
    Signature {
        needles: &["unexpected token", "expected one of", "syntax error", "parse error"],
        hints: &[
            "if/else and match are not supported; express conditions as assert!(jet::...).",
            "Compare against simplicity_generate_example output for working syntax.",
        ],
    },
    Signature {
        needles: &["undefined", "not found in scope", "unknown variable", "not defined"],
        hints: &["Declare the variable with let inside fn main() before using it."],
    },
    Signature {
        needles: &["witness"],
        hints: &[
            "Witness values are referenced as witness::NAME and supplied in a JSON witness file \
             at compile time.",
        ],
    },
    Signature {
        needles: &["fn main", "main function", "entry point"],
        hints: &["Every program needs exactly one entry point: fn main() { ... }."],
    },
    Signature {
        needles: &["unsupported", "not supported", "not implemented"],
        hints: &[
            "The construct is not implemented by the current compiler; check \
             simplicity_get_features for the supported subset.",
        ],
    },
];

const FALLBACK: &str = "No known fix for this error. Check simplicity_get_features for the \
     supported subset and start from simplicity_generate_example.";

/// Suggest fixes for a raw compiler error
///
/// Always returns at least one entry.
pub fn suggest_fix(error_message: &str) -> Vec<String> {
    let haystack = error_message.to_lowercase();
    let mut suggestions: Vec<String> = Vec::new();

    for signature in SIGNATURES {
        if !signature.needles.iter().any(|n| haystack.contains(n)) {
            continue;
        }
        for hint in signature.hints {
            if !suggestions.iter().any(|s| s == hint) {
                suggestions.push(hint.to_string());
            }
        }
    }

    if let Some(name) = mentioned_jet(&haystack) {
        if !WORKING_JETS.contains(&name.as_str()) {
            suggestions.push(format!(
                "Working jets: {} (jet::{} is not among them)",
                WORKING_JETS.join(", "),
                name
            ));
        }
    }

    if suggestions.is_empty() {
        suggestions.push(FALLBACK.to_string());
    }

    suggestions
}

/// First `jet::name` mentioned in a message
fn mentioned_jet(haystack: &str) -> Option<String> {
    let start = haystack.find("jet::")? + "jet::".len();
    let name: String = haystack[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}
