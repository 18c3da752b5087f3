//! Feature catalog for the SimplicityHL compiler
//!
//! Static snapshot of what the current external compiler accepts. The
//! validator reads its rejection table and jet allow-list from here, and the
//! example generator only uses what is listed as working, so the three stay
//! in lockstep.

use serde::{Deserialize, Serialize};

/// Compiler snapshot the catalog describes
pub const CATALOG_VERSION: &str = "simc-0.2";

/// Language features the compiler handles
pub const SUPPORTED_FEATURES: &[&str] = &[
    "fn main() entry point",
    "let bindings with type annotations inside fn main",
    "unsigned integer types u1, u2, u4, u8, u16, u32, u64, u128, u256",
    "tuples and fixed-size arrays",
    "assert!(...) on boolean jet results",
    "jet calls from the working list (jet::name)",
    "witness values (witness::NAME)",
    "unit expression ()",
];

/// Constructs accepted with a warning
pub const PARTIAL_FEATURES: &[&str] = &[
    "helper functions besides main (may fail to compile)",
    "reserved keywords mod and const (parsed, not implemented)",
    "jets outside the working list (untested)",
];

/// Keywords the parser reserves but the compiler does not implement
pub const RESERVED_KEYWORDS: &[&str] = &["mod", "const"];

/// Jets confirmed to compile and evaluate
pub const WORKING_JETS: &[&str] = &[
    "eq_8", "eq_16", "eq_32", "eq_64", "eq_256", "lt_8", "lt_16", "lt_32", "lt_64", "le_8",
    "le_16", "le_32", "le_64", "verify",
];

/// Jets known to exist but not exercised against the current compiler
pub const UNTESTED_JETS: &[&str] = &[
    "add_32",
    "subtract_32",
    "multiply_32",
    "sha_256_ctx_8_init",
    "sha_256_ctx_8_add_32",
    "sha_256_ctx_8_finalize",
    "bip_0340_verify",
    "check_lock_height",
    "check_lock_time",
    "current_index",
];

/// Constructs the compiler rejects outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    /// `let` outside of any function body
    TopLevelBinding,
    /// `if` / `else`
    Conditional,
    /// `match`
    PatternMatch,
}

impl Construct {
    pub const ALL: [Construct; 3] = [
        Construct::TopLevelBinding,
        Construct::Conditional,
        Construct::PatternMatch,
    ];

    /// Label used in the catalog's not-supported list
    pub fn feature(self) -> &'static str {
        match self {
            Construct::TopLevelBinding => "top-level let bindings outside fn main",
            Construct::Conditional => "if / else conditionals",
            Construct::PatternMatch => "match expressions",
        }
    }

    /// Otherwise valid program that uses only this construct
    pub fn sample(self) -> &'static str {
        match self {
            Construct::TopLevelBinding => "let limit: u32 = 10;\nfn main() { () }",
            Construct::Conditional => "fn main() {\n    if true { () } else { () }\n}",
            Construct::PatternMatch => {
                "fn main() {\n    match witness::X { Left(a) => a, Right(b) => b, };\n}"
            }
        }
    }
}

/// Jet section of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JetCatalog {
    pub working: Vec<String>,
    pub not_tested: Vec<String>,
}

/// User-facing catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCatalog {
    pub version: String,
    pub supported: Vec<String>,
    pub not_supported: Vec<String>,
    pub partially_supported: Vec<String>,
    pub jets: JetCatalog,
}

/// Describe the compiler's current feature set
pub fn describe_features() -> FeatureCatalog {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    FeatureCatalog {
        version: CATALOG_VERSION.to_string(),
        supported: owned(SUPPORTED_FEATURES),
        not_supported: Construct::ALL
            .iter()
            .map(|c| c.feature().to_string())
            .collect(),
        partially_supported: owned(PARTIAL_FEATURES),
        jets: JetCatalog {
            working: owned(WORKING_JETS),
            not_tested: owned(UNTESTED_JETS),
        },
    }
}

/// Whether a jet is on the working list
pub fn is_working_jet(name: &str) -> bool {
    WORKING_JETS.contains(&name)
}
