//! Working SimplicityHL example programs
//!
//! Each pattern only uses constructs and jets the catalog lists as working,
//! and each one passes the validator cleanly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Example program patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamplePattern {
    /// Smallest program the compiler accepts
    Basic,
    /// Comparisons using working jets
    Comparison,
    /// Assertion-based validation of a witness value
    Assertion,
}

impl ExamplePattern {
    pub const ALL: [ExamplePattern; 3] = [
        ExamplePattern::Basic,
        ExamplePattern::Comparison,
        ExamplePattern::Assertion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExamplePattern::Basic => "basic",
            ExamplePattern::Comparison => "comparison",
            ExamplePattern::Assertion => "assertion",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExamplePattern::Basic => "Minimal program that always succeeds",
            ExamplePattern::Comparison => "Integer comparisons with jet::eq_32 and jet::lt_32",
            ExamplePattern::Assertion => "Spend guarded by an assertion on a witness value",
        }
    }
}

impl fmt::Display for ExamplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExamplePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "minimal" => Ok(ExamplePattern::Basic),
            "comparison" | "compare" => Ok(ExamplePattern::Comparison),
            "assertion" | "assert" => Ok(ExamplePattern::Assertion),
            other => Err(format!(
                "Unknown example pattern: {}. Available: basic, comparison, assertion",
                other
            )),
        }
    }
}

const BASIC: &str = "\
// Minimal SimplicityHL program: always succeeds.
fn main() {
    ()
}
";

const COMPARISON: &str = "\
// Compare fixed-width integers with working jets.
fn main() {
    let a: u32 = 10;
    let b: u32 = 20;

    // a < b
    assert!(jet::lt_32(a, b));

    // a == c
    let c: u32 = 10;
    assert!(jet::eq_32(a, c));
}
";

const ASSERTION: &str = "\
// Spendable only with the witness value 42.
fn main() {
    let expected: u32 = 42;
    let provided: u32 = witness::VALUE;
    assert!(jet::eq_32(provided, expected));
}
";

/// Source text for a pattern
pub fn generate_example(pattern: ExamplePattern) -> &'static str {
    match pattern {
        ExamplePattern::Basic => BASIC,
        ExamplePattern::Comparison => COMPARISON,
        ExamplePattern::Assertion => ASSERTION,
    }
}

/// Source text for a pattern name, falling back to the minimal program
pub fn generate_example_named(name: &str) -> &'static str {
    match name.parse::<ExamplePattern>() {
        Ok(pattern) => generate_example(pattern),
        Err(e) => {
            warn!("{}; returning the basic example", e);
            BASIC
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Minimal".parse::<ExamplePattern>(), Ok(ExamplePattern::Basic));
        assert_eq!(" assert ".parse::<ExamplePattern>(), Ok(ExamplePattern::Assertion));
        assert!("timelock".parse::<ExamplePattern>().is_err());
    }

    #[test]
    fn test_unknown_name_falls_back_to_basic() {
        assert_eq!(generate_example_named("htlc"), BASIC);
        assert_eq!(generate_example_named("comparison"), COMPARISON);
    }

    #[test]
    fn test_names_round_trip() {
        for pattern in ExamplePattern::ALL {
            assert_eq!(pattern.name().parse::<ExamplePattern>(), Ok(pattern));
        }
    }
}
