//! Property and consistency tests across the authoring helpers

use proptest::prelude::*;

use simplicity_toolchain::catalog::{WORKING_JETS, UNTESTED_JETS};
use simplicity_toolchain::{
    describe_features, generate_example, suggest_fix, validate, ExamplePattern,
};

proptest! {
    #[test]
    fn validation_is_pure(source in ".{0,400}") {
        let first = validate(&source);
        let second = validate(&source);
        prop_assert_eq!(first.is_valid(), second.is_valid());
        prop_assert_eq!(first.errors(), second.errors());
        prop_assert_eq!(first.warnings(), second.warnings());
        prop_assert_eq!(first.suggestions(), second.suggestions());
    }

    #[test]
    fn valid_iff_no_errors(source in "(fn|let|if|match|jet::[a-z_0-9]{1,8}|main|\\{|\\}|\\(|\\)|;| |\n){0,40}") {
        let result = validate(&source);
        prop_assert_eq!(result.is_valid(), result.errors().is_empty());
    }

    #[test]
    fn suggestions_never_empty(message in ".{0,300}") {
        let hints = suggest_fix(&message);
        prop_assert!(!hints.is_empty());
        prop_assert_eq!(hints, suggest_fix(&message));
    }

    #[test]
    fn suggestions_have_no_duplicates(message in "(type mismatch|unknown jet|witness|main|expected end of input|jet::add_9| ){0,12}") {
        let hints = suggest_fix(&message);
        for (i, hint) in hints.iter().enumerate() {
            prop_assert!(!hints[i + 1..].contains(hint));
        }
    }
}

#[test]
fn examples_validate_cleanly() {
    for pattern in ExamplePattern::ALL {
        let source = generate_example(pattern);
        let result = validate(source);
        assert!(result.is_valid(), "{} example: {:?}", pattern, result.errors());
        assert!(result.warnings().is_empty(), "{} example: {:?}", pattern, result.warnings());
    }
}

#[test]
fn examples_use_only_working_jets() {
    for pattern in ExamplePattern::ALL {
        let source = generate_example(pattern);
        for (idx, _) in source.match_indices("jet::") {
            let name: String = source[idx + 5..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            assert!(WORKING_JETS.contains(&name.as_str()), "{} uses jet::{}", pattern, name);
        }
    }
}

#[test]
fn catalog_jet_lists_disjoint() {
    let catalog = describe_features();
    for jet in &catalog.jets.working {
        assert!(!catalog.jets.not_tested.contains(jet), "{} listed twice", jet);
    }
    assert_eq!(catalog.jets.working.len(), WORKING_JETS.len());
    assert_eq!(catalog.jets.not_tested.len(), UNTESTED_JETS.len());
}

#[test]
fn unsupported_features_are_rejected() {
    use simplicity_toolchain::catalog::Construct;

    let catalog = describe_features();
    for construct in Construct::ALL {
        assert!(catalog.not_supported.iter().any(|f| f == construct.feature()));
        let result = validate(construct.sample());
        assert!(
            !result.is_valid(),
            "{} should be rejected",
            construct.feature()
        );
        assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
        assert!(
            result.errors()[0].contains(construct.feature()),
            "{:?} does not name {}",
            result.errors(),
            construct.feature()
        );
    }
}
