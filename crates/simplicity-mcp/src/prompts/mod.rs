//! Simplicity MCP Prompt definitions
//!
//! Prompts provide guided workflows for writing, debugging and deploying
//! SimplicityHL contracts.

use serde_json::{Map, Value};

use simplicity_toolchain::{describe_features, generate_example_named, suggest_fix};

use crate::protocol::{Prompt, PromptArgument, PromptMessage, PromptsGetResult};

type PromptArgs = Map<String, Value>;

/// Get all prompt definitions
pub fn get_all_prompts() -> Vec<Prompt> {
    vec![
        Prompt {
            name: "write_contract".to_string(),
            title: Some("Write a SimplicityHL Contract".to_string()),
            description: Some(
                "Guided workflow for writing a contract that the current compiler accepts"
                    .to_string(),
            ),
            arguments: Some(vec![
                PromptArgument {
                    name: "description".to_string(),
                    description: Some("What the contract should enforce".to_string()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "pattern".to_string(),
                    description: Some(
                        "Example to start from: basic, comparison or assertion".to_string(),
                    ),
                    required: Some(false),
                },
            ]),
        },
        Prompt {
            name: "debug_compile_error".to_string(),
            title: Some("Debug a Compile Error".to_string()),
            description: Some(
                "Diagnose a compiler error and propose a corrected program".to_string(),
            ),
            arguments: Some(vec![
                PromptArgument {
                    name: "error_message".to_string(),
                    description: Some("Error text printed by the compiler".to_string()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "source".to_string(),
                    description: Some("Source code that failed to compile".to_string()),
                    required: Some(false),
                },
            ]),
        },
        Prompt {
            name: "deploy_contract".to_string(),
            title: Some("Deploy a Contract".to_string()),
            description: Some(
                "Compile, derive the address of and fund a contract on Liquid testnet"
                    .to_string(),
            ),
            arguments: Some(vec![
                PromptArgument {
                    name: "file_path".to_string(),
                    description: Some("Path to the .simf source file".to_string()),
                    required: Some(true),
                },
                PromptArgument {
                    name: "auto_fund".to_string(),
                    description: Some(
                        "Request testnet funds after deriving the address (true/false)"
                            .to_string(),
                    ),
                    required: Some(false),
                },
            ]),
        },
    ]
}

/// Get a specific prompt with arguments
pub fn get_prompt(name: &str, arguments: Option<&PromptArgs>) -> Result<PromptsGetResult, String> {
    match name {
        "write_contract" => get_write_contract_prompt(arguments),
        "debug_compile_error" => get_debug_compile_error_prompt(arguments),
        "deploy_contract" => get_deploy_contract_prompt(arguments),
        _ => Err(format!("Unknown prompt: {}", name)),
    }
}

fn required<'a>(arguments: Option<&'a PromptArgs>, name: &str) -> Result<&'a str, String> {
    arguments
        .and_then(|args| args.get(name))
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("Missing required argument: {}", name))
}

fn optional<'a>(arguments: Option<&'a PromptArgs>, name: &str) -> Option<&'a str> {
    arguments
        .and_then(|args| args.get(name))
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn get_write_contract_prompt(arguments: Option<&PromptArgs>) -> Result<PromptsGetResult, String> {
    let description = required(arguments, "description")?;
    let catalog = describe_features();

    let mut text = format!(
        "Write a SimplicityHL contract that does the following:\n\n{description}\n\n\
         The compiler ({version}) is limited. Stay within these rules:\n\
         - Supported: {supported}\n\
         - Not supported: {not_supported}\n\
         - Jets known to work: {jets}\n\n\
         Steps:\n\
         1. Call simplicity_generate_example for a starting point.\n\
         2. Write the program with all logic inside fn main, using assert! on jet results \
            instead of if/else or match.\n\
         3. Run simplicity_validate_syntax and fix every error it reports.\n\
         4. Compile with simplicity_compile_source; on failure pass the error to \
            simplicity_suggest_fix.\n\
         5. Show the final source and the compiled program.",
        description = description,
        version = catalog.version,
        supported = catalog.supported.join("; "),
        not_supported = catalog.not_supported.join("; "),
        jets = catalog.jets.working.join(", "),
    );
    if let Some(pattern) = optional(arguments, "pattern") {
        text.push_str(&format!(
            "\n\nStart from this example:\n\n```rust\n{}```\n",
            generate_example_named(pattern)
        ));
    }

    Ok(PromptsGetResult {
        description: Some(format!("Write a contract: {}", description)),
        messages: vec![PromptMessage::user(text)],
    })
}

fn get_debug_compile_error_prompt(
    arguments: Option<&PromptArgs>,
) -> Result<PromptsGetResult, String> {
    let error_message = required(arguments, "error_message")?;
    let source = optional(arguments, "source");

    let hints = suggest_fix(error_message)
        .into_iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    let mut text = format!(
        "The SimplicityHL compiler failed with:\n\n```\n{}\n```\n\n\
         Known causes for this kind of error:\n{}\n",
        error_message, hints
    );
    if let Some(source) = source {
        text.push_str(&format!("\nThe program was:\n\n```rust\n{}\n```\n", source));
    }
    text.push_str(
        "\nExplain what went wrong, then produce a corrected program. Check it with \
         simplicity_validate_syntax and compile it with simplicity_compile_source before \
         presenting it. Consult simplicity_get_features if a construct may be unsupported.",
    );

    Ok(PromptsGetResult {
        description: Some("Debug a SimplicityHL compile error".to_string()),
        messages: vec![PromptMessage::user(text)],
    })
}

fn get_deploy_contract_prompt(arguments: Option<&PromptArgs>) -> Result<PromptsGetResult, String> {
    let file_path = required(arguments, "file_path")?;
    let auto_fund = arguments
        .and_then(|args| args.get("auto_fund"))
        .map(|v| match v {
            Value::Bool(b) => *b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
        .unwrap_or(false);

    let funding = if auto_fund {
        "with auto_fund set to true so the testnet faucet pays the contract address"
    } else {
        "without auto-funding; afterwards offer to fund the address with simplicity_fund_address"
    };

    let text = format!(
        "Deploy the SimplicityHL contract at {file_path} to Liquid testnet.\n\n\
         1. Call simplicity_check_tools and stop with install instructions if simc or \
            hal-simplicity is missing.\n\
         2. Call simplicity_deploy_contract on {file_path} {funding}.\n\
         3. If it fails at the compile step, use the suggestions in the result (or \
            simplicity_suggest_fix) to repair the source and retry.\n\
         4. Report the contract address, the compiled program and the funding \
            transaction id, then list the next steps from the result.",
        file_path = file_path,
        funding = funding,
    );

    Ok(PromptsGetResult {
        description: Some(format!("Deploy {}", file_path)),
        messages: vec![PromptMessage::user(text)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PromptContent;
    use simplicity_toolchain::ExamplePattern;

    fn args(value: Value) -> PromptArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn first_text(result: &PromptsGetResult) -> &str {
        match &result.messages[0].content {
            PromptContent::Text { text } => text,
        }
    }

    #[test]
    fn test_get_all_prompts() {
        let names: Vec<_> = get_all_prompts().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["write_contract", "debug_compile_error", "deploy_contract"]);
    }

    #[test]
    fn test_write_contract_embeds_catalog() {
        let a = args(serde_json::json!({ "description": "only spendable with witness 42" }));
        let result = get_prompt("write_contract", Some(&a)).unwrap();
        let text = first_text(&result);
        assert!(text.contains("only spendable with witness 42"));
        assert!(text.contains("eq_32"));
        assert!(text.contains("match expressions"));
    }

    #[test]
    fn test_write_contract_starting_example() {
        let a = args(serde_json::json!({ "description": "x", "pattern": "comparison" }));
        let result = get_prompt("write_contract", Some(&a)).unwrap();
        assert!(first_text(&result)
            .contains(simplicity_toolchain::generate_example(ExamplePattern::Comparison)));

        // Unknown names fall back to the minimal program
        let a = args(serde_json::json!({ "description": "x", "pattern": "htlc" }));
        let result = get_prompt("write_contract", Some(&a)).unwrap();
        assert!(first_text(&result)
            .contains(simplicity_toolchain::generate_example(ExamplePattern::Basic)));

        let a = args(serde_json::json!({ "description": "x" }));
        assert!(!first_text(&get_prompt("write_contract", Some(&a)).unwrap())
            .contains("Start from this example"));
    }

    #[test]
    fn test_missing_required_argument() {
        assert_eq!(
            get_prompt("write_contract", None).unwrap_err(),
            "Missing required argument: description"
        );
        let a = args(serde_json::json!({ "source": "fn main() {}" }));
        assert!(get_prompt("debug_compile_error", Some(&a)).is_err());
    }

    #[test]
    fn test_debug_prompt_includes_suggestions() {
        let a = args(serde_json::json!({
            "error_message": "Type mismatch: expected u32, found u64",
            "source": "fn main() { () }"
        }));
        let result = get_prompt("debug_compile_error", Some(&a)).unwrap();
        let text = first_text(&result);
        assert!(text.contains("Type mismatch"));
        assert!(text.contains("fn main() { () }"));
        assert!(text.contains("\n- "));
    }

    #[test]
    fn test_deploy_prompt_auto_fund() {
        let a = args(serde_json::json!({ "file_path": "vault.simf", "auto_fund": "true" }));
        let result = get_prompt("deploy_contract", Some(&a)).unwrap();
        assert!(first_text(&result).contains("auto_fund set to true"));

        let a = args(serde_json::json!({ "file_path": "vault.simf" }));
        let result = get_prompt("deploy_contract", Some(&a)).unwrap();
        assert!(first_text(&result).contains("simplicity_fund_address"));
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(get_prompt("sign_transaction", None).is_err());
    }
}
