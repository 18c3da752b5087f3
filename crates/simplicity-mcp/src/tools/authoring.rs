//! Authoring aids: validation, feature catalog, examples and fix suggestions
//!
//! None of these spawn processes; they answer from the toolchain crate's
//! static tables.

use serde::Deserialize;

use simplicity_toolchain::{
    describe_features, generate_example, suggest_fix, validate, ExamplePattern,
};

use super::{failure, invalid, parse_args, success};
use crate::invariants;
use crate::protocol::{Tool, ToolAnnotations, ToolContent, ToolsCallResult};

#[derive(Debug, Deserialize)]
pub struct ValidateSyntaxParams {
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateExampleParams {
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestFixParams {
    pub error_message: String,
}

pub fn validate_syntax_definition() -> Tool {
    Tool {
        name: "simplicity_validate_syntax".to_string(),
        title: Some("Validate SimplicityHL Syntax".to_string()),
        description: "Check SimplicityHL source for constructs the current compiler rejects \
             (if/else, match, top-level let) and warn about partially supported ones. \
             A heuristic pre-filter: passing code may still fail to compile."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "source": {
                    "type": "string",
                    "description": "SimplicityHL source code"
                }
            },
            "required": ["source"]
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "valid": { "type": "boolean" },
                "errors": { "type": "array", "items": { "type": "string" } },
                "warnings": { "type": "array", "items": { "type": "string" } },
                "suggestions": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["valid", "errors", "warnings", "suggestions"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn get_features_definition() -> Tool {
    Tool {
        name: "simplicity_get_features".to_string(),
        title: Some("List Supported Features".to_string()),
        description: "List the SimplicityHL features and jets the current compiler supports, \
             partially supports and rejects. Read this before writing a contract."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "version": { "type": "string" },
                "supported": { "type": "array", "items": { "type": "string" } },
                "notSupported": { "type": "array", "items": { "type": "string" } },
                "partiallySupported": { "type": "array", "items": { "type": "string" } },
                "jets": {
                    "type": "object",
                    "properties": {
                        "working": { "type": "array", "items": { "type": "string" } },
                        "notTested": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn generate_example_definition() -> Tool {
    let patterns: Vec<&str> = ExamplePattern::ALL.iter().map(|p| p.name()).collect();
    Tool {
        name: "simplicity_generate_example".to_string(),
        title: Some("Generate Example Contract".to_string()),
        description: "Return a SimplicityHL example that compiles with the current compiler."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "enum": patterns,
                    "default": "basic",
                    "description": "Example pattern"
                }
            }
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string" },
                "description": { "type": "string" },
                "source": { "type": "string" }
            },
            "required": ["pattern", "source"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn suggest_fix_definition() -> Tool {
    Tool {
        name: "simplicity_suggest_fix".to_string(),
        title: Some("Suggest Fix".to_string()),
        description: "Map a compiler error message to concrete suggestions for fixing it."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "error_message": {
                    "type": "string",
                    "description": "Error text printed by the compiler"
                }
            },
            "required": ["error_message"]
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "suggestions": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["suggestions"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn execute_validate_syntax(arguments: serde_json::Value) -> ToolsCallResult {
    let params: ValidateSyntaxParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let source = match invariants::validate_source(&params.source) {
        Ok(s) => s,
        Err(e) => return invalid(e),
    };

    let result = validate(source);

    let mut text = if result.is_valid() {
        "Valid".to_string()
    } else {
        format!("Invalid ({} error(s))", result.errors().len())
    };
    for error in result.errors() {
        text.push_str(&format!("\nerror: {}", error));
    }
    for warning in result.warnings() {
        text.push_str(&format!("\nwarning: {}", warning));
    }
    for suggestion in result.suggestions() {
        text.push_str(&format!("\nhint: {}", suggestion));
    }

    // An invalid program is a normal answer, not a tool failure
    success(text, &result)
}

pub fn execute_get_features() -> ToolsCallResult {
    let catalog = describe_features();
    ToolsCallResult::success_with_structured(
        vec![ToolContent::json(&catalog)],
        serde_json::to_value(&catalog).unwrap_or(serde_json::Value::Null),
    )
}

pub fn execute_generate_example(arguments: serde_json::Value) -> ToolsCallResult {
    let params: GenerateExampleParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };

    let pattern = match params.pattern.as_deref() {
        None => ExamplePattern::Basic,
        Some(name) => match name.parse::<ExamplePattern>() {
            Ok(pattern) => pattern,
            Err(message) => {
                let available: Vec<&str> = ExamplePattern::ALL.iter().map(|p| p.name()).collect();
                return failure(
                    message,
                    &serde_json::json!({ "available": available }),
                    None,
                );
            }
        },
    };

    let source = generate_example(pattern);
    let structured = serde_json::json!({
        "pattern": pattern.name(),
        "description": pattern.description(),
        "source": source,
    });
    success(source, &structured)
}

pub fn execute_suggest_fix(arguments: serde_json::Value) -> ToolsCallResult {
    let params: SuggestFixParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };

    let suggestions = suggest_fix(&params.error_message);
    let text = suggestions
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");
    success(text, &serde_json::json!({ "suggestions": suggestions }))
}
