//! Compilation tools

use serde::{Deserialize, Serialize};
use std::path::Path;

use simplicity_toolchain::{validate, CompileResult, ValidationResult};

use super::{error_code, failure, invalid, parse_args, success, ToolContext};
use crate::invariants;
use crate::protocol::{codes, Tool, ToolAnnotations, ToolsCallResult};

/// Compile file input parameters
#[derive(Debug, Deserialize)]
pub struct CompileFileParams {
    /// Path to a `.simf` source file
    pub file_path: String,

    /// Optional witness file passed to the compiler
    #[serde(default)]
    pub witness_file: Option<String>,
}

/// Compile source input parameters
#[derive(Debug, Deserialize)]
pub struct CompileSourceParams {
    pub source: String,

    /// Run the syntax validator first and skip compiling on errors
    #[serde(default = "default_validate_first")]
    pub validate_first: bool,
}

fn default_validate_first() -> bool {
    true
}

#[derive(Serialize)]
struct CompileSourceOutput<'a> {
    #[serde(flatten)]
    compile: &'a CompileResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<&'a ValidationResult>,
}

fn compile_output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "program": { "type": "string", "description": "Base64-encoded program" },
            "witness": { "type": "string" },
            "error": { "type": "string" },
            "warnings": { "type": "array", "items": { "type": "string" } },
            "suggestions": { "type": "array", "items": { "type": "string" } },
            "install_hint": { "type": "string" }
        },
        "required": ["success"]
    })
}

pub fn compile_file_definition() -> Tool {
    Tool {
        name: "simplicity_compile_file".to_string(),
        title: Some("Compile SimplicityHL File".to_string()),
        description: "Compile a SimplicityHL (.simf) file with simc and return the base64 \
             program. Compiler errors come back verbatim with suggested fixes."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the .simf source file"
                },
                "witness_file": {
                    "type": "string",
                    "description": "Optional witness file (.wit) to compile with"
                }
            },
            "required": ["file_path"]
        }),
        output_schema: Some(compile_output_schema()),
        annotations: Some(ToolAnnotations::side_effecting(true, false)),
    }
}

pub fn compile_source_definition() -> Tool {
    Tool {
        name: "simplicity_compile_source".to_string(),
        title: Some("Compile SimplicityHL Source".to_string()),
        description: "Compile SimplicityHL source text. By default the source is checked by \
             the syntax validator first and is only compiled when no errors are found."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "source": {
                    "type": "string",
                    "description": "SimplicityHL source code"
                },
                "validate_first": {
                    "type": "boolean",
                    "default": true,
                    "description": "Validate syntax before compiling"
                }
            },
            "required": ["source"]
        }),
        output_schema: Some(compile_output_schema()),
        annotations: Some(ToolAnnotations::side_effecting(true, false)),
    }
}

pub async fn execute_compile_file(ctx: &ToolContext, arguments: serde_json::Value) -> ToolsCallResult {
    let params: CompileFileParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let file_path = match invariants::validate_file_path("file_path", &params.file_path) {
        Ok(p) => p,
        Err(e) => return invalid(e),
    };
    let witness_file = match params.witness_file.as_deref() {
        Some(w) => match invariants::validate_file_path("witness_file", w) {
            Ok(w) => Some(Path::new(w)),
            Err(e) => return invalid(e),
        },
        None => None,
    };

    let result = ctx
        .gateway
        .compile_file(Path::new(file_path), witness_file)
        .await;
    render(&result, &result)
}

pub async fn execute_compile_source(
    ctx: &ToolContext,
    arguments: serde_json::Value,
) -> ToolsCallResult {
    let params: CompileSourceParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let source = match invariants::validate_source(&params.source) {
        Ok(s) => s,
        Err(e) => return invalid(e),
    };

    if params.validate_first {
        let validation = validate(source);
        if !validation.is_valid() {
            let result = CompileResult::failed(
                format!(
                    "Validation failed with {} error(s): {}",
                    validation.errors().len(),
                    validation.errors().join("; ")
                ),
                validation.suggestions().to_vec(),
            );
            let output = CompileSourceOutput {
                compile: &result,
                validation: Some(&validation),
            };
            let text = super::describe_failure(
                "Not compiled",
                result.error.as_deref(),
                None,
                &result.suggestions,
            );
            return failure(text, &output, None);
        }

        let result = ctx.gateway.compile_source(source).await;
        let output = CompileSourceOutput {
            compile: &result,
            validation: Some(&validation),
        };
        return render(&result, &output);
    }

    let result = ctx.gateway.compile_source(source).await;
    let output = CompileSourceOutput {
        compile: &result,
        validation: None,
    };
    render(&result, &output)
}

fn render<T: Serialize>(result: &CompileResult, structured: &T) -> ToolsCallResult {
    if result.success {
        let mut text = format!(
            "Compiled successfully\n└─ Program: {}",
            result.program.as_deref().unwrap_or_default()
        );
        if let Some(witness) = &result.witness {
            text.push_str(&format!("\n   Witness: {}", witness));
        }
        for warning in &result.warnings {
            text.push_str(&format!("\nwarning: {}", warning));
        }
        return success(text, structured);
    }

    let text = super::describe_failure(
        "Compilation failed",
        result.error.as_deref(),
        result.install_hint.as_deref(),
        &result.suggestions,
    );
    let code = error_code(
        result.error.as_deref(),
        result.install_hint.as_deref(),
        Some(codes::COMPILE_FAILED),
    );
    failure(text, structured, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use simplicity_toolchain::{ScriptedFaucet, ScriptedReply, ScriptedRunner};
    use std::io::Write;
    use std::sync::Arc;

    const PROGRAM: &str = "zSQIS29W33fvVt93hgGA";

    #[tokio::test]
    async fn test_compile_source_success() {
        let runner = Arc::new(
            ScriptedRunner::all_installed()
                .reply("simc", ScriptedReply::stdout(format!("Program:\n{}\n", PROGRAM))),
        );
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let result = execute_compile_source(
            &ctx,
            serde_json::json!({ "source": "fn main() {\n    ()\n}\n" }),
        )
        .await;

        assert!(!result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["program"], PROGRAM);
        assert_eq!(structured["validation"]["valid"], true);
        assert_eq!(runner.calls_to("simc"), 1);
    }

    #[tokio::test]
    async fn test_validation_blocks_compile() {
        let runner = Arc::new(ScriptedRunner::all_installed());
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let source = "fn main() {\n    if true { () } else { () }\n}\n";
        let result = execute_compile_source(&ctx, serde_json::json!({ "source": source })).await;

        assert!(result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["validation"]["valid"], false);
        assert!(structured.get("errorCode").is_none());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_validation_can_be_skipped() {
        let runner = Arc::new(
            ScriptedRunner::all_installed()
                .reply("simc", ScriptedReply::failure("Expected ';', found 'else'")),
        );
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let source = "fn main() {\n    if true { () } else { () }\n}\n";
        let result = execute_compile_source(
            &ctx,
            serde_json::json!({ "source": source, "validate_first": false }),
        )
        .await;

        assert!(result.is_error());
        assert_eq!(runner.calls_to("simc"), 1);
        let structured = result.structured_content.clone().unwrap();
        assert_eq!(structured["errorCode"], codes::COMPILE_FAILED);
        assert!(structured.get("validation").is_none());
        assert!(testing::text(&result).contains("Expected ';', found 'else'"));
    }

    #[tokio::test]
    async fn test_compile_file_missing_compiler() {
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let mut file = tempfile::Builder::new().suffix(".simf").tempfile().unwrap();
        writeln!(file, "fn main() {{ () }}").unwrap();

        let result = execute_compile_file(
            &ctx,
            serde_json::json!({ "file_path": file.path().display().to_string() }),
        )
        .await;

        assert!(result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["errorCode"], codes::TOOL_NOT_INSTALLED);
        assert!(structured["install_hint"].as_str().unwrap().contains("simc"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_compile_file_timeout() {
        let runner = Arc::new(ScriptedRunner::all_installed().reply("simc", ScriptedReply::Timeout));
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let mut file = tempfile::Builder::new().suffix(".simf").tempfile().unwrap();
        writeln!(file, "fn main() {{ () }}").unwrap();

        let result = execute_compile_file(
            &ctx,
            serde_json::json!({ "file_path": file.path().display().to_string() }),
        )
        .await;

        let structured = result.structured_content.unwrap();
        assert_eq!(structured["errorCode"], codes::PROCESS_TIMEOUT);
    }

    #[tokio::test]
    async fn test_invalid_parameters() {
        let ctx = crate::tools::ToolContext::mock();

        let result = execute_compile_file(&ctx, serde_json::json!({})).await;
        assert!(testing::text(&result).starts_with("Invalid parameters"));

        let result = execute_compile_source(&ctx, serde_json::json!({ "source": "   " })).await;
        assert!(result.is_error());
        assert!(result.structured_content.is_none());
    }
}
