//! Simplicity MCP Resource definitions
//!
//! Resources provide readable context data to agents: the feature catalog,
//! live toolchain status and the example programs.

use simplicity_toolchain::{describe_features, generate_example, ExamplePattern};

use crate::invariants;
use crate::protocol::{
    JsonRpcError, Resource, ResourceContent, ResourceTemplate, ResourcesReadResult,
};
use crate::tools::{status_json, ToolContext};

const FEATURES_URI: &str = "simplicity://features";
const TOOLS_STATUS_URI: &str = "simplicity://tools/status";
const EXAMPLES_PREFIX: &str = "simplicity://examples/";

/// Get all resource definitions
pub fn get_all_resources() -> Vec<Resource> {
    let mut resources = vec![
        Resource {
            uri: FEATURES_URI.to_string(),
            name: "Feature Catalog".to_string(),
            title: Some("SimplicityHL Feature Catalog".to_string()),
            description: Some(
                "Supported, partially supported and rejected language features plus the \
                 working jet list"
                    .to_string(),
            ),
            mime_type: Some("application/json".to_string()),
        },
        Resource {
            uri: TOOLS_STATUS_URI.to_string(),
            name: "Toolchain Status".to_string(),
            title: Some("External Binary Availability".to_string()),
            description: Some(
                "Which of simc, hal-simplicity and hal-simplicity-pset are installed, checked \
                 on every read"
                    .to_string(),
            ),
            mime_type: Some("application/json".to_string()),
        },
    ];

    resources.extend(ExamplePattern::ALL.into_iter().map(|pattern| Resource {
        uri: format!("{}{}", EXAMPLES_PREFIX, pattern.name()),
        name: format!("Example: {}", pattern.name()),
        title: None,
        description: Some(pattern.description().to_string()),
        mime_type: Some("text/plain".to_string()),
    }));

    resources
}

/// Get all resource templates
pub fn get_all_templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: format!("{}{{pattern}}", EXAMPLES_PREFIX),
        name: "Example Program".to_string(),
        title: Some("SimplicityHL Example by Pattern".to_string()),
        description: Some(format!(
            "Example source for a pattern ({})",
            ExamplePattern::ALL
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ")
        )),
        mime_type: Some("text/plain".to_string()),
    }]
}

/// Read a resource by URI
pub fn read_resource(ctx: &ToolContext, uri: &str) -> Result<ResourcesReadResult, JsonRpcError> {
    invariants::validate_resource_uri(uri)?;

    match uri {
        FEATURES_URI => json_content(uri, &describe_features()),
        TOOLS_STATUS_URI => json_content(uri, &status_json(ctx)),
        _ => match uri.strip_prefix(EXAMPLES_PREFIX) {
            Some(name) => {
                let pattern = name
                    .parse::<ExamplePattern>()
                    .map_err(|_| JsonRpcError::resource_not_found(uri))?;
                Ok(ResourcesReadResult {
                    contents: vec![ResourceContent {
                        uri: uri.to_string(),
                        mime_type: Some("text/plain".to_string()),
                        text: Some(generate_example(pattern).to_string()),
                    }],
                })
            }
            None => Err(JsonRpcError::resource_not_found(uri)),
        },
    }
}

fn json_content<T: serde::Serialize>(
    uri: &str,
    value: &T,
) -> Result<ResourcesReadResult, JsonRpcError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| JsonRpcError::internal_error(e.to_string()))?;
    Ok(ResourcesReadResult {
        contents: vec![ResourceContent {
            uri: uri.to_string(),
            mime_type: Some("application/json".to_string()),
            text: Some(text),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codes;

    #[test]
    fn test_get_all_resources() {
        let resources = get_all_resources();
        assert_eq!(resources.len(), 2 + ExamplePattern::ALL.len());
        assert!(resources.iter().any(|r| r.uri == "simplicity://examples/assertion"));
    }

    #[test]
    fn test_read_features() {
        let ctx = ToolContext::mock();
        let result = read_resource(&ctx, "simplicity://features").unwrap();
        let text = result.contents[0].text.as_deref().unwrap();
        let catalog: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(catalog["version"], simplicity_toolchain::CATALOG_VERSION);
    }

    #[test]
    fn test_read_tools_status() {
        let ctx = ToolContext::mock();
        let result = read_resource(&ctx, "simplicity://tools/status").unwrap();
        let status: serde_json::Value =
            serde_json::from_str(result.contents[0].text.as_deref().unwrap()).unwrap();
        assert_eq!(status["compilerAvailable"], true);
    }

    #[test]
    fn test_read_example_template() {
        let ctx = ToolContext::mock();
        let result = read_resource(&ctx, "simplicity://examples/comparison").unwrap();
        assert!(result.contents[0]
            .text
            .as_deref()
            .unwrap()
            .contains("jet::lt_32"));
    }

    #[test]
    fn test_unknown_resources() {
        let ctx = ToolContext::mock();
        let err = read_resource(&ctx, "simplicity://examples/timelock").unwrap_err();
        assert_eq!(err.code, codes::RESOURCE_NOT_FOUND);

        let err = read_resource(&ctx, "simplicity://nothing").unwrap_err();
        assert_eq!(err.code, codes::RESOURCE_NOT_FOUND);

        let err = read_resource(&ctx, "file:///etc/passwd").unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);
    }
}
