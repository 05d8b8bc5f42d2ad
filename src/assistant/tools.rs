//! Tool declarations offered to the assistant

use crate::provider::ToolSchema;
use serde_json::json;

/// Tool that saves new glossary entries
pub const ADD_GLOSSARY_TOOL: &str = "add_to_glossary";

/// Tool that removes glossary entries by original term
pub const REMOVE_GLOSSARY_TOOL: &str = "remove_from_glossary";

/// Both glossary tools, in declaration order
pub fn glossary_tools() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: ADD_GLOSSARY_TOOL.to_string(),
            description: "Save new terms to the project glossary.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "original": { "type": "string" },
                                "translated": { "type": "string" }
                            },
                            "required": ["original", "translated"]
                        }
                    }
                },
                "required": ["items"]
            }),
        },
        ToolSchema {
            name: REMOVE_GLOSSARY_TOOL.to_string(),
            description: "Remove terms from the project glossary by their original term."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "originals": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Original terms to remove."
                    }
                },
                "required": ["originals"]
            }),
        },
    ]
}
