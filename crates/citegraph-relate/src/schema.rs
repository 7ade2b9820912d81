//! Classifier reply schema.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use citegraph_core::{Confidence, Error, RelationType, Result};
use citegraph_llm::OutputSchema;

pub const SCHEMA_NAME: &str = "RelationshipAnalysis";

/// One relationship the classifier found between the two papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Taxonomy name as written by the classifier, e.g. `"Adapts-from"`.
    #[serde(rename = "type")]
    pub relation_type: String,
    pub confidence: Confidence,
    pub evidence: String,
    pub explanation: String,
}

/// Full classifier reply for one citation pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipAnalysis {
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub no_relationship_reason: Option<String>,
}

impl RelationshipAnalysis {
    /// Reject replies that parsed but carry an empty relationship type.
    pub fn validate(&self) -> Result<()> {
        if let Some(i) = self
            .relationships
            .iter()
            .position(|r| r.relation_type.trim().is_empty())
        {
            return Err(Error::Validation(format!("relationship {} has an empty type", i)));
        }
        Ok(())
    }
}

/// JSON schema sent to the model alongside the prompt.
pub fn json_schema() -> Value {
    let names: Vec<&str> = RelationType::ALL.iter().map(|t| t.name()).collect();
    json!({
        "type": "object",
        "properties": {
            "relationships": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": names},
                        "confidence": {"type": "string", "enum": ["high", "medium", "low"]},
                        "evidence": {"type": "string"},
                        "explanation": {"type": "string"}
                    },
                    "required": ["type", "confidence", "evidence", "explanation"]
                }
            },
            "no_relationship_reason": {"type": ["string", "null"]}
        },
        "required": ["relationships"]
    })
}

pub fn output_schema() -> OutputSchema {
    OutputSchema::new(SCHEMA_NAME, json_schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_llm::structured::parse_reply;

    #[test]
    fn test_reply_parses() {
        let reply = r#"{
            "relationships": [
                {"type": "Extends", "confidence": "high", "evidence": "builds on", "explanation": "x"}
            ]
        }"#;
        let analysis: RelationshipAnalysis = parse_reply(reply).unwrap();
        assert_eq!(analysis.relationships.len(), 1);
        assert_eq!(analysis.relationships[0].confidence, Confidence::High);
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn test_bad_confidence_is_validation_error() {
        let reply = r#"{"relationships": [
            {"type": "Extends", "confidence": "certain", "evidence": "", "explanation": ""}
        ]}"#;
        assert!(matches!(parse_reply::<RelationshipAnalysis>(reply), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_type_fails_validation() {
        let analysis = RelationshipAnalysis {
            relationships: vec![Relationship {
                relation_type: " ".into(),
                confidence: Confidence::Low,
                evidence: String::new(),
                explanation: String::new(),
            }],
            no_relationship_reason: None,
        };
        assert!(matches!(analysis.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_schema_lists_every_type() {
        let schema = json_schema();
        let types = schema["properties"]["relationships"]["items"]["properties"]["type"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(types.len(), RelationType::ALL.len());
        assert!(types.iter().any(|t| t == "Adapts-from"));
    }
}
