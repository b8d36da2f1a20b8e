use crate::engine::ParseStatistics;
use crate::tree::ParseNode;
use serde::Serialize;

/// JSON document printed by the command line
#[derive(Debug, Serialize)]
pub struct PipelineOutput<'a> {
    pub grammar: &'a str,
    pub start: &'a str,
    pub tree: &'a ParseNode,
    pub statistics: ParseStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl<'a> PipelineOutput<'a> {
    pub fn new(grammar: &'a str, start: &'a str, tree: &'a ParseNode, statistics: ParseStatistics) -> Self {
        Self {
            grammar,
            start,
            tree,
            statistics,
            value: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
