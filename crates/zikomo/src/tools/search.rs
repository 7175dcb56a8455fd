use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use zikomo_core::tool::{Tool, ToolOutput};

const TOPICS: [(&str, &str); 4] = [
    (
        "population",
        "According to recent data, New York City has approximately 8.8 \
         million residents, making it the most populous city in the United \
         States.",
    ),
    (
        "landmarks",
        "Famous landmarks include the Statue of Liberty, Empire State \
         Building, Central Park, Times Square, and Brooklyn Bridge.",
    ),
    (
        "food",
        "New York is known for its pizza, bagels, cheesecake, and diverse \
         international cuisine from its many cultural neighborhoods.",
    ),
    (
        "transport",
        "New York has an extensive subway system, buses, taxis, and is served \
         by three major airports: JFK, LaGuardia, and Newark.",
    ),
];

#[derive(Deserialize, JsonSchema)]
pub struct SearchParameters {
    #[schemars(description = "What to search for.")]
    query: String,
}

/// A mock search engine answering from a few canned topics.
pub struct SearchTool {
    parameter_schema: Value,
}

impl SearchTool {
    /// Creates a new search tool.
    #[inline]
    pub fn new() -> Self {
        SearchTool {
            parameter_schema: schema_for!(SearchParameters).to_value(),
        }
    }
}

impl Default for SearchTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SearchTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Use this to search for information on any topic."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchParameters,
    ) -> impl Future<Output = ToolOutput> + Send + 'static {
        ready(Ok(search(&input.query)))
    }
}

fn search(query: &str) -> String {
    let query_lower = query.to_lowercase();
    TOPICS
        .iter()
        .find(|(keyword, _)| query_lower.contains(keyword))
        .map(|(_, answer)| (*answer).to_owned())
        .unwrap_or_else(|| {
            format!(
                "Searched for '{query}'. Here are some general facts about \
                 this topic. [This is a mock search response.]"
            )
        })
}
