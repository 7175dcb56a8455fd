use std::future::ready;

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde::de::{self, Deserializer};
use serde_json::Value;
use zikomo_core::tool::{Tool, ToolOutput};

/// A city with weather reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum City {
    Nyc,
    Sf,
    Toronto,
    London,
    Nairobi,
}

impl<'de> Deserialize<'de> for City {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        const NAMES: &[&str] = &["nyc", "sf", "toronto", "london", "nairobi"];

        let name = String::deserialize(deserializer)?;
        match name.trim().to_ascii_lowercase().as_str() {
            "nyc" => Ok(City::Nyc),
            "sf" => Ok(City::Sf),
            "toronto" => Ok(City::Toronto),
            "london" => Ok(City::London),
            "nairobi" => Ok(City::Nairobi),
            _ => Err(de::Error::unknown_variant(&name, NAMES)),
        }
    }
}

impl City {
    fn report(self) -> &'static str {
        match self {
            City::Nyc => {
                "It might be cloudy in NYC with temperatures around 65°F."
            }
            City::Sf => {
                "It's sunny in San Francisco with temperatures around 70°F."
            }
            City::Toronto => {
                "It's currently snowing in Toronto with temperatures around \
                 28°F."
            }
            City::London => {
                "It's rainy in London with temperatures around 55°F."
            }
            City::Nairobi => {
                "It's warm and partly cloudy in Nairobi with temperatures \
                 around 75°F."
            }
        }
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct WeatherParameters {
    #[schemars(description = "The city to get the weather for.")]
    city: City,
}

/// A tool for getting the current weather of a few cities.
pub struct WeatherTool {
    parameter_schema: Value,
}

impl WeatherTool {
    /// Creates a new weather tool.
    #[inline]
    pub fn new() -> Self {
        WeatherTool {
            parameter_schema: schema_for!(WeatherParameters).to_value(),
        }
    }
}

impl Default for WeatherTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WeatherTool {
    type Input = WeatherParameters;

    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Use this to get weather information for specific cities."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WeatherParameters,
    ) -> impl Future<Output = ToolOutput> + Send + 'static {
        ready(Ok(input.city.report().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_schema_lists_cities() {
        let tool = WeatherTool::new();
        let schema = tool.parameter_schema().to_string();
        for city in ["nyc", "sf", "toronto", "london", "nairobi"] {
            assert!(schema.contains(&format!("\"{city}\"")), "{city}");
        }
    }

    #[tokio::test]
    async fn test_report() {
        let tool = WeatherTool::new();
        let input = serde_json::from_value(json!({ "city": "nairobi" }));
        let output = tool.execute(input.unwrap()).await.unwrap();
        assert!(output.contains("Nairobi"));
    }

    #[test]
    fn test_unknown_city() {
        let input = serde_json::from_value::<WeatherParameters>(
            json!({ "city": "paris" }),
        );
        assert!(input.is_err());
    }

    #[test]
    fn test_city_ignores_case() {
        for name in ["Nyc", "NYC", "nAiRoBi"] {
            let input = serde_json::from_value::<WeatherParameters>(
                json!({ "city": name }),
            );
            assert!(input.is_ok(), "{name}");
        }
        let input: WeatherParameters =
            serde_json::from_value(json!({ "city": "Nyc" })).unwrap();
        assert_eq!(input.city, City::Nyc);
    }
}
