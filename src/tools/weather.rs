//! 天气查询工具（演示用内置数据，不访问外部 API）

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolParam};

/// 天气查询：按城市名返回内置的当前天气
pub struct WeatherTool;

const WEATHER_DATA: &[(&str, &str)] = &[
    ("new york", "72°F, Partly Cloudy"),
    ("san francisco", "65°F, Foggy"),
    ("london", "60°F, Rainy"),
    ("tokyo", "78°F, Sunny"),
    ("paris", "68°F, Clear"),
];

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a location"
    }

    fn parameters(&self) -> Vec<ToolParam> {
        vec![ToolParam::required("location", "string")]
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let location = args
            .get("location")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "missing required arg: location".to_string())?;

        let key = location.trim().to_lowercase();
        match WEATHER_DATA.iter().find(|(city, _)| *city == key) {
            Some((_, report)) => Ok(format!("Current weather in {}: {}", title_case(&key), report)),
            None => Ok(format!("Weather information not available for {location}")),
        }
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_known_city() {
        let out = WeatherTool
            .execute(json!({"location": "Tokyo"}))
            .await
            .unwrap();
        assert_eq!(out, "Current weather in Tokyo: 78°F, Sunny");
    }

    #[tokio::test]
    async fn test_unknown_city() {
        let out = WeatherTool
            .execute(json!({"location": "Atlantis"}))
            .await
            .unwrap();
        assert!(out.contains("not available"));
    }
}
