use serde::Deserialize;

pub const DEFAULT_SOURCE_URL: &str = "https://linkdoctor.io/";
pub const DEFAULT_PROMPT: &str =
    "Find some information about what does the company do, the name and a contact email.";

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    pub api_key: Option<String>,
    pub source_url: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Default)]
pub struct ChartImageQuery {
    pub chart_url: Option<String>,
}

impl ChartImageQuery {
    /// Builds the query from raw pairs. A repeated `chart_url` keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let chart_url = pairs
            .into_iter()
            .find(|(key, _)| key == "chart_url")
            .map(|(_, value)| value);

        Self { chart_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_chart_url_wins() {
        let query = ChartImageQuery::from_pairs(pairs(&[
            ("other", "x"),
            ("chart_url", "http://a.test/1.png"),
            ("chart_url", "http://b.test/2.png"),
        ]));
        assert_eq!(query.chart_url.as_deref(), Some("http://a.test/1.png"));
    }

    #[test]
    fn missing_chart_url_is_none() {
        assert!(ChartImageQuery::from_pairs(pairs(&[("other", "x")])).chart_url.is_none());
    }
}
