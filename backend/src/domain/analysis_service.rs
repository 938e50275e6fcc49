//! On-demand AI summary of the report log.
//!
//! The model call sits behind [`ReportAnalyzer`]. [`AnalysisService`] never
//! fails: a missing key, a failed call or an empty answer each produce a
//! localized message instead.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Value};
use shared::{Language, Member, Report, Tcf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::directory::Directory;
use crate::config::AnalysisConfig;

#[async_trait]
pub trait ReportAnalyzer: Send + Sync {
    /// Send `prompt` to the model and return its text answer
    async fn analyze(&self, prompt: &str) -> Result<String>;
}

/// Client for the Generative Language `generateContent` endpoint
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: String, endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client for analysis")?;

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Concatenated text parts of the first candidate
    fn extract_text(body: &Value) -> String {
        body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, prompt: &str) -> Result<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the analysis service")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Analysis request failed with status {}", status));
        }

        let payload: Value = response
            .json()
            .await
            .context("Analysis response was not valid JSON")?;
        Ok(Self::extract_text(&payload))
    }
}

struct Messages {
    missing_key: &'static str,
    failed: &'static str,
    empty: &'static str,
}

fn messages(language: Language) -> Messages {
    match language {
        Language::En => Messages {
            missing_key: "API Key is missing. Please configure your environment.",
            failed: "Failed to analyze reports due to an error.",
            empty: "No analysis could be generated.",
        },
        Language::Fa => Messages {
            missing_key: "کلید API وجود ندارد. لطفا محیط خود را تنظیم کنید.",
            failed: "خطا در تحلیل گزارش‌ها.",
            empty: "تحلیلی ایجاد نشد.",
        },
    }
}

#[derive(Clone, Default)]
pub struct AnalysisService {
    analyzer: Option<Arc<dyn ReportAnalyzer>>,
}

impl AnalysisService {
    pub fn new(analyzer: Option<Arc<dyn ReportAnalyzer>>) -> Self {
        Self { analyzer }
    }

    /// Use the Gemini client when an API key is configured. A client that
    /// can't be built leaves the service unconfigured.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let Some(key) = config.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
            return Self::default();
        };

        match GeminiAnalyzer::new(key.to_string(), config.model.clone(), config.endpoint.clone()) {
            Ok(analyzer) => Self {
                analyzer: Some(Arc::new(analyzer)),
            },
            Err(e) => {
                error!("Report analysis disabled: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.analyzer.is_some()
    }

    pub async fn analyze_reports(
        &self,
        reports: &[Report],
        members: &[Member],
        tcfs: &[Tcf],
        language: Language,
    ) -> String {
        let text = messages(language);
        let Some(analyzer) = &self.analyzer else {
            return text.missing_key.to_string();
        };

        let prompt = build_prompt(reports, members, tcfs, language);
        info!("Requesting analysis of {} report(s)", reports.len());

        match analyzer.analyze(&prompt).await {
            Ok(answer) if answer.trim().is_empty() => text.empty.to_string(),
            Ok(answer) => answer,
            Err(e) => {
                error!("Report analysis failed: {:#}", e);
                text.failed.to_string()
            }
        }
    }
}

/// One line per report with references resolved to display names
pub fn data_context(reports: &[Report], members: &[Member], tcfs: &[Tcf]) -> String {
    let directory = Directory::new(members, tcfs);

    reports
        .iter()
        .map(|report| {
            let date = DateTime::from_timestamp_millis(report.timestamp)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!(
                "Date: {}, Time: {}, Member: {}, TCF: {}, Description: {}",
                date,
                report.start_time.as_deref().unwrap_or(""),
                directory.member_name(&report.member_id),
                directory.tcf_name(&report.tcf_id),
                report
                    .description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or("N/A"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(reports: &[Report], members: &[Member], tcfs: &[Tcf], language: Language) -> String {
    let reply_in = match language {
        Language::En => "Respond in English.",
        Language::Fa => "Respond entirely in Persian (Farsi).",
    };

    format!(
        "Summarize the following TCF execution log. Point out workload distribution across members, \
         timing patterns and anything unusual in the descriptions, then list three actionable insights.\n\
         {}\n\nData:\n{}",
        reply_in,
        data_context(reports, members, tcfs)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubAnalyzer {
        answer: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubAnalyzer {
        fn new(answer: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReportAnalyzer for StubAnalyzer {
        async fn analyze(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer.clone().map_err(|e| anyhow!(e))
        }
    }

    fn sample() -> (Vec<Report>, Vec<Member>, Vec<Tcf>) {
        let reports = vec![Report {
            id: "r1".to_string(),
            member_id: "m1".to_string(),
            tcf_id: "deleted".to_string(),
            start_time: Some("14:05".to_string()),
            description: None,
            timestamp: 1_714_556_100_000,
            audio_note: None,
        }];
        let members = vec![Member {
            id: "m1".to_string(),
            name: "John Doe".to_string(),
            start_date: "2024-01-01".to_string(),
            phone_number: None,
            age: None,
            description: None,
        }];
        (reports, members, Vec::new())
    }

    #[test]
    fn test_data_context_resolves_names() {
        let (reports, members, tcfs) = sample();
        assert_eq!(
            data_context(&reports, &members, &tcfs),
            "Date: 2024-05-01, Time: 14:05, Member: John Doe, TCF: Unknown, Description: N/A"
        );
    }

    #[tokio::test]
    async fn test_missing_key_message_is_localized() {
        let service = AnalysisService::default();
        let (reports, members, tcfs) = sample();

        assert_eq!(
            service.analyze_reports(&reports, &members, &tcfs, Language::En).await,
            "API Key is missing. Please configure your environment."
        );
        assert_eq!(
            service.analyze_reports(&reports, &members, &tcfs, Language::Fa).await,
            "کلید API وجود ندارد. لطفا محیط خود را تنظیم کنید."
        );
    }

    #[tokio::test]
    async fn test_analyzer_outcomes() {
        let (reports, members, tcfs) = sample();

        let ok = StubAnalyzer::new(Ok("All good"));
        let service = AnalysisService::new(Some(ok.clone()));
        assert_eq!(
            service.analyze_reports(&reports, &members, &tcfs, Language::Fa).await,
            "All good"
        );
        let prompt = ok.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Member: John Doe"));
        assert!(prompt.contains("Persian"));

        let empty = AnalysisService::new(Some(StubAnalyzer::new(Ok("  "))));
        assert_eq!(
            empty.analyze_reports(&reports, &members, &tcfs, Language::En).await,
            "No analysis could be generated."
        );

        let failing = AnalysisService::new(Some(StubAnalyzer::new(Err("boom"))));
        assert_eq!(
            failing.analyze_reports(&reports, &members, &tcfs, Language::Fa).await,
            "خطا در تحلیل گزارش‌ها."
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] } }]
        });
        assert_eq!(GeminiAnalyzer::extract_text(&body), "Hello world");
        assert_eq!(GeminiAnalyzer::extract_text(&json!({})), "");
    }

    #[test]
    fn test_client_builds_model_url() {
        let analyzer = GeminiAnalyzer::new(
            "key".to_string(),
            "gemini-2.5-flash".to_string(),
            "https://example.test/v1beta/".to_string(),
        )
        .unwrap();
        assert_eq!(
            analyzer.url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = AnalysisConfig::default();
        assert!(!AnalysisService::from_config(&config).is_configured());

        config.api_key = Some("   ".to_string());
        assert!(!AnalysisService::from_config(&config).is_configured());

        config.api_key = Some("key".to_string());
        assert!(AnalysisService::from_config(&config).is_configured());
    }
}
