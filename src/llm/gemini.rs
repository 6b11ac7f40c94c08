//! src/llm/gemini.rs
use super::LLMClient; // 从父模块导入 trait
use crate::config::Config;
use crate::errors::AppError;
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

// --- 数据结构定义 ---
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidates>,
}
#[derive(Deserialize, Debug)]
struct Candidates {
    content: Option<ContentResponse>,
}
#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}
#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

// --- 客户端实现 ---
pub struct GeminiClient {
    api_key: String,
    model_name: String,
    api_base: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model_name: String, api_base: String) -> Self {
        Self {
            api_key,
            model_name,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// 只读取配置，不做任何交互。没有 key 时返回 `AppError::MissingApiKey`。
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or(AppError::MissingApiKey)?;
        Ok(Self::new(
            api_key,
            config.gemini.model.clone(),
            config.gemini.api_base.clone(),
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model_name)
    }
}

/// 错误响应里尽量取出 `error.message`，取不到就原样返回。
fn describe_error_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait::async_trait]
impl LLMClient for GeminiClient {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn call(&self, user_prompt: &str) -> Result<String> {
        let request_payload = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: user_prompt }],
            }],
        };
        let res = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_payload)
            .send()
            .await?;

        let res_status = res.status();

        if res_status.is_success() {
            let response = res.json::<GeminiResponse>().await?;
            let text = response
                .candidates
                .first()
                .and_then(|c| c.content.as_ref())
                .and_then(|c| c.parts.first())
                .map(|p| p.text.clone())
                .ok_or_else(|| anyhow!("Could not extract text from Gemini API response"))?;
            Ok(text.trim().to_string())
        } else {
            let error_body = res.text().await?;
            Err(anyhow!(
                "Failed to call Gemini API: {} {}\nResponse body: {}",
                res_status.as_u16(),
                res_status.canonical_reason().unwrap_or(""),
                describe_error_body(&error_body)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_model() {
        let client = GeminiClient::new(
            "k".to_string(),
            "gemini-test".to_string(),
            "http://localhost:1234/v1beta/".to_string(),
        );
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn error_message_is_extracted() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(describe_error_body(body), "API key not valid");
        assert_eq!(describe_error_body("plain text"), "plain text");
    }

    #[tokio::test]
    async fn reads_first_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "secret".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":" feat: add login \n"}]}}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("secret".into(), "gemini-test".into(), server.url());
        let text = client.call("prompt").await.unwrap();
        assert_eq!(text, "feat: add login");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"message":"permission denied"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("k".into(), "gemini-test".into(), server.url());
        let err = client.call("prompt").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("permission denied"));
    }
}
