use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// Test environment configuration
pub struct TestEnv {
    pub api_url: String,
    pub client: Client,
}

impl TestEnv {
    /// Points at `API_URL`, or the default local api port.
    pub fn new() -> Self {
        Self {
            api_url: std::env::var("API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    pub async fn wait_for_services(&self) -> Result<()> {
        println!("Waiting for services to be ready...");
        self.wait_for_service(&self.url("/health"), "API").await?;
        println!("All services ready!");
        Ok(())
    }

    async fn wait_for_service(&self, url: &str, name: &str) -> Result<()> {
        let max_attempts = 30;
        let mut attempt = 0;

        while attempt < max_attempts {
            attempt += 1;
            match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    println!("{} is ready", name);
                    return Ok(());
                }
                _ => {
                    if attempt < max_attempts {
                        println!(
                            "Waiting for {} (attempt {}/{})",
                            name, attempt, max_attempts
                        );
                        sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        }

        anyhow::bail!("{} failed to start after {} attempts", name, max_attempts)
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;
        envelope(resp).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;
        envelope(resp).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {} failed", path))?;
        envelope(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .with_context(|| format!("DELETE {} failed", path))?;
        envelope(resp).await
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

async fn envelope(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

/// Email that will not collide with earlier runs against the same database.
pub fn unique_email(prefix: &str) -> String {
    format!(
        "{}+{}@e2e.example.com",
        prefix,
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}
