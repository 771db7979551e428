//! Superset REST 用戶端：將既有圖表限定到單一門市與時間區間，並擷取圖表截圖。

use crate::core::Storage;
use crate::utils::error::{HawkeyeError, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

const UNIT_COLUMN: &str = "unidade";
const DATE_COLUMN: &str = "data_inicial";

/// 圖表時間區間
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    LastWeek,
    /// 含首尾兩天
    Range { start: NaiveDate, end: NaiveDate },
}

impl TimeWindow {
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(HawkeyeError::ValidationError {
                message: format!("End date {} is before start date {}", end, start),
            });
        }
        Ok(Self::Range { start, end })
    }

    /// Superset TEMPORAL_RANGE 比較值，結束日為不含
    pub fn comparator(&self) -> String {
        match self {
            TimeWindow::LastWeek => "Last week".to_string(),
            TimeWindow::Range { start, end } => {
                let end_exclusive = *end + ChronoDuration::days(1);
                format!(
                    "{} : {}",
                    start.format("%Y-%m-%d"),
                    end_exclusive.format("%Y-%m-%d")
                )
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartDefinition {
    pub id: u64,
    pub slice_name: String,
    pub viz_type: String,
    pub params: Value,
    pub query_context: Option<Value>,
}

impl ChartDefinition {
    pub fn datasource_id(&self) -> Result<u64> {
        self.query_context
            .as_ref()
            .and_then(|ctx| ctx.pointer("/datasource/id"))
            .and_then(Value::as_u64)
            .ok_or_else(|| HawkeyeError::ProcessingError {
                message: format!("Chart {} has no query_context datasource id", self.id),
            })
    }

    pub fn adhoc_filters(&self) -> Vec<Value> {
        self.params
            .get("adhoc_filters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    result: ChartPayload,
}

#[derive(Deserialize)]
struct ChartPayload {
    slice_name: String,
    viz_type: String,
    params: Option<String>,
    query_context: Option<String>,
}

#[derive(Deserialize)]
struct ScreenshotResponse {
    image_url: String,
}

/// 移除既有的門市與日期篩選，改為指定門市與時間區間
pub fn scope_filters(filters: &[Value], company: &str, window: &TimeWindow) -> Vec<Value> {
    let mut scoped: Vec<Value> = filters
        .iter()
        .filter(|f| {
            !matches!(
                f.get("subject").and_then(Value::as_str),
                Some(UNIT_COLUMN) | Some(DATE_COLUMN)
            )
        })
        .cloned()
        .collect();

    scoped.push(json!({
        "clause": "WHERE",
        "comparator": window.comparator(),
        "datasourceWarning": false,
        "expressionType": "SIMPLE",
        "isExtra": false,
        "isNew": false,
        "operator": "TEMPORAL_RANGE",
        "sqlExpression": null,
        "subject": DATE_COLUMN,
    }));
    scoped.push(json!({
        "expressionType": "SIMPLE",
        "subject": UNIT_COLUMN,
        "operator": "IN",
        "comparator": [company],
        "clause": "WHERE",
        "sqlExpression": null,
    }));

    scoped
}

/// 以 `base` 的 scheme/host/port 取代 `old`，保留路徑、查詢字串與片段
pub fn rebase_url(old: &str, base: &str) -> Result<String> {
    let invalid = |value: &str, reason: String| HawkeyeError::InvalidConfigValueError {
        field: "url".to_string(),
        value: value.to_string(),
        reason,
    };

    let mut rebased = Url::parse(old).map_err(|e| invalid(old, e.to_string()))?;
    let base_url = Url::parse(base).map_err(|e| invalid(base, e.to_string()))?;

    if let Some(host) = base_url.host_str() {
        rebased
            .set_scheme(base_url.scheme())
            .map_err(|_| invalid(base, "Incompatible URL scheme".to_string()))?;
        rebased
            .set_host(Some(host))
            .map_err(|e| invalid(base, e.to_string()))?;
        rebased
            .set_port(base_url.port())
            .map_err(|_| invalid(base, "Cannot set port".to_string()))?;
    }

    Ok(rebased.to_string())
}

#[derive(Debug, Clone)]
pub struct SupersetClient {
    base_url: String,
    username: String,
    password: String,
    screenshot_wait: Duration,
    client: Client,
}

/// 登入後的連線，帶有 bearer token
#[derive(Debug, Clone)]
pub struct SupersetSession {
    base_url: String,
    token: String,
    screenshot_wait: Duration,
    client: Client,
}

impl SupersetClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            screenshot_wait: Duration::from_secs(30),
            client: Client::new(),
        }
    }

    /// Superset 產生截圖需要時間，下載前等待
    pub fn with_screenshot_wait(mut self, wait: Duration) -> Self {
        self.screenshot_wait = wait;
        self
    }

    pub async fn login(&self) -> Result<SupersetSession> {
        let url = format!("{}/api/v1/security/login", self.base_url);
        tracing::debug!("Logging in to Superset at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "username": self.username,
                "password": self.password,
                "provider": "db",
            }))
            .send()
            .await?;
        let response = ensure_status(response, &[StatusCode::OK]).await?;
        let login: LoginResponse = response.json().await?;

        Ok(SupersetSession {
            base_url: self.base_url.clone(),
            token: login.access_token,
            screenshot_wait: self.screenshot_wait,
            client: self.client.clone(),
        })
    }
}

impl SupersetSession {
    pub async fn get_chart(&self, chart_id: u64) -> Result<ChartDefinition> {
        let url = format!("{}/api/v1/chart/{}", self.base_url, chart_id);
        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        let response = ensure_status(response, &[StatusCode::OK]).await?;
        let envelope: ChartEnvelope = response.json().await?;
        let payload = envelope.result;

        let params = match payload.params.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => json!({}),
        };
        let query_context = match payload.query_context.as_deref() {
            Some(raw) if !raw.is_empty() => Some(serde_json::from_str(raw)?),
            _ => None,
        };

        Ok(ChartDefinition {
            id: chart_id,
            slice_name: payload.slice_name,
            viz_type: payload.viz_type,
            params,
            query_context,
        })
    }

    pub async fn update_chart(&self, chart: &ChartDefinition, params: &Value) -> Result<()> {
        let url = format!("{}/api/v1/chart/{}", self.base_url, chart.id);
        let payload = json!({
            "slice_name": chart.slice_name,
            "viz_type": chart.viz_type,
            "datasource_type": "table",
            "datasource_id": chart.datasource_id()?,
            "params": serde_json::to_string(params)?,
        });
        tracing::debug!("Updating chart {}: {}", chart.id, payload);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        ensure_status(response, &[StatusCode::OK]).await?;
        Ok(())
    }

    /// 觸發截圖快取並回傳圖片 URL
    pub async fn cache_screenshot(&self, chart_id: u64) -> Result<String> {
        let url = format!(
            "{}/api/v1/chart/{}/cache_screenshot/",
            self.base_url, chart_id
        );
        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        let response = ensure_status(response, &[StatusCode::OK, StatusCode::ACCEPTED]).await?;
        let screenshot: ScreenshotResponse = response.json().await?;

        if !self.screenshot_wait.is_zero() {
            tracing::debug!(
                "Waiting {:?} for chart {} screenshot to render",
                self.screenshot_wait,
                chart_id
            );
            tokio::time::sleep(self.screenshot_wait).await;
        }

        Ok(screenshot.image_url)
    }

    pub async fn download_screenshot(&self, image_url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(image_url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = ensure_status(response, &[StatusCode::OK]).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn ensure_status(
    response: reqwest::Response,
    accepted: &[StatusCode],
) -> Result<reqwest::Response> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HawkeyeError::SupersetError {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedChart {
    pub id: u64,
    pub slice_name: String,
}

/// 依序更新所有設定的圖表篩選條件
pub struct ChartScoper {
    client: SupersetClient,
    chart_ids: Vec<u64>,
}

impl ChartScoper {
    pub fn new(client: SupersetClient, chart_ids: Vec<u64>) -> Self {
        Self { client, chart_ids }
    }

    pub async fn run(&self, company: &str, window: &TimeWindow) -> Result<Vec<ScopedChart>> {
        let session = self.client.login().await?;
        let mut scoped = Vec::with_capacity(self.chart_ids.len());

        for &chart_id in &self.chart_ids {
            let chart = session.get_chart(chart_id).await?;
            let filters = scope_filters(&chart.adhoc_filters(), company, window);

            let mut params = chart.params.clone();
            if let Value::Object(map) = &mut params {
                map.insert("adhoc_filters".to_string(), Value::Array(filters));
            } else {
                return Err(HawkeyeError::ProcessingError {
                    message: format!("Chart {} params is not a JSON object", chart_id),
                });
            }

            session.update_chart(&chart, &params).await?;
            tracing::info!(
                "🎯 Scoped chart {} ({}) to '{}' / {}",
                chart_id,
                chart.slice_name,
                company,
                window.comparator()
            );
            scoped.push(ScopedChart {
                id: chart_id,
                slice_name: chart.slice_name,
            });
        }

        Ok(scoped)
    }
}

/// 下載圖表截圖並存入儲存區
pub struct ScreenshotCollector<S: Storage> {
    client: SupersetClient,
    storage: S,
    prefix: String,
}

impl<S: Storage> ScreenshotCollector<S> {
    pub fn new(client: SupersetClient, storage: S, prefix: impl Into<String>) -> Self {
        Self {
            client,
            storage,
            prefix: prefix.into(),
        }
    }

    pub fn screenshot_key(&self, chart_id: u64) -> String {
        format!("{}/{}.png", self.prefix.trim_end_matches('/'), chart_id)
    }

    pub async fn run(&self, chart_ids: &[u64]) -> Result<Vec<String>> {
        let session = self.client.login().await?;
        let mut keys = Vec::with_capacity(chart_ids.len());

        for &chart_id in chart_ids {
            let image_url = session.cache_screenshot(chart_id).await?;
            // Superset 回傳的是內部位址，改用設定的 base URL
            let image_url = rebase_url(&image_url, session.base_url())?;
            let image = session.download_screenshot(&image_url).await?;

            let key = self.screenshot_key(chart_id);
            self.storage.write_file(&key, &image).await?;
            tracing::info!("🖼️ Saved chart {} screenshot to {}", chart_id, key);
            keys.push(key);
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_filters_replaces_unit_and_date() {
        let existing = vec![
            json!({"subject": "unidade", "operator": "IN", "comparator": ["OUTRA LOJA"]}),
            json!({"subject": "data_inicial", "operator": "TEMPORAL_RANGE", "comparator": "No filter"}),
            json!({"subject": "area", "operator": "==", "comparator": "Padaria"}),
            json!({"expressionType": "SQL", "sqlExpression": "result > 0"}),
        ];

        let scoped = scope_filters(&existing, "SUPERMERCADO RODRIGUES", &TimeWindow::LastWeek);

        assert_eq!(scoped.len(), 4);
        assert_eq!(scoped[0]["subject"], "area");
        assert_eq!(scoped[1]["expressionType"], "SQL");
        assert_eq!(scoped[2]["operator"], "TEMPORAL_RANGE");
        assert_eq!(scoped[2]["comparator"], "Last week");
        assert_eq!(scoped[3]["comparator"], json!(["SUPERMERCADO RODRIGUES"]));
    }

    #[test]
    fn test_range_comparator_is_end_exclusive() {
        let window = TimeWindow::range(
            NaiveDate::from_ymd_opt(2025, 9, 21).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 28).unwrap(),
        )
        .unwrap();
        assert_eq!(window.comparator(), "2025-09-21 : 2025-09-29");

        assert!(TimeWindow::range(
            NaiveDate::from_ymd_opt(2025, 9, 28).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 21).unwrap(),
        )
        .is_err());
    }

    #[test]
    fn test_rebase_url_keeps_path_and_query() {
        let rebased = rebase_url(
            "http://localhost:8088/api/v1/chart/5/screenshot/abc123/?thumb=1#x",
            "http://superset:8088",
        )
        .unwrap();
        assert_eq!(
            rebased,
            "http://superset:8088/api/v1/chart/5/screenshot/abc123/?thumb=1#x"
        );

        let rebased = rebase_url("http://localhost:8088/img.png", "https://bi.example.com").unwrap();
        assert_eq!(rebased, "https://bi.example.com/img.png");
    }

    #[test]
    fn test_datasource_id_from_query_context() {
        let chart = ChartDefinition {
            id: 5,
            slice_name: "Total vencidos".to_string(),
            viz_type: "big_number_total".to_string(),
            params: json!({}),
            query_context: Some(json!({"datasource": {"id": 12, "type": "table"}})),
        };
        assert_eq!(chart.datasource_id().unwrap(), 12);

        let chart = ChartDefinition {
            query_context: None,
            ..chart
        };
        assert!(chart.datasource_id().is_err());
    }
}
