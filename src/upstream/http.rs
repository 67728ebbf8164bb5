//! `reqwest` implementation of [`HrDirectory`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

use super::{HrDirectory, UpstreamError, UpstreamResult};
use crate::config::Config;
use crate::models::{CreatePayrollRequest, EmployeeQuery};

#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &Config) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        // A trailing slash makes `join` append rather than replace the last segment.
        let mut base = config.upstream_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url =
            Url::parse(&base).map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base, e)))?;

        Ok(Self {
            client,
            base_url,
            token: config.upstream_token.clone(),
        })
    }

    fn url(&self, path: &str) -> UpstreamResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> UpstreamResult<Value> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Upstream request failed with {}: {}", status, body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl HrDirectory for HttpDirectory {
    async fn list_departments(&self) -> UpstreamResult<Value> {
        self.send(self.client.get(self.url("departments")?)).await
    }

    async fn list_cadres(&self) -> UpstreamResult<Value> {
        self.send(self.client.get(self.url("cadres")?)).await
    }

    async fn list_employees(&self, query: &EmployeeQuery) -> UpstreamResult<Value> {
        let request = self.client.get(self.url("employees")?).query(&[
            ("search", query.search.clone()),
            ("page", query.page.to_string()),
            ("perPage", query.per_page.to_string()),
        ]);
        self.send(request).await
    }

    async fn create_payroll(&self, request: &CreatePayrollRequest) -> UpstreamResult<Value> {
        self.send(self.client.post(self.url("payroll")?).json(request))
            .await
    }
}
