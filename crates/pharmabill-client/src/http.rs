//! # HTTP Backend
//!
//! [`PharmacyBackend`] over the pharmacy REST API using `reqwest`.
//!
//! Every request carries the configured deadline; a request that exceeds it
//! fails with [`BackendError::Timeout`] and nothing is retried automatically.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pharmabill_core::{MedicineRef, SalesQuery, TransactionDraft};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::backend::{BillReceipt, PharmacyBackend, SalesReport};
use crate::config::ClientConfig;
use crate::error::{BackendError, BackendResult, ConfigError};
use crate::wire::{
    BillingRequest, BillingResponse, ErrorBody, MedicineDetailsResponse, MedicineListResponse,
    SalesResponse,
};

const MEDICINES_PATH: &str = "medicines";
const MEDICINE_DETAILS_PATH: &str = "medicine_details";
const BILLING_PATH: &str = "billing";
const SALES_PATH: &str = "sales";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    http: Client,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base: Url, request_timeout: Duration, connect_timeout: Duration) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BackendError::Transport {
                endpoint: base.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            base: with_trailing_slash(base),
            http,
            request_timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base = config.base_url()?;
        Self::new(base, config.request_timeout(), config.connect_timeout())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn map_error(&self, endpoint: &str, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_secs: self.request_timeout.as_secs(),
            }
        } else {
            BackendError::Transport {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: Url) -> BackendResult<T> {
        let started = Instant::now();
        debug!(%url, "GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(endpoint, e))?;

        let result = self.read_json(endpoint, response).await;
        debug!(endpoint, elapsed_ms = started.elapsed().as_millis() as u64, ok = result.is_ok(), "GET done");
        result
    }

    async fn read_json<T: DeserializeOwned>(&self, endpoint: &str, response: Response) -> BackendResult<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_error(endpoint, e))?;

        if !status.is_success() {
            let message = ErrorBody::message_from(&text);
            warn!(endpoint, status = status.as_u16(), %message, "Backend returned an error status");
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| BackendError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PharmacyBackend for HttpBackend {
    async fn list_medicines(&self) -> BackendResult<Vec<String>> {
        let url = self.endpoint(MEDICINES_PATH)?;
        let body: MedicineListResponse = self.get_json("/medicines", url).await?;
        Ok(body.medicines)
    }

    async fn medicine_details(&self, name: &str) -> BackendResult<MedicineRef> {
        let mut url = self.endpoint(MEDICINE_DETAILS_PATH)?;
        url.query_pairs_mut().append_pair("name", name);

        let body: MedicineDetailsResponse = match self.get_json("/medicine_details", url).await {
            Err(BackendError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Err(BackendError::NotFound(name.to_string()))
            }
            other => other?,
        };

        body.into_medicine(name).map_err(|reason| BackendError::Decode {
            endpoint: "/medicine_details".to_string(),
            reason,
        })
    }

    async fn submit_bill(&self, draft: &TransactionDraft) -> BackendResult<BillReceipt> {
        let endpoint = "/billing";
        let url = self.endpoint(BILLING_PATH)?;
        let body = BillingRequest::from(draft);
        debug!(%url, lines = body.medicines.len(), patient_id = %body.patient_id, "POST");

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(endpoint, e))?;

        // a 2xx with an empty or non-JSON body still counts as persisted
        let status = response.status();
        if status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let parsed: BillingResponse = serde_json::from_str(&text).unwrap_or_default();
            return Ok(BillReceipt {
                message: parsed.message,
            });
        }

        self.read_json::<BillingResponse>(endpoint, response)
            .await
            .map(|parsed| BillReceipt {
                message: parsed.message,
            })
    }

    async fn sales(&self, query: &SalesQuery) -> BackendResult<SalesReport> {
        let endpoint = "/sales";
        let mut url = self.endpoint(SALES_PATH)?;
        url.query_pairs_mut()
            .append_pair("start_date", &query.start().format("%Y-%m-%d").to_string())
            .append_pair("end_date", &query.end().format("%Y-%m-%d").to_string());

        let body: SalesResponse = self.get_json(endpoint, url).await?;
        let (records, reported_earnings) = body.into_records().map_err(|reason| BackendError::Decode {
            endpoint: endpoint.to_string(),
            reason,
        })?;

        Ok(SalesReport {
            records,
            reported_earnings,
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
