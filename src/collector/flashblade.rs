//! FlashBlade REST 1.x client
//!
//! `POST /api/login` exchanges the API token for an `x-auth-token` header
//! that accompanies every later call. Listings return `{"items": [...]}` and
//! are paged through `pagination_info.continuation_token`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::rest::{self, UpstreamSettings};
use super::{records_from_value, CollectResult, DataSource, EntityClass, Query, Record};
use crate::error::CollectorError;

const AUTH_HEADER: &str = "x-auth-token";

/// Upper bound on followed continuation tokens for one listing
const MAX_PAGES: usize = 1000;

/// One authenticated FlashBlade session
pub struct FlashBladeClient {
    http: Client,
    base: Url,
    api_base: Url,
    auth_token: String,
    settings: UpstreamSettings,
}

impl FlashBladeClient {
    /// Log in to `endpoint`
    ///
    /// # Errors
    /// `AuthenticationFailed` when the token is rejected or the array does
    /// not hand out a session header.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn connect(
        settings: &UpstreamSettings,
        endpoint: &str,
        api_token: &str,
    ) -> CollectResult<Self> {
        let http = rest::build_client(settings)?;
        let base = rest::base_url(endpoint)?;
        let api_base = rest::join(&base, &format!("api/{}", settings.flashblade_api_version));

        let response = http
            .post(rest::join(&base, "api/login"))
            .header("api-token", api_token)
            .send()
            .await
            .map_err(|e| rest::transport_error(e, settings))?;
        rest::check_status(&response)?;

        let auth_token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(CollectorError::AuthenticationFailed)?;

        debug!("FlashBlade session established");

        Ok(Self {
            http,
            base,
            api_base,
            auth_token,
            settings: settings.clone(),
        })
    }

    /// REST resource and parameters for a class/query pair
    ///
    /// Protocol-specific array performance lives under one resource per
    /// protocol, so its `protocol` parameter moves into the path.
    fn resource(class: EntityClass, query: &Query) -> CollectResult<(String, Vec<(String, String)>)> {
        let params = query.params().to_vec();
        let path = match class {
            EntityClass::Array => "arrays",
            EntityClass::ArraySpace => "arrays/space",
            EntityClass::ArrayPerformance => "arrays/performance",
            EntityClass::ArraySpecificPerformance => {
                let protocol = query
                    .get("protocol")
                    .ok_or(CollectorError::UnsupportedClass(class.as_str()))?;
                let remaining = params.into_iter().filter(|(k, _)| k != "protocol").collect();
                return Ok((format!("arrays/{}-specific-performance", protocol), remaining));
            }
            EntityClass::FileSystem => "file-systems",
            EntityClass::FileSystemPerformance => "file-systems/performance",
            EntityClass::Bucket => "buckets",
            EntityClass::BucketPerformance => "buckets/s3-specific-performance",
            EntityClass::BucketReplicaLink => "bucket-replica-links",
            EntityClass::FileSystemReplicaLink => "file-system-replica-links",
            EntityClass::UserUsage => "usage/users",
            EntityClass::GroupUsage => "usage/groups",
            EntityClass::ClientPerformance => "arrays/clients/performance",
            EntityClass::Hardware => "hardware",
            EntityClass::Alert => "alerts",
            other => return Err(CollectorError::UnsupportedClass(other.as_str())),
        };
        Ok((path.to_string(), params))
    }

    async fn page(&self, url: Url) -> CollectResult<Value> {
        let response = self
            .http
            .get(url)
            .header(AUTH_HEADER, &self.auth_token)
            .send()
            .await
            .map_err(|e| rest::transport_error(e, &self.settings))?;
        rest::check_status(&response)?;
        rest::read_json(response).await
    }
}

fn continuation_token(body: &Value) -> Option<&str> {
    body.get("pagination_info")
        .and_then(|p| p.get("continuation_token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl DataSource for FlashBladeClient {
    #[instrument(skip_all, fields(class = %class, query = %query))]
    async fn list(&self, class: EntityClass, query: &Query) -> CollectResult<Vec<Record>> {
        let (path, params) = Self::resource(class, query)?;
        let mut records = Vec::new();
        let mut token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut url = rest::join(&self.api_base, &path);
            {
                let mut pairs = url.query_pairs_mut();
                for (k, v) in &params {
                    pairs.append_pair(k, v);
                }
                if let Some(t) = &token {
                    pairs.append_pair("token", t);
                }
            }
            // drop a trailing '?' when there were no parameters
            if url.query() == Some("") {
                url.set_query(None);
            }
            debug!(url = %url, "Listing FlashBlade resource");

            let body = self.page(url).await?;
            records.extend(records_from_value(&body)?);

            match continuation_token(&body) {
                Some(next) => token = Some(next.to_string()),
                None => return Ok(records),
            }
        }

        warn!(pages = MAX_PAGES, "Pagination limit reached, listing truncated");
        Ok(records)
    }

    async fn close(&self) {
        let url = rest::join(&self.base, "api/logout");
        match self
            .http
            .post(url)
            .header(AUTH_HEADER, &self.auth_token)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("FlashBlade session closed");
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "FlashBlade logout rejected");
            }
            Err(e) => {
                warn!(error = %e, "FlashBlade logout failed");
            }
        }
    }
}
