//! FlashArray REST 1.x client
//!
//! A session is opened by posting the API token to `auth/session`; the array
//! answers with a session cookie that the client's cookie store replays on
//! every listing call.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;

use super::rest::{self, UpstreamSettings};
use super::{CollectResult, DataSource, EntityClass, Query, Record};
use crate::error::CollectorError;

/// NAA prefix of Pure Storage volume WWNs
pub const PURE_NAA: &str = "naa.624a9370";

/// One authenticated FlashArray session
pub struct FlashArrayClient {
    http: Client,
    api_base: Url,
    settings: UpstreamSettings,
}

impl FlashArrayClient {
    /// Open a session against `endpoint`
    ///
    /// # Errors
    /// `AuthenticationFailed` when the token is rejected, transport errors
    /// when the array cannot be reached.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn connect(
        settings: &UpstreamSettings,
        endpoint: &str,
        api_token: &str,
    ) -> CollectResult<Self> {
        let http = rest::build_client(settings)?;
        let base = rest::base_url(endpoint)?;
        let api_base = rest::join(&base, &format!("api/{}", settings.flasharray_api_version));

        let response = http
            .post(rest::join(&api_base, "auth/session"))
            .json(&json!({ "api_token": api_token }))
            .send()
            .await
            .map_err(|e| rest::transport_error(e, settings))?;
        rest::check_status(&response)?;

        debug!("FlashArray session established");

        Ok(Self {
            http,
            api_base,
            settings: settings.clone(),
        })
    }

    /// REST resource serving an entity class
    fn resource(class: EntityClass) -> CollectResult<&'static str> {
        match class {
            EntityClass::Array => Ok("array"),
            EntityClass::Volume => Ok("volume"),
            EntityClass::Host | EntityClass::HostConnection => Ok("host"),
            EntityClass::Pod => Ok("pod"),
            EntityClass::Hardware => Ok("hardware"),
            EntityClass::Alert => Ok("message"),
            EntityClass::NetworkInterface => Ok("network"),
            other => Err(CollectorError::UnsupportedClass(other.as_str())),
        }
    }

    fn url(&self, class: EntityClass, query: &Query) -> CollectResult<Url> {
        let mut url = rest::join(&self.api_base, Self::resource(class)?);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query.params() {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl DataSource for FlashArrayClient {
    #[instrument(skip_all, fields(class = %class, query = %query))]
    async fn list(&self, class: EntityClass, query: &Query) -> CollectResult<Vec<Record>> {
        let url = self.url(class, query)?;
        debug!(url = %url, "Listing FlashArray resource");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| rest::transport_error(e, &self.settings))?;
        rest::check_status(&response)?;

        rest::read_records(response).await
    }

    async fn close(&self) {
        let url = rest::join(&self.api_base, "auth/session");
        match self.http.delete(url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("FlashArray session closed");
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "FlashArray logout rejected");
            }
            Err(e) => {
                warn!(error = %e, "FlashArray logout failed");
            }
        }
    }
}
