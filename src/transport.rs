//! Issuing coupons without Goose.
//!
//! During a load test Goose owns the HTTP client and records every outcome itself. Outside
//! of a load test, [`submit_issuance`](./fn.submit_issuance.html) sends a single request
//! through any [`IssueTransport`](./trait.IssueTransport.html) and reports which of the
//! three ways it failed, if it did:
//!  - the host could not be reached ([`CouponError::Connect`](../enum.CouponError.html)),
//!  - no answer arrived in time ([`CouponError::Timeout`](../enum.CouponError.html)),
//!  - the answer had a non-success status
//!    ([`CouponError::UnexpectedStatus`](../enum.CouponError.html)).
//!
//! There are no retries.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time;
use url::Url;

use crate::config::{CouponConfiguration, IssueEndpoint};
use crate::request::{IssuanceRequest, IssueResponse};
use crate::{CouponError, APP_USER_AGENT};

/// A raw answer from the coupon service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueReply {
    pub status: u16,
    pub body: String,
}
impl IssueReply {
    /// Returns `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as an [`IssueResponse`](../request/struct.IssueResponse.html), if it
    /// is one.
    pub fn decode(&self) -> Option<IssueResponse> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Something that can deliver an [`IssuanceRequest`](../request/struct.IssuanceRequest.html).
#[async_trait]
pub trait IssueTransport: Send + Sync {
    /// POST `request` to `path`, returning whatever the service answered.
    async fn send(&self, path: &str, request: &IssuanceRequest) -> Result<IssueReply, CouponError>;
}

/// Returns a client builder carrying the configured connect and network timeouts.
///
/// Shared by [`HttpTransport`](./struct.HttpTransport.html) and by every
/// [`GooseUser`](https://docs.rs/goose/*/goose/goose/struct.GooseUser.html) in the load
/// test, so both bound requests the same way.
pub fn client_builder(configuration: &CouponConfiguration) -> ClientBuilder {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .connect_timeout(configuration.connect_timeout)
        .timeout(configuration.network_timeout)
}

/// An [`IssueTransport`](./trait.IssueTransport.html) backed by a `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    network_timeout: time::Duration,
}
impl HttpTransport {
    /// Build a transport for `host`, bounded by the configured timeouts.
    pub fn new(host: &str, configuration: &CouponConfiguration) -> Result<Self, CouponError> {
        let base_url = Url::parse(host).map_err(|parse_error| CouponError::InvalidHost {
            host: host.to_string(),
            detail: "invalid base url".to_string(),
            parse_error,
        })?;
        let client = client_builder(configuration).build()?;

        Ok(HttpTransport {
            client,
            base_url,
            network_timeout: configuration.network_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, CouponError> {
        self.base_url
            .join(path)
            .map_err(|parse_error| CouponError::InvalidHost {
                host: self.base_url.to_string(),
                detail: format!("unable to join path {}", path),
                parse_error,
            })
    }
}

#[async_trait]
impl IssueTransport for HttpTransport {
    async fn send(&self, path: &str, request: &IssuanceRequest) -> Result<IssueReply, CouponError> {
        let url = self.url(path)?;
        debug!("POST {} {:?}", url, request);

        let response = match self.client.post(url.clone()).json(request).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(CouponError::Timeout {
                    after: self.network_timeout,
                })
            }
            Err(e) if e.is_connect() => {
                return Err(CouponError::Connect {
                    url: url.to_string(),
                    detail: e.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                return Err(CouponError::Timeout {
                    after: self.network_timeout,
                })
            }
            Err(e) => return Err(e.into()),
        };
        debug!("{} answered {}: {}", url, status, body);

        Ok(IssueReply { status, body })
    }
}

/// Submit one issuance request, abandoning it after `timeout`.
///
/// Returns the reply only for a 2xx status.
pub async fn submit_issuance<T>(
    transport: &T,
    endpoint: &IssueEndpoint,
    request: &IssuanceRequest,
    timeout: time::Duration,
) -> Result<IssueReply, CouponError>
where
    T: IssueTransport + ?Sized,
{
    let reply = match tokio::time::timeout(timeout, transport.send(endpoint.path(), request)).await
    {
        Ok(reply) => reply?,
        Err(_) => {
            warn!("{} abandoned after {:?}", endpoint, timeout);
            return Err(CouponError::Timeout { after: timeout });
        }
    };

    if !reply.is_success() {
        return Err(CouponError::UnexpectedStatus {
            status: reply.status,
            body: reply.body,
        });
    }

    Ok(reply)
}
