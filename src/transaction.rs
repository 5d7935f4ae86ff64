//! The Goose scenario.
//!
//! Each [`GooseUser`](https://docs.rs/goose/*/goose/goose/struct.GooseUser.html) launched
//! from the `CouponIssue` scenario first installs an HTTP client bounded by the configured
//! timeouts, then repeats a single transaction for as long as the load test runs: build one
//! [`IssuanceRequest`](../request/struct.IssuanceRequest.html) and POST it, once.
//!
//! Goose records every outcome automatically: non-2xx responses, refused connections and
//! timeouts show up as failures in the request metrics. Nothing here retries or reacts to a
//! failure.

use goose::goose::GooseResponse;
use goose::prelude::*;
use std::sync::Arc;

use crate::config::{CouponConfiguration, IssueEndpoint};
use crate::request::{IssuanceRequestGenerator, IssueResponse};
use crate::transport;
use crate::CouponError;

/// Name of the scenario registered with Goose.
pub const SCENARIO_NAME: &str = "CouponIssue";

/// Name of the on-start transaction installing the bounded client.
pub const CLIENT_TRANSACTION_NAME: &str = "configure client";

/// Build the `CouponIssue` scenario described by `configuration`.
pub fn coupon_scenario(configuration: &CouponConfiguration) -> Result<Scenario, CouponError> {
    let issue = Arc::new(IssueTransaction::new(configuration)?);

    // Every user gets a client with the same timeouts before its first request.
    let client_configuration = configuration.clone();
    let configure_client: TransactionFunction = Arc::new(move |user| {
        let builder = transport::client_builder(&client_configuration);
        Box::pin(async move {
            user.set_client_builder(builder).await?;

            Ok(())
        })
    });

    let issue_coupon: TransactionFunction = Arc::new(move |user| {
        let issue = Arc::clone(&issue);
        Box::pin(async move { issue.run(user).await })
    });

    Ok(Scenario::new(SCENARIO_NAME)
        .register_transaction(
            Transaction::new(configure_client)
                .set_name(CLIENT_TRANSACTION_NAME)
                .set_on_start(),
        )
        // Left unnamed: Goose names requests after their transaction, and the metrics are
        // keyed by `POST <endpoint path>`.
        .register_transaction(Transaction::new(issue_coupon)))
}

/// One coupon issuance per invocation.
#[derive(Clone, Debug)]
pub struct IssueTransaction {
    generator: IssuanceRequestGenerator,
    endpoint: IssueEndpoint,
    validate_response: bool,
}
impl IssueTransaction {
    pub fn new(configuration: &CouponConfiguration) -> Result<Self, CouponError> {
        Ok(IssueTransaction {
            generator: configuration.request_generator()?,
            endpoint: configuration.endpoint.clone(),
            validate_response: configuration.validate_response,
        })
    }

    /// Build a request and POST it.
    pub async fn run(&self, user: &mut GooseUser) -> TransactionResult {
        // ThreadRng is not Send: draw before the first await.
        let request = {
            let mut rng = rand::rng();
            self.generator.generate(&mut rng)
        };

        let goose = user.post_json(self.endpoint.path(), &request).await?;

        if self.validate_response {
            return self.validate(user, goose).await;
        }

        Ok(())
    }

    /// Record a refused issuance as a failure.
    ///
    /// Transport failures and non-2xx responses were already recorded by Goose and are left
    /// alone.
    async fn validate(&self, user: &mut GooseUser, mut goose: GooseResponse) -> TransactionResult {
        let response = match goose.response {
            Ok(response) if response.status().is_success() => response,
            _ => return Ok(()),
        };

        // Copy the headers so we have them for logging if there are errors.
        let headers = &response.headers().clone();
        match response.text().await {
            Ok(body) => match serde_json::from_str::<IssueResponse>(&body) {
                Ok(issued) if issued.is_success => Ok(()),
                Ok(issued) => user.set_failure(
                    &format!(
                        "{}: coupon not issued: {}",
                        self.endpoint,
                        issued.comment.as_deref().unwrap_or("no comment")
                    ),
                    &mut goose.request,
                    Some(headers),
                    Some(&body),
                ),
                Err(e) => user.set_failure(
                    &format!("{}: unexpected response body: {}", self.endpoint, e),
                    &mut goose.request,
                    Some(headers),
                    Some(&body),
                ),
            },
            Err(e) => user.set_failure(
                &format!("{}: failed to read response: {}", self.endpoint, e),
                &mut goose.request,
                Some(headers),
                None,
            ),
        }
    }
}
