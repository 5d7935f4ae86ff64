//! # coupon_loadtest
//!
//! A [Goose](https://docs.rs/goose/) load test for the coupon issuance service.
//!
//! Every simulated user repeatedly asks the service to issue coupon `1` to a randomly
//! chosen user, by POSTing a small JSON document to `/v1/issue-async`:
//!
//! ```json
//! {"userId": 48213907, "couponId": 1}
//! ```
//!
//! User ids are drawn uniformly from `1..=100_000_000`, so two simulated users asking for
//! the same coupon on behalf of the same user is possible but rare. Each request is made
//! exactly once. Goose records the outcome of every request (status code, response time,
//! connection errors and timeouts) and prints the usual metrics when the load test ends.
//!
//! ## Running the load test
//!
//! ```bash
//! $ cargo run --release --bin coupon-loadtest -- --host http://localhost:8080 \
//!     --users 1000 --hatch-rate 100 --run-time 1m
//! ```
//!
//! All of Goose's [runtime options](https://book.goose.rs/getting-started/runtime-options.html)
//! are available. Coupon specific settings are read from the environment, see
//! [`CouponConfiguration`](./config/struct.CouponConfiguration.html):
//!
//! ```bash
//! # Deliberately stress duplicate issuance: every request asks for user 1.
//! $ COUPON_FIXED_USER_ID=1 COUPON_VALIDATE_RESPONSE=true \
//!     cargo run --release --bin coupon-loadtest -- --host http://localhost:8080 -u 100 -t 30s
//! ```
//!
//! ## Issuing a single coupon
//!
//! The `issue-once` binary sends one request without Goose, which is handy to check that
//! a target is reachable and answering before starting a long load test:
//!
//! ```bash
//! $ cargo run --bin issue-once -- --host http://localhost:8080 --user-id 42 -v
//! ```
//!
//! ## Using the library
//!
//! The scenario can also be registered on a custom
//! [`GooseAttack`](https://docs.rs/goose/*/goose/struct.GooseAttack.html):
//!
//! ```rust,no_run
//! use coupon_loadtest::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CouponError> {
//!     let configuration = CouponConfiguration::from_env()?;
//!     GooseAttack::initialize()?
//!         .register_scenario(coupon_scenario(&configuration)?)
//!         .execute()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[macro_use]
extern crate log;

pub mod config;
pub mod prelude;
pub mod request;
pub mod transaction;
pub mod transport;

use goose::config::GooseConfiguration;
use goose::prelude::*;
use std::{fmt, time};

use crate::config::CouponConfiguration;
use crate::transaction::coupon_scenario;

/// User agent sent with every issuance request.
pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An enumeration of all errors this crate can return.
#[derive(Debug)]
pub enum CouponError {
    /// Wraps a [`goose::GooseError`](https://docs.rs/goose/*/goose/enum.GooseError.html).
    Goose(GooseError),
    /// Wraps a [`reqwest::Error`](https://docs.rs/reqwest/*/reqwest/struct.Error.html).
    Reqwest(reqwest::Error),
    /// Failed to connect to the target host.
    Connect {
        /// The URL that could not be reached.
        url: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// The issuance request did not complete in time.
    Timeout {
        /// How long the request was allowed to take.
        after: time::Duration,
    },
    /// The target answered with a non-success status code.
    UnexpectedStatus {
        /// The status code returned.
        status: u16,
        /// The response body, possibly empty.
        body: String,
    },
    /// Invalid option or value specified, may only be invalid in context.
    InvalidOption {
        /// The invalid option that caused this error, may be only invalid in context.
        option: String,
        /// The invalid value that caused this error, may be only invalid in context.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// Failed to parse a hostname.
    InvalidHost {
        /// The invalid hostname that caused this error.
        host: String,
        /// An optional explanation of the error.
        detail: String,
        /// Wraps a [`url::ParseError`](https://docs.rs/url/*/url/enum.ParseError.html).
        parse_error: url::ParseError,
    },
}
/// Implement a helper to provide a text description of all possible types of errors.
impl CouponError {
    fn describe(&self) -> &str {
        match *self {
            CouponError::Goose(_) => "goose::GooseError",
            CouponError::Reqwest(_) => "reqwest::Error",
            CouponError::Connect { .. } => "failed to connect to host",
            CouponError::Timeout { .. } => "issuance request timed out",
            CouponError::UnexpectedStatus { .. } => "unexpected response status",
            CouponError::InvalidOption { .. } => "invalid option or value specified",
            CouponError::InvalidHost { .. } => "failed to parse hostname",
        }
    }

    /// Returns `true` if the target host could not be reached.
    pub fn is_connect(&self) -> bool {
        matches!(self, CouponError::Connect { .. })
    }

    /// Returns `true` if the request was abandoned after the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CouponError::Timeout { .. })
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for CouponError {
    // Implement display of error with `{}` marker.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CouponError::Goose(ref source) => {
                write!(f, "CouponError: {} ({})", self.describe(), source)
            }
            CouponError::Reqwest(ref source) => {
                write!(f, "CouponError: {} ({})", self.describe(), source)
            }
            CouponError::Connect {
                ref url,
                ref detail,
            } => write!(f, "CouponError: {} {} ({})", self.describe(), url, detail),
            CouponError::Timeout { after } => write!(
                f,
                "CouponError: {} after {:.1}s",
                self.describe(),
                after.as_secs_f64()
            ),
            CouponError::UnexpectedStatus { status, .. } => {
                write!(f, "CouponError: {} ({})", self.describe(), status)
            }
            CouponError::InvalidOption {
                ref option,
                ref detail,
                ..
            } => write!(f, "CouponError: {} {}: {}", self.describe(), option, detail),
            CouponError::InvalidHost {
                ref parse_error, ..
            } => write!(f, "CouponError: {} ({})", self.describe(), parse_error),
        }
    }
}

// Define the lower level source of this error, if any.
impl std::error::Error for CouponError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            CouponError::Goose(ref source) => Some(source),
            CouponError::Reqwest(ref source) => Some(source),
            CouponError::InvalidHost {
                ref parse_error, ..
            } => Some(parse_error),
            _ => None,
        }
    }
}

/// Auto-convert Goose errors.
impl From<GooseError> for CouponError {
    fn from(err: GooseError) -> CouponError {
        CouponError::Goose(err)
    }
}

/// Auto-convert Reqwest errors.
impl From<reqwest::Error> for CouponError {
    fn from(err: reqwest::Error) -> CouponError {
        CouponError::Reqwest(err)
    }
}

/// Build a [`GooseAttack`](https://docs.rs/goose/*/goose/struct.GooseAttack.html) running
/// the coupon issuance scenario.
///
/// The configured `COUPON_HOST` only becomes Goose's default host, so a `--host` passed on
/// the command line still wins.
pub fn build_attack(
    goose_configuration: GooseConfiguration,
    configuration: &CouponConfiguration,
) -> Result<GooseAttack, CouponError> {
    let goose_attack = GooseAttack::initialize_with_config(goose_configuration)?
        .register_scenario(coupon_scenario(configuration)?)
        .set_default(GooseDefault::Host, configuration.host.as_str())?;

    Ok(*goose_attack)
}
