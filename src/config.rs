//! Coupon specific configuration.
//!
//! Goose owns the command line: `--host`, `--users`, `--hatch-rate`, `--run-time` and all
//! other [runtime options](https://book.goose.rs/getting-started/runtime-options.html) are
//! parsed by [`GooseConfiguration`](https://docs.rs/goose/*/goose/config/struct.GooseConfiguration.html).
//! The settings that describe *what* to request are read from the environment:
//!
//! | Variable                   | Default                 |
//! |----------------------------|-------------------------|
//! | `COUPON_HOST`              | `http://localhost:8080` |
//! | `COUPON_ENDPOINT`          | `v1-async`              |
//! | `COUPON_ID`                | `1`                     |
//! | `COUPON_USER_ID_MIN`       | `1`                     |
//! | `COUPON_USER_ID_MAX`       | `100000000`             |
//! | `COUPON_FIXED_USER_ID`     | unset                   |
//! | `COUPON_CONNECT_TIMEOUT`   | `10` (seconds)          |
//! | `COUPON_NETWORK_TIMEOUT`   | `10` (seconds)          |
//! | `COUPON_VALIDATE_RESPONSE` | `false`                 |

use std::str::FromStr;
use std::{env, fmt, time};

use crate::request::{
    IssuanceRequestGenerator, UserIdMode, DEFAULT_COUPON_ID, MAX_USER_ID, MIN_USER_ID,
};
use crate::CouponError;

/// Host used when neither `--host` nor `COUPON_HOST` is set.
pub const DEFAULT_HOST: &str = "http://localhost:8080";

/// Default connection and network timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_HOST: &str = "COUPON_HOST";
const ENV_ENDPOINT: &str = "COUPON_ENDPOINT";
const ENV_COUPON_ID: &str = "COUPON_ID";
const ENV_USER_ID_MIN: &str = "COUPON_USER_ID_MIN";
const ENV_USER_ID_MAX: &str = "COUPON_USER_ID_MAX";
const ENV_FIXED_USER_ID: &str = "COUPON_FIXED_USER_ID";
const ENV_CONNECT_TIMEOUT: &str = "COUPON_CONNECT_TIMEOUT";
const ENV_NETWORK_TIMEOUT: &str = "COUPON_NETWORK_TIMEOUT";
const ENV_VALIDATE_RESPONSE: &str = "COUPON_VALIDATE_RESPONSE";

/// The issuance routes exposed by the coupon service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IssueEndpoint {
    /// `POST /v1/issue`, issued synchronously under a lock.
    IssueV1,
    /// `POST /v1/issue-async`, queued for asynchronous issuance (default).
    #[default]
    AsyncIssueV1,
    /// `POST /v2/issue-async`, queued through a single server-side script.
    AsyncIssueV2,
}
impl IssueEndpoint {
    /// The path requested, relative to the host.
    pub fn path(&self) -> &'static str {
        match self {
            IssueEndpoint::IssueV1 => "/v1/issue",
            IssueEndpoint::AsyncIssueV1 => "/v1/issue-async",
            IssueEndpoint::AsyncIssueV2 => "/v2/issue-async",
        }
    }

    /// The key Goose files this endpoint's request metrics under.
    pub fn request_key(&self) -> String {
        format!("POST {}", self.path())
    }
}
impl fmt::Display for IssueEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "POST {}", self.path())
    }
}
impl FromStr for IssueEndpoint {
    type Err = CouponError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept a short name or the path itself.
        match s.trim().trim_end_matches('/').to_lowercase().as_str() {
            "v1" | "v1-sync" | "/v1/issue" => Ok(IssueEndpoint::IssueV1),
            "v1-async" | "/v1/issue-async" => Ok(IssueEndpoint::AsyncIssueV1),
            "v2-async" | "/v2/issue-async" => Ok(IssueEndpoint::AsyncIssueV2),
            _ => Err(CouponError::InvalidOption {
                option: ENV_ENDPOINT.to_string(),
                value: s.to_string(),
                detail: "expected one of v1, v1-async, v2-async.".to_string(),
            }),
        }
    }
}

/// What each simulated user requests, and how long it waits for an answer.
#[derive(Clone, Debug, PartialEq)]
pub struct CouponConfiguration {
    /// Default base URL, applied only when Goose was not given `--host`.
    pub host: String,
    pub endpoint: IssueEndpoint,
    pub coupon_id: u64,
    pub user_ids: UserIdMode,
    /// Bound on establishing a connection.
    pub connect_timeout: time::Duration,
    /// Bound on the whole request, connecting included.
    pub network_timeout: time::Duration,
    /// Decode `isSuccess` and record refused issuances as failures.
    pub validate_response: bool,
}
impl Default for CouponConfiguration {
    fn default() -> Self {
        CouponConfiguration {
            host: DEFAULT_HOST.to_string(),
            endpoint: IssueEndpoint::default(),
            coupon_id: DEFAULT_COUPON_ID,
            user_ids: UserIdMode::default(),
            connect_timeout: time::Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            network_timeout: time::Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            validate_response: false,
        }
    }
}
impl CouponConfiguration {
    /// Read the configuration from `COUPON_*` environment variables.
    pub fn from_env() -> Result<Self, CouponError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup, unset values fall back to
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CouponError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Treat empty values as unset.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut configuration = CouponConfiguration::default();

        if let Some(host) = get(ENV_HOST) {
            configuration.host = host.trim().to_string();
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            configuration.endpoint = endpoint.parse()?;
        }
        if let Some(coupon_id) = get(ENV_COUPON_ID) {
            configuration.coupon_id = parse_integer(ENV_COUPON_ID, &coupon_id)?;
        }

        configuration.user_ids = match get(ENV_FIXED_USER_ID) {
            Some(user_id) => UserIdMode::Fixed(parse_integer(ENV_FIXED_USER_ID, &user_id)?),
            None => {
                let min = match get(ENV_USER_ID_MIN) {
                    Some(min) => parse_integer(ENV_USER_ID_MIN, &min)?,
                    None => MIN_USER_ID,
                };
                let max = match get(ENV_USER_ID_MAX) {
                    Some(max) => parse_integer(ENV_USER_ID_MAX, &max)?,
                    None => MAX_USER_ID,
                };
                UserIdMode::Random { min, max }
            }
        };

        if let Some(timeout) = get(ENV_CONNECT_TIMEOUT) {
            configuration.connect_timeout = parse_seconds(ENV_CONNECT_TIMEOUT, &timeout)?;
        }
        if let Some(timeout) = get(ENV_NETWORK_TIMEOUT) {
            configuration.network_timeout = parse_seconds(ENV_NETWORK_TIMEOUT, &timeout)?;
        }
        if let Some(validate) = get(ENV_VALIDATE_RESPONSE) {
            configuration.validate_response = parse_flag(ENV_VALIDATE_RESPONSE, &validate)?;
        }

        configuration.validate()?;

        Ok(configuration)
    }

    /// Confirm the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), CouponError> {
        if let Err(parse_error) = url::Url::parse(&self.host) {
            return Err(CouponError::InvalidHost {
                host: self.host.clone(),
                detail: format!("{} must be a base url such as {}", ENV_HOST, DEFAULT_HOST),
                parse_error,
            });
        }

        // Surfaces user id bound errors before any user launches.
        self.request_generator()?;

        Ok(())
    }

    /// Build the generator described by this configuration.
    pub fn request_generator(&self) -> Result<IssuanceRequestGenerator, CouponError> {
        IssuanceRequestGenerator::new(self.user_ids.clone(), self.coupon_id)
    }
}

fn parse_integer(option: &str, value: &str) -> Result<u64, CouponError> {
    u64::from_str(value.trim()).map_err(|e| CouponError::InvalidOption {
        option: option.to_string(),
        value: value.to_string(),
        detail: format!("expected a positive integer ({}).", e),
    })
}

fn parse_seconds(option: &str, value: &str) -> Result<time::Duration, CouponError> {
    let invalid = |detail: &str| CouponError::InvalidOption {
        option: option.to_string(),
        value: value.to_string(),
        detail: detail.to_string(),
    };

    let seconds = f64::from_str(value.trim().trim_end_matches('s'))
        .map_err(|_| invalid("expected a number of seconds, such as 10 or 2.5."))?;
    if seconds <= 0.0 {
        return Err(invalid("timeouts must be greater than zero."));
    }

    time::Duration::try_from_secs_f64(seconds).map_err(|e| invalid(&e.to_string()))
}

fn parse_flag(option: &str, value: &str) -> Result<bool, CouponError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CouponError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            detail: "expected true or false.".to_string(),
        }),
    }
}
