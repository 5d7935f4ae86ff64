//! Coupon issuance payloads.
//!
//! An [`IssuanceRequest`](./struct.IssuanceRequest.html) is built fresh for every
//! transaction, serialized to JSON, sent once, and dropped. Nothing is remembered between
//! requests.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CouponError;

/// Smallest user id the coupon service accepts.
pub const MIN_USER_ID: u64 = 1;

/// Largest user id drawn by default.
pub const MAX_USER_ID: u64 = 100_000_000;

/// Coupon requested by default, expected to already exist in the service's database.
pub const DEFAULT_COUPON_ID: u64 = 1;

/// The body POSTed to the issuance endpoint.
///
/// Serializes as `{"userId": <int>, "couponId": <int>}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssuanceRequest {
    pub user_id: u64,
    pub coupon_id: u64,
}

/// The body the coupon service answers with.
///
/// A failed issuance (for example a duplicate request, or a coupon that has run out) is
/// still answered with `200 OK`; only `isSuccess` tells the outcomes apart.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct IssueResponse {
    #[serde(rename = "isSuccess")]
    pub is_success: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// How user ids are picked for each request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserIdMode {
    /// Uniformly random in `min..=max`, independently for every request (default).
    Random {
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },
    /// Every request uses the same user id, to exercise duplicate issuance handling.
    Fixed(u64),
}
impl Default for UserIdMode {
    fn default() -> Self {
        UserIdMode::Random {
            min: MIN_USER_ID,
            max: MAX_USER_ID,
        }
    }
}
impl fmt::Display for UserIdMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserIdMode::Random { min, max } => write!(f, "random user ids {}..={}", min, max),
            UserIdMode::Fixed(user_id) => write!(f, "fixed user id {}", user_id),
        }
    }
}

/// Builds one [`IssuanceRequest`](./struct.IssuanceRequest.html) per call.
///
/// The generator holds no mutable state, so a single instance can be shared by every
/// [`GooseUser`](https://docs.rs/goose/*/goose/goose/struct.GooseUser.html). The random
/// source is passed in by the caller.
///
/// # Example
/// ```rust
/// use coupon_loadtest::request::{IssuanceRequestGenerator, MAX_USER_ID};
///
/// let generator = IssuanceRequestGenerator::default();
/// let request = generator.generate(&mut rand::rng());
///
/// assert!((1..=MAX_USER_ID).contains(&request.user_id));
/// assert_eq!(request.coupon_id, 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuanceRequestGenerator {
    user_ids: UserIdMode,
    coupon_id: u64,
}
impl IssuanceRequestGenerator {
    /// Validates the user id mode and returns a generator.
    pub fn new(user_ids: UserIdMode, coupon_id: u64) -> Result<Self, CouponError> {
        match user_ids {
            UserIdMode::Random { min, max } => {
                if min < MIN_USER_ID {
                    return Err(CouponError::InvalidOption {
                        option: "`user_ids.min`".to_string(),
                        value: min.to_string(),
                        detail: format!("user ids start at {}.", MIN_USER_ID),
                    });
                }
                if min > max {
                    return Err(CouponError::InvalidOption {
                        option: "`user_ids.max`".to_string(),
                        value: max.to_string(),
                        detail: format!("must be greater than or equal to the minimum ({}).", min),
                    });
                }
            }
            UserIdMode::Fixed(user_id) => {
                if user_id < MIN_USER_ID {
                    return Err(CouponError::InvalidOption {
                        option: "`user_ids.fixed`".to_string(),
                        value: user_id.to_string(),
                        detail: format!("user ids start at {}.", MIN_USER_ID),
                    });
                }
            }
        }

        Ok(IssuanceRequestGenerator {
            user_ids,
            coupon_id,
        })
    }

    /// Builds the next request.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> IssuanceRequest {
        let user_id = match self.user_ids {
            UserIdMode::Random { min, max } => rng.random_range(min..=max),
            UserIdMode::Fixed(user_id) => user_id,
        };

        IssuanceRequest {
            user_id,
            coupon_id: self.coupon_id,
        }
    }
}
impl Default for IssuanceRequestGenerator {
    fn default() -> Self {
        IssuanceRequestGenerator {
            user_ids: UserIdMode::default(),
            coupon_id: DEFAULT_COUPON_ID,
        }
    }
}
