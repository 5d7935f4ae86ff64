pub use crate::config::{CouponConfiguration, IssueEndpoint};
pub use crate::request::{IssuanceRequest, IssuanceRequestGenerator, IssueResponse, UserIdMode};
pub use crate::transaction::{coupon_scenario, IssueTransaction};
pub use crate::transport::{submit_issuance, HttpTransport, IssueReply, IssueTransport};
pub use crate::{build_attack, CouponError};
pub use goose::prelude::*;
