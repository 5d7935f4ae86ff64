//! Coupon issuance load test.
//!
//! Goose's runtime options are taken from the command line, coupon settings from the
//! `COUPON_*` environment. For example:
//!
//! ```bash
//! $ COUPON_ENDPOINT=v2-async coupon-loadtest --host http://localhost:8080 \
//!     --users 500 --hatch-rate 50 --run-time 2m
//! ```

use gumdrop::Options;

use coupon_loadtest::config::CouponConfiguration;
use coupon_loadtest::{build_attack, CouponError};
use goose::config::GooseConfiguration;

#[tokio::main]
async fn main() -> Result<(), CouponError> {
    let goose_configuration = GooseConfiguration::parse_args_default_or_exit();
    let configuration = CouponConfiguration::from_env()?;

    let goose_metrics = build_attack(goose_configuration, &configuration)?
        .execute()
        .await?;

    // Goose only initializes the logger once the attack is executing.
    log::info!(
        "issued coupon {} through {} ({})",
        configuration.coupon_id,
        configuration.endpoint,
        configuration.user_ids
    );
    log::debug!("coupon configuration: {:?}", configuration);

    // Goose prints the full report; leave a one-line summary in the log.
    if let Some(issued) = goose_metrics
        .requests
        .get(&configuration.endpoint.request_key())
    {
        log::info!(
            "{}: {} requests, {} succeeded, {} failed",
            configuration.endpoint,
            issued.raw_data.counter,
            issued.success_count,
            issued.fail_count
        );
    }

    Ok(())
}
