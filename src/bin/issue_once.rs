//! Issue a single coupon, without Goose.
//!
//! Useful to confirm a target is up and answering before starting a load test:
//!
//! ```bash
//! $ issue-once --host http://localhost:8080 --user-id 42 -v
//! ```
//!
//! Unset options fall back to the same `COUPON_*` environment the load test reads. Exits
//! non-zero if the host is unreachable, the request times out, or the status is not 2xx.

use gumdrop::Options;
use log::LevelFilter;
use std::env;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use coupon_loadtest::config::{CouponConfiguration, IssueEndpoint};
use coupon_loadtest::request::UserIdMode;
use coupon_loadtest::transport::{submit_issuance, HttpTransport, IssueReply};
use coupon_loadtest::CouponError;

#[derive(Options, Debug, Default)]
#[options(help = "Sends one coupon issuance request and reports the outcome.")]
struct IssueOnceOptions {
    /// Displays this help
    #[options(short = "h")]
    help: bool,
    /// Defines host to issue against (default: COUPON_HOST or http://localhost:8080)
    #[options(short = "H")]
    host: Option<String>,
    /// Sets the user id (default: random)
    #[options(short = "u", meta = "ID")]
    user_id: Option<u64>,
    /// Sets the coupon id (default: COUPON_ID or 1)
    #[options(short = "c", meta = "ID")]
    coupon_id: Option<u64>,
    /// Sets the endpoint: v1, v1-async, v2-async (default: v1-async)
    #[options(short = "e", meta = "NAME")]
    endpoint: Option<IssueEndpoint>,
    /// Increases verbosity (-v, -vv, etc)
    #[options(count, short = "v")]
    verbose: u8,
    /// Decreases verbosity (-q, -qq, etc)
    #[options(count, short = "q")]
    quiet: u8,
}
impl IssueOnceOptions {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => match self.quiet {
                0 => LevelFilter::Info,
                1 => LevelFilter::Warn,
                _ => LevelFilter::Error,
            },
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Layer the command line over the `COUPON_*` values found through `lookup`.
    fn configuration<F>(&self, lookup: F) -> Result<CouponConfiguration, CouponError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut configuration = CouponConfiguration::from_lookup(lookup)?;
        if let Some(host) = &self.host {
            configuration.host = host.clone();
        }
        if let Some(user_id) = self.user_id {
            configuration.user_ids = UserIdMode::Fixed(user_id);
        }
        if let Some(coupon_id) = self.coupon_id {
            configuration.coupon_id = coupon_id;
        }
        if let Some(endpoint) = &self.endpoint {
            configuration.endpoint = endpoint.clone();
        }
        configuration.validate()?;

        Ok(configuration)
    }
}

/// Send one request to the configured target, returning the 2xx reply.
async fn issue_once(configuration: &CouponConfiguration) -> Result<IssueReply, CouponError> {
    let transport = HttpTransport::new(&configuration.host, configuration)?;
    let request = configuration
        .request_generator()?
        .generate(&mut rand::rng());

    log::info!(
        "{}{} {}",
        transport.base_url(),
        configuration.endpoint.path().trim_start_matches('/'),
        serde_json::to_string(&request).unwrap_or_default()
    );

    submit_issuance(
        &transport,
        &configuration.endpoint,
        &request,
        configuration.network_timeout,
    )
    .await
}

#[tokio::main]
async fn main() -> Result<(), CouponError> {
    let options = IssueOnceOptions::parse_args_default_or_exit();

    if let Err(e) = TermLogger::init(
        options.log_level(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logger: {}", e);
    }

    let configuration = options.configuration(|key| env::var(key).ok())?;
    log::debug!("coupon configuration: {:?}", configuration);

    let reply = match issue_once(&configuration).await {
        Ok(reply) => reply,
        Err(e) => {
            log::error!("{}", e);
            return Err(e);
        }
    };

    match reply.decode() {
        Some(issued) if issued.is_success => {
            log::info!("{}: coupon issued", reply.status)
        }
        Some(issued) => log::warn!(
            "{}: coupon not issued: {}",
            reply.status,
            issued.comment.as_deref().unwrap_or("no comment")
        ),
        None => log::info!("{}: {}", reply.status, reply.body),
    }

    Ok(())
}
