//! Per-client rate limiting.
//!
//! Clients are keyed by IP with `SmartIpKeyExtractor`, which reads `X-Forwarded-For`,
//! `X-Real-IP` and `Forwarded` before falling back to the peer address. The server must
//! therefore be started with `into_make_service_with_connect_info::<SocketAddr>()`.

/// Seconds before one generation request is replenished
pub const GENERATION_RATE_PER_SECOND: u64 = 2;

/// Generation requests a client may fire back to back
pub const GENERATION_BURST_SIZE: u32 = 5;

/// Build a `tower_governor` layer replenishing one request every `$per_second` seconds,
/// allowing bursts of `$burst` requests.
#[macro_export]
macro_rules! make_rate_limit_layer {
    ($per_second:expr, $burst:expr) => {{
        let governor_conf = ::tower_governor::governor::GovernorConfigBuilder::default()
            .per_second($per_second)
            .burst_size($burst)
            .key_extractor(::tower_governor::key_extractor::SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .expect("rate limit configuration has non-zero period and burst");

        ::tower_governor::GovernorLayer::new(governor_conf)
    }};
}
