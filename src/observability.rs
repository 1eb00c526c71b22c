//! Tracing initialization, grounded in the corpus's `tracing_subscriber`
//! idiom (`RUST_LOG`-driven `EnvFilter`, compact formatter).

pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .compact()
        .with_target(false)
        .init();
}
