use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Login attempts by outcome",
        &["status"]
    ).unwrap();

    pub static ref SIGNUPS_COUNTER: CounterVec = register_counter_vec!(
        "api_signups_total",
        "Signup attempts by outcome",
        &["status"]
    ).unwrap();

    pub static ref TOKEN_REJECTIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_token_rejections_total",
        "Bearer tokens rejected by reason",
        &["reason"]
    ).unwrap();

    pub static ref STORE_TIMEOUTS_COUNTER: CounterVec = register_counter_vec!(
        "api_store_timeouts_total",
        "Store operations abandoned after the timeout",
        &["operation"]
    ).unwrap();
}

/// Outcome label for counters, from a handler result.
pub fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "failure" }
}
