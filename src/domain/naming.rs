/// Fully-qualified metric name: `prefix` immediately followed by `suffix`.
///
/// No character validation happens here; an invalid result is rejected when
/// the series is registered.
pub fn metric_name(prefix: &str, suffix: &str) -> String {
    format!("{prefix}{suffix}")
}
