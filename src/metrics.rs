use crate::report::Report;
use prometheus::{
    Encoder, Registry, TextEncoder, opts, register_gauge_with_registry,
    register_int_gauge_vec_with_registry, register_int_gauge_with_registry,
};

/// Encode one report in the Prometheus text exposition format.
///
/// A fresh registry is built per call, nothing is shared between checks.
///
/// # Errors
///
/// Returns an error if a metric cannot be registered or encoded
pub fn encode(report: &Report) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    let up = register_int_gauge_with_registry!("querypulse_up", "1 ok, 0 critical", &registry)?;
    up.set(i64::from(report.is_ok()));

    #[allow(clippy::cast_precision_loss)]
    let runtime_seconds = report.runtime_ms as f64 / 1000.0;
    register_gauge_with_registry!(
        "querypulse_runtime_seconds",
        "check duration in seconds",
        &registry
    )?
    .set(runtime_seconds);

    if let Some(rows) = report.row_count {
        register_int_gauge_with_registry!(
            "querypulse_rows",
            "rows returned by the query",
            &registry
        )?
        .set(i64::try_from(rows).unwrap_or(i64::MAX));
    }

    if let Some(value) = report.number_output.as_ref().and_then(serde_json::Number::as_f64) {
        register_gauge_with_registry!(
            "querypulse_number_output",
            "numeric value of the last row",
            &registry
        )?
        .set(value);
    }

    if let Some(text) = &report.text_output {
        register_int_gauge_vec_with_registry!(
            opts!(
                "querypulse_text_output_info",
                "textual value of the last row - value is always 1"
            ),
            &["value"],
            &registry
        )?
        .with_label_values(&[text.as_str()])
        .set(1);
    }

    if let Some(kind) = &report.failure {
        register_int_gauge_vec_with_registry!(
            opts!(
                "querypulse_failure_info",
                "failure category of a critical check - value is always 1"
            ),
            &["kind"],
            &registry
        )?
        .with_label_values(&[kind.as_str()])
        .set(1);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;

    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
