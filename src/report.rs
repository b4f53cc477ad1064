use crate::{
    check::{CheckStatus, State},
    metrics,
    reducer::ScalarValue,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a finished check is printed for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Prometheus,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "prometheus" => Ok(Self::Prometheus),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Output values of a check plus timing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub state: String,
    pub message: String,
    pub time: String,
    pub runtime_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_output: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Report {
    #[must_use]
    pub fn new(status: &CheckStatus, started: DateTime<Utc>, runtime: Duration) -> Self {
        let mut report = Self {
            state: status.state.to_string(),
            message: status.message.clone(),
            time: started.to_rfc3339_opts(SecondsFormat::Secs, true),
            runtime_ms: runtime.num_milliseconds(),
            failure: status.failure.map(|kind| kind.as_str().to_string()),
            ..Self::default()
        };

        if let Some(outcome) = &status.outcome {
            match &outcome.value {
                ScalarValue::Integer(v) => report.number_output = Some((*v).into()),
                // non-finite floats have no JSON number, report them as text
                ScalarValue::Float(v) => match serde_json::Number::from_f64(*v) {
                    Some(number) => report.number_output = Some(number),
                    None => report.text_output = Some(v.to_string()),
                },
                ScalarValue::Text(v) => report.text_output = Some(v.clone()),
            }
            report.row_count = Some(outcome.row_count);
        }

        report
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.state == State::Ok.to_string()
    }

    /// Single status line, Nagios style
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut line = format!("{}: {}", self.state, self.message);
        if let Some(number) = &self.number_output {
            line.push_str(&format!(" number_output={number}"));
        }
        if let Some(text) = &self.text_output {
            line.push_str(&format!(" text_output={text:?}"));
        }
        if let Some(rows) = self.row_count {
            line.push_str(&format!(" row_count={rows}"));
        }
        line
    }

    /// Render in the requested format
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => serde_json::to_string(self)?,
            OutputFormat::Prometheus => metrics::encode(self)?,
        })
    }
}
