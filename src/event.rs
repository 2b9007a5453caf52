//! Trace event model (Chrome Trace Event Format)
//!
//! Events are decoded leniently: every field except the phase code falls back
//! to its default when missing, null, or of the wrong type, so a single odd
//! event never fails the whole trace.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Ordered key/value arguments attached to an event
pub type Args = serde_json::Map<String, Value>;

/// Process or thread identifier
///
/// Profilers emit both numeric ids and symbolic ones (e.g. `"Spans"`), so both
/// are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum TraceId {
    Num(i64),
    Name(String),
}

impl Default for TraceId {
    fn default() -> Self {
        TraceId::Num(0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceId::Num(n) => write!(f, "{}", n),
            TraceId::Name(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for TraceId {
    fn from(n: i64) -> Self {
        TraceId::Num(n)
    }
}

impl From<&str> for TraceId {
    fn from(s: &str) -> Self {
        TraceId::Name(s.to_string())
    }
}

impl<'de> Deserialize<'de> for TraceId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Value = Deserialize::deserialize(deserializer)?;
        match value {
            Value::Number(n) => Ok(n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .map(TraceId::Num)
                .unwrap_or_default()),
            Value::String(s) => Ok(TraceId::Name(s)),
            _ => Ok(TraceId::default()),
        }
    }
}

/// Semantic kind of a trace event (`ph` field)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    /// `B`
    Begin,
    /// `E`
    End,
    /// `X`
    Complete,
    /// `M` or `m`
    Metadata,
    /// `C`
    Counter,
    /// Instant, async, flow, ... kept with the raw `ph` code
    Other(String),
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Other(String::new())
    }
}

impl Phase {
    pub fn from_code(code: &str) -> Self {
        match code {
            "B" => Phase::Begin,
            "E" => Phase::End,
            "X" => Phase::Complete,
            "M" | "m" => Phase::Metadata,
            "C" => Phase::Counter,
            other => Phase::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Phase::Begin => "B",
            Phase::End => "E",
            Phase::Complete => "X",
            Phase::Metadata => "M",
            Phase::Counter => "C",
            Phase::Other(code) => code,
        }
    }
}

impl From<String> for Phase {
    fn from(code: String) -> Self {
        Phase::from_code(&code)
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.code().to_string()
    }
}

/// A single event as found in the trace payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "ph", default)]
    pub phase: Phase,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(
        rename = "cat",
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(default)]
    pub pid: TraceId,
    #[serde(default)]
    pub tid: TraceId,
    /// Absolute timestamp in microseconds
    #[serde(default, deserialize_with = "lenient::number")]
    pub ts: f64,
    /// Duration in microseconds (Complete events only)
    #[serde(
        default,
        deserialize_with = "lenient::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub dur: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::args",
        skip_serializing_if = "Option::is_none"
    )]
    pub args: Option<Args>,
}

/// Field decoders that map null or wrong-typed values to the field default
mod lenient {
    use super::Args;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_string(d)?.unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_number(d)?.unwrap_or(0.0))
    }

    /// Numbers and numeric strings; non-finite values are dropped
    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let number = match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(number.filter(|n| n.is_finite()))
    }

    pub fn args<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Args>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => Some(map),
            _ => None,
        })
    }
}

impl RawEvent {
    /// Create an event with the given phase and no optional fields
    pub fn new(phase: Phase, name: impl Into<String>, pid: TraceId, tid: TraceId, ts: f64) -> Self {
        Self {
            phase,
            name: name.into(),
            category: None,
            pid,
            tid,
            ts,
            dur: None,
            args: None,
        }
    }

    /// Look up a single argument
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.as_ref().and_then(|args| args.get(key))
    }

    /// Narrow to a Complete event; `None` unless `ph == X` with a duration
    pub fn as_complete(&self) -> Option<CompleteEvent> {
        match (&self.phase, self.dur) {
            (Phase::Complete, Some(dur)) => Some(CompleteEvent {
                name: self.name.clone(),
                category: self.category.clone(),
                pid: self.pid.clone(),
                tid: self.tid.clone(),
                ts: self.ts,
                dur: dur.max(0.0),
                args: self.args.clone(),
            }),
            _ => None,
        }
    }
}

/// An interval event with a resolved duration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteEvent {
    pub name: String,
    #[serde(rename = "cat", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub pid: TraceId,
    pub tid: TraceId,
    pub ts: f64,
    pub dur: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

impl CompleteEvent {
    /// End timestamp (`ts + dur`)
    pub fn end(&self) -> f64 {
        self.ts + self.dur
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.as_ref().and_then(|args| args.get(key))
    }

    /// `(pid, tid)` thread key
    pub fn thread_key(&self) -> (TraceId, TraceId) {
        (self.pid.clone(), self.tid.clone())
    }
}
