//! Record codec: the single serialized shape used on the wire and on disk.
//!
//! Encoding emits `{id, type, delta}` for counters and `{id, type, value}`
//! for gauges; the inactive field is omitted rather than zero-filled.
//!
//! Decoding is two-phase: the record is first read into a generic JSON
//! object to peek the `type` discriminant, then the remaining fields are
//! strictly decoded into the counter- or gauge-shaped record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::metric::{Metric, MetricKind, MetricValue};

/// Outgoing record. Exactly one of `delta` / `value` is populated.
#[derive(Serialize)]
struct Record<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CounterFields {
    id: String,
    delta: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GaugeFields {
    id: String,
    value: f64,
}

#[derive(Deserialize)]
struct QueryFields {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Lookup request body: `{"id": "...", "type": "counter" | "gauge"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub id: String,
    pub kind: MetricKind,
}

/// Encode a metric into a single JSON record (no trailing newline).
pub fn encode(metric: &Metric) -> CodecResult<Vec<u8>> {
    let record = match metric.value {
        MetricValue::Counter(delta) => Record {
            id: &metric.id,
            kind: MetricKind::Counter,
            delta: Some(delta),
            value: None,
        },
        MetricValue::Gauge(value) => {
            if !value.is_finite() {
                return Err(CodecError::NonFinite {
                    id: metric.id.clone(),
                });
            }
            Record {
                id: &metric.id,
                kind: MetricKind::Gauge,
                delta: None,
                value: Some(value),
            }
        }
    };
    serde_json::to_vec(&record).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Encode a sequence of metrics as a JSON array of records.
pub fn encode_all(metrics: &[Metric]) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(metrics.len() * 48 + 2);
    out.push(b'[');
    for (i, metric) in metrics.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        out.extend_from_slice(&encode(metric)?);
    }
    out.push(b']');
    Ok(out)
}

/// Decode a single JSON record into a metric.
pub fn decode(bytes: &[u8]) -> CodecResult<Metric> {
    let mut fields = decode_object(bytes)?;
    let kind = match fields.remove("type") {
        Some(Value::String(s)) => s.parse::<MetricKind>()?,
        Some(other) => {
            return Err(CodecError::Malformed(format!(
                "field `type` must be a string, got {other}"
            )));
        }
        None => return Err(CodecError::Malformed("missing field `type`".to_string())),
    };

    let rest = Value::Object(fields);
    let metric = match kind {
        MetricKind::Counter => {
            let c: CounterFields = serde_json::from_value(rest).map_err(malformed(kind))?;
            Metric::counter(c.id, c.delta)
        }
        MetricKind::Gauge => {
            let g: GaugeFields = serde_json::from_value(rest).map_err(malformed(kind))?;
            Metric::gauge(g.id, g.value)
        }
    };

    if metric.id.is_empty() {
        return Err(CodecError::Malformed("empty metric id".to_string()));
    }
    Ok(metric)
}

/// Decode a lookup request body.
///
/// Extra fields are ignored so a full record can be posted as a query.
pub fn decode_query(bytes: &[u8]) -> CodecResult<MetricQuery> {
    let q: QueryFields =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let kind = q.kind.parse::<MetricKind>()?;
    if q.id.is_empty() {
        return Err(CodecError::Malformed("empty metric id".to_string()));
    }
    Ok(MetricQuery { id: q.id, kind })
}

/// Build a metric from the path-parameter form `/{type}/{id}/{value}`.
///
/// `raw` is parsed as `i64` for counters and as a finite `f64` for gauges.
pub fn parse_path(kind: &str, id: &str, raw: &str) -> CodecResult<Metric> {
    let kind = kind.parse::<MetricKind>()?;
    if id.is_empty() {
        return Err(CodecError::Malformed("empty metric id".to_string()));
    }
    match kind {
        MetricKind::Counter => raw
            .parse::<i64>()
            .map(|delta| Metric::counter(id, delta))
            .map_err(|_| CodecError::Malformed(format!("counter delta {raw:?} is not an integer"))),
        MetricKind::Gauge => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Metric::gauge(id, value)),
            _ => Err(CodecError::Malformed(format!(
                "gauge value {raw:?} is not a finite number"
            ))),
        },
    }
}

fn decode_object(bytes: &[u8]) -> CodecResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CodecError::Malformed(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(CodecError::Malformed(e.to_string())),
    }
}

fn malformed(kind: MetricKind) -> impl Fn(serde_json::Error) -> CodecError {
    move |e| CodecError::Malformed(format!("{kind} record: {e}"))
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn counter_encodes_without_value_field() {
        let bytes = encode(&Metric::counter("hits", 5)).unwrap();
        let json = as_json(&bytes);
        assert_eq!(json["id"], "hits");
        assert_eq!(json["type"], "counter");
        assert_eq!(json["delta"], 5);
        assert!(json.get("value").is_none());
    }

    #[test]
    fn gauge_encodes_without_delta_field() {
        let bytes = encode(&Metric::gauge("load", 0.75)).unwrap();
        let json = as_json(&bytes);
        assert_eq!(json["type"], "gauge");
        assert_eq!(json["value"], 0.75);
        assert!(json.get("delta").is_none());
    }

    #[test]
    fn explicit_zero_survives_round_trip() {
        for m in [Metric::counter("c", 0), Metric::gauge("g", 0.0)] {
            let bytes = encode(&m).unwrap();
            assert_eq!(decode(&bytes).unwrap(), m);
        }
    }

    #[test]
    fn round_trip_preserves_extremes() {
        let metrics = [
            Metric::counter("min", i64::MIN),
            Metric::counter("max", i64::MAX),
            Metric::gauge("tiny", f64::MIN_POSITIVE),
            Metric::gauge("neg", -1234.5678),
            Metric::gauge("third", 1.0 / 3.0),
        ];
        for m in metrics {
            assert_eq!(decode(&encode(&m).unwrap()).unwrap(), m);
        }
    }

    #[test]
    fn non_finite_gauge_refuses_to_encode() {
        let err = encode(&Metric::gauge("bad", f64::NAN)).unwrap_err();
        assert_eq!(err, CodecError::NonFinite { id: "bad".to_string() });
        assert!(encode(&Metric::gauge("bad", f64::INFINITY)).is_err());
    }

    #[test]
    fn unknown_kind_is_distinguished() {
        let err = decode(br#"{"id":"h","type":"histogram","value":1}"#).unwrap_err();
        assert_eq!(err, CodecError::UnknownKind("histogram".to_string()));
    }

    #[test]
    fn missing_or_non_string_type_is_malformed() {
        assert!(matches!(
            decode(br#"{"id":"x","delta":1}"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode(br#"{"id":"x","type":7,"delta":1}"#),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn payload_must_match_declared_kind() {
        // Counter without delta.
        assert!(matches!(
            decode(br#"{"id":"c","type":"counter","value":1.5}"#),
            Err(CodecError::Malformed(_))
        ));
        // Fractional delta.
        assert!(matches!(
            decode(br#"{"id":"c","type":"counter","delta":1.5}"#),
            Err(CodecError::Malformed(_))
        ));
        // Gauge without value.
        assert!(matches!(
            decode(br#"{"id":"g","type":"gauge"}"#),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn both_payload_fields_are_rejected() {
        let err = decode(br#"{"id":"c","type":"counter","delta":1,"value":2.0}"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn gauge_accepts_integer_literal() {
        let m = decode(br#"{"id":"g","type":"gauge","value":3}"#).unwrap();
        assert_eq!(m, Metric::gauge("g", 3.0));
    }

    #[test]
    fn empty_id_and_non_objects_are_malformed() {
        assert!(matches!(
            decode(br#"{"id":"","type":"counter","delta":1}"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(decode(b"[1,2]"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode(b"not json"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn encode_all_produces_array() {
        assert_eq!(encode_all(&[]).unwrap(), b"[]");
        let bytes = encode_all(&[Metric::counter("a", 1), Metric::gauge("b", 2.5)]).unwrap();
        let json = as_json(&bytes);
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["value"], 2.5);
    }

    #[test]
    fn query_ignores_payload_fields() {
        let q = decode_query(br#"{"id":"hits","type":"counter","delta":9}"#).unwrap();
        assert_eq!(
            q,
            MetricQuery {
                id: "hits".to_string(),
                kind: MetricKind::Counter
            }
        );
        assert!(matches!(
            decode_query(br#"{"id":"hits","type":"summary"}"#),
            Err(CodecError::UnknownKind(_))
        ));
    }

    #[test]
    fn path_form_parses_by_kind() {
        assert_eq!(parse_path("counter", "hits", "5").unwrap(), Metric::counter("hits", 5));
        assert_eq!(parse_path("gauge", "load", "2.75").unwrap(), Metric::gauge("load", 2.75));
        assert!(matches!(
            parse_path("counter", "hits", "5.5"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            parse_path("gauge", "load", "NaN"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            parse_path("histogram", "h", "1"),
            Err(CodecError::UnknownKind(_))
        ));
    }
}
