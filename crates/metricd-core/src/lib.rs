//! metricd-core: the metric model shared by the agent and the server.
//!
//! A [`Metric`] is either a counter (accumulate-on-write) or a gauge
//! (replace-on-write). The [`codec`] module converts metrics to and from the
//! type-discriminated JSON record used both on the wire and in the journal:
//!
//! ```text
//! {"id":"hits","type":"counter","delta":5}
//! {"id":"load","type":"gauge","value":0.75}
//! ```

pub mod codec;
pub mod error;
pub mod metric;

pub use codec::{MetricQuery, decode, decode_query, encode, encode_all, parse_path};
pub use error::{CodecError, CodecResult};
pub use metric::{Metric, MetricKind, MetricValue};
