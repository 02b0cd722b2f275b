//! metricd-agent: the producing side.
//!
//! Samples process and host runtime statistics on one interval and reports
//! them to a metricd server on another.
//!
//! # Architecture
//!
//! ```text
//! Agent
//!   ├── poll task   → Sampler::sample() → PendingBuffer::absorb()
//!   └── report task → PendingBuffer::snapshot() → Reporter::send() per metric
//!                                               → PendingBuffer::acknowledge()
//! ```
//!
//! The two tasks are independent: either may stop or fail without taking the
//! other down. A failed send is dropped for that tick; counter deltas stay in
//! the buffer and go out with the next report.

pub mod agent;
pub mod buffer;
pub mod error;
pub mod reporter;
pub mod sampler;

pub use agent::Agent;
pub use buffer::PendingBuffer;
pub use error::{AgentError, AgentResult};
pub use reporter::Reporter;
pub use sampler::{RuntimeSampler, Sampler};
