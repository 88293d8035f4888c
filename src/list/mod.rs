//! Deferred invalidation lists.
//!
//! Invalidation traffic is bursty, so pending messages are kept in chunks of
//! geometrically growing capacity instead of one buffer per message. A
//! [`ListHeader`] groups three such lists by dispatch class.

mod chunked;
mod header;
pub use chunked::*;
pub use header::*;
