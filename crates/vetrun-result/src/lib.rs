//! vetrun result contract
//!
//! Every launch and download operation reports its outcome through
//! [`OpResult`]: an exit-style code plus an ordered sequence of output
//! lines. Expected failures (missing file, untrusted host, bad signature)
//! are failed results, never errors or panics.

mod result;

pub use result::{codes, OpResult};
