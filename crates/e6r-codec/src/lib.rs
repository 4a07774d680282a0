//! e6r-codec
//!
//! Decoding of the two result wire shapes into row tuples of typed
//! [`Value`]s:
//!
//! - **Row-metadata stream** — a fixed-width big-endian stream carrying the
//!   row count and field descriptors, optionally followed (in batch
//!   responses) by per-row presence-flagged values.
//! - **Columnar chunk** — the self-describing [`e6r_schemas::Chunk`]: typed
//!   vectors with out-of-band null masks and constant-vector projection.
//!
//! Decoding is a pure function of bytes plus declared schema: no IO, no
//! hidden state. A cell that cannot be converted never aborts the enclosing
//! fetch — it decodes to the parse sentinel (stream) or to null (chunk) and
//! the batch completes. Chunks decode in one pass per vector plus one row
//! assembly pass.

mod chunk;
mod decimal;
mod metadata;
mod reader;
mod temporal;
mod value;

pub use chunk::decode_chunk;
pub use decimal::{decimal_from_binary, decimal_from_text};
pub use metadata::{decode_batch, decode_result_meta, ResultMeta};
pub use reader::{ByteReader, DecodeError};
pub use temporal::{
    date_from_micros, datetime_from_julian, datetime_from_micros, floor_div, floor_mod,
    zoned_from_micros, MICROS_PER_SEC, UNIX_EPOCH_JULIAN_DAY,
};
pub use value::{Value, PARSE_SENTINEL};
