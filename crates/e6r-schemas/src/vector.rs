//! Columnar chunk model.
//!
//! A result batch arrives as a [`Chunk`]: a row count plus one [`Vector`] per
//! column. Each vector is either per-row data (`constant = false`) or a
//! single scalar projected across every row (`constant = true`). Null-ness is
//! carried out-of-band in `nulls`; for constant vectors the mask has length
//! one (or zero, meaning non-null).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VectorType
// ---------------------------------------------------------------------------

/// Column type tag. Every decoder dispatch is keyed on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorType {
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    Boolean,
    String,
    Array,
    Map,
    Struct,
    Binary,
    Date,
    DateTime,
    TimestampTz,
    /// Metadata-stream only: Julian day + time-of-day.
    Int96,
    Decimal128,
    Null,
}

impl VectorType {
    /// Map a wire-level type name (field descriptor or vector tag) to a type.
    /// Returns `None` for names this connector does not know — callers treat
    /// that as a per-cell decode failure, never as a fatal error.
    pub fn parse(name: &str) -> Option<VectorType> {
        match name.trim().to_ascii_uppercase().as_str() {
            "LONG" | "BIGINT" => Some(VectorType::Long),
            "INTEGER" | "INT" => Some(VectorType::Integer),
            "SHORT" | "SMALLINT" => Some(VectorType::Short),
            "BYTE" | "TINYINT" => Some(VectorType::Byte),
            "DOUBLE" => Some(VectorType::Double),
            "FLOAT" | "REAL" => Some(VectorType::Float),
            "BOOLEAN" | "BOOL" => Some(VectorType::Boolean),
            "STRING" | "VARCHAR" => Some(VectorType::String),
            "ARRAY" => Some(VectorType::Array),
            "MAP" => Some(VectorType::Map),
            "STRUCT" => Some(VectorType::Struct),
            "BINARY" => Some(VectorType::Binary),
            "DATE" => Some(VectorType::Date),
            "DATETIME" | "TIMESTAMP" => Some(VectorType::DateTime),
            "TIMESTAMP_TZ" => Some(VectorType::TimestampTz),
            "INT96" => Some(VectorType::Int96),
            "DECIMAL128" | "DECIMAL" => Some(VectorType::Decimal128),
            "NULL" => Some(VectorType::Null),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// VectorData
// ---------------------------------------------------------------------------

/// Typed payload union of a [`Vector`].
///
/// Per-row array variants pair with `constant = false`; scalar variants pair
/// with `constant = true`. Constant scalars arrive widened (integers as
/// `i64`, floats as `f64`) regardless of the declared column type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VectorData {
    /// LONG / DATE / DATETIME (epoch microseconds for the temporal types).
    Long { values: Vec<i64> },
    Int32 { values: Vec<i32> },
    Double { values: Vec<f64> },
    Float32 { values: Vec<f32> },
    Bool { values: Vec<bool> },
    /// STRING and the composite types (ARRAY / MAP / STRUCT as opaque JSON).
    Utf8 { values: Vec<String> },
    Binary { values: Vec<Vec<u8>> },
    /// Epoch microseconds plus a per-row IANA zone name.
    TimestampTz { micros: Vec<i64>, zones: Vec<String> },
    /// 16-byte IEEE 754-2008 Decimal128 big-endian blobs.
    Decimal128 { values: Vec<Vec<u8>> },

    ConstLong(i64),
    ConstDouble(f64),
    ConstBool(bool),
    ConstUtf8(String),
    ConstBinary(Vec<u8>),
    ConstTimestampTz { micros: i64, zone: String },
    ConstDecimal128(Vec<u8>),

    /// NULL-typed columns carry no payload.
    Absent,
}

// ---------------------------------------------------------------------------
// Vector / Chunk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    /// Logical row count — equals the chunk size even for constant vectors.
    pub size: i32,
    pub vtype: VectorType,
    /// Out-of-band null mask. Length `size` for per-row vectors; length 1 (or
    /// 0, meaning non-null) for constant vectors.
    pub nulls: Vec<bool>,
    pub constant: bool,
    /// IANA zone name for temporal columns; empty when not applicable.
    pub zone: String,
    /// Server-side formatting hint; opaque to the connector.
    pub format: String,
    pub data: VectorData,
}

impl Vector {
    /// Null-ness of logical row `i`, honoring constant-vector projection.
    /// A mask shorter than the row index means non-null.
    pub fn null_at(&self, i: usize) -> bool {
        if self.constant {
            self.nulls.first().copied().unwrap_or(false)
        } else {
            self.nulls.get(i).copied().unwrap_or(false)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub size: i32,
    pub vectors: Vec<Vector>,
}

// ---------------------------------------------------------------------------
// FieldInfo
// ---------------------------------------------------------------------------

/// One field descriptor from the row-metadata stream: name, wire type name,
/// zone and formatting hint, all exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: String,
    pub zone: String,
    pub format: String,
}

impl FieldInfo {
    /// Resolved [`VectorType`], if the wire name is known.
    pub fn vector_type(&self) -> Option<VectorType> {
        VectorType::parse(&self.field_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
