//! Row-metadata stream decoding (the fixed-width big-endian shape).
//!
//! Layout:
//!
//! ```text
//! int64  rowCount
//! int32  fieldCount
//! field × fieldCount:  { uint16 len + name, type, zone, format }
//! row   × rowCount (batch responses only):
//!     per field: int8 present; if present, a typed big-endian value
//! ```
//!
//! The header must frame or decoding fails structurally. Row values never
//! fail the batch: a cell that cannot be converted becomes the parse
//! sentinel, and if the stream becomes unframeable mid-row (truncation, or a
//! field type whose width is unknowable) the current row is padded with
//! sentinels and the rows decoded so far are returned.

use tracing::warn;

use e6r_schemas::{FieldInfo, VectorType};

use crate::decimal::decimal_from_text;
use crate::reader::{ByteReader, DecodeError};
use crate::temporal::{date_from_micros, datetime_from_julian, datetime_from_micros, zoned_from_micros};
use crate::value::Value;

// ---------------------------------------------------------------------------
// ResultMeta
// ---------------------------------------------------------------------------

/// Decoded stream header: how many rows follow and what each column is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMeta {
    pub row_count: i64,
    pub fields: Vec<FieldInfo>,
}

/// Decode a header-only blob (the get-result-metadata payload).
pub fn decode_result_meta(bytes: &[u8]) -> Result<ResultMeta, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    read_meta(&mut reader)
}

/// Decode a batch blob: header followed by presence-flagged rows.
pub fn decode_batch(bytes: &[u8]) -> Result<(ResultMeta, Vec<Vec<Value>>), DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let meta = read_meta(&mut reader)?;
    let rows = read_rows(&mut reader, &meta);
    Ok((meta, rows))
}

fn read_meta(reader: &mut ByteReader<'_>) -> Result<ResultMeta, DecodeError> {
    let row_count = reader.read_i64()?;
    let field_count = reader.read_i32()?;
    if field_count < 0 {
        return Err(DecodeError::Malformed(format!(
            "negative field count: {field_count}"
        )));
    }
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(FieldInfo {
            name: reader.read_utf()?,
            field_type: reader.read_utf()?,
            zone: reader.read_utf()?,
            format: reader.read_utf()?,
        });
    }
    Ok(ResultMeta { row_count, fields })
}

fn read_rows(reader: &mut ByteReader<'_>, meta: &ResultMeta) -> Vec<Vec<Value>> {
    let expected = usize::try_from(meta.row_count).unwrap_or(0);
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(expected.min(4096));

    for _ in 0..expected {
        if !reader.has_remaining() {
            break;
        }
        let mut row = Vec::with_capacity(meta.fields.len());
        for field in &meta.fields {
            match read_cell(reader, field) {
                Ok(value) => row.push(value),
                Err(e) => {
                    // Unframeable from here on; finish this row with
                    // sentinels and stop.
                    warn!(error = %e, field = %field.name, "row stream unframeable; truncating batch");
                    while row.len() < meta.fields.len() {
                        row.push(Value::parse_sentinel());
                    }
                    rows.push(row);
                    return rows;
                }
            }
        }
        rows.push(row);
    }
    rows
}

/// One presence-flagged cell. `Err` means the stream cannot be framed past
/// this point; a conversion problem inside a well-framed value yields the
/// sentinel instead.
fn read_cell(reader: &mut ByteReader<'_>, field: &FieldInfo) -> Result<Value, DecodeError> {
    if reader.read_i8()? == 0 {
        return Ok(Value::Null);
    }
    let vtype = field
        .vector_type()
        .ok_or_else(|| DecodeError::UnknownType(field.field_type.clone()))?;

    let value = match vtype {
        VectorType::Long => Value::Int(reader.read_i64()?),
        VectorType::Integer => Value::Int(i64::from(reader.read_i32()?)),
        VectorType::Short => Value::Int(i64::from(reader.read_i16()?)),
        VectorType::Byte => Value::Int(i64::from(reader.read_i8()?)),
        VectorType::Float => Value::Float(f64::from(reader.read_f32()?)),
        VectorType::Double => Value::Float(reader.read_f64()?),
        VectorType::Boolean => Value::Bool(reader.read_u8()? != 0),
        VectorType::String | VectorType::Array | VectorType::Map | VectorType::Struct => {
            Value::Str(reader.read_utf()?)
        }
        VectorType::Binary => Value::Bytes(reader.read_len_bytes()?.to_vec()),
        VectorType::Date => {
            let micros = reader.read_i64()?;
            match date_from_micros(micros) {
                Some(date) => Value::Date(date),
                None => Value::parse_sentinel(),
            }
        }
        VectorType::DateTime => {
            let micros = reader.read_i64()?;
            match datetime_from_micros(micros) {
                Some(dt) => Value::DateTime(dt),
                None => Value::parse_sentinel(),
            }
        }
        VectorType::TimestampTz => {
            let micros = reader.read_i64()?;
            match zoned_from_micros(micros, &field.zone) {
                Some(dt) => Value::Zoned(dt),
                None => Value::parse_sentinel(),
            }
        }
        VectorType::Int96 => {
            let julian_day = reader.read_i32()?;
            let nanos = reader.read_i64()?;
            match datetime_from_julian(julian_day, nanos) {
                Some(dt) => Value::DateTime(dt),
                None => Value::parse_sentinel(),
            }
        }
        VectorType::Decimal128 => {
            let text = reader.read_utf()?;
            match decimal_from_text(&text) {
                Some(decimal) => Value::Decimal(decimal),
                None => Value::parse_sentinel(),
            }
        }
        VectorType::Null => Value::Null,
    };
    Ok(value)
}
