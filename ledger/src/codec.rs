//! # Record Codec
//!
//! Every persisted entity encodes to an ordered list of byte fields, in
//! declaration order. The list itself goes through bincode with fixed-width
//! big-endian integers, so each field carries its own length prefix and the
//! whole record is self-delimiting.
//!
//! ```text
//! record  = bincode(Vec<field>)
//! field   = raw bytes of one primitive, or bincode(Vec<field>) for a list
//! ```
//!
//! Decoding is strict. Truncation, trailing bytes, a different field count,
//! a fixed-width field of the wrong width, or an unknown tag all fail with
//! [`LedgerError::MalformedRecord`]. Two nodes that encode the same entity
//! always produce the same bytes, which is what lets block change logs be
//! hashed and compared.

use bincode::Options;
use primitive_types::{H160, H256, U256};

use crate::config::{ADDRESS_LENGTH, HASH_LENGTH, MAX_RECORD_BYTES};
use crate::error::{LedgerError, LedgerResult};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .with_limit(MAX_RECORD_BYTES)
        .reject_trailing_bytes()
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An entity with a fixed, ordered field layout.
pub trait Record: Sized {
    /// Name used in error messages.
    const NAME: &'static str;

    /// Exact number of top-level fields. Decoding any other count fails.
    const FIELD_COUNT: usize;

    /// Append this record's fields, in declaration order.
    fn write_fields(&self, w: &mut FieldWriter) -> LedgerResult<()>;

    /// Consume fields in the same order [`Record::write_fields`] wrote them.
    fn read_fields(r: &mut FieldReader) -> LedgerResult<Self>;

    /// Encode to the canonical byte form.
    fn encode(&self) -> LedgerResult<Vec<u8>> {
        let mut w = FieldWriter::new(Self::NAME);
        self.write_fields(&mut w)?;
        if w.len() != Self::FIELD_COUNT {
            return Err(LedgerError::malformed(
                Self::NAME,
                format!("wrote {} fields, layout has {}", w.len(), Self::FIELD_COUNT),
            ));
        }
        w.finish()
    }

    /// Decode from the canonical byte form.
    fn decode(bytes: &[u8]) -> LedgerResult<Self> {
        let fields: Vec<Vec<u8>> = options()
            .deserialize(bytes)
            .map_err(|e| LedgerError::malformed(Self::NAME, e.to_string()))?;
        if fields.len() != Self::FIELD_COUNT {
            return Err(LedgerError::malformed(
                Self::NAME,
                format!("expected {} fields, found {}", Self::FIELD_COUNT, fields.len()),
            ));
        }
        Self::read_fields(&mut FieldReader::new(Self::NAME, fields))
    }
}

// ---------------------------------------------------------------------------
// FieldWriter
// ---------------------------------------------------------------------------

/// Accumulates the ordered field list of one record.
#[derive(Debug)]
pub struct FieldWriter {
    record: &'static str,
    fields: Vec<Vec<u8>>,
}

impl FieldWriter {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            fields: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn h256(&mut self, value: &H256) {
        self.fields.push(value.as_bytes().to_vec());
    }

    pub fn h160(&mut self, value: &H160) {
        self.fields.push(value.as_bytes().to_vec());
    }

    /// 32-byte big-endian, so every value has the same width.
    pub fn u256(&mut self, value: U256) {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.fields.push(buf.to_vec());
    }

    pub fn u64(&mut self, value: u64) {
        self.fields.push(value.to_be_bytes().to_vec());
    }

    pub fn u8(&mut self, value: u8) {
        self.fields.push(vec![value]);
    }

    pub fn str(&mut self, value: &str) {
        self.fields.push(value.as_bytes().to_vec());
    }

    pub fn bytes(&mut self, value: &[u8]) {
        self.fields.push(value.to_vec());
    }

    /// Write a homogeneous list as a single field. `each` must write exactly
    /// one field per item.
    pub fn list<T>(
        &mut self,
        items: &[T],
        mut each: impl FnMut(&mut FieldWriter, &T),
    ) -> LedgerResult<()> {
        let mut nested = FieldWriter::new(self.record);
        for item in items {
            each(&mut nested, item);
        }
        let encoded = nested.finish()?;
        self.fields.push(encoded);
        Ok(())
    }

    /// Serialize the accumulated field list.
    pub fn finish(self) -> LedgerResult<Vec<u8>> {
        options()
            .serialize(&self.fields)
            .map_err(|e| LedgerError::malformed(self.record, e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FieldReader
// ---------------------------------------------------------------------------

/// Hands out the fields of one decoded record, front to back.
#[derive(Debug)]
pub struct FieldReader {
    record: &'static str,
    fields: std::vec::IntoIter<Vec<u8>>,
}

impl FieldReader {
    pub fn new(record: &'static str, fields: Vec<Vec<u8>>) -> Self {
        Self {
            record,
            fields: fields.into_iter(),
        }
    }

    /// Fields not yet consumed.
    pub fn remaining(&self) -> usize {
        self.fields.len()
    }

    /// Build a [`LedgerError::MalformedRecord`] tagged with this record's name.
    pub fn malformed(&self, reason: impl Into<String>) -> LedgerError {
        LedgerError::malformed(self.record, reason)
    }

    fn next_field(&mut self) -> LedgerResult<Vec<u8>> {
        self.fields
            .next()
            .ok_or_else(|| self.malformed("missing field"))
    }

    fn fixed<const N: usize>(&mut self, what: &str) -> LedgerResult<[u8; N]> {
        let raw = self.next_field()?;
        <[u8; N]>::try_from(raw.as_slice()).map_err(|_| {
            self.malformed(format!("{what} field must be {N} bytes, got {}", raw.len()))
        })
    }

    pub fn h256(&mut self) -> LedgerResult<H256> {
        Ok(H256::from(self.fixed::<HASH_LENGTH>("hash")?))
    }

    pub fn h160(&mut self) -> LedgerResult<H160> {
        Ok(H160::from(self.fixed::<ADDRESS_LENGTH>("address")?))
    }

    pub fn u256(&mut self) -> LedgerResult<U256> {
        Ok(U256::from_big_endian(&self.fixed::<32>("u256")?))
    }

    pub fn u64(&mut self) -> LedgerResult<u64> {
        Ok(u64::from_be_bytes(self.fixed::<8>("u64")?))
    }

    pub fn u8(&mut self) -> LedgerResult<u8> {
        Ok(self.fixed::<1>("u8")?[0])
    }

    pub fn string(&mut self) -> LedgerResult<String> {
        let raw = self.next_field()?;
        String::from_utf8(raw).map_err(|e| self.malformed(format!("invalid utf-8: {e}")))
    }

    pub fn bytes(&mut self) -> LedgerResult<Vec<u8>> {
        self.next_field()
    }

    /// Read a list written by [`FieldWriter::list`]. `each` must consume
    /// exactly one field per call.
    pub fn list<T>(
        &mut self,
        mut each: impl FnMut(&mut FieldReader) -> LedgerResult<T>,
    ) -> LedgerResult<Vec<T>> {
        let raw = self.next_field()?;
        let elements: Vec<Vec<u8>> = options()
            .deserialize(&raw)
            .map_err(|e| self.malformed(format!("bad list field: {e}")))?;
        let mut nested = FieldReader::new(self.record, elements);
        let mut out = Vec::with_capacity(nested.remaining());
        while nested.remaining() > 0 {
            out.push(each(&mut nested)?);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
