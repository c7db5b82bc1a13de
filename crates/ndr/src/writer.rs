//! NDR output cursor
//!
//! The writer owns the output buffer, so its position is always the byte
//! offset from the start of the stub data, which is what NDR alignment is
//! computed against.

use crate::{NdrContext, NdrError, NdrFormat, NdrMarshal, Primitive, Result};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

/// First referent id handed out in a pass; ids then advance by 4
pub const FIRST_REFERENT_ID: u32 = 0x0002_0000;

/// Pointer referent waiting for the deferred pass
struct Deferred<'a> {
    referent_id: u32,
    value: &'a dyn NdrMarshal,
}

/// Stateful NDR encoder for one marshal pass
pub struct NdrWriter<'a> {
    buf: BytesMut,
    format: NdrFormat,
    capacity_limit: Option<usize>,
    deferred: Vec<Deferred<'a>>,
    next_referent: u32,
}

impl<'a> NdrWriter<'a> {
    pub fn new(format: NdrFormat) -> Self {
        Self {
            buf: BytesMut::new(),
            format,
            capacity_limit: None,
            deferred: Vec::new(),
            next_referent: FIRST_REFERENT_ID,
        }
    }

    /// Writer over a fixed-size sink: any write past `limit` bytes fails
    /// with [`NdrError::WriteFailure`].
    pub fn with_capacity_limit(format: NdrFormat, limit: usize) -> Self {
        let mut writer = Self::new(format);
        writer.capacity_limit = Some(limit);
        writer
    }

    #[inline]
    pub fn format(&self) -> NdrFormat {
        self.format
    }

    /// Bytes written so far
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Number of pointer referents waiting for [`write_deferred`](Self::write_deferred)
    pub fn pending_referents(&self) -> usize {
        self.deferred.len()
    }

    /// Finish the pass. Referents still queued are discarded; callers that
    /// need them flush with [`write_deferred`](Self::write_deferred) first.
    pub fn into_bytes(self) -> Bytes {
        if !self.deferred.is_empty() {
            debug!(pending = self.deferred.len(), "discarding unwritten pointer referents");
        }
        self.buf.freeze()
    }

    fn reserve(&mut self, needed: usize) -> Result<()> {
        if let Some(capacity) = self.capacity_limit {
            if self.buf.len() + needed > capacity {
                return Err(NdrError::WriteFailure {
                    needed: self.buf.len() + needed,
                    capacity,
                });
            }
        }
        Ok(())
    }

    /// Write zero padding up to the given boundary (`9` = pointer size)
    pub fn write_align(&mut self, alignment: usize) -> Result<()> {
        let padding = self.format.align_padding(self.buf.len(), alignment);
        if padding > 0 {
            self.reserve(padding)?;
            self.buf.put_bytes(0, padding);
        }
        Ok(())
    }

    /// Alignment before a union discriminant and arm (NDR64 only)
    pub fn write_union_align(&mut self, alignment: usize) -> Result<()> {
        if self.format.is_ndr64() {
            self.write_align(alignment)?;
        }
        Ok(())
    }

    /// Padding at the end of a structure (NDR64 only)
    pub fn write_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        if self.format.is_ndr64() {
            self.write_align(alignment)?;
        }
        Ok(())
    }

    /// Append a scalar at the cursor, without alignment
    pub fn write_data<T: Primitive>(&mut self, value: T) -> Result<()> {
        self.reserve(T::wire_size(&self.format))?;
        value.put(&self.format, &mut self.buf)
    }

    /// Append raw bytes at the cursor
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Write an enumeration value (2 bytes NDR20, 4 bytes NDR64), aligned
    pub fn write_enum(&mut self, value: u16) -> Result<()> {
        self.write_field(crate::NdrEnum(value))
    }

    /// Write a conformance or variance value (max count, offset, actual count).
    ///
    /// NDR20 sizes are 32-bit; a larger value fails with
    /// [`NdrError::ValueOutOfRange`] instead of being cut short.
    pub fn write_size(&mut self, size: u64) -> Result<()> {
        self.write_align(crate::format::ALIGN_PTR)?;
        if self.format.is_ndr64() {
            self.write_data(size)
        } else {
            let narrow = u32::try_from(size).map_err(|_| NdrError::ValueOutOfRange {
                value: i128::from(size),
                width: 4,
            })?;
            self.write_data(narrow)
        }
    }

    /// Write a scalar structure member, aligned to its own size
    pub fn write_field<T: Primitive>(&mut self, value: T) -> Result<()> {
        self.write_align(T::wire_size(&self.format))?;
        self.write_data(value)
    }

    /// Write a union discriminant
    pub fn write_switch<T: Primitive>(&mut self, value: T) -> Result<()> {
        self.write_field(value)
    }

    /// Write the conformance prefix of a conformant aggregate.
    ///
    /// When `ctx` already carries size info, an enclosing aggregate has
    /// written it and `ctx` is returned unchanged. Otherwise every size from
    /// `sizes` is written and a context carrying them is returned.
    pub fn enter_conformant<F>(&mut self, ctx: &NdrContext, sizes: F) -> Result<NdrContext>
    where
        F: FnOnce() -> Vec<u64>,
    {
        if ctx.size_info().is_some() {
            return Ok(ctx.clone());
        }
        let sizes = sizes();
        for size in &sizes {
            self.write_size(*size)?;
        }
        Ok(ctx.with_size_info(sizes))
    }

    /// Write a pointer.
    ///
    /// `None` writes a null referent and queues nothing. `Some` writes a fresh
    /// non-zero referent id and queues the value for the deferred pass.
    pub fn write_pointer<T: NdrMarshal>(&mut self, value: Option<&'a T>) -> Result<()> {
        self.write_align(crate::format::ALIGN_PTR)?;
        match value {
            None => self.write_referent(0),
            Some(value) => {
                let referent_id = self.next_referent;
                self.next_referent = self.next_referent.wrapping_add(4);
                self.write_referent(referent_id)?;
                self.deferred.push(Deferred { referent_id, value });
                Ok(())
            }
        }
    }

    fn write_referent(&mut self, referent_id: u32) -> Result<()> {
        if self.format.is_ndr64() {
            self.write_data(u64::from(referent_id))
        } else {
            self.write_data(referent_id)
        }
    }

    /// Write every queued referent in encounter order.
    ///
    /// Pointers found while writing a referent are written right after that
    /// referent, before its next sibling.
    pub fn write_deferred(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.deferred);
        for entry in pending {
            trace!(referent_id = entry.referent_id, position = self.buf.len(), "writing deferred referent");
            entry.value.marshal_ndr(&NdrContext::new(), self)?;
            self.write_deferred()?;
        }
        Ok(())
    }

    /// Marshal a zero-valued `T`.
    ///
    /// Used for padding elements of sized arrays and for union arms whose
    /// value does not match the discriminant. A default value holds only null
    /// pointers, so it never leaves referents behind.
    pub fn write_zero_value<T: NdrMarshal + Default>(&mut self, ctx: &NdrContext) -> Result<()> {
        let zero = T::default();
        let mut scratch = NdrWriter {
            buf: std::mem::take(&mut self.buf),
            format: self.format,
            capacity_limit: self.capacity_limit,
            deferred: Vec::new(),
            next_referent: self.next_referent,
        };
        let result = zero
            .marshal_ndr(ctx, &mut scratch)
            .and_then(|()| scratch.write_deferred());
        self.buf = scratch.buf;
        self.next_referent = scratch.next_referent;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UniquePtr, NdrWString};

    #[test]
    fn test_align_idempotent() {
        let mut w = NdrWriter::new(NdrFormat::new());
        w.write_data(1u8).unwrap();
        w.write_align(4).unwrap();
        let once = w.position();
        w.write_align(4).unwrap();
        assert_eq!(once, 4);
        assert_eq!(w.position(), once);
        assert_eq!(&w.into_bytes()[..], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_write_data_does_not_align() {
        let mut w = NdrWriter::new(NdrFormat::new());
        w.write_data(1u8).unwrap();
        w.write_data(0x0302u16).unwrap();
        assert_eq!(&w.into_bytes()[..], &[1, 2, 3]);
    }

    #[test]
    fn test_null_pointer_is_four_zero_bytes() {
        let mut w = NdrWriter::new(NdrFormat::new());
        w.write_pointer::<u32>(None).unwrap();
        assert_eq!(w.pending_referents(), 0);
        w.write_deferred().unwrap();
        assert_eq!(&w.into_bytes()[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_referent_ids_are_unique() {
        let (a, b) = (7u16, 9u16);
        let mut w = NdrWriter::new(NdrFormat::new());
        w.write_pointer(Some(&a)).unwrap();
        w.write_pointer(Some(&b)).unwrap();
        assert_eq!(w.pending_referents(), 2);
        w.write_deferred().unwrap();
        assert_eq!(
            &w.into_bytes()[..],
            &[0x00, 0x00, 0x02, 0x00, 0x04, 0x00, 0x02, 0x00, 7, 0, 9, 0]
        );
    }

    #[test]
    fn test_nested_deferral_order() {
        // outer -> inner -> 3 must be written before the sibling 4
        let inner = UniquePtr::new(3u32);
        let outer = UniquePtr::new(inner);
        let sibling = UniquePtr::new(4u32);

        let mut w = NdrWriter::new(NdrFormat::new());
        outer.marshal_ndr(&NdrContext::new(), &mut w).unwrap();
        sibling.marshal_ndr(&NdrContext::new(), &mut w).unwrap();
        w.write_deferred().unwrap();

        let bytes = w.into_bytes();
        let words: Vec<u32> = bytes
            .chunks(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![0x20000, 0x20004, 0x20008, 3, 4]);
    }

    #[test]
    fn test_ndr20_size_above_u32_rejected() {
        let mut w = NdrWriter::new(NdrFormat::new());
        let err = w.write_size(1 << 32).unwrap_err();
        assert!(matches!(err, NdrError::ValueOutOfRange { value: 0x1_0000_0000, width: 4 }));
        assert_eq!(w.position(), 0);

        w.write_size(u64::from(u32::MAX)).unwrap();
        assert_eq!(&w.into_bytes()[..], &[0xFF; 4]);

        let mut w = NdrWriter::new(NdrFormat::ndr64());
        w.write_size(1 << 32).unwrap();
        assert_eq!(&w.into_bytes()[..], &[0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_into_bytes_without_flush_drops_referents() {
        let value = 9u32;
        let mut w = NdrWriter::new(NdrFormat::new());
        w.write_pointer(Some(&value)).unwrap();
        assert_eq!(w.pending_referents(), 1);
        assert_eq!(&w.into_bytes()[..], &[0x00, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn test_capacity_limit_does_not_preallocate() {
        let w = NdrWriter::with_capacity_limit(NdrFormat::new(), 1 << 30);
        assert!(w.buf.capacity() < 1 << 20);
    }

    #[test]
    fn test_capacity_limit() {
        let mut w = NdrWriter::with_capacity_limit(NdrFormat::new(), 6);
        w.write_data(1u32).unwrap();
        let err = w.write_data(2u32).unwrap_err();
        assert!(matches!(err, NdrError::WriteFailure { needed: 8, capacity: 6 }));
    }

    #[test]
    fn test_capacity_limit_in_deferred_pass() {
        let name = UniquePtr::new(NdrWString::new("volume"));
        let mut w = NdrWriter::with_capacity_limit(NdrFormat::new(), 8);
        name.marshal_ndr(&NdrContext::new(), &mut w).unwrap();
        assert!(matches!(w.write_deferred(), Err(NdrError::WriteFailure { .. })));
    }

    #[test]
    fn test_ndr64_sizes_and_referents() {
        let value = 5u8;
        let mut w = NdrWriter::new(NdrFormat::ndr64());
        w.write_data(1u8).unwrap();
        w.write_size(3).unwrap();
        w.write_pointer(Some(&value)).unwrap();
        w.write_deferred().unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 8 + 8 + 8 + 1);
        assert_eq!(&bytes[8..16], &[3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[16..24], &[0x00, 0x00, 0x02, 0x00, 0, 0, 0, 0]);
        assert_eq!(bytes[24], 5);
    }

    #[test]
    fn test_union_align_and_trailing_gap_only_in_ndr64() {
        let mut w = NdrWriter::new(NdrFormat::new());
        w.write_data(1u8).unwrap();
        w.write_union_align(8).unwrap();
        w.write_trailing_gap(8).unwrap();
        assert_eq!(w.position(), 1);

        let mut w = NdrWriter::new(NdrFormat::ndr64());
        w.write_data(1u8).unwrap();
        w.write_union_align(8).unwrap();
        assert_eq!(w.position(), 8);
        w.write_data(1u8).unwrap();
        w.write_trailing_gap(4).unwrap();
        assert_eq!(w.position(), 12);
    }
}
