//! NDR input cursor

use crate::{NdrContext, NdrError, NdrFormat, NdrUnmarshal, Primitive, Result};
use bytes::{Buf, Bytes};
use tracing::{debug, trace, warn};

/// Pointer slot waiting for the deferred pass
struct PendingRead<'a> {
    referent_id: u64,
    slot: &'a mut dyn NdrUnmarshal,
}

/// Stateful NDR decoder for one unmarshal pass
///
/// Values are decoded in place; pointer referents are filled in by
/// [`read_deferred`](Self::read_deferred), which is why the reader borrows
/// the destination for `'a`.
pub struct NdrReader<'a> {
    buf: Bytes,
    total: usize,
    format: NdrFormat,
    opaque_sizes: bool,
    deferred: Vec<PendingRead<'a>>,
}

impl<'a> NdrReader<'a> {
    pub fn new(data: impl Into<Bytes>, format: NdrFormat) -> Self {
        let buf = data.into();
        Self {
            total: buf.len(),
            buf,
            format,
            opaque_sizes: false,
            deferred: Vec::new(),
        }
    }

    /// Accept a zero transmitted size when a sibling field declares a
    /// non-zero length (legacy "opaque" encoders). Off by default.
    pub fn allow_opaque_sizes(mut self, allow: bool) -> Self {
        self.opaque_sizes = allow;
        self
    }

    #[inline]
    pub fn format(&self) -> NdrFormat {
        self.format
    }

    /// Bytes consumed so far
    #[inline]
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    /// Bytes left to read
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.remaining()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(NdrError::Truncated {
                needed,
                have: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Skip padding up to the given boundary (`9` = pointer size)
    pub fn read_align(&mut self, alignment: usize) -> Result<()> {
        let padding = self.format.align_padding(self.position(), alignment);
        self.ensure(padding)?;
        self.buf.advance(padding);
        Ok(())
    }

    /// Alignment before a union discriminant and arm (NDR64 only)
    pub fn read_union_align(&mut self, alignment: usize) -> Result<()> {
        if self.format.is_ndr64() {
            self.read_align(alignment)?;
        }
        Ok(())
    }

    /// Padding at the end of a structure (NDR64 only)
    pub fn read_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        if self.format.is_ndr64() {
            self.read_align(alignment)?;
        }
        Ok(())
    }

    /// Consume a scalar at the cursor, without alignment
    pub fn read_data<T: Primitive>(&mut self) -> Result<T> {
        self.ensure(T::wire_size(&self.format))?;
        T::get(&self.format, &mut self.buf)
    }

    /// Fill `dst` with raw bytes from the cursor
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        self.ensure(dst.len())?;
        self.buf.copy_to_slice(dst);
        Ok(())
    }

    /// Read an enumeration value (2 bytes NDR20, 4 bytes NDR64), aligned
    pub fn read_enum(&mut self) -> Result<u16> {
        Ok(self.read_field::<crate::NdrEnum>()?.0)
    }

    /// Read a conformance or variance value
    pub fn read_size(&mut self) -> Result<u64> {
        self.read_align(crate::format::ALIGN_PTR)?;
        if self.format.is_ndr64() {
            self.read_data()
        } else {
            Ok(u64::from(self.read_data::<u32>()?))
        }
    }

    /// Read a scalar structure member, aligned to its own size
    pub fn read_field<T: Primitive>(&mut self) -> Result<T> {
        self.read_align(T::wire_size(&self.format))?;
        self.read_data()
    }

    /// Read a union discriminant
    pub fn read_switch<T: Primitive>(&mut self) -> Result<T> {
        self.read_field()
    }

    /// Reject a transmitted element count that cannot fit in what is left.
    ///
    /// Every NDR element takes at least one byte, so a count above the
    /// remaining length is malformed; failing here keeps hostile sizes from
    /// reaching an allocation.
    pub fn check_size(&self, size: u64) -> Result<usize> {
        let remaining = self.buf.remaining();
        if size > remaining as u64 {
            debug!(size, remaining, "rejecting oversized NDR array");
            return Err(NdrError::BufferOverflow { size, remaining });
        }
        Ok(size as usize)
    }

    /// Reconcile a transmitted size with the length carried by a sibling
    /// field of the same structure.
    ///
    /// A zero transmitted size next to a non-zero declared length is an
    /// error unless [`allow_opaque_sizes`](Self::allow_opaque_sizes) is set,
    /// in which case the declared length wins.
    pub fn reconcile_size(&self, declared: u64, transmitted: u64) -> Result<u64> {
        if transmitted == 0 && declared > 0 {
            if !self.opaque_sizes {
                return Err(NdrError::ArraySizeMismatch {
                    expected: declared,
                    got: transmitted,
                });
            }
            warn!(declared, "zero conformance on the wire, using declared length");
            return Ok(declared);
        }
        Ok(transmitted)
    }

    /// Read the conformance prefix of a conformant aggregate.
    ///
    /// When `ctx` already carries size info it is returned unchanged;
    /// otherwise `dimensions` sizes are read and installed in a new context.
    pub fn enter_conformant(&mut self, ctx: &NdrContext, dimensions: usize) -> Result<NdrContext> {
        if ctx.size_info().is_some() {
            return Ok(ctx.clone());
        }
        let mut sizes = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            sizes.push(self.read_size()?);
        }
        Ok(ctx.with_size_info(sizes))
    }

    /// Read a pointer into `slot`.
    ///
    /// A null referent leaves `None`. Otherwise a default value is installed
    /// and queued; [`read_deferred`](Self::read_deferred) decodes it.
    pub fn read_pointer<T>(&mut self, slot: &'a mut Option<Box<T>>) -> Result<()>
    where
        T: NdrUnmarshal + Default,
    {
        self.read_align(crate::format::ALIGN_PTR)?;
        let referent_id = if self.format.is_ndr64() {
            self.read_data::<u64>()?
        } else {
            u64::from(self.read_data::<u32>()?)
        };
        if referent_id == 0 {
            *slot = None;
            return Ok(());
        }
        let value: &'a mut T = slot.insert(Box::default());
        self.deferred.push(PendingRead {
            referent_id,
            slot: value,
        });
        Ok(())
    }

    /// Number of pointer slots waiting for [`read_deferred`](Self::read_deferred)
    pub fn pending_referents(&self) -> usize {
        self.deferred.len()
    }

    /// Decode every queued referent in encounter order, nesting like
    /// [`NdrWriter::write_deferred`](crate::NdrWriter::write_deferred).
    pub fn read_deferred(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.deferred);
        for entry in pending {
            trace!(referent_id = entry.referent_id, position = self.position(), "reading deferred referent");
            entry.slot.unmarshal_ndr(&NdrContext::new(), self)?;
            self.read_deferred()?;
        }
        Ok(())
    }
}
