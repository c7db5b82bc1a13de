//! NDR array types
//!
//! - Fixed arrays `[T; N]`: elements only, no size prefix
//! - Conformant arrays: `max_count` prefix, then `max_count` elements
//! - Conformant varying arrays: `max_count`, `offset`, `actual_count`, then
//!   `actual_count` elements
//!
//! Inside a conformant structure the `max_count` is hoisted to the start of
//! the outermost structure and reaches the array through
//! [`NdrContext::size_info`]; the array then writes no prefix of its own.

use crate::{NdrContext, NdrError, NdrMarshal, NdrReader, NdrUnmarshal, NdrWriter, Result};
use tracing::debug;

/// Most zero-valued elements [`marshal_sized`] appends after the data
pub const MAX_ZERO_PADDING: u64 = 4096;

/// Length of a buffer as a 32-bit wire count
pub fn wire_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| NdrError::ValueOutOfRange {
        value: len as i128,
        width: 4,
    })
}

/// Marshal exactly `count` elements: `items` truncated to `count`, padded
/// with zero-valued elements when shorter.
///
/// A count more than [`MAX_ZERO_PADDING`] elements past the data fails with
/// [`NdrError::ExcessivePadding`].
pub fn marshal_sized<'a, T>(items: &'a [T], count: u64, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()>
where
    T: NdrMarshal + Default,
{
    let supplied = items.len() as u64;
    if count > supplied.saturating_add(MAX_ZERO_PADDING) {
        debug!(count, supplied, "refusing to pad sized array");
        return Err(NdrError::ExcessivePadding {
            declared: count,
            supplied: items.len(),
        });
    }
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    for item in items.iter().take(count) {
        item.marshal_ndr(ctx, w)?;
    }
    for _ in items.len()..count {
        w.write_zero_value::<T>(ctx)?;
    }
    Ok(())
}

/// Unmarshal exactly `count` elements into `items`, replacing its contents.
///
/// The count is validated against the remaining input before allocating.
pub fn unmarshal_sized<'a, T>(
    items: &'a mut Vec<T>,
    count: u64,
    ctx: &NdrContext,
    r: &mut NdrReader<'a>,
) -> Result<()>
where
    T: NdrUnmarshal + Default,
{
    let count = r.check_size(count)?;
    items.clear();
    items.resize_with(count, T::default);
    for item in items.iter_mut() {
        item.unmarshal_ndr(ctx, r)?;
    }
    Ok(())
}

impl<T: NdrMarshal, const N: usize> NdrMarshal for [T; N] {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        for elem in self {
            elem.marshal_ndr(ctx, w)?;
        }
        Ok(())
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.iter_mut().try_for_each(|elem| elem.prepare_payload())
    }
}

impl<T: NdrUnmarshal, const N: usize> NdrUnmarshal for [T; N] {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        for elem in self.iter_mut() {
            elem.unmarshal_ndr(ctx, r)?;
        }
        Ok(())
    }
}

/// Conformant array - size determined at runtime
///
/// Wire format:
/// ```text
/// max_count: u32/u64  # omitted when hoisted by the enclosing structure
/// elements[max_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantArray<T> {
    pub elements: Vec<T>,
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.elements
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T: NdrMarshal + Default> NdrMarshal for ConformantArray<T> {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        let ctx = w.enter_conformant(ctx, || vec![self.elements.len() as u64])?;
        marshal_sized(&self.elements, ctx.dimension(0), &ctx.without_size_info(), w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.elements.iter_mut().try_for_each(|elem| elem.prepare_payload())
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for ConformantArray<T> {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        let ctx = r.enter_conformant(ctx, 1)?;
        unmarshal_sized(&mut self.elements, ctx.dimension(0), &ctx.without_size_info(), r)
    }
}

/// Conformant varying array - size and subset determined at runtime
///
/// Wire format:
/// ```text
/// max_count: u32/u64     # omitted when hoisted
/// offset: u32/u64        # first transmitted element
/// actual_count: u32/u64  # number of transmitted elements
/// elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantVaryingArray<T> {
    pub max_count: u64,
    pub offset: u64,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: elements.len() as u64,
            offset: 0,
            elements,
        }
    }

    pub fn with_max(max_count: u64, elements: Vec<T>) -> Self {
        Self {
            max_count,
            offset: 0,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: NdrMarshal> NdrMarshal for ConformantVaryingArray<T> {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        // a hoisted size is the max count the peer will check against
        let max_count = match ctx.size_info() {
            Some(_) => ctx.dimension(0),
            None => self.max_count,
        };
        let actual_count = self.elements.len() as u64;
        let total = self.offset.saturating_add(actual_count);
        if total > max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: total,
            });
        }
        w.enter_conformant(ctx, || vec![max_count])?;
        w.write_size(self.offset)?;
        w.write_size(actual_count)?;
        let inner = ctx.without_size_info();
        for elem in &self.elements {
            elem.marshal_ndr(&inner, w)?;
        }
        Ok(())
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.elements.iter_mut().try_for_each(|elem| elem.prepare_payload())
    }
}

impl<T: NdrUnmarshal + Default> NdrUnmarshal for ConformantVaryingArray<T> {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        let ctx = r.enter_conformant(ctx, 1)?;
        self.max_count = ctx.dimension(0);
        self.offset = r.read_size()?;
        let actual_count = r.read_size()?;

        let total = self.offset.checked_add(actual_count).ok_or(NdrError::ConformanceMismatch {
            max_count: self.max_count,
            actual_count,
        })?;
        if total > self.max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count: self.max_count,
                actual_count: total,
            });
        }

        unmarshal_sized(&mut self.elements, actual_count, &ctx.without_size_info(), r)
    }
}
