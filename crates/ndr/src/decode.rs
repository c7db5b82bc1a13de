//! NDR decoding trait

use crate::{NdrContext, NdrFormat, NdrReader, Result};
use bytes::Bytes;

/// Trait for types that can be decoded from NDR format
///
/// Decoding is in place: the caller provides a value (usually
/// `Default::default()`) and the implementation overwrites its fields.
pub trait NdrUnmarshal {
    /// Decode the inline part of this value at the reader's cursor.
    ///
    /// Pointer slots are queued on the reader and filled by
    /// [`NdrReader::read_deferred`].
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()>;
}

/// Decode one top-level value, including its deferred referents
pub fn unmarshal<T: NdrUnmarshal + Default>(data: impl Into<Bytes>, format: NdrFormat) -> Result<T> {
    let mut value = T::default();
    {
        let mut r = NdrReader::new(data, format);
        value.unmarshal_ndr(&NdrContext::new(), &mut r)?;
        r.read_deferred()?;
    }
    Ok(value)
}

/// Like [`unmarshal`], tolerating zero sizes that contradict a declared
/// length (see [`NdrReader::allow_opaque_sizes`])
pub fn unmarshal_opaque<T: NdrUnmarshal + Default>(
    data: impl Into<Bytes>,
    format: NdrFormat,
) -> Result<T> {
    let mut value = T::default();
    {
        let mut r = NdrReader::new(data, format).allow_opaque_sizes(true);
        value.unmarshal_ndr(&NdrContext::new(), &mut r)?;
        r.read_deferred()?;
    }
    Ok(value)
}
