//! NDR encoding trait

use crate::{NdrContext, NdrFormat, NdrWriter, Result};
use bytes::Bytes;

/// Trait for types that can be encoded to NDR format
pub trait NdrMarshal {
    /// Encode the inline part of this value at the writer's cursor.
    ///
    /// Pointer referents are queued on the writer and emitted by
    /// [`NdrWriter::write_deferred`]; the `'a` borrow keeps them alive until
    /// then.
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Derive wire counts from the data before encoding.
    ///
    /// Aggregates with length fields override this to fill them in and call
    /// it on their children.
    fn prepare_payload(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Encode one top-level value, including its deferred referents
pub fn marshal<T: NdrMarshal>(value: &mut T, format: NdrFormat) -> Result<Bytes> {
    value.prepare_payload()?;
    let value: &T = value;
    let mut w = NdrWriter::new(format);
    value.marshal_ndr(&NdrContext::new(), &mut w)?;
    w.write_deferred()?;
    Ok(w.into_bytes())
}
