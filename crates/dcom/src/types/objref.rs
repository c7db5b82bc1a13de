//! Marshaled interface pointers (MS-DCOM 2.2.14)
//!
//! The OBJREF inside an `MInterfacePointer` is opaque at this layer; it is
//! carried as bytes and resolved by the caller.

use msrpc_ndr::{
    marshal_sized, unmarshal_sized, wire_count, NdrContext, NdrMarshal, NdrReader, NdrUnmarshal,
    NdrWriter, Result,
};

/// OBJREF signature ("MEOW" in little-endian)
pub const OBJREF_SIGNATURE: u32 = 0x574F454D;

/// MInterfacePointer: a conformant structure holding a hand-marshaled OBJREF
///
/// ```text
/// max_count: u32        # == data_count
/// data_count: u32
/// data[data_count]: u8
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct InterfacePointer {
    /// Size of `data` in bytes
    pub data_count: u32,
    pub data: Vec<u8>,
}

impl InterfacePointer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data_count: u32::try_from(data.len()).unwrap_or(u32::MAX),
            data,
        }
    }

    /// Whether the blob starts with the OBJREF signature
    pub fn has_objref_signature(&self) -> bool {
        self.data.len() >= 4
            && u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
                == OBJREF_SIGNATURE
    }
}

impl NdrMarshal for InterfacePointer {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        let ctx = w.enter_conformant(ctx, || vec![u64::from(self.data_count)])?;
        w.write_align(4)?;
        w.write_field(self.data_count)?;
        marshal_sized(&self.data, ctx.dimension(0), &ctx.without_size_info(), w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        if !self.data.is_empty() && self.data_count == 0 {
            self.data_count = wire_count(self.data.len())?;
        }
        Ok(())
    }
}

impl NdrUnmarshal for InterfacePointer {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        let ctx = r.enter_conformant(ctx, 1)?;
        r.read_align(4)?;
        self.data_count = r.read_field()?;
        let count = r.reconcile_size(u64::from(self.data_count), ctx.dimension(0))?;
        unmarshal_sized(&mut self.data, count, &ctx.without_size_info(), r)
    }
}
