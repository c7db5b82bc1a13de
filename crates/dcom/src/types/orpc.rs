//! ORPC (Object RPC) header types (MS-DCOM 2.2.11 - 2.2.14)
//!
//! An ORPCTHIS is the implicit first argument of every ORPC request, and an
//! ORPCTHAT the implicit first value of every response.

use super::identifiers::{generate_uuid, Cid};
use msrpc_ndr::{
    marshal_sized, unmarshal_sized, wire_count, ConformantArray, Guid, NdrContext, NdrMarshal,
    NdrReader, NdrUnmarshal, NdrWriter, Result, UniquePtr, ALIGN_PTR,
};

/// COM version structure (MS-DCOM 2.2.11)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ComVersion {
    /// Major version number
    pub major: u16,
    /// Minor version number
    pub minor: u16,
}

impl ComVersion {
    /// DCOM version 5.1 (Windows 2000)
    pub const DCOM_5_1: Self = Self { major: 5, minor: 1 };
    /// DCOM version 5.4 (Windows XP/2003)
    pub const DCOM_5_4: Self = Self { major: 5, minor: 4 };
    /// DCOM version 5.6 (Windows Vista)
    pub const DCOM_5_6: Self = Self { major: 5, minor: 6 };
    /// DCOM version 5.7 (Windows 7)
    pub const DCOM_5_7: Self = Self { major: 5, minor: 7 };

    /// Create a new COM version
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl NdrMarshal for ComVersion {
    fn marshal_ndr<'a>(&'a self, _ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(2)?;
        w.write_data(self.major)?;
        w.write_data(self.minor)
    }
}

impl NdrUnmarshal for ComVersion {
    fn unmarshal_ndr<'a>(&'a mut self, _ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(2)?;
        self.major = r.read_data()?;
        self.minor = r.read_data()?;
        Ok(())
    }
}

/// ORPC_EXTENT: opaque out-of-band data identified by a GUID
///
/// `data` is transmitted rounded up to a multiple of 8 bytes; `size` is the
/// length without that padding.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OrpcExtent {
    /// Format of `data`
    pub id: Guid,
    /// Size of `data` in bytes, excluding padding
    pub size: u32,
    pub data: Vec<u8>,
}

impl OrpcExtent {
    pub fn new(id: Guid, data: Vec<u8>) -> Self {
        Self {
            id,
            size: u32::try_from(data.len()).unwrap_or(u32::MAX),
            data,
        }
    }

    fn padded_size(size: u32) -> u64 {
        (u64::from(size) + 7) & !7
    }
}

impl NdrMarshal for OrpcExtent {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        let ctx = w.enter_conformant(ctx, || vec![Self::padded_size(self.size)])?;
        let inner = ctx.without_size_info();
        w.write_align(4)?;
        self.id.marshal_ndr(&inner, w)?;
        w.write_field(self.size)?;
        marshal_sized(&self.data, ctx.dimension(0), &inner, w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        if !self.data.is_empty() && self.size == 0 {
            self.size = wire_count(self.data.len())?;
        }
        Ok(())
    }
}

impl NdrUnmarshal for OrpcExtent {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        let ctx = r.enter_conformant(ctx, 1)?;
        let inner = ctx.without_size_info();
        r.read_align(4)?;
        self.id.unmarshal_ndr(&inner, r)?;
        self.size = r.read_field()?;
        let count = r.reconcile_size(Self::padded_size(self.size), ctx.dimension(0))?;
        unmarshal_sized(&mut self.data, count, &inner, r)
    }
}

/// ORPC_EXTENT_ARRAY
///
/// The extent pointer array is transmitted with an even number of slots;
/// `prepare_payload` pads it with null pointers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OrpcExtentArray {
    /// Number of non-null extents
    pub size: u32,
    pub reserved: u32,
    pub extent: UniquePtr<ConformantArray<UniquePtr<OrpcExtent>>>,
}

impl OrpcExtentArray {
    pub fn new(extents: Vec<OrpcExtent>) -> Self {
        let mut array = Self {
            size: 0,
            reserved: 0,
            extent: UniquePtr::new(ConformantArray::new(
                extents.into_iter().map(UniquePtr::new).collect(),
            )),
        };
        array.pad_slots();
        array.size = u32::try_from(array.extents().count()).unwrap_or(u32::MAX);
        array
    }

    /// Non-null extents
    pub fn extents(&self) -> impl Iterator<Item = &OrpcExtent> {
        self.extent
            .as_ref()
            .into_iter()
            .flat_map(|slots| slots.elements.iter())
            .filter_map(UniquePtr::as_ref)
    }

    /// Extent with the given format id
    pub fn find(&self, id: &Guid) -> Option<&OrpcExtent> {
        self.extents().find(|extent| extent.id == *id)
    }

    fn pad_slots(&mut self) {
        if let Some(slots) = self.extent.as_mut() {
            if slots.elements.len() % 2 == 1 {
                slots.elements.push(UniquePtr::null());
            }
        }
    }
}

impl NdrMarshal for OrpcExtentArray {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(ALIGN_PTR)?;
        w.write_field(self.size)?;
        w.write_field(0u32)?;
        self.extent.marshal_ndr(ctx, w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.pad_slots();
        if self.size == 0 {
            self.size = wire_count(self.extents().count())?;
        }
        self.extent.prepare_payload()
    }
}

impl NdrUnmarshal for OrpcExtentArray {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(ALIGN_PTR)?;
        self.size = r.read_field()?;
        self.reserved = r.read_field()?;
        self.extent.unmarshal_ndr(ctx, r)
    }
}

/// ORPCTHIS structure (MS-DCOM 2.2.13)
///
/// Sent with every ORPC request from client to server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrpcThis {
    /// COM version
    pub version: ComVersion,
    /// Flags (must be 0 for ORPC calls)
    pub flags: u32,
    /// Reserved (must be 0)
    pub reserved1: u32,
    /// Causality ID
    pub cid: Cid,
    /// Optional extension array
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThis {
    /// ORPCTHIS with a fresh causality id
    pub fn new() -> Self {
        Self::with_causality(generate_uuid())
    }

    /// Create with a specific causality ID
    pub fn with_causality(cid: Cid) -> Self {
        Self {
            version: ComVersion::DCOM_5_7,
            flags: 0,
            reserved1: 0,
            cid,
            extensions: UniquePtr::null(),
        }
    }
}

impl Default for OrpcThis {
    fn default() -> Self {
        Self {
            version: ComVersion::default(),
            flags: 0,
            reserved1: 0,
            cid: Guid::NIL,
            extensions: UniquePtr::null(),
        }
    }
}

impl NdrMarshal for OrpcThis {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(ALIGN_PTR)?;
        self.version.marshal_ndr(ctx, w)?;
        w.write_field(self.flags)?;
        w.write_field(0u32)?;
        self.cid.marshal_ndr(ctx, w)?;
        self.extensions.marshal_ndr(ctx, w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.extensions.prepare_payload()
    }
}

impl NdrUnmarshal for OrpcThis {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(ALIGN_PTR)?;
        self.version.unmarshal_ndr(ctx, r)?;
        self.flags = r.read_field()?;
        self.reserved1 = r.read_field()?;
        self.cid.unmarshal_ndr(ctx, r)?;
        self.extensions.unmarshal_ndr(ctx, r)
    }
}

/// ORPCTHAT structure (MS-DCOM 2.2.14)
///
/// Sent with every ORPC response from server to client.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OrpcThat {
    /// Flags (ignored on receipt)
    pub flags: u32,
    /// Optional extension array
    pub extensions: UniquePtr<OrpcExtentArray>,
}

impl OrpcThat {
    /// Create a new empty ORPCTHAT
    pub fn new() -> Self {
        Self::default()
    }
}

impl NdrMarshal for OrpcThat {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(ALIGN_PTR)?;
        w.write_field(self.flags)?;
        self.extensions.marshal_ndr(ctx, w)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.extensions.prepare_payload()
    }
}

impl NdrUnmarshal for OrpcThat {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(ALIGN_PTR)?;
        self.flags = r.read_field()?;
        self.extensions.unmarshal_ndr(ctx, r)
    }
}

/// Well-known extension UUIDs
pub mod extent_ids {
    /// Error info extension
    pub const ERROR_INFO: &str = "0000031c-0000-0000-c000-000000000046";
}

#[cfg(test)]
mod tests {
    use super::*;
    use msrpc_ndr::{marshal, unmarshal, unmarshal_opaque, NdrError, NdrFormat};

    #[test]
    fn test_com_version_roundtrip() {
        let mut version = ComVersion::DCOM_5_7;
        let bytes = marshal(&mut version, NdrFormat::new()).unwrap();
        assert_eq!(&bytes[..], &[5, 0, 7, 0]);

        let decoded: ComVersion = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(version, decoded);
    }

    #[test]
    fn test_orpc_this_new() {
        let orpc = OrpcThis::new();
        assert_eq!(orpc.version, ComVersion::DCOM_5_7);
        assert_eq!(orpc.flags, 0);
        assert!(!orpc.cid.is_nil());
        assert!(orpc.extensions.as_ref().is_none());
    }

    #[test]
    fn test_orpc_this_layout() {
        let cid = Guid::parse("01020304-0506-0708-090a-0b0c0d0e0f10").unwrap();
        let mut orpc = OrpcThis::with_causality(cid);
        let bytes = marshal(&mut orpc, NdrFormat::new()).unwrap();

        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..4], &[5, 0, 7, 0]);
        assert_eq!(&bytes[12..16], &[4, 3, 2, 1]);
        assert_eq!(&bytes[28..], &[0, 0, 0, 0]);

        let decoded: OrpcThis = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded, orpc);
    }

    #[test]
    fn test_orpc_that_roundtrip() {
        let mut orpc = OrpcThat::new();
        let bytes = marshal(&mut orpc, NdrFormat::new()).unwrap();
        assert_eq!(&bytes[..], &[0u8; 8]);

        let decoded: OrpcThat = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.flags, 0);
        assert!(decoded.extensions.as_ref().is_none());
    }

    #[test]
    fn test_extent_padding() {
        let mut extent = OrpcExtent {
            id: Guid::NIL,
            size: 0,
            data: vec![1, 2, 3],
        };
        let bytes = marshal(&mut extent, NdrFormat::new()).unwrap();
        assert_eq!(extent.size, 3);

        // max_count 8, guid, size 3, 3 data bytes and 5 zero bytes
        assert_eq!(&bytes[..4], &[8, 0, 0, 0]);
        assert_eq!(&bytes[20..24], &[3, 0, 0, 0]);
        assert_eq!(&bytes[24..], &[1, 2, 3, 0, 0, 0, 0, 0]);

        let decoded: OrpcExtent = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.size, 3);
        assert_eq!(decoded.data, vec![1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_extent_zero_conformance() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&[0u8; 16]);
        data.extend_from_slice(&[2, 0, 0, 0]);
        data.extend_from_slice(&[0xAB; 8]);

        let strict: std::result::Result<OrpcExtent, NdrError> = unmarshal(data.clone(), NdrFormat::new());
        assert!(matches!(strict, Err(NdrError::ArraySizeMismatch { expected: 8, got: 0 })));

        let lenient: OrpcExtent = unmarshal_opaque(data, NdrFormat::new()).unwrap();
        assert_eq!(lenient.data, vec![0xAB; 8]);
    }

    #[test]
    fn test_orpc_that_with_extensions() {
        let error_info = crate::types::identifiers::well_known(extent_ids::ERROR_INFO);
        let mut orpc = OrpcThat {
            flags: 0,
            extensions: UniquePtr::new(OrpcExtentArray::new(vec![OrpcExtent::new(
                error_info,
                vec![0xEE; 8],
            )])),
        };
        let bytes = marshal(&mut orpc, NdrFormat::new()).unwrap();

        let decoded: OrpcThat = unmarshal(bytes, NdrFormat::new()).unwrap();
        let extensions = decoded.extensions.as_ref().unwrap();
        assert_eq!(extensions.size, 1);
        assert_eq!(extensions.extent.as_ref().unwrap().len(), 2);
        assert_eq!(extensions.find(&error_info).unwrap().data, vec![0xEE; 8]);
        assert_eq!(decoded, orpc);
    }

    #[test]
    fn test_orpc_this_ndr64() {
        let mut orpc = OrpcThis::with_causality(generate_uuid());
        let bytes = marshal(&mut orpc, NdrFormat::ndr64()).unwrap();
        // 28 bytes of fields, 4 bytes padding, 8-byte null referent
        assert_eq!(bytes.len(), 40);

        let decoded: OrpcThis = unmarshal(bytes, NdrFormat::ndr64()).unwrap();
        assert_eq!(decoded, orpc);
    }
}
