//! IVdsPack (MS-VDS 3.4.5.2.19) properties and operation payloads
//!
//! Each request starts with ORPCTHIS and each response with ORPCTHAT; the
//! deferred referents of every top-level parameter are flushed before the
//! next parameter, and a response ends with the HRESULT.

use crate::disk::InputDisk;
use crate::enums::{PackStatus, VolumeType};
use msrpc_dcom::{check_hresult, InterfacePointer, OrpcThat, OrpcThis};
use msrpc_ndr::{
    marshal_sized, unmarshal_sized, Guid, NdrContext, NdrError, NdrMarshal, NdrReader,
    NdrUnmarshal, NdrWString, NdrWriter, Result, UniquePtr, ALIGN_PTR,
};
use tracing::warn;

/// IVdsPack interface UUID
pub const IID_IVDS_PACK: &str = "3b69d7f5-9d94-4648-91ca-79939ba263bf";

/// VDS_PACK_PROP
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackProp {
    pub id: Guid,
    pub name: UniquePtr<NdrWString>,
    pub status: PackStatus,
    pub flags: u32,
}

impl PackProp {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(NdrWString::as_str)
    }
}

impl NdrMarshal for PackProp {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(ALIGN_PTR)?;
        self.id.marshal_ndr(ctx, w)?;
        self.name.marshal_ndr(ctx, w)?;
        self.status.marshal_ndr(ctx, w)?;
        w.write_field(self.flags)?;
        w.write_trailing_gap(ALIGN_PTR)
    }
}

impl NdrUnmarshal for PackProp {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(ALIGN_PTR)?;
        self.id.unmarshal_ndr(ctx, r)?;
        self.name.unmarshal_ndr(ctx, r)?;
        self.status = PackStatus(r.read_enum()?);
        self.flags = r.read_field()?;
        r.read_trailing_gap(ALIGN_PTR)
    }
}

/// `IVdsPack::GetProperties` request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetPropertiesRequest {
    pub this: OrpcThis,
}

impl GetPropertiesRequest {
    pub const OPNUM: u16 = 3;
}

impl NdrMarshal for GetPropertiesRequest {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.this.marshal_ndr(ctx, w)?;
        w.write_deferred()
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.this.prepare_payload()
    }
}

impl NdrUnmarshal for GetPropertiesRequest {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.this.unmarshal_ndr(ctx, r)?;
        r.read_deferred()
    }
}

/// `IVdsPack::GetProperties` response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetPropertiesResponse {
    pub that: OrpcThat,
    pub pack_properties: PackProp,
    pub return_value: i32,
}

impl GetPropertiesResponse {
    /// Map the returned HRESULT to a result
    pub fn hresult(&self) -> msrpc_dcom::Result<()> {
        check_hresult(self.return_value)
    }
}

impl NdrMarshal for GetPropertiesResponse {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.that.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        self.pack_properties.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        w.write_field(self.return_value)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.that.prepare_payload()
    }
}

impl NdrUnmarshal for GetPropertiesResponse {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.that.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.pack_properties.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.return_value = r.read_field()?;
        Ok(())
    }
}

/// `IVdsPack::CreateVolume` request
///
/// ```text
/// ORPCTHIS
/// type: VDS_VOLUME_TYPE
/// pInputDiskArray: [ref, size_is(lNumberOfDisks)] VDS_INPUT_DISK*
/// lNumberOfDisks: i32
/// ulStripeSize: u32
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateVolumeRequest {
    pub this: OrpcThis,
    pub volume_type: VolumeType,
    pub input_disks: Vec<InputDisk>,
    /// Transmitted array size; taken from `input_disks` when left at 0
    pub number_of_disks: i32,
    /// Stripe size in bytes for striped and parity volumes
    pub stripe_size: u32,
}

impl CreateVolumeRequest {
    pub const OPNUM: u16 = 7;

    pub fn new(volume_type: VolumeType, input_disks: Vec<InputDisk>, stripe_size: u32) -> Self {
        Self {
            this: OrpcThis::new(),
            volume_type,
            number_of_disks: i32::try_from(input_disks.len()).unwrap_or(i32::MAX),
            input_disks,
            stripe_size,
        }
    }

    fn disk_count(&self) -> u64 {
        u64::try_from(self.number_of_disks).unwrap_or_default()
    }
}

impl NdrMarshal for CreateVolumeRequest {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.this.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        self.volume_type.marshal_ndr(ctx, w)?;
        let count = self.disk_count();
        w.write_size(count)?;
        marshal_sized(&self.input_disks, count, ctx, w)?;
        w.write_field(self.number_of_disks)?;
        w.write_field(self.stripe_size)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        if !self.input_disks.is_empty() && self.number_of_disks == 0 {
            let len = self.input_disks.len();
            self.number_of_disks = i32::try_from(len).map_err(|_| NdrError::ValueOutOfRange {
                value: len as i128,
                width: 4,
            })?;
        }
        self.this.prepare_payload()
    }
}

impl NdrUnmarshal for CreateVolumeRequest {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.this.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.volume_type = VolumeType(r.read_enum()?);
        let count = r.read_size()?;
        unmarshal_sized(&mut self.input_disks, count, ctx, r)?;
        self.number_of_disks = r.read_field()?;
        self.stripe_size = r.read_field()?;
        if u64::try_from(self.number_of_disks).ok() != Some(count) {
            warn!(
                count,
                number_of_disks = self.number_of_disks,
                "disk array size differs from lNumberOfDisks"
            );
        }
        Ok(())
    }
}

/// `IVdsPack::CreateVolume` response
///
/// `ppAsync` is an IVdsAsync interface pointer, kept as an opaque
/// `MInterfacePointer`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateVolumeResponse {
    pub that: OrpcThat,
    pub async_op: UniquePtr<InterfacePointer>,
    pub return_value: i32,
}

impl CreateVolumeResponse {
    /// Map the returned HRESULT to a result
    pub fn hresult(&self) -> msrpc_dcom::Result<()> {
        check_hresult(self.return_value)
    }
}

impl NdrMarshal for CreateVolumeResponse {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.that.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        self.async_op.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        w.write_field(self.return_value)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.that.prepare_payload()?;
        self.async_op.prepare_payload()
    }
}

impl NdrUnmarshal for CreateVolumeResponse {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.that.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.async_op.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.return_value = r.read_field()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msrpc_dcom::{hresult, DcomError};
    use msrpc_ndr::{marshal, unmarshal, NdrFormat, NdrPtr};

    #[test]
    fn test_pack_prop_layout() {
        let mut prop = PackProp {
            id: Guid::NIL,
            name: UniquePtr::new(NdrWString::new("ab")),
            status: PackStatus::ONLINE,
            flags: 0x10,
        };
        let bytes = marshal(&mut prop, NdrFormat::new()).unwrap();
        // id, referent, status, pad, flags, then the deferred string
        assert_eq!(&bytes[16..20], &[0x00, 0x00, 0x02, 0x00]);
        assert_eq!(&bytes[20..28], &[1, 0, 0, 0, 0x10, 0, 0, 0]);
        assert_eq!(&bytes[28..40], &[3, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(bytes.len(), 46);

        let decoded: PackProp = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.name(), Some("ab"));
    }

    #[test]
    fn test_get_properties_response() {
        let mut resp = GetPropertiesResponse {
            that: OrpcThat::new(),
            pack_properties: PackProp {
                id: Guid::NIL,
                name: UniquePtr::new(NdrWString::new("ab")),
                status: PackStatus::ONLINE,
                flags: 0,
            },
            return_value: 0,
        };
        let bytes = marshal(&mut resp, NdrFormat::new()).unwrap();
        // ORPCTHAT (8), pack prop (28), string (18), pad (2), HRESULT (4)
        assert_eq!(bytes.len(), 60);
        assert_eq!(&bytes[56..], &[0, 0, 0, 0]);

        let decoded: GetPropertiesResponse = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded, resp);
        assert!(decoded.hresult().is_ok());
    }

    #[test]
    fn test_get_properties_failure_hresult() {
        let resp = GetPropertiesResponse {
            return_value: hresult::E_ACCESSDENIED as i32,
            ..Default::default()
        };
        assert!(matches!(resp.hresult(), Err(DcomError::Hresult(hresult::E_ACCESSDENIED))));
    }

    #[test]
    fn test_get_properties_request() {
        let mut req = GetPropertiesRequest {
            this: OrpcThis::with_causality(Guid::NIL),
        };
        let bytes = marshal(&mut req, NdrFormat::new()).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..4], &[5, 0, 7, 0]);
    }

    #[test]
    fn test_create_volume_request_roundtrip() {
        let disks = vec![
            InputDisk {
                disk_id: Guid::parse("00000001-0000-0000-0000-000000000000").unwrap(),
                size: 1 << 30,
                plex_id: Guid::NIL,
                member_index: 0,
            },
            InputDisk {
                disk_id: Guid::parse("00000002-0000-0000-0000-000000000000").unwrap(),
                size: 1 << 30,
                plex_id: Guid::NIL,
                member_index: 1,
            },
        ];
        for format in [NdrFormat::new(), NdrFormat::ndr64(), NdrFormat::big_endian()] {
            let mut req = CreateVolumeRequest::new(VolumeType::STRIPE, disks.clone(), 64 * 1024);
            let bytes = marshal(&mut req, format).unwrap();
            let decoded: CreateVolumeRequest = unmarshal(bytes, format).unwrap();
            assert_eq!(decoded, req);
        }
    }

    #[test]
    fn test_create_volume_request_layout() {
        let mut req = CreateVolumeRequest {
            this: OrpcThis::with_causality(Guid::NIL),
            volume_type: VolumeType::SIMPLE,
            input_disks: vec![InputDisk::default()],
            number_of_disks: 0,
            stripe_size: 0,
        };
        let bytes = marshal(&mut req, NdrFormat::new()).unwrap();
        assert_eq!(req.number_of_disks, 1);
        // ORPCTHIS, type, pad, size
        assert_eq!(&bytes[32..40], &[10, 0, 0, 0, 1, 0, 0, 0]);
        // one disk at 40, then lNumberOfDisks and ulStripeSize
        assert_eq!(&bytes[84..], &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_create_volume_request_pads_short_array() {
        let mut req = CreateVolumeRequest {
            this: OrpcThis::with_causality(Guid::NIL),
            volume_type: VolumeType::SPAN,
            input_disks: vec![InputDisk::default()],
            number_of_disks: 3,
            stripe_size: 0,
        };
        let bytes = marshal(&mut req, NdrFormat::new()).unwrap();
        let decoded: CreateVolumeRequest = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert_eq!(decoded.input_disks.len(), 3);
        assert_eq!(decoded.number_of_disks, 3);
    }

    #[test]
    fn test_create_volume_request_disk_count_far_beyond_data() {
        let mut req = CreateVolumeRequest {
            this: OrpcThis::with_causality(Guid::NIL),
            volume_type: VolumeType::SPAN,
            input_disks: vec![],
            number_of_disks: i32::MAX,
            stripe_size: 0,
        };
        let result = marshal(&mut req, NdrFormat::new());
        assert!(matches!(
            result,
            Err(NdrError::ExcessivePadding {
                declared: 0x7FFF_FFFF,
                supplied: 0
            })
        ));
    }

    #[test]
    fn test_create_volume_response() {
        let mut resp = CreateVolumeResponse {
            that: OrpcThat::new(),
            async_op: UniquePtr::new(InterfacePointer::new(vec![0x4D, 0x45, 0x4F, 0x57])),
            return_value: hresult::S_OK as i32,
        };
        let bytes = marshal(&mut resp, NdrFormat::new()).unwrap();
        // ORPCTHAT, referent, MInterfacePointer, HRESULT
        assert_eq!(bytes.len(), 8 + 4 + 12 + 4);
        assert_eq!(&bytes[8..12], &[0x00, 0x00, 0x02, 0x00]);

        let decoded: CreateVolumeResponse = unmarshal(bytes, NdrFormat::new()).unwrap();
        assert!(decoded.async_op.as_ref().unwrap().has_objref_signature());
        assert!(decoded.hresult().is_ok());
    }

    #[test]
    fn test_create_volume_response_null_async() {
        let mut resp = CreateVolumeResponse {
            return_value: hresult::E_INVALIDARG as i32,
            ..Default::default()
        };
        let bytes = marshal(&mut resp, NdrFormat::ndr64()).unwrap();
        assert_eq!(bytes.len(), 16 + 8 + 4);

        let decoded: CreateVolumeResponse = unmarshal(bytes, NdrFormat::ndr64()).unwrap();
        assert!(decoded.async_op.is_null());
        assert!(decoded.hresult().is_err());
    }
}
