//! Disk and partition structures (MS-VDS 2.2.2.11, 2.2.2.13.1, 2.2.2.15.1)

use crate::enums::{DiskStatus, Health, LunReserveMode, PartitionStyle, StorageBusType};
use msrpc_ndr::{
    Guid, NdrContext, NdrEnum, NdrError, NdrMarshal, NdrReader, NdrUnion, NdrUnmarshal,
    NdrWString, NdrWriter, Result, UniquePtr,
};

/// Disk identification for the partition style of a disk
///
/// `[switch_is(PartitionStyle)]` with no default arm: an unknown style is
/// rejected in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiskStyleInfo {
    /// MBR disk signature
    Mbr(u32),
    /// GPT disk GUID
    Gpt(Guid),
}

impl Default for DiskStyleInfo {
    fn default() -> Self {
        Self::Mbr(0)
    }
}

impl NdrUnion for DiskStyleInfo {
    type Switch = NdrEnum;
    const ALIGN: usize = 4;

    fn switch_value(&self) -> NdrEnum {
        match self {
            Self::Mbr(_) => PartitionStyle::MBR.into(),
            Self::Gpt(_) => PartitionStyle::GPT.into(),
        }
    }

    fn marshal_arm<'a>(&'a self, sw: NdrEnum, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        match (PartitionStyle::from(sw), self) {
            (PartitionStyle::MBR, Self::Mbr(signature)) => signature.marshal_ndr(ctx, w),
            (PartitionStyle::MBR, _) => w.write_zero_value::<u32>(ctx),
            (PartitionStyle::GPT, Self::Gpt(guid)) => guid.marshal_ndr(ctx, w),
            (PartitionStyle::GPT, _) => w.write_zero_value::<Guid>(ctx),
            _ => Err(NdrError::UnsupportedDiscriminant(u64::from(sw))),
        }
    }

    fn unmarshal_arm<'a>(&'a mut self, sw: NdrEnum, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        *self = match PartitionStyle::from(sw) {
            PartitionStyle::MBR => Self::Mbr(0),
            PartitionStyle::GPT => Self::Gpt(Guid::NIL),
            _ => return Err(NdrError::UnsupportedDiscriminant(u64::from(sw))),
        };
        match self {
            Self::Mbr(signature) => signature.unmarshal_ndr(ctx, r),
            Self::Gpt(guid) => guid.unmarshal_ndr(ctx, r),
        }
    }
}

/// VDS_DISK_PROP
///
/// The partition style is transmitted twice: once as a member and once as
/// the discriminant of `style_info`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiskProp {
    pub id: Guid,
    pub status: DiskStatus,
    pub reserve_mode: LunReserveMode,
    pub health: Health,
    pub device_type: u32,
    pub media_type: u32,
    /// Disk size in bytes
    pub size: u64,
    pub bytes_per_sector: u32,
    pub sectors_per_track: u32,
    pub tracks_per_cylinder: u32,
    pub flags: u32,
    pub bus_type: StorageBusType,
    pub partition_style: PartitionStyle,
    pub style_info: DiskStyleInfo,
    pub disk_address: UniquePtr<NdrWString>,
    pub name: UniquePtr<NdrWString>,
    pub friendly_name: UniquePtr<NdrWString>,
    pub adaptor_name: UniquePtr<NdrWString>,
    pub device_path: UniquePtr<NdrWString>,
}

impl NdrMarshal for DiskProp {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8)?;
        self.id.marshal_ndr(ctx, w)?;
        self.status.marshal_ndr(ctx, w)?;
        self.reserve_mode.marshal_ndr(ctx, w)?;
        self.health.marshal_ndr(ctx, w)?;
        w.write_field(self.device_type)?;
        w.write_field(self.media_type)?;
        w.write_field(self.size)?;
        w.write_field(self.bytes_per_sector)?;
        w.write_field(self.sectors_per_track)?;
        w.write_field(self.tracks_per_cylinder)?;
        w.write_field(self.flags)?;
        self.bus_type.marshal_ndr(ctx, w)?;
        self.partition_style.marshal_ndr(ctx, w)?;
        self.style_info
            .marshal_union_ndr(self.partition_style.into(), ctx, w)?;
        self.disk_address.marshal_ndr(ctx, w)?;
        self.name.marshal_ndr(ctx, w)?;
        self.friendly_name.marshal_ndr(ctx, w)?;
        self.adaptor_name.marshal_ndr(ctx, w)?;
        self.device_path.marshal_ndr(ctx, w)?;
        w.write_trailing_gap(8)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        if self.partition_style == PartitionStyle::UNKNOWN {
            self.partition_style = self.style_info.switch_value().into();
        }
        Ok(())
    }
}

impl NdrUnmarshal for DiskProp {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.id.unmarshal_ndr(ctx, r)?;
        self.status = DiskStatus(r.read_enum()?);
        self.reserve_mode = LunReserveMode(r.read_enum()?);
        self.health = Health(r.read_enum()?);
        self.device_type = r.read_field()?;
        self.media_type = r.read_field()?;
        self.size = r.read_field()?;
        self.bytes_per_sector = r.read_field()?;
        self.sectors_per_track = r.read_field()?;
        self.tracks_per_cylinder = r.read_field()?;
        self.flags = r.read_field()?;
        self.bus_type = StorageBusType(r.read_enum()?);
        self.partition_style = PartitionStyle(r.read_enum()?);
        self.style_info.unmarshal_union_ndr(ctx, r)?;
        self.disk_address.unmarshal_ndr(ctx, r)?;
        self.name.unmarshal_ndr(ctx, r)?;
        self.friendly_name.unmarshal_ndr(ctx, r)?;
        self.adaptor_name.unmarshal_ndr(ctx, r)?;
        self.device_path.unmarshal_ndr(ctx, r)?;
        r.read_trailing_gap(8)
    }
}

/// VDS_PARTITION_INFO_MBR
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartitionInfoMbr {
    pub partition_type: u8,
    pub boot_indicator: bool,
    pub recognized_partition: bool,
    pub hidden_sectors: u32,
}

impl NdrMarshal for PartitionInfoMbr {
    fn marshal_ndr<'a>(&'a self, _ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.partition_type)?;
        w.write_field(self.boot_indicator)?;
        w.write_field(self.recognized_partition)?;
        w.write_field(self.hidden_sectors)
    }
}

impl NdrUnmarshal for PartitionInfoMbr {
    fn unmarshal_ndr<'a>(&'a mut self, _ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.partition_type = r.read_field()?;
        self.boot_indicator = r.read_field()?;
        self.recognized_partition = r.read_field()?;
        self.hidden_sectors = r.read_field()?;
        Ok(())
    }
}

/// Length of the fixed GPT partition name, in UTF-16 code units
pub const GPT_NAME_LEN: usize = 36;

/// VDS_PARTITION_INFO_GPT
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionInfoGpt {
    pub partition_type: Guid,
    pub partition_id: Guid,
    pub attributes: u64,
    /// NUL-padded UTF-16 name
    pub name: [u16; GPT_NAME_LEN],
}

impl Default for PartitionInfoGpt {
    fn default() -> Self {
        Self {
            partition_type: Guid::NIL,
            partition_id: Guid::NIL,
            attributes: 0,
            name: [0; GPT_NAME_LEN],
        }
    }
}

impl PartitionInfoGpt {
    /// Store `name`, truncated to the fixed field width
    pub fn set_name(&mut self, name: &str) {
        self.name = [0; GPT_NAME_LEN];
        for (slot, unit) in self.name.iter_mut().zip(name.encode_utf16()) {
            *slot = unit;
        }
    }

    /// Name up to the first NUL
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&c| c == 0).unwrap_or(GPT_NAME_LEN);
        String::from_utf16_lossy(&self.name[..end])
    }
}

impl NdrMarshal for PartitionInfoGpt {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8)?;
        self.partition_type.marshal_ndr(ctx, w)?;
        self.partition_id.marshal_ndr(ctx, w)?;
        w.write_field(self.attributes)?;
        self.name.marshal_ndr(ctx, w)
    }
}

impl NdrUnmarshal for PartitionInfoGpt {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.partition_type.unmarshal_ndr(ctx, r)?;
        self.partition_id.unmarshal_ndr(ctx, r)?;
        self.attributes = r.read_field()?;
        self.name.unmarshal_ndr(ctx, r)
    }
}

/// Style-specific partition information
///
/// The default arm is empty and keeps the label it was decoded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionInfo {
    Mbr(PartitionInfoMbr),
    Gpt(PartitionInfoGpt),
    Other(PartitionStyle),
}

impl Default for PartitionInfo {
    fn default() -> Self {
        Self::Other(PartitionStyle::UNKNOWN)
    }
}

impl NdrUnion for PartitionInfo {
    type Switch = NdrEnum;
    const ALIGN: usize = 8;

    fn switch_value(&self) -> NdrEnum {
        match self {
            Self::Mbr(_) => PartitionStyle::MBR.into(),
            Self::Gpt(_) => PartitionStyle::GPT.into(),
            Self::Other(style) => (*style).into(),
        }
    }

    fn marshal_arm<'a>(&'a self, sw: NdrEnum, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        match (PartitionStyle::from(sw), self) {
            (PartitionStyle::MBR, Self::Mbr(info)) => info.marshal_ndr(ctx, w),
            (PartitionStyle::MBR, _) => w.write_zero_value::<PartitionInfoMbr>(ctx),
            (PartitionStyle::GPT, Self::Gpt(info)) => info.marshal_ndr(ctx, w),
            (PartitionStyle::GPT, _) => w.write_zero_value::<PartitionInfoGpt>(ctx),
            _ => Ok(()),
        }
    }

    fn unmarshal_arm<'a>(&'a mut self, sw: NdrEnum, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        *self = match PartitionStyle::from(sw) {
            PartitionStyle::MBR => Self::Mbr(PartitionInfoMbr::default()),
            PartitionStyle::GPT => Self::Gpt(PartitionInfoGpt::default()),
            style => Self::Other(style),
        };
        match self {
            Self::Mbr(info) => info.unmarshal_ndr(ctx, r),
            Self::Gpt(info) => info.unmarshal_ndr(ctx, r),
            Self::Other(_) => Ok(()),
        }
    }
}

/// VDS_PARTITION_PROP
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartitionProp {
    pub partition_style: PartitionStyle,
    pub flags: u32,
    pub partition_number: u32,
    /// Byte offset from the start of the disk
    pub offset: u64,
    pub size: u64,
    pub info: PartitionInfo,
}

impl NdrMarshal for PartitionProp {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8)?;
        self.partition_style.marshal_ndr(ctx, w)?;
        w.write_field(self.flags)?;
        w.write_field(self.partition_number)?;
        w.write_field(self.offset)?;
        w.write_field(self.size)?;
        self.info.marshal_union_ndr(self.partition_style.into(), ctx, w)?;
        w.write_trailing_gap(8)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        if self.partition_style == PartitionStyle::UNKNOWN {
            self.partition_style = self.info.switch_value().into();
        }
        Ok(())
    }
}

impl NdrUnmarshal for PartitionProp {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.partition_style = PartitionStyle(r.read_enum()?);
        self.flags = r.read_field()?;
        self.partition_number = r.read_field()?;
        self.offset = r.read_field()?;
        self.size = r.read_field()?;
        self.info.unmarshal_union_ndr(ctx, r)?;
        r.read_trailing_gap(8)
    }
}

/// VDS_INPUT_DISK: one member disk of a volume to create
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputDisk {
    pub disk_id: Guid,
    /// Bytes to use on this disk
    pub size: u64,
    pub plex_id: Guid,
    pub member_index: u32,
}

impl NdrMarshal for InputDisk {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8)?;
        self.disk_id.marshal_ndr(ctx, w)?;
        w.write_field(self.size)?;
        self.plex_id.marshal_ndr(ctx, w)?;
        w.write_field(self.member_index)?;
        w.write_trailing_gap(8)
    }
}

impl NdrUnmarshal for InputDisk {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.disk_id.unmarshal_ndr(ctx, r)?;
        self.size = r.read_field()?;
        self.plex_id.unmarshal_ndr(ctx, r)?;
        self.member_index = r.read_field()?;
        r.read_trailing_gap(8)
    }
}
