//! VDS notifications (MS-VDS 2.2.1.3.1 - 2.2.1.3.9)
//!
//! A `VDS_NOTIFICATION` is the target type followed by a union whose arm is
//! the target-specific notification. The union has no default arm.

use crate::enums::{NotificationTargetType, RecoverAction};
use msrpc_ndr::{
    Guid, NdrContext, NdrEnum, NdrError, NdrMarshal, NdrReader, NdrUnion, NdrUnmarshal, NdrWriter,
    Result,
};

/// Notification event codes (`VDS_NF_*`)
pub mod events {
    pub const PACK_ARRIVE: u32 = 1;
    pub const PACK_DEPART: u32 = 2;
    pub const PACK_MODIFY: u32 = 3;
    pub const VOLUME_ARRIVE: u32 = 4;
    pub const VOLUME_DEPART: u32 = 5;
    pub const VOLUME_MODIFY: u32 = 6;
    pub const VOLUME_REBUILDING_PROGRESS: u32 = 7;
    pub const DISK_ARRIVE: u32 = 8;
    pub const DISK_DEPART: u32 = 9;
    pub const DISK_MODIFY: u32 = 10;
    pub const PARTITION_ARRIVE: u32 = 11;
    pub const PARTITION_DEPART: u32 = 12;
    pub const PARTITION_MODIFY: u32 = 13;
    pub const DRIVE_LETTER_FREE: u32 = 201;
    pub const DRIVE_LETTER_ASSIGN: u32 = 202;
    pub const FILE_SYSTEM_MODIFY: u32 = 203;
    pub const FILE_SYSTEM_FORMAT_PROGRESS: u32 = 204;
    pub const MOUNT_POINTS_CHANGE: u32 = 205;
    pub const SERVICE_OUT_OF_SYNC: u32 = 301;
}

/// VDS_PACK_NOTIFICATION
///
/// ```text
/// ulEvent: u32
/// packId: GUID
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackNotification {
    pub event: u32,
    pub pack_id: Guid,
}

impl NdrMarshal for PackNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        self.pack_id.marshal_ndr(ctx, w)
    }
}

impl NdrUnmarshal for PackNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.pack_id.unmarshal_ndr(ctx, r)
    }
}

/// VDS_DISK_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiskNotification {
    pub event: u32,
    pub disk_id: Guid,
}

impl NdrMarshal for DiskNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        self.disk_id.marshal_ndr(ctx, w)
    }
}

impl NdrUnmarshal for DiskNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.disk_id.unmarshal_ndr(ctx, r)
    }
}

/// VDS_VOLUME_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VolumeNotification {
    pub event: u32,
    pub volume_id: Guid,
    pub plex_id: Guid,
    /// Rebuild progress, only meaningful for `VOLUME_REBUILDING_PROGRESS`
    pub percent_completed: u32,
}

impl NdrMarshal for VolumeNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        self.volume_id.marshal_ndr(ctx, w)?;
        self.plex_id.marshal_ndr(ctx, w)?;
        w.write_field(self.percent_completed)
    }
}

impl NdrUnmarshal for VolumeNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.volume_id.unmarshal_ndr(ctx, r)?;
        self.plex_id.unmarshal_ndr(ctx, r)?;
        self.percent_completed = r.read_field()?;
        Ok(())
    }
}

/// VDS_PARTITION_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartitionNotification {
    pub event: u32,
    pub disk_id: Guid,
    /// Byte offset of the partition on the disk
    pub offset: u64,
}

impl NdrMarshal for PartitionNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8)?;
        w.write_field(self.event)?;
        self.disk_id.marshal_ndr(ctx, w)?;
        w.write_field(self.offset)
    }
}

impl NdrUnmarshal for PartitionNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.event = r.read_field()?;
        self.disk_id.unmarshal_ndr(ctx, r)?;
        self.offset = r.read_field()?;
        Ok(())
    }
}

/// VDS_DRIVE_LETTER_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveLetterNotification {
    pub event: u32,
    /// Drive letter as a UTF-16 code unit
    pub letter: u16,
    pub volume_id: Guid,
}

impl DriveLetterNotification {
    pub fn letter(&self) -> Option<char> {
        char::from_u32(u32::from(self.letter))
    }
}

impl NdrMarshal for DriveLetterNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        w.write_field(self.letter)?;
        self.volume_id.marshal_ndr(ctx, w)
    }
}

impl NdrUnmarshal for DriveLetterNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.letter = r.read_field()?;
        self.volume_id.unmarshal_ndr(ctx, r)
    }
}

/// VDS_FILE_SYSTEM_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileSystemNotification {
    pub event: u32,
    pub volume_id: Guid,
    pub percent_completed: u32,
}

impl NdrMarshal for FileSystemNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        self.volume_id.marshal_ndr(ctx, w)?;
        w.write_field(self.percent_completed)
    }
}

impl NdrUnmarshal for FileSystemNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.volume_id.unmarshal_ndr(ctx, r)?;
        self.percent_completed = r.read_field()?;
        Ok(())
    }
}

/// VDS_MOUNT_POINT_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountPointNotification {
    pub event: u32,
    pub volume_id: Guid,
}

impl NdrMarshal for MountPointNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        self.volume_id.marshal_ndr(ctx, w)
    }
}

impl NdrUnmarshal for MountPointNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.volume_id.unmarshal_ndr(ctx, r)
    }
}

/// VDS_SERVICE_NOTIFICATION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServiceNotification {
    pub event: u32,
    pub action: RecoverAction,
}

impl NdrMarshal for ServiceNotification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(4)?;
        w.write_field(self.event)?;
        self.action.marshal_ndr(ctx, w)
    }
}

impl NdrUnmarshal for ServiceNotification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.event = r.read_field()?;
        self.action.unmarshal_ndr(ctx, r)
    }
}

/// Target-specific notification, discriminated by [`NotificationTargetType`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationBody {
    Pack(PackNotification),
    Disk(DiskNotification),
    Volume(VolumeNotification),
    Partition(PartitionNotification),
    DriveLetter(DriveLetterNotification),
    FileSystem(FileSystemNotification),
    MountPoint(MountPointNotification),
    Service(ServiceNotification),
}

impl Default for NotificationBody {
    fn default() -> Self {
        Self::Pack(PackNotification::default())
    }
}

impl NotificationBody {
    pub fn target_type(&self) -> NotificationTargetType {
        match self {
            Self::Pack(_) => NotificationTargetType::PACK,
            Self::Disk(_) => NotificationTargetType::DISK,
            Self::Volume(_) => NotificationTargetType::VOLUME,
            Self::Partition(_) => NotificationTargetType::PARTITION,
            Self::DriveLetter(_) => NotificationTargetType::DRIVE_LETTER,
            Self::FileSystem(_) => NotificationTargetType::FILE_SYSTEM,
            Self::MountPoint(_) => NotificationTargetType::MOUNT_POINT,
            Self::Service(_) => NotificationTargetType::SERVICE,
        }
    }

    /// Event code of the active arm
    pub fn event(&self) -> u32 {
        match self {
            Self::Pack(n) => n.event,
            Self::Disk(n) => n.event,
            Self::Volume(n) => n.event,
            Self::Partition(n) => n.event,
            Self::DriveLetter(n) => n.event,
            Self::FileSystem(n) => n.event,
            Self::MountPoint(n) => n.event,
            Self::Service(n) => n.event,
        }
    }
}

impl NdrUnion for NotificationBody {
    type Switch = NdrEnum;
    const ALIGN: usize = 8;

    fn switch_value(&self) -> NdrEnum {
        self.target_type().into()
    }

    fn marshal_arm<'a>(&'a self, sw: NdrEnum, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        match (NotificationTargetType::from(sw), self) {
            (NotificationTargetType::PACK, Self::Pack(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::PACK, _) => w.write_zero_value::<PackNotification>(ctx),
            (NotificationTargetType::DISK, Self::Disk(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::DISK, _) => w.write_zero_value::<DiskNotification>(ctx),
            (NotificationTargetType::VOLUME, Self::Volume(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::VOLUME, _) => w.write_zero_value::<VolumeNotification>(ctx),
            (NotificationTargetType::PARTITION, Self::Partition(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::PARTITION, _) => {
                w.write_zero_value::<PartitionNotification>(ctx)
            }
            (NotificationTargetType::DRIVE_LETTER, Self::DriveLetter(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::DRIVE_LETTER, _) => {
                w.write_zero_value::<DriveLetterNotification>(ctx)
            }
            (NotificationTargetType::FILE_SYSTEM, Self::FileSystem(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::FILE_SYSTEM, _) => {
                w.write_zero_value::<FileSystemNotification>(ctx)
            }
            (NotificationTargetType::MOUNT_POINT, Self::MountPoint(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::MOUNT_POINT, _) => {
                w.write_zero_value::<MountPointNotification>(ctx)
            }
            (NotificationTargetType::SERVICE, Self::Service(n)) => n.marshal_ndr(ctx, w),
            (NotificationTargetType::SERVICE, _) => w.write_zero_value::<ServiceNotification>(ctx),
            _ => Err(NdrError::UnsupportedDiscriminant(u64::from(sw))),
        }
    }

    fn unmarshal_arm<'a>(&'a mut self, sw: NdrEnum, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        *self = match NotificationTargetType::from(sw) {
            NotificationTargetType::PACK => Self::Pack(PackNotification::default()),
            NotificationTargetType::DISK => Self::Disk(DiskNotification::default()),
            NotificationTargetType::VOLUME => Self::Volume(VolumeNotification::default()),
            NotificationTargetType::PARTITION => Self::Partition(PartitionNotification::default()),
            NotificationTargetType::DRIVE_LETTER => {
                Self::DriveLetter(DriveLetterNotification::default())
            }
            NotificationTargetType::FILE_SYSTEM => {
                Self::FileSystem(FileSystemNotification::default())
            }
            NotificationTargetType::MOUNT_POINT => {
                Self::MountPoint(MountPointNotification::default())
            }
            NotificationTargetType::SERVICE => Self::Service(ServiceNotification::default()),
            _ => return Err(NdrError::UnsupportedDiscriminant(u64::from(sw))),
        };
        match self {
            Self::Pack(n) => n.unmarshal_ndr(ctx, r),
            Self::Disk(n) => n.unmarshal_ndr(ctx, r),
            Self::Volume(n) => n.unmarshal_ndr(ctx, r),
            Self::Partition(n) => n.unmarshal_ndr(ctx, r),
            Self::DriveLetter(n) => n.unmarshal_ndr(ctx, r),
            Self::FileSystem(n) => n.unmarshal_ndr(ctx, r),
            Self::MountPoint(n) => n.unmarshal_ndr(ctx, r),
            Self::Service(n) => n.unmarshal_ndr(ctx, r),
        }
    }
}

/// VDS_NOTIFICATION
///
/// ```text
/// objectType: enum
/// [union align] objectType [union align] arm
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Notification {
    pub object_type: NotificationTargetType,
    pub body: NotificationBody,
}

impl Notification {
    pub fn new(body: NotificationBody) -> Self {
        Self {
            object_type: body.target_type(),
            body,
        }
    }
}

impl From<NotificationBody> for Notification {
    fn from(body: NotificationBody) -> Self {
        Self::new(body)
    }
}

impl NdrMarshal for Notification {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(8)?;
        self.object_type.marshal_ndr(ctx, w)?;
        self.body.marshal_union_ndr(self.object_type.into(), ctx, w)
    }
}

impl NdrUnmarshal for Notification {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(8)?;
        self.object_type = NotificationTargetType(r.read_enum()?);
        self.body.unmarshal_union_ndr(ctx, r).map(|_| ())
    }
}
