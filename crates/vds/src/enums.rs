//! VDS enumerations (MS-VDS 2.2.1.2)
//!
//! NDR enumerations are open on the wire, so each one is a newtype over its
//! 16-bit value with the known values as associated constants.

use msrpc_ndr::{NdrContext, NdrEnum, NdrMarshal, NdrReader, NdrUnmarshal, NdrWriter, Result};

macro_rules! vds_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub u16);

        impl $name {
            $($(#[$vmeta])* pub const $variant: Self = Self($value);)*
        }

        impl From<$name> for NdrEnum {
            fn from(value: $name) -> Self {
                NdrEnum(value.0)
            }
        }

        impl From<NdrEnum> for $name {
            fn from(value: NdrEnum) -> Self {
                Self(value.0)
            }
        }

        impl NdrMarshal for $name {
            fn marshal_ndr<'a>(&'a self, _ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
                w.write_enum(self.0)
            }
        }

        impl NdrUnmarshal for $name {
            fn unmarshal_ndr<'a>(&'a mut self, _ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
                self.0 = r.read_enum()?;
                Ok(())
            }
        }
    };
}

vds_enum! {
    /// VDS_NOTIFICATION_TARGET_TYPE: selects the arm of a notification
    NotificationTargetType {
        UNKNOWN = 0,
        PACK = 10,
        VOLUME = 11,
        DISK = 13,
        PARTITION = 60,
        DRIVE_LETTER = 61,
        FILE_SYSTEM = 62,
        MOUNT_POINT = 63,
        SERVICE = 200,
    }
}

vds_enum! {
    /// VDS_PARTITION_STYLE
    PartitionStyle {
        UNKNOWN = 0,
        MBR = 1,
        GPT = 2,
    }
}

vds_enum! {
    /// VDS_VOLUME_TYPE
    VolumeType {
        UNKNOWN = 0,
        SIMPLE = 10,
        SPAN = 11,
        STRIPE = 12,
        MIRROR = 13,
        PARITY = 14,
    }
}

vds_enum! {
    /// VDS_PACK_STATUS
    PackStatus {
        UNKNOWN = 0,
        ONLINE = 1,
        OFFLINE = 4,
    }
}

vds_enum! {
    /// VDS_DISK_STATUS
    DiskStatus {
        UNKNOWN = 0,
        ONLINE = 1,
        NOT_READY = 2,
        NO_MEDIA = 3,
        OFFLINE = 4,
        FAILED = 5,
        MISSING = 6,
    }
}

vds_enum! {
    /// VDS_LUN_RESERVE_MODE
    LunReserveMode {
        NONE = 0,
        EXCLUSIVE_RW = 1,
        EXCLUSIVE_RO = 2,
        SHARED_RO = 3,
        SHARED_RW = 4,
    }
}

vds_enum! {
    /// VDS_HEALTH
    Health {
        UNKNOWN = 0,
        HEALTHY = 1,
        REBUILDING = 2,
        STALE = 3,
        FAILING = 4,
        FAILING_REDUNDANCY = 5,
        FAILED_REDUNDANCY = 6,
        FAILED_REDUNDANCY_FAILING = 7,
        FAILED = 8,
    }
}

vds_enum! {
    /// VDS_STORAGE_BUS_TYPE
    StorageBusType {
        UNKNOWN = 0,
        SCSI = 1,
        ATAPI = 2,
        ATA = 3,
        IEEE1394 = 4,
        SSA = 5,
        FIBRE = 6,
        USB = 7,
        RAID = 8,
        ISCSI = 9,
        SAS = 10,
        SATA = 11,
        SD = 12,
        MMC = 13,
        VIRTUAL = 14,
        FILE_BACKED_VIRTUAL = 15,
    }
}

vds_enum! {
    /// VDS_RECOVER_ACTION
    RecoverAction {
        UNKNOWN = 0,
        REFRESH = 1,
        RESTART = 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msrpc_ndr::{marshal, unmarshal, NdrFormat};

    #[test]
    fn test_enum_widths() {
        let mut ty = VolumeType::STRIPE;
        assert_eq!(&marshal(&mut ty, NdrFormat::new()).unwrap()[..], &[12, 0]);
        assert_eq!(&marshal(&mut ty, NdrFormat::ndr64()).unwrap()[..], &[12, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_value_survives() {
        let decoded: PartitionStyle = unmarshal(vec![0x34, 0x12], NdrFormat::new()).unwrap();
        assert_eq!(decoded, PartitionStyle(0x1234));
        assert_eq!(NdrEnum::from(decoded), NdrEnum(0x1234));
    }
}
