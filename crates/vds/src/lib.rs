//! Virtual Disk Service (MS-VDS) payloads
//!
//! Structures and operation payloads of the VDS DCOM interfaces, expressed
//! with the `msrpc-ndr` codec. Only the wire encoding lives here; calling a
//! VDS server needs a DCE/RPC transport on top.
//!
//! ```
//! use msrpc_ndr::{marshal, unmarshal, Guid, NdrFormat};
//! use msrpc_vds::{events, Notification, NotificationBody, PackNotification};
//!
//! let mut n = Notification::new(NotificationBody::Pack(PackNotification {
//!     event: events::PACK_ARRIVE,
//!     pack_id: Guid::NIL,
//! }));
//! let bytes = marshal(&mut n, NdrFormat::new()).unwrap();
//! let back: Notification = unmarshal(bytes, NdrFormat::new()).unwrap();
//! assert_eq!(back, n);
//! ```

pub mod disk;
pub mod enums;
pub mod notification;
pub mod pack;

pub use disk::{
    DiskProp, DiskStyleInfo, InputDisk, PartitionInfo, PartitionInfoGpt, PartitionInfoMbr,
    PartitionProp,
};
pub use enums::*;
pub use notification::{
    events, DiskNotification, DriveLetterNotification, FileSystemNotification,
    MountPointNotification, Notification, NotificationBody, PackNotification,
    PartitionNotification, ServiceNotification, VolumeNotification,
};
pub use pack::{
    CreateVolumeRequest, CreateVolumeResponse, GetPropertiesRequest, GetPropertiesResponse,
    PackProp, IID_IVDS_PACK,
};
