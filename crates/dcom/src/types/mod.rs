//! Core DCOM types (MS-DCOM 2.2)
//!
//! - Identifiers: CID, IID
//! - ORPC headers: ORPCTHIS, ORPCTHAT and their extensions
//! - Marshaled interface pointers: MInterfacePointer

mod error;
mod identifiers;
mod objref;
mod orpc;

pub use error::*;
pub use identifiers::{generate_uuid, well_known, Cid, Iid};
pub use objref::*;
pub use orpc::*;

/// Well-known interface UUIDs
pub mod iid {
    /// IUnknown interface UUID
    pub const IUNKNOWN: &str = "00000000-0000-0000-c000-000000000046";
    /// IRemUnknown interface UUID
    pub const IREMUNKNOWN: &str = "00000131-0000-0000-c000-000000000046";
}
