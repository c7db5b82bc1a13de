//! DCOM ORPC types for NDR-marshaled calls
//!
//! Every DCOM method call carries an implicit ORPCTHIS as its first request
//! argument and an implicit ORPCTHAT as the first response value, followed
//! by the method's own parameters and, for responses, an HRESULT.
//!
//! ```text
//! request:  ORPCTHIS | [in] parameters
//! response: ORPCTHAT | [out] parameters | HRESULT
//! ```
//!
//! Interface pointers travel as opaque `MInterfacePointer` blobs; resolving
//! them (OXID resolution, remote reference counting) is out of scope.
//!
//! # Modules
//!
//! - [`types`]: ORPC headers, interface pointers, HRESULTs

pub mod types;

pub use types::{
    check_hresult, hresult, iid, ComVersion, DcomError, InterfacePointer, OrpcExtent,
    OrpcExtentArray, OrpcThat, OrpcThis, Result,
};

/// DCOM version sent in ORPCTHIS by default
pub const DCOM_VERSION: ComVersion = ComVersion::DCOM_5_7;
