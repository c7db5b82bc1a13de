//! DCOM error types

use msrpc_ndr::NdrError;
use thiserror::Error;
use tracing::debug;

/// Result type for DCOM operations
pub type Result<T> = std::result::Result<T, DcomError>;

/// DCOM-specific errors
#[derive(Error, Debug)]
pub enum DcomError {
    /// Payload could not be marshaled or unmarshaled
    #[error("NDR error: {0}")]
    Ndr(#[from] NdrError),

    /// The call completed with a failure HRESULT
    #[error("call failed: HRESULT 0x{0:08x}")]
    Hresult(u32),
}

/// HRESULT codes commonly used in DCOM
pub mod hresult {
    /// Operation successful
    pub const S_OK: u32 = 0x00000000;
    /// Operation successful, returning false
    pub const S_FALSE: u32 = 0x00000001;
    /// Unspecified error
    pub const E_FAIL: u32 = 0x80004005;
    /// Invalid pointer
    pub const E_POINTER: u32 = 0x80004003;
    /// No such interface supported
    pub const E_NOINTERFACE: u32 = 0x80004002;
    /// Out of memory
    pub const E_OUTOFMEMORY: u32 = 0x8007000E;
    /// Invalid argument
    pub const E_INVALIDARG: u32 = 0x80070057;
    /// Access denied
    pub const E_ACCESSDENIED: u32 = 0x80070005;
    /// Object or server not available
    pub const CO_E_OBJNOTCONNECTED: u32 = 0x800401FD;
    /// RPC server unavailable
    pub const RPC_E_SERVER_DIED: u32 = 0x80010007;

    /// Severity bit clear
    pub fn succeeded(hr: i32) -> bool {
        hr >= 0
    }
}

/// Map the HRESULT returned by an ORPC call to a `Result`
pub fn check_hresult(hr: i32) -> Result<()> {
    if hresult::succeeded(hr) {
        Ok(())
    } else {
        debug!(hresult = format_args!("0x{:08x}", hr as u32), "ORPC call failed");
        Err(DcomError::Hresult(hr as u32))
    }
}
