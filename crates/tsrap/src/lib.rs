//! Telnet Server Remote Administration Protocol (MS-TSRAP) payloads
//!
//! `IManageTelnetSessions` is a DCOM interface with three methods:
//!
//! | opnum | method              | [in]              | [out]            |
//! |-------|---------------------|-------------------|------------------|
//! | 7     | `GetTelnetSessions` |                   | BSTR session data |
//! | 8     | `TerminateSession`  | `dwUniqueId`      |                  |
//! | 9     | `SendMsgToASession` | `dwUniqueId`, BSTR |                 |
//!
//! Every request starts with ORPCTHIS; every response starts with ORPCTHAT
//! and ends with an HRESULT.

mod sessions;

pub use sessions::{
    GetTelnetSessionsRequest, GetTelnetSessionsResponse, SendMsgToASessionRequest,
    SendMsgToASessionResponse, StatusResponse, TerminateSessionRequest,
    TerminateSessionResponse,
};

/// IManageTelnetSessions interface UUID
pub const IID_IMANAGE_TELNET_SESSIONS: &str = "034634fd-ba3f-11d1-856a-00a0c944138c";
