//! IManageTelnetSessions request and response payloads (MS-TSRAP 3.1.4)

use msrpc_dcom::{check_hresult, OrpcThat, OrpcThis};
use msrpc_ndr::{Bstr, NdrContext, NdrMarshal, NdrReader, NdrUnmarshal, NdrWriter, Result};

/// `GetTelnetSessions` request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetTelnetSessionsRequest {
    pub this: OrpcThis,
}

impl GetTelnetSessionsRequest {
    pub const OPNUM: u16 = 7;

    pub fn new() -> Self {
        Self {
            this: OrpcThis::new(),
        }
    }
}

impl NdrMarshal for GetTelnetSessionsRequest {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.this.marshal_ndr(ctx, w)?;
        w.write_deferred()
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.this.prepare_payload()
    }
}

impl NdrUnmarshal for GetTelnetSessionsRequest {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.this.unmarshal_ndr(ctx, r)?;
        r.read_deferred()
    }
}

/// `GetTelnetSessions` response
///
/// ```text
/// ORPCTHAT
/// pszSessionData: [out, retval] BSTR*
/// HRESULT
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetTelnetSessionsResponse {
    pub that: OrpcThat,
    pub session_data: Bstr,
    pub return_value: i32,
}

impl GetTelnetSessionsResponse {
    /// Session listing as returned by the server, `None` if the BSTR is null
    pub fn session_data(&self) -> Option<String> {
        self.session_data.to_option_string()
    }

    pub fn hresult(&self) -> msrpc_dcom::Result<()> {
        check_hresult(self.return_value)
    }
}

impl NdrMarshal for GetTelnetSessionsResponse {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.that.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        self.session_data.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        w.write_field(self.return_value)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.that.prepare_payload()?;
        self.session_data.prepare_payload()
    }
}

impl NdrUnmarshal for GetTelnetSessionsResponse {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.that.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.session_data.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.return_value = r.read_field()?;
        Ok(())
    }
}

/// `TerminateSession` request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerminateSessionRequest {
    pub this: OrpcThis,
    /// Session to terminate
    pub unique_id: u32,
}

impl TerminateSessionRequest {
    pub const OPNUM: u16 = 8;

    pub fn new(unique_id: u32) -> Self {
        Self {
            this: OrpcThis::new(),
            unique_id,
        }
    }
}

impl NdrMarshal for TerminateSessionRequest {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.this.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        w.write_field(self.unique_id)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.this.prepare_payload()
    }
}

impl NdrUnmarshal for TerminateSessionRequest {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.this.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.unique_id = r.read_field()?;
        Ok(())
    }
}

/// `SendMsgToASession` request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendMsgToASessionRequest {
    pub this: OrpcThis,
    pub unique_id: u32,
    pub message: Bstr,
}

impl SendMsgToASessionRequest {
    pub const OPNUM: u16 = 9;

    pub fn new(unique_id: u32, message: &str) -> Self {
        Self {
            this: OrpcThis::new(),
            unique_id,
            message: Bstr::new(message),
        }
    }
}

impl NdrMarshal for SendMsgToASessionRequest {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.this.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        w.write_field(self.unique_id)?;
        self.message.marshal_ndr(ctx, w)?;
        w.write_deferred()
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.this.prepare_payload()?;
        self.message.prepare_payload()
    }
}

impl NdrUnmarshal for SendMsgToASessionRequest {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.this.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.unique_id = r.read_field()?;
        self.message.unmarshal_ndr(ctx, r)?;
        r.read_deferred()
    }
}

/// Response carrying only ORPCTHAT and the HRESULT
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub that: OrpcThat,
    pub return_value: i32,
}

/// `TerminateSession` response
pub type TerminateSessionResponse = StatusResponse;

/// `SendMsgToASession` response
pub type SendMsgToASessionResponse = StatusResponse;

impl StatusResponse {
    pub fn hresult(&self) -> msrpc_dcom::Result<()> {
        check_hresult(self.return_value)
    }
}

impl NdrMarshal for StatusResponse {
    fn marshal_ndr<'a>(&'a self, ctx: &NdrContext, w: &mut NdrWriter<'a>) -> Result<()> {
        self.that.marshal_ndr(ctx, w)?;
        w.write_deferred()?;
        w.write_field(self.return_value)
    }

    fn prepare_payload(&mut self) -> Result<()> {
        self.that.prepare_payload()
    }
}

impl NdrUnmarshal for StatusResponse {
    fn unmarshal_ndr<'a>(&'a mut self, ctx: &NdrContext, r: &mut NdrReader<'a>) -> Result<()> {
        self.that.unmarshal_ndr(ctx, r)?;
        r.read_deferred()?;
        self.return_value = r.read_field()?;
        Ok(())
    }
}
