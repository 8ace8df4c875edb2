//! Two-stage radiko authorization handshake
//!
//! 1. `auth1` is sent with the application identity headers. The response
//!    headers carry a partial token and an offset/length pair into the
//!    player key ([`Stage1Result`]).
//! 2. The partial key is the base64 encoding of that slice of [`AUTH_KEY`].
//!    `auth2` sends it back with the partial token; the first line of the
//!    response body is the full token ([`Stage2Result`]).
//!
//! Only a completed exchange touches the client: any failure leaves the
//! previously configured token in place. Each call runs both stages again,
//! so [`RadikoClient::authorize_token`] doubles as a token refresh.

use crate::client::{
    api_path, default_auth_token_header, ApiVersion, Params, RadikoClient,
    RADIKO_AUTH_TOKEN_HEADER,
};
use crate::context::RequestContext;
use crate::error::{AuthStage, Error, Result};
use base64::prelude::*;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response};
use tracing::{debug, info, warn};

/// Player key sliced to compute the partial key
pub const AUTH_KEY: &str = "bcd151073c03b352e1ef2fd66c32209da9ca0afa";

pub const RADIKO_APP_HEADER: &str = "X-Radiko-App";
pub const RADIKO_APP_VERSION_HEADER: &str = "X-Radiko-App-Version";
pub const RADIKO_USER_HEADER: &str = "X-Radiko-User";
pub const RADIKO_DEVICE_HEADER: &str = "X-Radiko-Device";
pub const RADIKO_KEY_OFFSET_HEADER: &str = "X-Radiko-KeyOffset";
pub const RADIKO_KEY_LENGTH_HEADER: &str = "X-Radiko-KeyLength";
pub const RADIKO_PARTIAL_KEY_HEADER: &str = "X-Radiko-PartialKey";
pub const RADIKO_SEGMENT_INDEX_HEADER: &str = "X-Radiko-Segment-Index";
pub const RADIKO_SEGMENT_COUNT_HEADER: &str = "X-Radiko-Segment-Count";

/// Output of `auth1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage1Result {
    /// Token to present to `auth2`
    pub partial_token: String,
    /// Start of the partial key in [`AUTH_KEY`]
    pub key_offset: usize,
    /// Length of the partial key in [`AUTH_KEY`]
    pub key_length: usize,
}

impl Stage1Result {
    /// Extract the stage 1 fragments from `auth1` response headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        Ok(Self {
            partial_token: header_str(headers, RADIKO_AUTH_TOKEN_HEADER)?.to_string(),
            key_offset: header_usize(headers, RADIKO_KEY_OFFSET_HEADER)?,
            key_length: header_usize(headers, RADIKO_KEY_LENGTH_HEADER)?,
        })
    }

    /// Partial key for these fragments
    pub fn partial_key(&self) -> Result<String> {
        partial_key(self.key_offset, self.key_length)
    }
}

/// Output of `auth2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage2Result {
    /// Token for authenticated calls
    pub full_token: String,
}

impl Stage2Result {
    /// The full token is the first line of the `auth2` body
    pub fn from_body(body: &str) -> Result<Self> {
        let full_token = body
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| Error::decode("auth2 response has no token line"))?;

        Ok(Self {
            full_token: full_token.to_string(),
        })
    }
}

/// Base64 of `AUTH_KEY[offset..offset + length]`
///
/// ```
/// use pmoradiko::auth::partial_key;
///
/// assert_eq!(partial_key(0, 4).unwrap(), "YmNkMQ==");
/// assert!(partial_key(38, 8).is_err());
/// ```
pub fn partial_key(offset: usize, length: usize) -> Result<String> {
    let slice = offset
        .checked_add(length)
        .and_then(|end| AUTH_KEY.as_bytes().get(offset..end))
        .ok_or_else(|| {
            Error::decode(format!(
                "key slice offset={} length={} outside the {}-byte key",
                offset,
                length,
                AUTH_KEY.len()
            ))
        })?;

    Ok(BASE64_STANDARD.encode(slice))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .ok_or_else(|| Error::decode(format!("missing {} header", name)))?
        .to_str()
        .map_err(|e| Error::decode(format!("{} header: {}", name, e)))
}

fn header_usize(headers: &HeaderMap, name: &str) -> Result<usize> {
    let raw = header_str(headers, name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::decode(format!("{} header {:?}: {}", name, raw, e)))
}

fn check_stage(stage: AuthStage, response: &Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    warn!(%status, "radiko authorization failed at {}", stage);
    Err(Error::Auth {
        stage,
        status: status.as_u16(),
    })
}

impl RadikoClient {
    /// Run the full handshake and keep the resulting token
    ///
    /// On success every request built with [`Params::authenticated`] carries
    /// the new token in the `X-Radiko-AuthToken` header.
    ///
    /// # Errors
    ///
    /// * [`Error::Auth`] - non-success status at either stage
    /// * [`Error::Decode`] - missing/invalid stage 1 headers or no token line
    /// * [`Error::Context`] / [`Error::Transport`] - as for any request
    pub async fn authorize_token(&mut self, ctx: &RequestContext) -> Result<String> {
        let stage1 = self.auth1(ctx).await?;
        let partial_key = stage1.partial_key()?;
        let stage2 = self.auth2(ctx, &stage1.partial_token, &partial_key).await?;

        self.set_auth_token_header_name(default_auth_token_header());
        self.set_auth_token_header(stage2.full_token.clone());

        info!("radiko auth token authorized");
        Ok(stage2.full_token)
    }

    /// Stage 1: obtain the partial token and key slice metadata
    pub async fn auth1(&self, ctx: &RequestContext) -> Result<Stage1Result> {
        let app = self.app_identity();
        let params = Params::new()
            .header(RADIKO_APP_HEADER, &app.app)
            .header(RADIKO_APP_VERSION_HEADER, &app.app_version)
            .header(RADIKO_USER_HEADER, &app.user)
            .header(RADIKO_DEVICE_HEADER, &app.device);

        let path = api_path(ApiVersion::V2, "api/auth1");
        let request = self.new_request(Some(ctx), Method::GET, &path, &params)?;
        let response = self.execute(request).await?;
        check_stage(AuthStage::Stage1, &response)?;

        let stage1 = Stage1Result::from_headers(response.headers())?;
        debug!(
            key_offset = stage1.key_offset,
            key_length = stage1.key_length,
            "radiko auth1 succeeded"
        );
        Ok(stage1)
    }

    /// Stage 2: exchange the partial token and key for the full token
    pub async fn auth2(
        &self,
        ctx: &RequestContext,
        partial_token: &str,
        partial_key: &str,
    ) -> Result<Stage2Result> {
        let app = self.app_identity();
        let params = Params::new()
            .header(RADIKO_AUTH_TOKEN_HEADER, partial_token)
            .header(RADIKO_PARTIAL_KEY_HEADER, partial_key)
            .header(RADIKO_USER_HEADER, &app.user)
            .header(RADIKO_DEVICE_HEADER, &app.device)
            .header(RADIKO_SEGMENT_INDEX_HEADER, "1")
            .header(RADIKO_SEGMENT_COUNT_HEADER, "1");

        let path = api_path(ApiVersion::V2, "api/auth2");
        let request = self.new_request(Some(ctx), Method::GET, &path, &params)?;
        let response = self.execute(request).await?;
        check_stage(AuthStage::Stage2, &response)?;

        let body = ctx.run(response.text()).await??;
        let stage2 = Stage2Result::from_body(&body)?;
        debug!("radiko auth2 succeeded");
        Ok(stage2)
    }
}
