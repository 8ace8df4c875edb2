//! Stream endpoints

use crate::client::{api_path, ApiVersion, Params, RadikoClient};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::models::{StreamUrl, StreamUrls};
use crate::time;
use chrono::{DateTime, TimeZone};
use reqwest::Method;
use tracing::debug;

/// Chunk length (seconds) requested for timeshift playlists
pub const TIMESHIFT_CHUNK_SECS: u32 = 15;

impl RadikoClient {
    /// Playlist endpoints of a station's streams
    pub async fn get_stream_urls(
        &self,
        ctx: &RequestContext,
        station_id: &str,
    ) -> Result<Vec<StreamUrl>> {
        let path = api_path(
            ApiVersion::V2,
            &format!("station/stream_smh_multi/{}.xml", station_id),
        );
        let urls: StreamUrls = self.fetch_xml(ctx, &path, &Params::new()).await?;
        Ok(urls.urls)
    }

    /// URI of the chunklist for a past program (timefree)
    ///
    /// Requires an authorized client: the request carries the auth token.
    pub async fn timeshift_playlist_m3u8<Tz: TimeZone>(
        &self,
        ctx: &RequestContext,
        station_id: &str,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> Result<String> {
        let params = Params::authenticated()
            .query("station_id", station_id)
            .query("l", TIMESHIFT_CHUNK_SECS.to_string())
            .query("ft", time::datetime(start))
            .query("to", time::datetime(end));

        let path = api_path(ApiVersion::V2, "api/ts/playlist.m3u8");
        let body = self.fetch_text(ctx, Method::POST, &path, &params).await?;

        let uri = first_playlist_uri(&body)?;
        debug!(station_id, %uri, "Resolved timeshift chunklist");
        Ok(uri)
    }
}

/// First URI line of an M3U8 playlist
fn first_playlist_uri(playlist: &str) -> Result<String> {
    playlist
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .ok_or_else(|| Error::decode("playlist has no media URI"))
}
