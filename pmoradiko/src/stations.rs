//! Area and station endpoints

use crate::client::{api_path, ApiVersion, Params, RadikoClient};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::models::Stations;
use regex::Regex;
use reqwest::Method;
use tracing::debug;

impl RadikoClient {
    /// Area id (e.g., "JP13") radiko assigns to the caller's IP address
    ///
    /// The `area` endpoint answers with a JavaScript snippet such as
    /// `document.write('<span class="JP13">TOKYO JAPAN</span>');`.
    pub async fn area_id(&self, ctx: &RequestContext) -> Result<String> {
        let body = self
            .fetch_text(ctx, Method::GET, "area", &Params::new())
            .await?;

        let area_id = extract_area_id(&body)?;
        debug!(%area_id, "Resolved radiko area");
        Ok(area_id)
    }

    /// Stations of an area
    pub async fn get_stations(&self, ctx: &RequestContext, area_id: &str) -> Result<Stations> {
        let path = api_path(ApiVersion::V3, &format!("station/list/{}.xml", area_id));
        self.fetch_xml(ctx, &path, &Params::new()).await
    }
}

fn extract_area_id(body: &str) -> Result<String> {
    let re = Regex::new(r#"class="(JP\d+)""#)?;

    re.captures(body)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::decode(format!("no area id in {:?}", body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_area_id() {
        let body = r#"document.write('<span class="JP13">TOKYO JAPAN</span>');"#;
        assert_eq!(extract_area_id(body).unwrap(), "JP13");
    }

    #[test]
    fn test_extract_area_id_outside_japan() {
        let body = r#"document.write('<span class="OUT">OUT</span>');"#;
        assert!(matches!(extract_area_id(body), Err(Error::Decode(_))));
    }
}
