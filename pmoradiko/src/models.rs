//! Data models for radiko API responses
//!
//! radiko answers in XML; these structures deserialize through
//! `quick-xml`'s serde support (`@name` fields are attributes).

use crate::error::Result;
use crate::time;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Stations (v3/station/list)
// ============================================================================

/// Stations broadcasting in an area
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stations {
    #[serde(rename = "@area_id", default)]
    pub area_id: String,
    #[serde(rename = "@area_name", default)]
    pub area_name: String,
    #[serde(rename = "station", default)]
    pub stations: Vec<Station>,
}

/// A radiko station
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    /// Station id (e.g., "TBS", "QRR")
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ascii_name: String,
    #[serde(default)]
    pub ruby: String,
    #[serde(default)]
    pub areafree: u8,
    #[serde(default)]
    pub timefree: u8,
    #[serde(rename = "logo", default)]
    pub logos: Vec<Logo>,
    #[serde(default)]
    pub banner: String,
    #[serde(default)]
    pub href: String,
}

impl Station {
    /// Listenable outside its broadcast area (premium)
    pub fn is_areafree(&self) -> bool {
        self.areafree != 0
    }

    /// Past programs available through timeshift playlists
    pub fn is_timefree(&self) -> bool {
        self.timefree != 0
    }

    /// Logo with the largest surface
    pub fn largest_logo(&self) -> Option<&Logo> {
        self.logos
            .iter()
            .max_by_key(|logo| u64::from(logo.width) * u64::from(logo.height))
    }
}

/// Station logo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logo {
    #[serde(rename = "@width", default)]
    pub width: u32,
    #[serde(rename = "@height", default)]
    pub height: u32,
    #[serde(rename = "$text", default)]
    pub url: String,
}

// ============================================================================
// Programs (v3/program/...)
// ============================================================================

/// Program listings for one or more stations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramSchedule {
    /// Seconds the listing stays valid
    #[serde(default)]
    pub ttl: u64,
    /// Server time (Unix seconds)
    #[serde(default)]
    pub srvtime: i64,
    #[serde(default)]
    pub stations: ScheduleStations,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleStations {
    #[serde(rename = "station", default)]
    pub items: Vec<StationSchedule>,
}

impl ProgramSchedule {
    pub fn stations(&self) -> &[StationSchedule] {
        &self.stations.items
    }

    /// Schedule of one station
    pub fn station(&self, id: &str) -> Option<&StationSchedule> {
        self.stations.items.iter().find(|station| station.id == id)
    }

    /// Recommended delay before fetching the listing again
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

/// Programs of one station, grouped by broadcast day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StationSchedule {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "progs", default)]
    pub days: Vec<ProgramDay>,
}

impl StationSchedule {
    /// All programs in broadcast order
    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.days.iter().flat_map(|day| day.programs.iter())
    }

    /// Program starting exactly at `ft` (`YYYYMMDDhhmmss`)
    pub fn program_starting_at(&self, ft: &str) -> Option<&Program> {
        self.programs().find(|program| program.ft == ft)
    }
}

/// Programs of a broadcast day (`date` is empty for "now" listings)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramDay {
    #[serde(default)]
    pub date: String,
    #[serde(rename = "prog", default)]
    pub programs: Vec<Program>,
}

/// A program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Program {
    #[serde(rename = "@id", default)]
    pub id: String,
    /// Start, `YYYYMMDDhhmmss` in Asia/Tokyo
    #[serde(rename = "@ft")]
    pub ft: String,
    /// End, `YYYYMMDDhhmmss` in Asia/Tokyo
    #[serde(rename = "@to")]
    pub to: String,
    /// Start, `hhmm`
    #[serde(rename = "@ftl", default)]
    pub ftl: String,
    /// End, `hhmm`
    #[serde(rename = "@tol", default)]
    pub tol: String,
    /// Duration in seconds
    #[serde(rename = "@dur", default)]
    pub dur: u32,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub info: String,
    /// Performers
    #[serde(default)]
    pub pfm: String,
    #[serde(default)]
    pub img: String,
}

impl Program {
    pub fn start(&self) -> Result<DateTime<FixedOffset>> {
        time::parse_datetime(&self.ft)
    }

    pub fn end(&self) -> Result<DateTime<FixedOffset>> {
        time::parse_datetime(&self.to)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.dur))
    }
}

// ============================================================================
// Streams (v2/station/stream_smh_multi)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct StreamUrls {
    #[serde(rename = "url", default)]
    pub urls: Vec<StreamUrl>,
}

/// A playlist endpoint for a station's live or timeshift stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamUrl {
    #[serde(rename = "@areafree", default)]
    pub areafree: u8,
    #[serde(rename = "@timefree", default)]
    pub timefree: u8,
    pub playlist_create_url: String,
}

impl StreamUrl {
    pub fn is_areafree(&self) -> bool {
        self.areafree != 0
    }

    pub fn is_timefree(&self) -> bool {
        self.timefree != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<stations area_id="JP13" area_name="TOKYO JAPAN">
  <station>
    <id>TBS</id>
    <name>TBSラジオ</name>
    <ascii_name>TBS RADIO</ascii_name>
    <ruby>てぃーびーえすらじお</ruby>
    <areafree>1</areafree>
    <timefree>1</timefree>
    <logo width="224" height="100" align="center">https://radiko.jp/v2/static/station/logo/TBS/224x100.png</logo>
    <logo width="448" height="200" align="center">https://radiko.jp/v2/static/station/logo/TBS/448x200.png</logo>
    <banner>https://radiko.jp/res/banner/TBS/banner.png</banner>
    <href>https://www.tbsradio.jp/</href>
  </station>
  <station>
    <id>QRR</id>
    <name>文化放送</name>
    <areafree>0</areafree>
    <timefree>1</timefree>
  </station>
</stations>"#;

    const PROGRAMS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<radiko>
  <ttl>1800</ttl>
  <srvtime>1706731815</srvtime>
  <stations>
    <station id="TBS">
      <name>TBSラジオ</name>
      <progs>
        <date>20240201</date>
        <prog id="1001" master_id="" ft="20240201050000" to="20240201063000" ftl="0500" tol="0630" dur="5400">
          <title>Morning Show</title>
          <url>https://www.tbsradio.jp/morning/</url>
          <desc></desc>
          <info>&lt;p&gt;news&lt;/p&gt;</info>
          <pfm>Host A</pfm>
          <img>https://radiko.jp/res/program/morning.jpg</img>
        </prog>
        <prog id="1002" master_id="" ft="20240201063000" to="20240201083000" ftl="0630" tol="0830" dur="7200">
          <title>News</title>
          <url/>
          <desc/>
          <info/>
          <pfm/>
          <img/>
        </prog>
      </progs>
    </station>
  </stations>
</radiko>"#;

    const STREAM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urls>
  <url areafree="0" max_delay="100" timefree="0">
    <playlist_create_url>https://si-f-radiko.smartstream.ne.jp/so/playlist.m3u8</playlist_create_url>
  </url>
  <url areafree="1" max_delay="100" timefree="1">
    <playlist_create_url>https://radiko.jp/v2/api/ts/playlist.m3u8</playlist_create_url>
  </url>
</urls>"#;

    #[test]
    fn test_parse_stations() {
        let stations: Stations = quick_xml::de::from_str(STATIONS_XML).unwrap();

        assert_eq!(stations.area_id, "JP13");
        assert_eq!(stations.area_name, "TOKYO JAPAN");
        assert_eq!(stations.stations.len(), 2);

        let tbs = &stations.stations[0];
        assert_eq!(tbs.id, "TBS");
        assert_eq!(tbs.ascii_name, "TBS RADIO");
        assert!(tbs.is_areafree());
        assert!(tbs.is_timefree());
        assert_eq!(tbs.logos.len(), 2);
        assert_eq!(tbs.largest_logo().unwrap().width, 448);

        let qrr = &stations.stations[1];
        assert!(!qrr.is_areafree());
        assert!(qrr.logos.is_empty());
        assert!(qrr.href.is_empty());
    }

    #[test]
    fn test_parse_programs() {
        let schedule: ProgramSchedule = quick_xml::de::from_str(PROGRAMS_XML).unwrap();

        assert_eq!(schedule.ttl, 1800);
        assert_eq!(schedule.refresh_delay(), Duration::from_secs(1800));

        let tbs = schedule.station("TBS").unwrap();
        assert_eq!(tbs.name, "TBSラジオ");
        assert_eq!(tbs.days.len(), 1);
        assert_eq!(tbs.days[0].date, "20240201");

        let programs: Vec<_> = tbs.programs().collect();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].title, "Morning Show");
        assert_eq!(programs[0].info, "<p>news</p>");
        assert_eq!(programs[0].duration(), Duration::from_secs(5400));
        assert!(programs[1].url.is_empty());

        let news = tbs.program_starting_at("20240201063000").unwrap();
        assert_eq!(news.id, "1002");
        assert_eq!(time::datetime(&news.start().unwrap()), "20240201063000");
        assert_eq!(time::datetime(&news.end().unwrap()), "20240201083000");

        assert!(schedule.station("QRR").is_none());
    }

    #[test]
    fn test_parse_stream_urls() {
        let urls: StreamUrls = quick_xml::de::from_str(STREAM_XML).unwrap();

        assert_eq!(urls.urls.len(), 2);
        assert!(!urls.urls[0].is_timefree());
        assert!(urls.urls[1].is_areafree());
        assert_eq!(
            urls.urls[1].playlist_create_url,
            "https://radiko.jp/v2/api/ts/playlist.m3u8"
        );
    }
}
