//! Program listing endpoints

use crate::client::{api_path, ApiVersion, Params, RadikoClient};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::models::{Program, ProgramSchedule};
use crate::time;
use chrono::{DateTime, TimeZone};

impl RadikoClient {
    /// Programs of every station in an area for the broadcast day of `when`
    ///
    /// The day is taken in Asia/Tokyo, whatever the timezone of `when`.
    pub async fn get_programs_by_date<Tz: TimeZone>(
        &self,
        ctx: &RequestContext,
        area_id: &str,
        when: &DateTime<Tz>,
    ) -> Result<ProgramSchedule> {
        let path = api_path(
            ApiVersion::V3,
            &format!("program/date/{}/{}.xml", time::date(when), area_id),
        );
        self.fetch_xml(ctx, &path, &Params::new()).await
    }

    /// Programs currently on air in an area
    pub async fn get_now_programs(
        &self,
        ctx: &RequestContext,
        area_id: &str,
    ) -> Result<ProgramSchedule> {
        let path = api_path(ApiVersion::V3, &format!("program/now/{}.xml", area_id));
        self.fetch_xml(ctx, &path, &Params::new()).await
    }

    /// The week of programs of a station
    pub async fn get_weekly_programs(
        &self,
        ctx: &RequestContext,
        station_id: &str,
    ) -> Result<ProgramSchedule> {
        let path = api_path(
            ApiVersion::V3,
            &format!("program/station/weekly/{}.xml", station_id),
        );
        self.fetch_xml(ctx, &path, &Params::new()).await
    }

    /// The program of `station_id` starting exactly at `start`
    ///
    /// # Errors
    ///
    /// [`Error::ProgramNotFound`] when no program of the weekly listing
    /// starts at that time.
    pub async fn get_program_by_start_time<Tz: TimeZone>(
        &self,
        ctx: &RequestContext,
        station_id: &str,
        start: &DateTime<Tz>,
    ) -> Result<Program> {
        let ft = time::datetime(start);
        let schedule = self.get_weekly_programs(ctx, station_id).await?;

        schedule
            .station(station_id)
            .and_then(|station| station.program_starting_at(&ft))
            .cloned()
            .ok_or(Error::ProgramNotFound {
                station_id: station_id.to_string(),
                start: ft,
            })
    }
}
