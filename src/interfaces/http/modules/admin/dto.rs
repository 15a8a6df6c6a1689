//! Admin DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{GenerationReport, ResetReport};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateDayRequest {
    pub date: NaiveDate,
}

/// Both dates inclusive
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateRangeRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthParams {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationReportDto {
    pub created: usize,
    pub days_generated: u32,
    /// Closed weekdays and holidays
    pub days_skipped: u32,
}

impl From<GenerationReport> for GenerationReportDto {
    fn from(r: GenerationReport) -> Self {
        Self {
            created: r.created,
            days_generated: r.days_generated,
            days_skipped: r.days_skipped,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanReportDto {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetReportDto {
    pub deleted: u64,
    pub generation: GenerationReportDto,
}

impl From<ResetReport> for ResetReportDto {
    fn from(r: ResetReport) -> Self {
        Self {
            deleted: r.deleted,
            generation: r.generation.into(),
        }
    }
}
