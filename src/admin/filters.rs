//! Change-list filters for book instances

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use super::ModelAdmin;
use crate::{
    error::{AppError, AppResult},
    models::LoanStatus,
};

/// Query parameters that are never treated as filters
const RESERVED_PARAMS: &[&str] = &["page"];

/// Date drill-down choices for `due_back`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBackFilter {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

/// SQL-ready form of a date filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// `from <= date < until`
    Between(NaiveDate, NaiveDate),
    IsNull,
    NotNull,
}

impl DueBackFilter {
    pub fn range(&self, today: NaiveDate) -> DateRange {
        let tomorrow = today + Duration::days(1);
        match self {
            DueBackFilter::Today => DateRange::Between(today, tomorrow),
            DueBackFilter::Past7Days => DateRange::Between(today - Duration::days(7), tomorrow),
            DueBackFilter::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let next = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
                };
                DateRange::Between(first, next.unwrap_or(tomorrow))
            }
            DueBackFilter::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(tomorrow);
                DateRange::Between(first, next)
            }
            DueBackFilter::NoDate => DateRange::IsNull,
            DueBackFilter::HasDate => DateRange::NotNull,
        }
    }
}

impl std::str::FromStr for DueBackFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DueBackFilter::Today),
            "past_7_days" => Ok(DueBackFilter::Past7Days),
            "this_month" => Ok(DueBackFilter::ThisMonth),
            "this_year" => Ok(DueBackFilter::ThisYear),
            "no_date" => Ok(DueBackFilter::NoDate),
            "has_date" => Ok(DueBackFilter::HasDate),
            _ => Err(AppError::BadRequest(format!("Unknown due_back filter: {}", s))),
        }
    }
}

/// Active filters on the book instance change list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    pub status: Option<LoanStatus>,
    pub due_back: Option<DueBackFilter>,
    pub borrower: Option<i32>,
}

/// Reject any query parameter the model does not declare in `list_filter`
pub fn check_params(admin: &ModelAdmin, params: &HashMap<String, String>) -> AppResult<()> {
    for key in params.keys() {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        if !admin.has_filter(key) {
            return Err(AppError::BadRequest(format!(
                "{} cannot be filtered by {}",
                admin.verbose_name_plural, key
            )));
        }
    }
    Ok(())
}

/// Build the instance filter from already checked query parameters
pub fn instance_filter(params: &HashMap<String, String>) -> AppResult<InstanceFilter> {
    let status = params
        .get("status")
        .map(|s| s.parse::<LoanStatus>().map_err(AppError::BadRequest))
        .transpose()?;
    let due_back = params.get("due_back").map(|s| s.parse()).transpose()?;
    let borrower = params
        .get("borrower")
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| AppError::BadRequest(format!("Invalid borrower id: {}", s)))
        })
        .transpose()?;

    Ok(InstanceFilter { status, due_back, borrower })
}
