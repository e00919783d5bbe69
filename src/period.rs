use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{consts::PERIOD_YEARS, error::ApiError, utils};

/// A (month, year) payroll cycle. Only constructible for real calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
    #[serde(skip)]
    first: NaiveDate,
    #[serde(skip)]
    last: NaiveDate,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, ApiError> {
        if !(1..=12).contains(&month) {
            return Err(ApiError::validation("month must be between 1 and 12"));
        }

        if !(PERIOD_YEARS.0..=PERIOD_YEARS.1).contains(&year) {
            return Err(ApiError::validation(format!("year must be between {} and {}", PERIOD_YEARS.0, PERIOD_YEARS.1)));
        }

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ApiError::validation("invalid period"))?;
        let last = first.checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| ApiError::validation("invalid period"))?;

        Ok(Self { month, year, first, last })
    }

    /// Both parts are required, the error names what is missing
    pub fn from_parts(month: Option<u32>, year: Option<i32>) -> Result<Self, ApiError> {
        match (month, year) {
            (Some(month), Some(year)) => Self::new(month, year),
            (None, _) => Err(ApiError::validation("`month` is required")),
            (_, None) => Err(ApiError::validation("`year` is required")),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// The authoritative denominator for attendance in this period
    pub fn business_days(&self) -> Vec<NaiveDate> {
        utils::business_days(self.first, self.last)
    }
}

/// Query string shape shared by every period-scoped endpoint
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl PeriodQuery {
    pub fn required(&self) -> Result<Period, ApiError> {
        Period::from_parts(self.month, self.year)
    }

    /// `None` when neither part is given, an error when only one is
    pub fn optional(&self) -> Result<Option<Period>, ApiError> {
        match (self.month, self.year) {
            (None, None) => Ok(None),
            (month, year) => Period::from_parts(month, year).map(Some),
        }
    }
}
