use chrono::{DateTime, Datelike as _, Days, FixedOffset, NaiveDate, Utc, Weekday};

/// Calendar day an instant falls on, normalized to UTC
pub fn utc_date(time: &DateTime<FixedOffset>) -> NaiveDate {
    time.with_timezone(&Utc).date_naive()
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every Monday to Friday between `start` and `end`, both inclusive
pub fn business_days(mut start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();

    while start <= end {
        if is_business_day(start) {
            days.push(start);
        }

        let Some(next) = start.checked_add_days(Days::new(1)) else {
            break;
        };
        start = next;
    }

    days
}

/// Length of an inclusive date span, 0 when `end` precedes `start`
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// Number of days shared by two inclusive date spans
pub fn overlapping_days(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> i64 {
    inclusive_days(a.0.max(b.0), a.1.min(b.1))
}
