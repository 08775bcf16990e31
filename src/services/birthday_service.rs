use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Reads a stored birth date as a UTC calendar date. Accepts plain dates,
/// RFC 3339 timestamps and SQLite's `YYYY-MM-DD HH:MM:SS`; anything else is
/// treated as no birthday.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

// 29 February falls on 1 March in non-leap years.
fn occurrence_in(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        if month == 2 && day == 29 {
            NaiveDate::from_ymd_opt(year, 3, 1)
        } else {
            None
        }
    })
}

/// Whole days from `today` until the next recurrence of `birth`'s month and
/// day, `0` when the birthday is today.
pub fn days_to_next_birthday_on(birth: NaiveDate, today: NaiveDate) -> Option<i64> {
    let mut next = occurrence_in(today.year(), birth.month(), birth.day())?;
    if next < today {
        next = occurrence_in(today.year() + 1, birth.month(), birth.day())?;
    }
    Some((next - today).num_days())
}

pub fn days_to_next_birthday(birth: NaiveDate) -> Option<i64> {
    days_to_next_birthday_on(birth, today_utc())
}

/// Completed years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(birth)
}

/// API rendering of a birth date. Without `show_age` the year is dropped.
pub fn format_birth_date(birth: NaiveDate, show_age: bool) -> String {
    if show_age {
        birth.format("%Y-%m-%d").to_string()
    } else {
        birth.format("%m-%d").to_string()
    }
}

/// Human label, e.g. `05 Mar 1990` or `05 Mar`.
pub fn birthday_label(birth: NaiveDate, show_age: bool) -> String {
    if show_age {
        birth.format("%d %b %Y").to_string()
    } else {
        birth.format("%d %b").to_string()
    }
}
