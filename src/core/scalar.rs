//! Purpose: Canonical text forms and fresh "zero" values for well-known scalars.
//! Exports: `parse_uuid`, `parse_date`, `parse_datetime`, `parse_time`, `format_*`, `now_*`, `new_uuid`.
//! Role: The only place that knows how identifiers, dates, datetimes, and times look on the wire.
//! Invariants: Formatting output always parses back to an equal value.
//! Invariants: Clock reads use UTC; defaults are not idempotent across calls.
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

use crate::core::error::{Error, ErrorKind};

pub fn parse_uuid(text: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(text).map_err(|err| parse_error("UUID", text).with_source(err))
}

pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|err| parse_error("date", text).with_source(err))
}

/// Accepts `T` or space separators and an optional fraction; offset-bearing
/// RFC 3339 text is normalized to UTC.
pub fn parse_datetime(text: &str) -> Result<PrimitiveDateTime, Error> {
    let attempts = [
        PrimitiveDateTime::parse(
            text,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        ),
        PrimitiveDateTime::parse(text, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")),
        PrimitiveDateTime::parse(
            text,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        ),
        PrimitiveDateTime::parse(text, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")),
    ];
    let mut last_err = None;
    for attempt in attempts {
        match attempt {
            Ok(parsed) => return Ok(parsed),
            Err(err) => last_err = Some(err),
        }
    }
    if let Ok(offset) = OffsetDateTime::parse(text, &Rfc3339) {
        let utc = offset.to_offset(UtcOffset::UTC);
        return Ok(PrimitiveDateTime::new(utc.date(), utc.time()));
    }
    let err = parse_error("datetime", text);
    Err(match last_err {
        Some(source) => err.with_source(source),
        None => err,
    })
}

pub fn parse_time(text: &str) -> Result<Time, Error> {
    Time::parse(text, format_description!("[hour]:[minute]:[second].[subsecond]"))
        .or_else(|_| Time::parse(text, format_description!("[hour]:[minute]:[second]")))
        .map_err(|err| parse_error("time", text).with_source(err))
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_datetime(dt: PrimitiveDateTime) -> String {
    let formatted = if dt.nanosecond() == 0 {
        dt.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
    } else {
        dt.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"))
    };
    formatted.unwrap_or_else(|_| dt.to_string())
}

pub fn format_time(t: Time) -> String {
    let formatted = if t.nanosecond() == 0 {
        t.format(format_description!("[hour]:[minute]:[second]"))
    } else {
        t.format(format_description!("[hour]:[minute]:[second].[subsecond]"))
    };
    formatted.unwrap_or_else(|_| t.to_string())
}

pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}

pub fn now_datetime() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub fn now_date() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn now_time() -> Time {
    OffsetDateTime::now_utc().time()
}

fn parse_error(kind: &str, text: &str) -> Error {
    Error::new(ErrorKind::Parse).with_message(format!("invalid {kind} text {text:?}"))
}
