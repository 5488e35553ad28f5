use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

const WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

fn weekday(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
}

/// `"{month}/{day}({weekday})"` with the Japanese short weekday name.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use chousei_libs::format::format_date;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(format_date(date), "1/15(月)");
/// ```
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}({})", date.month(), date.day(), weekday(date))
}

/// Column header of the answer grid: the day and its weekday, rendered
/// on two lines.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DateLabel {
    pub day: String,
    pub weekday: &'static str,
}

pub fn format_date_short(date: NaiveDate) -> DateLabel {
    DateLabel {
        day: format!("{}/{}", date.month(), date.day()),
        weekday: weekday(date),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineInfo {
    pub text: String,
    pub is_past: bool,
}

/// Renders a deadline as `"{month}/{day} {hour}:{minute:02}"` and whether it
/// has passed at `now`. Not stored: recompute on every render.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use chousei_libs::format::format_deadline_at;
///
/// let deadline = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 5, 0).unwrap();
/// let before = deadline - chrono::Duration::minutes(1);
///
/// let info = format_deadline_at(Some(deadline), before).unwrap();
/// assert_eq!(info.text, "6/1 9:05");
/// assert!(!info.is_past);
/// assert!(format_deadline_at(None, before).is_none());
/// ```
pub fn format_deadline_at(deadline: Option<NaiveDateTime>, now: NaiveDateTime) -> Option<DeadlineInfo> {
    deadline.map(|deadline| DeadlineInfo {
        text: format!(
            "{}/{} {}:{:02}",
            deadline.month(),
            deadline.day(),
            deadline.hour(),
            deadline.minute()
        ),
        is_past: deadline < now,
    })
}

/// [`format_deadline_at`] against the local wall clock.
pub fn format_deadline(deadline: Option<NaiveDateTime>) -> Option<DeadlineInfo> {
    format_deadline_at(deadline, Local::now().naive_local())
}

/// How many teachers can make a slot, as shown on answer grid cells.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TeacherPresence {
    None,
    One,
    Two,
    Full,
}

impl TeacherPresence {
    /// Three or more teachers all show the full badge.
    pub fn from_count(count: usize) -> TeacherPresence {
        match count {
            0 => TeacherPresence::None,
            1 => TeacherPresence::One,
            2 => TeacherPresence::Two,
            _ => TeacherPresence::Full,
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            TeacherPresence::None => "",
            TeacherPresence::One => "👨‍🏫¹",
            TeacherPresence::Two => "👨‍🏫²",
            TeacherPresence::Full => "👨‍🏫³",
        }
    }
}
