use crate::aggregate::{aggregate_with, AttendancePolicy, Aggregation, SlotTally};
use crate::event::Event;
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// The two headline slots of an event. Both are `None` until some slot
/// meets the quorum.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub most_participants: Option<SlotTally>,
    pub earliest: Option<SlotTally>,
}

impl Recommendation {
    pub fn is_decided(&self) -> bool {
        self.most_participants.is_some()
    }
}

/// Aggregation and recommendation together, as the event views consume them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Analysis {
    #[serde(flatten)]
    pub aggregation: Aggregation,
    #[serde(flatten)]
    pub recommendation: Recommendation,
}

/// Reduces an aggregation to its headline slots.
pub fn select(aggregation: &Aggregation) -> Recommendation {
    Recommendation {
        most_participants: most_participants(&aggregation.valid_dates).cloned(),
        earliest: earliest(&aggregation.valid_dates).cloned(),
    }
}

/// The slot with the highest `total_available`.
///
/// Ties go to the slot met first in candidate order, even when a later
/// candidate date is earlier on the calendar.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use chousei_libs::aggregate::SlotTally;
/// use chousei_libs::select::most_participants;
/// use chousei_libs::slot::{encode, TimeSlot};
///
/// let tally = |day: u32, total: usize| {
///     let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
///     let slot = TimeSlot::new(10, 0).unwrap();
///     SlotTally {
///         date,
///         slot,
///         key: encode(date, slot),
///         available_teachers: 0,
///         available_students: total,
///         total_target_students: total,
///         student_ratio: 1.0,
///         meets_criteria: true,
///         total_available: total,
///     }
/// };
///
/// let valid = vec![tally(9, 2), tally(8, 2), tally(7, 1)];
/// assert_eq!(most_participants(&valid).unwrap().date.to_string(), "2024-03-09");
/// assert!(most_participants(&[]).is_none());
/// ```
pub fn most_participants(valid: &[SlotTally]) -> Option<&SlotTally> {
    valid.iter().reduce(|best, candidate| {
        if candidate.total_available > best.total_available {
            candidate
        } else {
            best
        }
    })
}

/// The slot starting first on the calendar. Equal instants keep the one
/// met first.
pub fn earliest(valid: &[SlotTally]) -> Option<&SlotTally> {
    valid.iter().reduce(|first, candidate| {
        if candidate.starts_at() < first.starts_at() {
            candidate
        } else {
            first
        }
    })
}

pub fn analyze(event: &Event) -> Analysis {
    analyze_with(event, &AttendancePolicy::default())
}

pub fn analyze_with(event: &Event, policy: &AttendancePolicy) -> Analysis {
    let aggregation = aggregate_with(event, policy);
    let recommendation = select(&aggregation);

    if let Some(best) = &recommendation.most_participants {
        debug!(
            "Event {}: best slot {} with {} available",
            event.id, best.key, best.total_available
        );
    }

    Analysis {
        aggregation,
        recommendation,
    }
}

/// Analyses a whole event list, in list order.
#[cfg(feature = "rayon")]
pub fn analyze_all(events: &[Event], policy: &AttendancePolicy) -> Vec<Analysis> {
    events
        .par_iter()
        .map(|event| analyze_with(event, policy))
        .collect()
}

/// Analyses a whole event list, in list order.
#[cfg(not(feature = "rayon"))]
pub fn analyze_all(events: &[Event], policy: &AttendancePolicy) -> Vec<Analysis> {
    events
        .iter()
        .map(|event| analyze_with(event, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{encode, TimeSlot};
    use chrono::NaiveDate;

    fn tally(date: (i32, u32, u32), time: (u32, u32), total: usize) -> SlotTally {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        let slot = TimeSlot::new(time.0, time.1).unwrap();
        SlotTally {
            date,
            slot,
            key: encode(date, slot),
            available_teachers: 0,
            available_students: total,
            total_target_students: total,
            student_ratio: 1.0,
            meets_criteria: true,
            total_available: total,
        }
    }

    #[test]
    fn first_maximum_wins_over_clock_time() {
        let valid = vec![
            tally((2024, 3, 1), (15, 0), 1),
            tally((2024, 3, 1), (16, 0), 4),
            tally((2024, 3, 1), (9, 0), 4),
        ];

        let best = most_participants(&valid).unwrap();
        assert_eq!(best.slot, TimeSlot::new(16, 0).unwrap());
    }

    #[test]
    fn earliest_compares_date_then_time() {
        let valid = vec![
            tally((2024, 3, 2), (9, 0), 1),
            tally((2024, 3, 1), (17, 30), 1),
            tally((2024, 3, 1), (18, 0), 9),
        ];

        let first = earliest(&valid).unwrap();
        assert_eq!(first.key, "2024-03-01_17:30");
    }

    #[test]
    fn equal_instants_keep_the_first() {
        let mut a = tally((2024, 3, 1), (9, 0), 1);
        let mut b = a.clone();
        a.available_teachers = 1;
        b.available_teachers = 2;
        let valid = vec![a, b];

        assert_eq!(earliest(&valid).unwrap().available_teachers, 1);
    }

    #[test]
    fn nothing_valid_nothing_selected() {
        let aggregation = Aggregation {
            all_results: vec![],
            valid_dates: vec![],
            teacher_count: 3,
            student_count: 0,
        };

        let recommendation = select(&aggregation);
        assert_eq!(recommendation, Recommendation::default());
        assert!(!recommendation.is_decided());
    }
}
