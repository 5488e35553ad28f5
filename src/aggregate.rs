use crate::error::MalformedKeyError;
use crate::event::{Event, Response};
use crate::participant::Role;
use crate::slot::{self, TimeSlot};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pass/fail gate for a slot. Only students are gated; teacher turnout is
/// reported but never required.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct AttendancePolicy {
    /// Share of in-target student respondents that must be available.
    pub student_quorum: f64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        AttendancePolicy {
            student_quorum: 0.8,
        }
    }
}

/// Turnout for one (date, slot) pair of an event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotTally {
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub key: String,
    pub available_teachers: usize,
    pub available_students: usize,
    pub total_target_students: usize,
    pub student_ratio: f64,
    pub meets_criteria: bool,
    pub total_available: usize,
}

impl SlotTally {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.slot.on(self.date)
    }
}

/// Per-slot turnout of an event, recomputed from the full response map.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// Every slot, date-major in candidate order.
    pub all_results: Vec<SlotTally>,
    /// The slots meeting the student quorum, same order.
    pub valid_dates: Vec<SlotTally>,
    pub teacher_count: usize,
    pub student_count: usize,
}

impl Aggregation {
    /// Slot key -> number of available teachers, for annotating input cells.
    pub fn teacher_counts(&self) -> HashMap<&str, usize> {
        self.all_results
            .iter()
            .map(|tally| (tally.key.as_str(), tally.available_teachers))
            .collect()
    }

    pub fn tally(&self, key: &str) -> Option<&SlotTally> {
        self.all_results.iter().find(|tally| tally.key == key)
    }
}

/// Aggregates `event` under the default 80% student quorum.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use chousei_libs::aggregate::aggregate;
/// use chousei_libs::event::{answer_all, Event, EventDetails};
/// use chousei_libs::participant::{Grade, Role, User};
/// use chousei_libs::slot::canonical_slots;
///
/// let teacher = User::register("Sato", Role::Teacher, None).unwrap();
/// let student = User::register("Ito", Role::Student, Some(Grade::B4)).unwrap();
///
/// let event = Event::create(
///     EventDetails {
///         name: "Thesis review".to_string(),
///         target_grades: [Grade::B4].into_iter().collect(),
///         candidate_dates: vec![NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()],
///         deadline: None,
///     },
///     canonical_slots(),
///     &teacher,
/// )
/// .unwrap();
///
/// let event = event.submit_response(&student.id, student.responder(), answer_all(&event, true), "");
///
/// let result = aggregate(&event);
/// assert_eq!(result.all_results.len(), 19);
/// assert_eq!(result.valid_dates.len(), 19);
/// assert_eq!(result.teacher_count, 0);
/// assert_eq!(result.student_count, 1);
/// ```
pub fn aggregate(event: &Event) -> Aggregation {
    aggregate_with(event, &AttendancePolicy::default())
}

/// Aggregates `event` under `policy`.
///
/// Teachers are every teacher respondent. Students only count when their
/// declared grade is one of the event's target grades; others are ignored
/// entirely. With no in-target students the ratio is 0, so no slot
/// qualifies however many teachers are free.
pub fn aggregate_with(event: &Event, policy: &AttendancePolicy) -> Aggregation {
    let (teachers, students) = partition(event);

    let all_results: Vec<SlotTally> = event
        .slots()
        .map(|(date, slot)| {
            let key = slot::encode(date, slot);
            let available_teachers = count_available(&teachers, &key);
            let available_students = count_available(&students, &key);

            let student_ratio = if students.is_empty() {
                0.0
            } else {
                available_students as f64 / students.len() as f64
            };
            let meets_criteria = student_ratio >= policy.student_quorum;

            trace!(
                "{}: {} teachers, {}/{} students",
                key,
                available_teachers,
                available_students,
                students.len()
            );

            SlotTally {
                date,
                slot,
                key,
                available_teachers,
                available_students,
                total_target_students: students.len(),
                student_ratio,
                meets_criteria,
                total_available: available_teachers + available_students,
            }
        })
        .collect();

    let valid_dates: Vec<SlotTally> = all_results
        .iter()
        .filter(|tally| tally.meets_criteria)
        .cloned()
        .collect();

    debug!(
        "Event {}: {} teachers, {} target students, {}/{} slots meet the quorum",
        event.id,
        teachers.len(),
        students.len(),
        valid_dates.len(),
        all_results.len()
    );

    Aggregation {
        all_results,
        valid_dates,
        teacher_count: teachers.len(),
        student_count: students.len(),
    }
}

fn partition(event: &Event) -> (Vec<&Response>, Vec<&Response>) {
    let mut teachers = Vec::new();
    let mut students = Vec::new();

    for response in event.responses.values() {
        match (response.responder.user_role, response.responder.user_grade) {
            (Role::Teacher, _) => teachers.push(response),
            (Role::Student, Some(grade)) if event.target_grades.contains(&grade) => {
                students.push(response)
            }
            (Role::Student, _) => {}
        }
    }

    (teachers, students)
}

fn count_available(respondents: &[&Response], key: &str) -> usize {
    respondents
        .iter()
        .filter(|response| response.is_available(key))
        .count()
}

/// Answer keys in `event` that the codec cannot read back, with the id of
/// the respondent holding them. Such keys never match a slot and are inert
/// in aggregation.
pub fn malformed_answer_keys(event: &Event) -> Vec<(&str, MalformedKeyError)> {
    event
        .responses
        .iter()
        .flat_map(|(user_id, response)| {
            response
                .answers
                .keys()
                .filter_map(move |key| slot::decode(key).err().map(|e| (user_id.as_str(), e)))
        })
        .collect()
}
