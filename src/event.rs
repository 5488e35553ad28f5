use crate::error::{RangeError, ValidationError};
use crate::id;
use crate::participant::{Grade, Responder, Role, User};
use crate::slot::{self, TimeSlot};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Slot key -> "I can attend". A missing key means unavailable.
pub type Answers = BTreeMap<String, bool>;

/// A scheduling poll: candidate dates crossed with time slots, and one
/// response per member.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub target_grades: BTreeSet<Grade>,
    pub candidate_dates: Vec<NaiveDate>,
    pub time_slots: Vec<TimeSlot>,
    #[serde(default, with = "deadline_format")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// One member's answer to an event. Keyed by `visitor_id` inside the event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub visitor_id: String,
    #[serde(flatten)]
    pub responder: Responder,
    #[serde(default, deserialize_with = "lenient_answers")]
    pub answers: Answers,
    #[serde(default)]
    pub comment: String,
}

impl Response {
    /// Only an explicit `true` counts.
    pub fn is_available(&self, key: &str) -> bool {
        self.answers.get(key).copied().unwrap_or(false)
    }
}

/// The editable part of an event. Used both to create and to patch one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDetails {
    pub name: String,
    pub target_grades: BTreeSet<Grade>,
    pub candidate_dates: Vec<NaiveDate>,
    pub deadline: Option<NaiveDateTime>,
}

impl EventDetails {
    /// Trims the name and drops repeated candidate dates, keeping the
    /// creator's order.
    fn validated(self) -> Result<EventDetails, ValidationError> {
        let name = self.name.trim().to_string();

        if name.is_empty() {
            Err(ValidationError::EmptyName)
        } else if self.target_grades.is_empty() {
            Err(ValidationError::NoTargetGrades)
        } else if self.candidate_dates.is_empty() {
            Err(ValidationError::NoCandidateDates)
        } else {
            Ok(EventDetails {
                name,
                candidate_dates: self.candidate_dates.into_iter().unique().collect(),
                ..self
            })
        }
    }
}

impl Event {
    /// Creates an event with no responses yet.
    ///
    /// # Errors
    /// `ValidationError` if the name, the target grades or the candidate
    /// dates are empty.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use chousei_libs::event::{Event, EventDetails};
    /// use chousei_libs::participant::{Grade, Role, User};
    /// use chousei_libs::slot::canonical_slots;
    ///
    /// let creator = User::register("Sato", Role::Teacher, None).unwrap();
    /// let details = EventDetails {
    ///     name: "Lab meeting".to_string(),
    ///     target_grades: [Grade::B4].into_iter().collect(),
    ///     candidate_dates: vec![NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()],
    ///     deadline: None,
    /// };
    ///
    /// let event = Event::create(details, canonical_slots(), &creator).unwrap();
    /// assert!(event.responses.is_empty());
    /// assert_eq!(event.created_by_name, "Sato");
    /// ```
    pub fn create(
        details: EventDetails,
        time_slots: Vec<TimeSlot>,
        creator: &User,
    ) -> Result<Event, ValidationError> {
        let details = details.validated()?;

        let event = Event {
            id: id::next_id(),
            name: details.name,
            target_grades: details.target_grades,
            candidate_dates: details.candidate_dates,
            time_slots,
            deadline: details.deadline,
            responses: BTreeMap::new(),
            created_by: creator.id.clone(),
            created_by_name: creator.name.clone(),
            created_at: Utc::now(),
        };

        info!(
            "Created event `{}` ({}) with {} candidate slots",
            event.name,
            event.id,
            event.slot_count()
        );
        Ok(event)
    }

    /// Replaces the editable fields. Responses, id and creator are untouched,
    /// including answers for dates that are no longer candidates.
    pub fn update(&self, patch: EventDetails) -> Result<Event, ValidationError> {
        let patch = patch.validated()?;

        info!("Updated event `{}` ({})", patch.name, self.id);
        Ok(Event {
            name: patch.name,
            target_grades: patch.target_grades,
            candidate_dates: patch.candidate_dates,
            deadline: patch.deadline,
            ..self.clone()
        })
    }

    /// Stores `user_id`'s answers, replacing any earlier response wholesale.
    /// Keys left out of `answers` are unavailable even if they were
    /// checked in a previous submission.
    pub fn submit_response(
        &self,
        user_id: &str,
        responder: Responder,
        answers: Answers,
        comment: &str,
    ) -> Event {
        let mut event = self.clone();
        let replaced = event
            .responses
            .insert(
                user_id.to_string(),
                Response {
                    visitor_id: user_id.to_string(),
                    responder,
                    answers,
                    comment: comment.to_string(),
                },
            )
            .is_some();

        info!(
            "{} response from {} on event {}",
            if replaced { "Replaced" } else { "Recorded" },
            user_id,
            event.id
        );
        event
    }

    /// Every (date, slot) pair, date-major in the order the creator gave.
    pub fn slots(&self) -> impl Iterator<Item = (NaiveDate, TimeSlot)> + '_ {
        self.candidate_dates
            .iter()
            .copied()
            .cartesian_product(self.time_slots.iter().copied())
    }

    pub fn slot_count(&self) -> usize {
        self.candidate_dates.len() * self.time_slots.len()
    }

    /// Whether `user` is asked to answer: every teacher, and students of a
    /// targeted grade.
    pub fn is_target(&self, user: &User) -> bool {
        match (user.role, user.grade) {
            (Role::Teacher, _) => true,
            (Role::Student, Some(grade)) => self.target_grades.contains(&grade),
            (Role::Student, None) => false,
        }
    }

    pub fn has_responded(&self, user_id: &str) -> bool {
        self.responses.contains_key(user_id)
    }

    pub fn response_count(&self) -> usize {
        self.responses.len()
    }
}

/// Removes the event with `event_id`. Absent ids are not an error.
pub fn delete_event(events: &[Event], event_id: &str) -> Vec<Event> {
    let remaining: Vec<Event> = events
        .iter()
        .filter(|event| event.id != event_id)
        .cloned()
        .collect();

    debug!(
        "Deleting event {}: {} -> {} events",
        event_id,
        events.len(),
        remaining.len()
    );
    remaining
}

/// Every calendar day from `start` to `end`, both included.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use chousei_libs::event::generate_date_range;
///
/// let start = NaiveDate::from_ymd_opt(2023, 12, 30).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
///
/// let days = generate_date_range(start, end).unwrap();
/// assert_eq!(days.len(), 4);
/// assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
///
/// assert!(generate_date_range(end, start).is_err());
/// ```
pub fn generate_date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, RangeError> {
    if start > end {
        return Err(RangeError { start, end });
    }

    Ok(start.iter_days().take_while(|day| *day <= end).collect())
}

/// Sets every key swept by one drag gesture to `value`.
pub fn paint<I, K>(answers: &mut Answers, keys: I, value: bool)
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    answers.extend(keys.into_iter().map(|key| (key.into(), value)));
}

/// Answers for every slot of `event`, all set to `value`.
pub fn answer_all(event: &Event, value: bool) -> Answers {
    event
        .slots()
        .map(|(date, time)| (slot::encode(date, time), value))
        .collect()
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Event {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");

        let date_count = u.int_in_range(1..=7usize)?;
        let mut candidate_dates = Vec::with_capacity(date_count);
        for _ in 0..date_count {
            let offset = u.int_in_range(0..=400u16)?;
            candidate_dates.push(base + chrono::Duration::days(i64::from(offset)));
        }

        let time_slots: Vec<TimeSlot> = slot::canonical_slots()
            .into_iter()
            .filter(|_| u.arbitrary::<bool>().unwrap_or(false))
            .collect();

        let mut target_grades: BTreeSet<Grade> = Grade::ALL
            .iter()
            .copied()
            .filter(|_| u.arbitrary::<bool>().unwrap_or(false))
            .collect();
        if target_grades.is_empty() {
            target_grades.insert(*u.choose(&Grade::ALL)?);
        }

        let mut event = Event {
            id: "fuzz".to_string(),
            name: "fuzz".to_string(),
            target_grades,
            candidate_dates,
            time_slots,
            deadline: None,
            responses: BTreeMap::new(),
            created_by: "fuzz".to_string(),
            created_by_name: "fuzz".to_string(),
            created_at: DateTime::<Utc>::default(),
        };

        let keys: Vec<String> = event.slots().map(|(d, s)| slot::encode(d, s)).collect();
        for n in 0..u.int_in_range(0..=12u8)? {
            let responder = if u.arbitrary()? {
                Responder {
                    user_name: format!("teacher {}", n),
                    user_role: Role::Teacher,
                    user_grade: None,
                }
            } else {
                Responder {
                    user_name: format!("student {}", n),
                    user_role: Role::Student,
                    user_grade: Some(*u.choose(&Grade::ALL)?),
                }
            };

            let mut answers = Answers::new();
            for key in &keys {
                answers.insert(key.clone(), u.arbitrary()?);
            }
            if u.arbitrary()? {
                answers.insert(u.arbitrary::<String>()?, true);
            }

            event = event.submit_response(&n.to_string(), responder, answers, "");
        }

        Ok(event)
    }
}

fn lenient_answers<'de, D>(deserializer: D) -> Result<Answers, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .map(|(key, value)| (key, value == serde_json::Value::Bool(true)))
        .collect())
}

/// Parses a deadline as entered in a `datetime-local` field, with or
/// without seconds.
pub fn parse_deadline(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, deadline_format::FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
}

mod deadline_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(deadline) => serializer.collect_str(&deadline.format(FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;

        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(deadline) => super::parse_deadline(deadline)
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid deadline `{}`: {}", deadline, e))),
        }
    }
}
