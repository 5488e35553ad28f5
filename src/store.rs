use crate::aggregate::{malformed_answer_keys, AttendancePolicy};
use crate::error::{PersistenceError, StoreError};
use crate::event::{self, Answers, Event, EventDetails, Response};
use crate::participant::{Grade, Role, Roster, User};
use crate::select::{analyze_all, analyze_with, Analysis};
use crate::slot::{canonical_slots, TimeSlot};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Blob holding every event.
pub const EVENTS_BLOB: &str = "events";
/// Blob holding every registered user.
pub const USERS_BLOB: &str = "allUsers";

/// Key-value storage of named JSON blobs.
pub trait BlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, name: &str, blob: &str) -> Result<(), PersistenceError>;
}

impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), PersistenceError> {
        (**self).set(name, blob)
    }
}

#[derive(Default, Debug)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| PersistenceError::Backend("blob map lock poisoned".to_string()))?;
        Ok(blobs.get(name).cloned())
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), PersistenceError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| PersistenceError::Backend("blob map lock poisoned".to_string()))?;
        blobs.insert(name.to_string(), blob.to_string());
        Ok(())
    }
}

/// One `<name>.json` file per blob inside `dir`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> FileBlobStore {
        FileBlobStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path(name)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes beside the target and renames over it, so readers never see
    /// half a blob.
    fn set(&self, name: &str, blob: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path(name);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, blob)?;
        fs::rename(&staging, &path)?;

        Ok(())
    }
}

/// Everything the application keeps durably.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub events: Vec<Event>,
    pub users: Vec<User>,
}

/// A partial save. Fields left `None` are not touched in storage; fields
/// present overwrite the stored collection in full.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub events: Option<Vec<Event>>,
    pub users: Option<Vec<User>>,
}

/// Durable storage contract of the application state.
///
/// The single-record writes re-read what is stored right before writing,
/// so a caller holding an old snapshot only overwrites the record it names.
pub trait Persistence {
    fn load_state(&self) -> Result<State, PersistenceError>;
    fn save_state(&self, patch: &StatePatch) -> Result<(), PersistenceError>;

    fn load_events(&self) -> Result<Vec<Event>, PersistenceError> {
        Ok(self.load_state()?.events)
    }

    fn load_users(&self) -> Result<Vec<User>, PersistenceError> {
        Ok(self.load_state()?.users)
    }

    /// Appends a new event, or replaces a stored one with the same id.
    fn insert_event(&self, event: &Event) -> Result<(), PersistenceError> {
        let mut events = self.load_events()?;
        match events.iter_mut().find(|stored| stored.id == event.id) {
            Some(stored) => *stored = event.clone(),
            None => events.push(event.clone()),
        }

        save_events(self, events)
    }

    /// Writes the editable fields of `event` over the stored event with the
    /// same id. The stored responses are kept, not the ones in `event`.
    /// Returns the event as now stored, or `None` when it no longer exists.
    fn replace_event(&self, event: &Event) -> Result<Option<Event>, PersistenceError> {
        let mut events = self.load_events()?;

        let merged = match events.iter_mut().find(|stored| stored.id == event.id) {
            Some(stored) => {
                *stored = Event {
                    responses: std::mem::take(&mut stored.responses),
                    ..event.clone()
                };
                stored.clone()
            }
            None => return Ok(None),
        };

        save_events(self, events)?;
        Ok(Some(merged))
    }

    /// Returns `false` when the event was already gone.
    fn remove_event(&self, event_id: &str) -> Result<bool, PersistenceError> {
        let events = self.load_events()?;
        if !events.iter().any(|event| event.id == event_id) {
            return Ok(false);
        }

        save_events(self, event::delete_event(&events, event_id))?;
        Ok(true)
    }

    /// Stores one response into the event as currently persisted.
    /// Returns `false` when the event no longer exists in storage.
    fn upsert_response(&self, event_id: &str, response: &Response) -> Result<bool, PersistenceError> {
        let mut events = self.load_events()?;

        match events.iter_mut().find(|event| event.id == event_id) {
            Some(event) => {
                event
                    .responses
                    .insert(response.visitor_id.clone(), response.clone());
            }
            None => return Ok(false),
        }

        save_events(self, events)?;
        Ok(true)
    }

    /// Replaces the stored user with the same id, or appends it.
    fn upsert_user(&self, user: &User) -> Result<(), PersistenceError> {
        let mut users = self.load_users()?;
        upsert_by_id(&mut users, user.clone());

        self.save_state(&StatePatch {
            events: None,
            users: Some(users),
        })
    }
}

fn save_events<P: Persistence + ?Sized>(persistence: &P, events: Vec<Event>) -> Result<(), PersistenceError> {
    persistence.save_state(&StatePatch {
        events: Some(events),
        users: None,
    })
}

impl<B: BlobStore> Persistence for B {
    fn load_state(&self) -> Result<State, PersistenceError> {
        Ok(State {
            events: self.load_events()?,
            users: self.load_users()?,
        })
    }

    fn load_events(&self) -> Result<Vec<Event>, PersistenceError> {
        load_blob(self, EVENTS_BLOB)
    }

    fn load_users(&self) -> Result<Vec<User>, PersistenceError> {
        load_blob(self, USERS_BLOB)
    }

    fn save_state(&self, patch: &StatePatch) -> Result<(), PersistenceError> {
        if let Some(events) = &patch.events {
            self.set(EVENTS_BLOB, &serde_json::to_string(events)?)?;
        }
        if let Some(users) = &patch.users {
            self.set(USERS_BLOB, &serde_json::to_string(users)?)?;
        }

        Ok(())
    }
}

fn load_blob<B, T>(blobs: &B, name: &str) -> Result<Vec<T>, PersistenceError>
where
    B: BlobStore + ?Sized,
    T: DeserializeOwned,
{
    match blobs.get(name)? {
        Some(blob) => Ok(serde_json::from_str(&blob)?),
        None => Ok(Vec::new()),
    }
}

fn upsert_by_id(users: &mut Vec<User>, user: User) {
    match users.iter_mut().find(|existing| existing.id == user.id) {
        Some(existing) => *existing = user,
        None => users.push(user),
    }
}

/// The events and users of the application, held in memory and written
/// through to a [`Persistence`] backend.
///
/// When a write fails the in-memory change is kept and the error returned;
/// nothing is retried.
pub struct Store<P: Persistence> {
    backend: P,
    events: Vec<Event>,
    users: Vec<User>,
    time_slots: Vec<TimeSlot>,
    policy: AttendancePolicy,
}

impl<P: Persistence> Store<P> {
    /// An empty store that has not read from `backend`.
    pub fn new(backend: P) -> Store<P> {
        Store {
            backend,
            events: Vec::new(),
            users: Vec::new(),
            time_slots: canonical_slots(),
            policy: AttendancePolicy::default(),
        }
    }

    /// Loads the current state from `backend`.
    pub fn open(backend: P) -> Result<Store<P>, StoreError> {
        let mut store = Store::new(backend);
        store.reload()?;
        Ok(store)
    }

    /// Slots offered by events created from now on.
    pub fn with_time_slots(mut self, time_slots: Vec<TimeSlot>) -> Store<P> {
        self.time_slots = time_slots;
        self
    }

    pub fn with_policy(mut self, policy: AttendancePolicy) -> Store<P> {
        self.policy = policy;
        self
    }

    /// Replaces the in-memory state with what is durably stored.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let state = self.backend.load_state()?;

        for event in &state.events {
            for (user_id, error) in malformed_answer_keys(event) {
                warn!("Event {}: answer from {} ignored: {}", event.id, user_id, error);
            }
        }

        debug!(
            "Loaded {} events and {} users",
            state.events.len(),
            state.users.len()
        );
        self.events = state.events;
        self.users = state.users;
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == event_id)
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == user_id)
    }

    pub fn roster(&self) -> Roster<'_> {
        Roster::from_users(&self.users)
    }

    pub fn backend(&self) -> &P {
        &self.backend
    }

    fn require_user(&self, user_id: &str) -> Result<&User, StoreError> {
        self.user(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }

    fn require_event_index(&self, event_id: &str) -> Result<usize, StoreError> {
        self.events
            .iter()
            .position(|event| event.id == event_id)
            .ok_or_else(|| StoreError::EventNotFound(event_id.to_string()))
    }

    fn persisted(&self, result: Result<(), PersistenceError>) -> Result<(), StoreError> {
        result.map_err(|e| self.save_failed(e))
    }

    fn save_failed(&self, error: PersistenceError) -> StoreError {
        warn!("Save failed, keeping local state only: {}", error);
        StoreError::Persistence(error)
    }

    /// Inserts or replaces `user` by id.
    pub fn save_user(&mut self, user: User) -> Result<(), StoreError> {
        upsert_by_id(&mut self.users, user.clone());
        self.persisted(self.backend.upsert_user(&user))
    }

    pub fn register(&mut self, name: &str, role: Role, grade: Option<Grade>) -> Result<User, StoreError> {
        let user = User::register(name, role, grade)?;
        self.save_user(user.clone())?;
        Ok(user)
    }

    /// Edits a profile in place. Responses already submitted keep the old
    /// name, role and grade.
    pub fn edit_profile(
        &mut self,
        user_id: &str,
        name: &str,
        role: Role,
        grade: Option<Grade>,
    ) -> Result<User, StoreError> {
        let user = self.require_user(user_id)?.edit_profile(name, role, grade)?;
        self.save_user(user.clone())?;
        Ok(user)
    }

    pub fn create_event(&mut self, details: EventDetails, creator_id: &str) -> Result<Event, StoreError> {
        let creator = self.require_user(creator_id)?;
        let event = Event::create(details, self.time_slots.clone(), creator)?;

        self.events.push(event.clone());
        self.persisted(self.backend.insert_event(&event))?;
        Ok(event)
    }

    /// Edits the event. The returned event carries the responses as stored,
    /// which may include answers this store has not seen yet.
    ///
    /// # Errors
    /// `EventNotFound` when the event was deleted from storage by another
    /// writer. The edit is then only kept in memory.
    pub fn update_event(&mut self, event_id: &str, patch: EventDetails) -> Result<Event, StoreError> {
        let index = self.require_event_index(event_id)?;
        let event = self.events[index].update(patch)?;
        self.events[index] = event.clone();

        match self.backend.replace_event(&event) {
            Ok(Some(stored)) => {
                self.events[index] = stored.clone();
                Ok(stored)
            }
            Ok(None) => Err(self.gone_from_storage(event_id)),
            Err(e) => Err(self.save_failed(e)),
        }
    }

    /// Removes the event and its responses. Unknown ids are a no-op.
    pub fn delete_event(&mut self, event_id: &str) -> Result<(), StoreError> {
        if self.event(event_id).is_none() {
            return Ok(());
        }

        self.events = event::delete_event(&self.events, event_id);
        info!("Deleted event {}", event_id);
        self.persisted(self.backend.remove_event(event_id).map(|_| ()))
    }

    /// Records `user_id`'s answers on the event, replacing any earlier ones.
    /// The user's current profile is frozen into the response.
    ///
    /// # Errors
    /// `EventNotFound` when the event was deleted from storage by another
    /// writer. The response is then only kept in memory.
    pub fn submit_response(
        &mut self,
        event_id: &str,
        user_id: &str,
        answers: Answers,
        comment: &str,
    ) -> Result<Event, StoreError> {
        let responder = self.require_user(user_id)?.responder();
        let index = self.require_event_index(event_id)?;

        let event = self.events[index].submit_response(user_id, responder, answers, comment);
        self.events[index] = event.clone();

        let response = &event.responses[user_id];
        match self.backend.upsert_response(event_id, response) {
            Ok(true) => Ok(event),
            Ok(false) => Err(self.gone_from_storage(event_id)),
            Err(e) => Err(self.save_failed(e)),
        }
    }

    fn gone_from_storage(&self, event_id: &str) -> StoreError {
        warn!("Event {} is gone from storage, keeping local state only", event_id);
        StoreError::EventNotFound(event_id.to_string())
    }

    pub fn analyze(&self, event_id: &str) -> Option<Analysis> {
        self.event(event_id)
            .map(|event| analyze_with(event, &self.policy))
    }

    pub fn analyze_all(&self) -> Vec<Analysis> {
        analyze_all(&self.events, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot;
    use chrono::NaiveDate;

    struct ReadOnly(MemoryBlobStore);

    impl BlobStore for ReadOnly {
        fn get(&self, name: &str) -> Result<Option<String>, PersistenceError> {
            self.0.get(name)
        }

        fn set(&self, _: &str, _: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Backend("read only".to_string()))
        }
    }

    fn details(name: &str) -> EventDetails {
        EventDetails {
            name: name.to_string(),
            target_grades: [Grade::B4].into_iter().collect(),
            candidate_dates: vec![NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()],
            deadline: None,
        }
    }

    fn nine_am() -> String {
        slot::encode(
            NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            TimeSlot::new(9, 0).unwrap(),
        )
    }

    #[test]
    fn partial_save_leaves_other_blob_alone() {
        let backend = MemoryBlobStore::default();
        let user = User::with_id("1", "Sato", Role::Teacher, None).unwrap();

        backend
            .save_state(&StatePatch {
                events: None,
                users: Some(vec![user.clone()]),
            })
            .unwrap();
        backend
            .save_state(&StatePatch {
                events: Some(vec![]),
                users: None,
            })
            .unwrap();

        let state = backend.load_state().unwrap();
        assert_eq!(state.users, vec![user]);
        assert!(state.events.is_empty());
    }

    #[test]
    fn empty_backend_loads_empty_state() {
        let store = Store::open(MemoryBlobStore::default()).unwrap();
        assert!(store.events().is_empty());
        assert!(store.users().is_empty());
    }

    #[test]
    fn store_round_trips_through_backend() {
        let backend = Arc::new(MemoryBlobStore::default());
        let mut store = Store::open(backend.clone()).unwrap();

        let teacher = store.register("Sato", Role::Teacher, None).unwrap();
        let event = store.create_event(details("Kickoff"), &teacher.id).unwrap();

        let reopened = Store::open(backend).unwrap();
        assert_eq!(reopened.users(), store.users());
        assert_eq!(reopened.event(&event.id), Some(&event));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut store = Store::new(MemoryBlobStore::default());

        assert!(matches!(
            store.create_event(details("x"), "nobody"),
            Err(StoreError::UserNotFound(_))
        ));

        let teacher = store.register("Sato", Role::Teacher, None).unwrap();
        assert!(matches!(
            store.submit_response("missing", &teacher.id, Answers::new(), ""),
            Err(StoreError::EventNotFound(_))
        ));
        assert!(store.delete_event("missing").is_ok());
    }

    #[test]
    fn profile_edit_does_not_rewrite_responses() {
        let mut store = Store::new(MemoryBlobStore::default());
        let teacher = store.register("Sato", Role::Teacher, None).unwrap();
        let student = store.register("Ito", Role::Student, Some(Grade::B4)).unwrap();
        let event = store.create_event(details("Review"), &teacher.id).unwrap();

        store
            .submit_response(&event.id, &student.id, Answers::new(), "")
            .unwrap();
        store
            .edit_profile(&student.id, "Ito K.", Role::Student, Some(Grade::M1))
            .unwrap();

        let response = &store.event(&event.id).unwrap().responses[&student.id];
        assert_eq!(response.responder.user_name, "Ito");
        assert_eq!(response.responder.user_grade, Some(Grade::B4));
        assert_eq!(store.user(&student.id).unwrap().name, "Ito K.");
        assert_eq!(store.users().len(), 2);
    }

    #[test]
    fn respondents_on_stale_snapshots_do_not_drop_each_other() {
        let backend = Arc::new(MemoryBlobStore::default());
        let mut setup = Store::open(backend.clone()).unwrap();
        let teacher = setup.register("Sato", Role::Teacher, None).unwrap();
        let student = setup.register("Ito", Role::Student, Some(Grade::B4)).unwrap();
        let event = setup.create_event(details("Retreat"), &teacher.id).unwrap();

        let mut first = Store::open(backend.clone()).unwrap();
        let mut second = Store::open(backend.clone()).unwrap();

        let answers: Answers = [(nine_am(), true)].into_iter().collect();
        first
            .submit_response(&event.id, &teacher.id, answers.clone(), "")
            .unwrap();
        second
            .submit_response(&event.id, &student.id, answers, "")
            .unwrap();

        let stored = Store::open(backend).unwrap();
        let responses = &stored.event(&event.id).unwrap().responses;
        assert_eq!(responses.len(), 2);
        assert!(responses.contains_key(&teacher.id));
        assert!(responses.contains_key(&student.id));
    }

    #[test]
    fn stale_event_writes_keep_stored_responses() {
        let backend = Arc::new(MemoryBlobStore::default());
        let mut setup = Store::open(backend.clone()).unwrap();
        let teacher = setup.register("Sato", Role::Teacher, None).unwrap();
        let student = setup.register("Ito", Role::Student, Some(Grade::B4)).unwrap();
        let event = setup.create_event(details("Retreat"), &teacher.id).unwrap();
        let other = setup.create_event(details("Party"), &teacher.id).unwrap();

        let mut editor = Store::open(backend.clone()).unwrap();
        let mut creator = Store::open(backend.clone()).unwrap();
        let mut deleter = Store::open(backend.clone()).unwrap();
        let mut respondent = Store::open(backend.clone()).unwrap();

        let answers: Answers = [(nine_am(), true)].into_iter().collect();
        respondent
            .submit_response(&event.id, &student.id, answers, "")
            .unwrap();

        let edited = editor
            .update_event(&event.id, details("Retreat, moved"))
            .unwrap();
        assert!(edited.responses.contains_key(&student.id));
        assert_eq!(editor.event(&event.id), Some(&edited));

        creator.create_event(details("Workshop"), &teacher.id).unwrap();
        deleter.delete_event(&other.id).unwrap();

        let stored = Store::open(backend).unwrap();
        let retreat = stored.event(&event.id).unwrap();
        assert_eq!(retreat.name, "Retreat, moved");
        assert_eq!(retreat.responses.len(), 1);
        assert!(retreat.responses.contains_key(&student.id));
        assert!(stored.event(&other.id).is_none());
        assert_eq!(stored.events().len(), 2);
    }

    #[test]
    fn writes_to_an_event_deleted_elsewhere_are_reported() {
        let backend = Arc::new(MemoryBlobStore::default());
        let mut setup = Store::open(backend.clone()).unwrap();
        let teacher = setup.register("Sato", Role::Teacher, None).unwrap();
        let event = setup.create_event(details("Retreat"), &teacher.id).unwrap();

        let mut late = Store::open(backend.clone()).unwrap();
        let mut deleter = Store::open(backend.clone()).unwrap();
        deleter.delete_event(&event.id).unwrap();

        let answers: Answers = [(nine_am(), true)].into_iter().collect();
        assert!(matches!(
            late.submit_response(&event.id, &teacher.id, answers, ""),
            Err(StoreError::EventNotFound(_))
        ));
        assert!(late.event(&event.id).unwrap().has_responded(&teacher.id));

        assert!(matches!(
            late.update_event(&event.id, details("Retreat, moved")),
            Err(StoreError::EventNotFound(_))
        ));
        assert_eq!(late.event(&event.id).unwrap().name, "Retreat, moved");

        assert!(Store::open(backend).unwrap().events().is_empty());
    }

    #[test]
    fn corrupt_events_do_not_block_users() {
        let backend = MemoryBlobStore::default();
        backend.set(EVENTS_BLOB, "{not json").unwrap();

        let mut store = Store::new(backend);
        let teacher = store.register("Sato", Role::Teacher, None).unwrap();
        store
            .edit_profile(&teacher.id, "Sato T.", Role::Teacher, None)
            .unwrap();

        let users = store.backend().load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Sato T.");
    }

    #[test]
    fn failed_save_keeps_local_change() {
        let mut store = Store::new(ReadOnly(MemoryBlobStore::default()));

        let result = store.register("Sato", Role::Teacher, None);
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(store.users().len(), 1);
    }

    #[test]
    fn analysis_uses_store_policy() {
        let mut store = Store::new(MemoryBlobStore::default())
            .with_policy(AttendancePolicy { student_quorum: 0.5 })
            .with_time_slots(vec![TimeSlot::new(9, 0).unwrap()]);

        let teacher = store.register("Sato", Role::Teacher, None).unwrap();
        let a = store.register("Ito", Role::Student, Some(Grade::B4)).unwrap();
        let b = store.register("Abe", Role::Student, Some(Grade::B4)).unwrap();
        let event = store.create_event(details("Lab"), &teacher.id).unwrap();

        let answers: Answers = [(nine_am(), true)].into_iter().collect();
        store.submit_response(&event.id, &a.id, answers, "").unwrap();
        store.submit_response(&event.id, &b.id, Answers::new(), "").unwrap();

        let analysis = store.analyze(&event.id).unwrap();
        assert_eq!(analysis.aggregation.all_results.len(), 1);
        assert_eq!(analysis.aggregation.valid_dates.len(), 1);
        assert!(analysis.recommendation.is_decided());
        assert_eq!(store.analyze_all().len(), 1);
    }

    #[test]
    fn file_backend_persists_named_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBlobStore::new(dir.path().join("data"));

        assert_eq!(backend.get(EVENTS_BLOB).unwrap(), None);

        let mut store = Store::open(backend.clone()).unwrap();
        let teacher = store.register("Sato", Role::Teacher, None).unwrap();
        store.create_event(details("Offsite"), &teacher.id).unwrap();

        assert!(dir.path().join("data/events.json").exists());
        assert!(dir.path().join("data/allUsers.json").exists());

        let reopened = Store::open(backend).unwrap();
        assert_eq!(reopened.events().len(), 1);
        assert_eq!(reopened.events()[0].name, "Offsite");
    }

    #[test]
    fn corrupt_blob_is_a_load_error() {
        let backend = MemoryBlobStore::default();
        backend.set(EVENTS_BLOB, "{not json").unwrap();

        assert!(matches!(
            Store::open(backend),
            Err(StoreError::Persistence(PersistenceError::Serialization(_)))
        ));
    }
}
