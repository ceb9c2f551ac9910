//! The note collection store.
//!
//! `NoteStore` owns the notes and the profile for a session. Every mutation
//! updates memory first and then writes the whole affected record through
//! the persistence adapter. If that write fails the in-memory state stays
//! authoritative and the error is handed back to the caller.

use std::fmt;

use log::{debug, info, warn};

use crate::{
    backup, view, Clock, IdGenerator, ImportSummary, KeyValueStore, Note, NoteChanges,
    NoteStorage, NotepadError, ProfileChanges, Result, SortOption, StoreEvent, SystemClock,
    UserProfile, UuidGenerator,
};

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Authoritative in-memory state of notes and profile.
pub struct NoteStore<K: KeyValueStore> {
    storage: NoteStorage<K>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,

    notes: Vec<Note>,
    profile: UserProfile,

    search_query: String,
    sort_option: SortOption,

    revision: u64,
    notes_unsaved: bool,
    profile_unsaved: bool,
    listeners: Vec<Listener>,
}

impl<K: KeyValueStore> fmt::Debug for NoteStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteStore")
            .field("notes", &self.notes.len())
            .field("profile", &self.profile)
            .field("search_query", &self.search_query)
            .field("sort_option", &self.sort_option)
            .field("revision", &self.revision)
            .field("unsaved", &self.has_unsaved_changes())
            .finish()
    }
}

impl<K: KeyValueStore> NoteStore<K> {
    /// Loads the store using the system clock and random ids.
    pub fn load(storage: NoteStorage<K>) -> Self {
        Self::load_with(storage, Box::new(SystemClock::new()), Box::new(UuidGenerator))
    }

    /// Loads the persisted state with explicit capabilities.
    ///
    /// Missing, unreadable or corrupt records fall back to an empty
    /// collection and the default profile. This never fails.
    pub fn load_with(
        storage: NoteStorage<K>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        let notes = match storage.load_notes() {
            Ok(Some(mut notes)) => {
                for note in notes.iter_mut() {
                    if note.normalize_timestamps() {
                        warn!("Stored note {} was modified before it was created, clamping", note.id);
                    }
                }
                notes
            }
            Ok(None) => {
                debug!("No stored notes, starting with an empty collection");
                Vec::new()
            }
            Err(e) => {
                warn!("Discarding unreadable notes record: {}", e);
                Vec::new()
            }
        };

        let profile = match storage.load_profile() {
            Ok(Some(profile)) => profile.normalized(),
            Ok(None) => UserProfile::default(),
            Err(e) => {
                warn!("Discarding unreadable profile record: {}", e);
                UserProfile::default()
            }
        };

        info!("Loaded {} notes for profile '{}'", notes.len(), profile.name);

        Self {
            storage,
            clock,
            ids,
            notes,
            profile,
            search_query: String::new(),
            sort_option: SortOption::default(),
            revision: 0,
            notes_unsaved: false,
            profile_unsaved: false,
            listeners: Vec::new(),
        }
    }

    /// Sets the initial sort option, e.g. from configuration.
    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort_option = sort;
        self
    }


    /// The collection in storage order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// First note with the given id.
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort_option(&self) -> SortOption {
        self.sort_option
    }

    /// The projected view for the current search query and sort option.
    pub fn view(&self) -> Vec<&Note> {
        view::project(&self.notes, &self.search_query, self.sort_option)
    }

    /// The projected view for an explicit query and sort option.
    pub fn project(&self, query: &str, sort: SortOption) -> Vec<&Note> {
        view::project(&self.notes, query, sort)
    }

    /// Incremented after every state change; lets callers poll for updates.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the last write to durable storage failed.
    pub fn has_unsaved_changes(&self) -> bool {
        self.notes_unsaved || self.profile_unsaved
    }

    /// Registers a callback invoked after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }


    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.notify(StoreEvent::ViewChanged);
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort_option = sort;
        self.notify(StoreEvent::ViewChanged);
    }


    /// Creates an empty note at the front of the collection and returns its id.
    ///
    /// If persisting fails the note still exists in memory.
    pub fn create(&mut self) -> Result<String> {
        let id = self.ids.next_id();
        let now = self.clock.now_millis();
        self.notes.insert(0, Note::new(id.clone(), now));
        info!("Created note {}", id);

        let flushed = self.persist_notes();
        self.notify(StoreEvent::Created { id: id.clone() });
        flushed.map(|_| id)
    }

    /// Applies `changes` to the note and refreshes `lastModified`.
    ///
    /// `lastModified` is refreshed even when `changes` is empty. `id` and
    /// `createdAt` are never touched.
    pub fn update(&mut self, id: &str, changes: NoteChanges) -> Result<()> {
        let now = self.clock.now_millis();
        let mut found = false;

        for note in self.notes.iter_mut().filter(|note| note.id == id) {
            found = true;
            if let Some(title) = &changes.title {
                note.title = title.clone();
            }
            if let Some(content) = &changes.content {
                note.content = content.clone();
            }
            if let Some(pinned) = changes.is_pinned {
                note.is_pinned = pinned;
            }
            if let Some(color) = changes.color {
                note.color = color;
            }
            note.last_modified = now.max(note.last_modified);
        }

        if !found {
            debug!("Cannot update note {}: not found", id);
            return Err(NotepadError::NotFound { id: id.to_string() });
        }

        info!("Updated note {}", id);
        let flushed = self.persist_notes();
        self.notify(StoreEvent::Updated { id: id.to_string() });
        flushed
    }

    /// Removes the note. Returns `false` if there was nothing to remove.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);

        if self.notes.len() == before {
            debug!("Nothing to delete for {}", id);
            return Ok(false);
        }

        info!("Deleted note {}", id);
        let flushed = self.persist_notes();
        self.notify(StoreEvent::Deleted { id: id.to_string() });
        flushed.map(|_| true)
    }

    /// Flips the pin flag and returns the new state.
    ///
    /// Pinning is not an edit: `lastModified` is left alone.
    pub fn toggle_pin(&mut self, id: &str) -> Result<bool> {
        let mut pinned = None;
        for note in self.notes.iter_mut().filter(|note| note.id == id) {
            note.is_pinned = !note.is_pinned;
            pinned = Some(note.is_pinned);
        }

        let pinned = pinned.ok_or_else(|| NotepadError::NotFound { id: id.to_string() })?;
        info!("Note {} is now {}", id, if pinned { "pinned" } else { "unpinned" });

        let flushed = self.persist_notes();
        self.notify(StoreEvent::PinToggled {
            id: id.to_string(),
            pinned,
        });
        flushed.map(|_| pinned)
    }

    /// Empties the collection and resets the profile.
    ///
    /// Irreversible. Callers must confirm with the user first.
    pub fn clear_all(&mut self) -> Result<()> {
        warn!("Clearing {} notes and resetting the profile", self.notes.len());
        self.notes.clear();
        self.profile = UserProfile::default();

        let notes_flushed = self.persist_notes();
        let profile_flushed = self.persist_profile();
        self.notify(StoreEvent::Cleared);
        notes_flushed.and(profile_flushed)
    }

    /// Merges `changes` into the profile.
    pub fn set_profile(&mut self, changes: ProfileChanges) -> Result<()> {
        if let Some(name) = changes.name {
            self.profile.name = name;
        }
        if let Some(avatar) = changes.avatar {
            self.profile.avatar = avatar;
        }
        self.profile = std::mem::take(&mut self.profile).normalized();
        info!("Profile updated for '{}'", self.profile.name);

        let flushed = self.persist_profile();
        self.notify(StoreEvent::ProfileChanged);
        flushed
    }


    /// Serializes every note into a backup document.
    pub fn export(&self) -> Result<String> {
        backup::export_document(&self.notes)
    }

    /// Prepends every note of `document` to the collection.
    ///
    /// Ids are not de-duplicated: importing the same backup twice yields
    /// duplicates. A document that fails to parse leaves the collection
    /// untouched.
    pub fn import(&mut self, document: &str) -> Result<ImportSummary> {
        let mut imported = backup::parse_document(document)?;
        let count = imported.len();

        imported.append(&mut self.notes);
        self.notes = imported;
        info!("Imported {} notes, collection now holds {}", count, self.notes.len());

        let flushed = self.persist_notes();
        self.notify(StoreEvent::Imported { count });
        flushed.map(|_| ImportSummary {
            imported: count,
            total: self.notes.len(),
        })
    }

    /// Writes both records again, e.g. after a failed write.
    pub fn flush(&mut self) -> Result<()> {
        self.persist_notes().and(self.persist_profile())
    }

    fn persist_notes(&mut self) -> Result<()> {
        let result = self.storage.save_notes(&self.notes);
        self.notes_unsaved = result.is_err();
        result
    }

    fn persist_profile(&mut self) -> Result<()> {
        let result = self.storage.save_profile(&self.profile);
        self.profile_unsaved = result.is_err();
        result
    }

    fn notify(&mut self, event: StoreEvent) {
        self.revision += 1;
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{ManualClock, MemoryKeyValueStore, SequentialIds, NOTES_KEY, PROFILE_KEY};

    fn store() -> (NoteStore<MemoryKeyValueStore>, MemoryKeyValueStore, ManualClock) {
        let kv = MemoryKeyValueStore::new();
        let clock = ManualClock::starting_at(1_000);
        let store = NoteStore::load_with(
            NoteStorage::new(kv.clone()),
            Box::new(clock.clone()),
            Box::new(SequentialIds::new()),
        );
        (store, kv, clock)
    }

    #[test]
    fn create_inserts_at_front_and_persists() {
        let (mut store, kv, clock) = store();
        let first = store.create().unwrap();
        clock.advance(10);
        let second = store.create().unwrap();

        assert_eq!(store.notes()[0].id, second);
        assert_eq!(store.notes()[1].id, first);
        let note = store.get(&second).unwrap();
        assert_eq!(note.created_at, 1_010);
        assert_eq!(note.last_modified, 1_010);

        let persisted: Vec<Note> = serde_json::from_str(&kv.raw(NOTES_KEY).unwrap()).unwrap();
        assert_eq!(persisted, store.notes());
    }

    #[test]
    fn update_refreshes_last_modified_only() {
        let (mut store, _kv, clock) = store();
        let id = store.create().unwrap();
        clock.advance(500);

        store
            .update(&id, NoteChanges::default().title("Groceries").content("milk"))
            .unwrap();

        let note = store.get(&id).unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.created_at, 1_000);
        assert_eq!(note.last_modified, 1_500);
    }

    #[test]
    fn update_never_moves_last_modified_backwards() {
        let (mut store, _kv, clock) = store();
        let id = store.create().unwrap();
        clock.set(10);
        store.update(&id, NoteChanges::default()).unwrap();
        assert_eq!(store.get(&id).unwrap().last_modified, 1_000);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (mut store, _kv, _clock) = store();
        let revision = store.revision();
        let err = store.update("missing", NoteChanges::default().title("x")).unwrap_err();
        assert!(matches!(err, NotepadError::NotFound { .. }));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn toggle_pin_keeps_last_modified() {
        let (mut store, _kv, clock) = store();
        let id = store.create().unwrap();
        clock.advance(1_000);

        assert!(store.toggle_pin(&id).unwrap());
        assert!(!store.toggle_pin(&id).unwrap());
        assert_eq!(store.get(&id).unwrap().last_modified, 1_000);
        assert!(matches!(
            store.toggle_pin("missing"),
            Err(NotepadError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_is_a_no_op_for_unknown_ids() {
        let (mut store, _kv, _clock) = store();
        let id = store.create().unwrap();
        assert!(!store.delete("missing").unwrap());
        assert!(store.delete(&id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn clear_all_resets_notes_and_profile() {
        let (mut store, kv, _clock) = store();
        store.create().unwrap();
        store
            .set_profile(ProfileChanges {
                name: Some("Ada".to_string()),
                avatar: Some(Some("data:image/png;base64,AAAA".to_string())),
            })
            .unwrap();

        store.clear_all().unwrap();

        assert!(store.is_empty());
        assert_eq!(store.profile(), &UserProfile::default());
        assert_eq!(kv.raw(NOTES_KEY).as_deref(), Some("[]"));
        assert_eq!(
            kv.raw(PROFILE_KEY).as_deref(),
            Some(r#"{"name":"Guest","avatar":null}"#)
        );
    }

    #[test]
    fn blank_profile_name_falls_back_to_guest() {
        let (mut store, _kv, _clock) = store();
        store
            .set_profile(ProfileChanges {
                name: Some("  ".to_string()),
                avatar: None,
            })
            .unwrap();
        assert_eq!(store.profile().name, "Guest");
    }

    #[test]
    fn profile_name_is_stored_as_given() {
        let (mut store, _kv, _clock) = store();
        store
            .set_profile(ProfileChanges {
                name: Some("  Bob  ".to_string()),
                avatar: None,
            })
            .unwrap();
        assert_eq!(store.profile().name, "  Bob  ");
    }

    #[test]
    fn name_only_change_keeps_the_avatar() {
        let (mut store, kv, _clock) = store();
        store
            .set_profile(ProfileChanges {
                name: Some("Ada".to_string()),
                avatar: Some(Some("data:image/png;base64,AAAA".to_string())),
            })
            .unwrap();
        store
            .set_profile(ProfileChanges {
                name: Some("Grace".to_string()),
                avatar: None,
            })
            .unwrap();

        assert_eq!(
            store.profile().avatar.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(
            kv.raw(PROFILE_KEY).unwrap(),
            r#"{"name":"Grace","avatar":"data:image/png;base64,AAAA"}"#
        );
    }

    #[test]
    fn clearing_the_avatar_keeps_the_name() {
        let (mut store, kv, _clock) = store();
        store
            .set_profile(ProfileChanges {
                name: Some("Ada".to_string()),
                avatar: Some(Some("data:image/png;base64,AAAA".to_string())),
            })
            .unwrap();
        store
            .set_profile(ProfileChanges {
                name: None,
                avatar: Some(None),
            })
            .unwrap();

        assert_eq!(store.profile().name, "Ada");
        assert_eq!(store.profile().avatar, None);
        assert_eq!(kv.raw(PROFILE_KEY).unwrap(), r#"{"name":"Ada","avatar":null}"#);
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let (mut store, kv, _clock) = store();
        let kept = store.create().unwrap();
        kv.fail_writes(true);

        let err = store.create().unwrap_err();
        assert!(matches!(err, NotepadError::PersistenceWriteFailure { .. }));
        assert_eq!(store.len(), 2);
        assert!(store.has_unsaved_changes());

        kv.fail_writes(false);
        store.flush().unwrap();
        assert!(!store.has_unsaved_changes());
        let persisted: Vec<Note> = serde_json::from_str(&kv.raw(NOTES_KEY).unwrap()).unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[1].id, kept);
    }

    #[test]
    fn subscribers_see_every_change() {
        let (mut store, _kv, _clock) = store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let id = store.create().unwrap();
        store.toggle_pin(&id).unwrap();
        store.set_sort(SortOption::AlphabeticalTitle);

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::Created { id: id.clone() },
                StoreEvent::PinToggled { id, pinned: true },
                StoreEvent::ViewChanged,
            ]
        );
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn view_uses_current_search_and_sort() {
        let (mut store, _kv, _clock) = store();
        let a = store.create().unwrap();
        store.update(&a, NoteChanges::default().title("b note")).unwrap();
        let b = store.create().unwrap();
        store.update(&b, NoteChanges::default().title("a note")).unwrap();

        store.set_sort(SortOption::AlphabeticalTitle);
        let titles: Vec<&str> = store.view().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["a note", "b note"]);

        store.set_search("B NOTE");
        assert_eq!(store.view().len(), 1);
        assert_eq!(store.notes().len(), 2);
    }
}
