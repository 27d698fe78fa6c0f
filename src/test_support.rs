use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dmirror_api::FileRecord;

use crate::config::{self, TryDefault};
use crate::drive::{DriveError, RemoteEntry, RemoteStore};
use crate::notify::{Notifier, NotifyError};
use crate::state::{ArcShared, Shared};

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
struct Stored {
    parent: String,
    entry: RemoteEntry,
    data: Bytes,
}

#[derive(Debug)]
pub struct MemoryStore {
    root: String,
    entries: Mutex<Vec<Stored>>,
    next_id: AtomicUsize,
    mutations: AtomicUsize,
    fail_listing: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryStore {
    pub fn new(root: &str) -> Self {
        MemoryStore {
            root: root.to_owned(),
            entries: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            mutations: AtomicUsize::new(0),
            fail_listing: AtomicBool::new(false),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn next_id(&self) -> String {
        format!("id{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, parent: &str, name: &str, mime_type: &str, modified: &str, data: Bytes) -> String {
        let id = self.next_id();

        self.entries.lock().unwrap().push(Stored {
            parent: parent.to_owned(),
            entry: RemoteEntry {
                id: id.clone(),
                name: name.to_owned(),
                mime_type: mime_type.to_owned(),
                modified_time: modified.to_owned(),
                trashed: false,
            },
            data,
        });

        id
    }

    pub fn add_folder(&self, parent: &str, name: &str, modified: &str) -> String {
        self.insert(parent, name, dmirror_lib::mime::FOLDER, modified, Bytes::new())
    }

    pub fn add_file(&self, parent: &str, name: &str, mime_type: &str, modified: &str, data: &[u8]) -> String {
        self.insert(parent, name, mime_type, modified, Bytes::copy_from_slice(data))
    }

    pub fn set_modified(&self, id: &str, modified: &str) {
        let mut entries = self.entries.lock().unwrap();

        if let Some(found) = entries.iter_mut().find(|s| s.entry.id == id) {
            found.entry.modified_time = modified.to_owned();
        }
    }

    pub fn trash(&self, id: &str) {
        let mut entries = self.entries.lock().unwrap();

        if let Some(found) = entries.iter_mut().find(|s| s.entry.id == id) {
            found.entry.trashed = true;
        }
    }

    pub fn remove(&self, id: &str) {
        self.entries.lock().unwrap().retain(|s| s.entry.id != id);
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::Relaxed);
    }

    fn upload_failure(&self) -> Result<(), DriveError> {
        if self.fail_uploads.load(Ordering::Relaxed) {
            Err(DriveError::Status {
                status: 503,
                body: "upload failed".into(),
            })
        } else {
            Ok(())
        }
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::Relaxed)
    }

    pub fn entry(&self, id: &str) -> Option<RemoteEntry> {
        self.entries.lock().unwrap()
            .iter()
            .find(|s| s.entry.id == id)
            .map(|s| s.entry.clone())
    }

    pub fn data(&self, id: &str) -> Option<Bytes> {
        self.entries.lock().unwrap()
            .iter()
            .find(|s| s.entry.id == id)
            .map(|s| s.data.clone())
    }

    pub fn children_named(&self, parent: &str, name: &str) -> Vec<RemoteEntry> {
        self.entries.lock().unwrap()
            .iter()
            .filter(|s| s.parent == parent && s.entry.name == name)
            .map(|s| s.entry.clone())
            .collect()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>, DriveError> {
        if self.fail_listing.load(Ordering::Relaxed) {
            return Err(DriveError::Status {
                status: 500,
                body: "listing failed".into(),
            });
        }

        Ok(self.entries.lock().unwrap()
            .iter()
            .filter(|s| s.parent == folder_id)
            .map(|s| s.entry.clone())
            .collect())
    }

    async fn get_media(&self, id: &str) -> Result<Bytes, DriveError> {
        self.data(id).ok_or_else(|| DriveError::NotFound(id.to_owned()))
    }

    async fn export(&self, id: &str, _mime_type: &str) -> Result<Bytes, DriveError> {
        self.data(id).ok_or_else(|| DriveError::NotFound(id.to_owned()))
    }

    async fn create_folder(&self, parent: &str, name: &str) -> Result<RemoteEntry, DriveError> {
        self.mutations.fetch_add(1, Ordering::Relaxed);

        let id = self.add_folder(parent, name, &now());

        self.entry(&id).ok_or_else(|| DriveError::NotFound(id))
    }

    async fn create_file(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        data: Bytes
    ) -> Result<RemoteEntry, DriveError> {
        self.mutations.fetch_add(1, Ordering::Relaxed);
        self.upload_failure()?;

        let id = self.insert(parent, name, mime_type, &now(), data);

        self.entry(&id).ok_or_else(|| DriveError::NotFound(id))
    }

    async fn update_file(
        &self,
        id: &str,
        mime_type: &str,
        data: Bytes
    ) -> Result<RemoteEntry, DriveError> {
        self.mutations.fetch_add(1, Ordering::Relaxed);
        self.upload_failure()?;

        let mut entries = self.entries.lock().unwrap();
        let found = entries.iter_mut()
            .find(|s| s.entry.id == id)
            .ok_or_else(|| DriveError::NotFound(id.to_owned()))?;

        found.entry.mime_type = mime_type.to_owned();
        found.entry.modified_time = now();
        found.data = data;

        Ok(found.entry.clone())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<FileRecord>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        RecordingNotifier {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn sent(&self) -> Vec<FileRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, record: &FileRecord) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(record.clone());

        if self.fail.load(Ordering::Relaxed) {
            Err(NotifyError::Status {
                status: 429,
                body: "rate limited".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// a folder tree used across tests
///
/// ```text
/// root
/// ├── Reports/
/// │   ├── Report.pdf        2024-03-01
/// │   └── Q1/
/// │       └── summary.txt   2024-02-10
/// ├── notes.txt             2024-03-05
/// └── Plan (google doc)     2024-01-20
/// ```
pub struct Tree {
    pub store: Arc<MemoryStore>,
    pub reports: String,
    pub report_pdf: String,
    pub q1: String,
    pub summary: String,
    pub notes: String,
    pub plan: String,
}

pub fn tree() -> Tree {
    let store = Arc::new(MemoryStore::new("root"));

    let reports = store.add_folder("root", "Reports", "2024-01-01T00:00:00.000Z");
    let notes = store.add_file("root", "notes.txt", "text/plain", "2024-03-05T09:00:00.000Z", b"remember the milk");
    let plan = store.add_file(
        "root",
        "Plan",
        dmirror_lib::mime::GOOGLE_DOCUMENT,
        "2024-01-20T12:00:00.000Z",
        b"quarterly plan"
    );
    let report_pdf = store.add_file(
        &reports,
        "Report.pdf",
        "application/pdf",
        "2024-03-01T10:00:00.000Z",
        b"%PDF-1.4 not a real pdf"
    );
    let q1 = store.add_folder(&reports, "Q1", "2024-01-02T00:00:00.000Z");
    let summary = store.add_file(&q1, "summary.txt", "text/plain", "2024-02-10T15:30:00.000Z", b"q1 went fine");

    Tree {
        store,
        reports,
        report_pdf,
        q1,
        summary,
        notes,
        plan,
    }
}


pub fn settings() -> config::Settings {
    let mut settings = config::Settings::try_default().unwrap();
    settings.drive.root_folder = "root".into();
    settings.http.bearer_token = Some(TOKEN.into());

    settings
}

pub fn shared(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> ArcShared {
    shared_with(store, notifier, |_| {})
}

pub fn shared_with<F>(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>, modify: F) -> ArcShared
where
    F: FnOnce(&mut config::Settings)
{
    let mut settings = settings();
    modify(&mut settings);

    Arc::new(Shared::new(store, notifier, &settings))
}
