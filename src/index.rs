use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use dmirror_api::FileRecord;
use dmirror_lib::path;
use tokio::sync::Mutex;

use crate::drive::{DriveError, RemoteStore};

pub const RECENT_LIMIT: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct Index {
    records: Vec<FileRecord>,
    lookup: HashMap<String, usize>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: FileRecord) -> bool {
        if self.lookup.contains_key(&record.id) {
            return false;
        }

        self.lookup.insert(record.id.clone(), self.records.len());
        self.records.push(record);

        true
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.lookup.get(id).map(|pos| &self.records[*pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }
}

/// walks the folder tree below `root` and records every non trashed entry.
///
/// the children of a folder are all recorded before any of its sub folders
/// are descended into. sub folders are then visited in listing order. any
/// listing failure aborts the walk.
pub async fn build(store: &dyn RemoteStore, root: &str) -> Result<Index, DriveError> {
    let mut index = Index::new();
    let mut stack: Vec<(String, String)> = vec![(root.to_owned(), String::new())];

    while let Some((folder_id, folder_path)) = stack.pop() {
        let children = store.list_children(&folder_id).await?;
        let mut folders = Vec::new();

        for entry in children {
            if entry.trashed {
                continue;
            }

            let record = FileRecord {
                path: path::child(&folder_path, &entry.name),
                id: entry.id,
                name: entry.name,
                mime_type: entry.mime_type,
                modified_time: entry.modified_time,
            };

            let is_folder = dmirror_lib::mime::is_folder(&record.mime_type);
            let pair = (record.id.clone(), record.path.clone());

            if !index.insert(record) {
                tracing::debug!("skipping duplicate entry {}", pair.0);
                continue;
            }

            if is_folder {
                folders.push(pair);
            }
        }

        // popped in reverse so the first listed folder is walked first
        stack.extend(folders.into_iter().rev());
    }

    Ok(index)
}

pub fn recency<'a, I>(records: I, limit: usize) -> Vec<FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>
{
    let mut sorted: Vec<&FileRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));

    sorted.into_iter()
        .take(limit)
        .cloned()
        .collect()
}

pub fn changed<'a>(prev: Option<&Index>, next: &'a Index) -> Vec<&'a FileRecord> {
    next.iter()
        .filter(|record| match prev.and_then(|p| p.get(&record.id)) {
            Some(known) => known.modified_time != record.modified_time,
            None => true,
        })
        .collect()
}

pub fn removed(prev: Option<&Index>, next: &Index) -> usize {
    match prev {
        Some(prev) => prev.iter()
            .filter(|record| !next.contains(&record.id))
            .count(),
        None => 0
    }
}

#[derive(Debug)]
pub struct Snapshot {
    index: Index,
    recent: Vec<FileRecord>,
    built: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(index: Index) -> Self {
        let recent = recency(index.iter(), RECENT_LIMIT);

        Snapshot {
            index,
            recent,
            built: Utc::now(),
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn recent(&self) -> &[FileRecord] {
        &self.recent
    }

    pub fn built(&self) -> &DateTime<Utc> {
        &self.built
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.index.get(id)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<FileRecord> {
        let needle = query.trim().to_lowercase();

        if needle.is_empty() {
            return self.recent.iter()
                .take(limit)
                .cloned()
                .collect();
        }

        let matched = self.index.iter()
            .filter(|record| {
                record.name.to_lowercase().contains(&needle) ||
                    record.path.to_lowercase().contains(&needle)
            });

        recency(matched, limit)
    }
}

#[derive(Debug, Default)]
pub struct IndexStore {
    current: ArcSwapOption<Snapshot>,
    loading: Mutex<()>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);

        self.current.store(Some(Arc::clone(&snapshot)));

        snapshot
    }

    pub async fn get_or_build<F, T>(&self, builder: F) -> Result<Arc<Snapshot>, DriveError>
    where
        F: FnOnce() -> T,
        T: Future<Output = Result<Index, DriveError>>,
    {
        if let Some(found) = self.current() {
            return Ok(found);
        }

        let _guard = self.loading.lock().await;

        if let Some(found) = self.current() {
            return Ok(found);
        }

        tracing::debug!("no index published. building");

        let index = builder().await?;

        Ok(self.publish(Snapshot::new(index)))
    }

    /// builds a new snapshot and publishes it, returning the snapshot it
    /// replaced. a failed build leaves the current snapshot in place
    pub async fn rebuild<F, T>(&self, builder: F) -> Result<(Option<Arc<Snapshot>>, Arc<Snapshot>), DriveError>
    where
        F: FnOnce() -> T,
        T: Future<Output = Result<Index, DriveError>>,
    {
        let _guard = self.loading.lock().await;

        let index = builder().await?;
        let prev = self.current();

        Ok((prev, self.publish(Snapshot::new(index))))
    }
}

#[cfg(test)]
mod test {
    use crate::test_support::{tree, MemoryStore};

    use super::*;

    fn record(id: &str, path: &str, modified: &str) -> FileRecord {
        FileRecord {
            id: id.into(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            path: path.into(),
            mime_type: "text/plain".into(),
            modified_time: modified.into(),
        }
    }

    fn index_of(records: Vec<FileRecord>) -> Index {
        let mut index = Index::new();

        for r in records {
            index.insert(r);
        }

        index
    }

    #[tokio::test]
    async fn build_records_every_entry_with_paths() {
        let t = tree();
        let index = build(t.store.as_ref(), "root").await.unwrap();

        let order: Vec<&str> = index.iter().map(|r| r.path.as_str()).collect();

        assert_eq!(order, vec![
            "Reports",
            "notes.txt",
            "Plan",
            "Reports/Report.pdf",
            "Reports/Q1",
            "Reports/Q1/summary.txt",
        ]);

        assert_eq!(index.get(&t.summary).unwrap().name, "summary.txt");
        assert_eq!(index.get(&t.q1).unwrap().mime_type, dmirror_lib::mime::FOLDER);
    }

    #[tokio::test]
    async fn build_skips_trashed() {
        let t = tree();
        t.store.trash(&t.q1);
        t.store.trash(&t.notes);

        let index = build(t.store.as_ref(), "root").await.unwrap();

        assert_eq!(index.len(), 3);
        assert!(!index.contains(&t.q1));
        assert!(!index.contains(&t.summary));
        assert!(!index.contains(&t.notes));
    }

    #[tokio::test]
    async fn build_fails_as_a_whole() {
        let t = tree();
        t.store.set_fail_listing(true);

        assert!(build(t.store.as_ref(), "root").await.is_err());
    }

    #[tokio::test]
    async fn empty_root() {
        let store = MemoryStore::new("root");
        let index = build(&store, "root").await.unwrap();

        assert!(index.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut index = Index::new();

        assert!(index.insert(record("a", "one", "2024-01-01")));
        assert!(!index.insert(record("a", "two", "2024-01-02")));

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").unwrap().path, "one");
    }

    #[test]
    fn recency_sorted_stable_and_bounded() {
        let mut records = Vec::new();

        for i in 0..150 {
            records.push(record(&format!("r{i}"), &format!("f{i}"), &format!("2024-01-01T00:{:02}:00Z", i % 60)));
        }

        let snapshot = Snapshot::new(index_of(records));
        let recent = snapshot.recent();

        assert_eq!(recent.len(), RECENT_LIMIT);

        for pair in recent.windows(2) {
            assert!(pair[0].modified_time >= pair[1].modified_time);
        }

        // r59, r119 share a timestamp; walk order decides
        assert_eq!(recent[0].id, "r59");
        assert_eq!(recent[1].id, "r119");
    }

    #[test]
    fn search_matches_name_or_path() {
        let snapshot = Snapshot::new(index_of(vec![
            record("1", "Reports/Q1/summary.txt", "2024-02-10"),
            record("2", "Reports/Report.pdf", "2024-03-01"),
            record("3", "notes.txt", "2024-03-05"),
            record("4", "archive/old-REPORT.md", "2023-12-01"),
        ]));

        let ids: Vec<String> = snapshot.search("report", 10)
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec!["2", "1", "4"]);

        let capped = snapshot.search("REPORT", 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, "2");

        assert!(snapshot.search("nothing", 10).is_empty());
    }

    #[test]
    fn empty_search_is_recent_prefix() {
        let snapshot = Snapshot::new(index_of(vec![
            record("1", "a", "2024-01-01"),
            record("2", "b", "2024-01-03"),
            record("3", "c", "2024-01-02"),
        ]));

        let found = snapshot.search("   ", 2);

        assert_eq!(found, snapshot.recent()[..2].to_vec());
    }

    #[test]
    fn diff_by_id_and_timestamp() {
        let prev = index_of(vec![
            record("1", "a", "T1"),
            record("2", "b", "T1"),
            record("3", "c", "T1"),
        ]);

        let same = prev.clone();
        assert!(changed(Some(&prev), &same).is_empty());
        assert_eq!(removed(Some(&prev), &same), 0);

        let next = index_of(vec![
            record("1", "a", "T1"),
            record("2", "b", "T2"),
            record("4", "d", "T1"),
        ]);

        let ids: Vec<&str> = changed(Some(&prev), &next)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();

        assert_eq!(ids, vec!["2", "4"]);
        assert_eq!(removed(Some(&prev), &next), 1);

        assert_eq!(changed(None, &next).len(), 3);
        assert_eq!(removed(None, &next), 0);
    }

    #[tokio::test]
    async fn store_builds_once() {
        let t = tree();
        let store = IndexStore::new();

        assert!(store.current().is_none());

        let first = store.get_or_build(|| build(t.store.as_ref(), "root")).await.unwrap();

        t.store.set_fail_listing(true);

        // already published, the failing store is never asked
        let second = store.get_or_build(|| build(t.store.as_ref(), "root")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous() {
        let t = tree();
        let store = IndexStore::new();

        let (prev, first) = store.rebuild(|| build(t.store.as_ref(), "root")).await.unwrap();
        assert!(prev.is_none());

        t.store.set_fail_listing(true);

        assert!(store.rebuild(|| build(t.store.as_ref(), "root")).await.is_err());

        let current = store.current().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }
}
