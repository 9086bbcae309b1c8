use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::LocalStore;
use crate::error::Result;
use crate::models::{Devotional, Program};

use super::DevotionalApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramSource {
    Remote,
    LocalCache,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramsSnapshot {
    pub programs: Vec<Program>,
    pub source: ProgramSource,
}

/// Mirrors the remote API into the local store, falling back to cached
/// data when the network is unavailable.
pub struct RemoteSync {
    api: Arc<dyn DevotionalApi>,
    store: LocalStore,
    // Written on every successful program read, never used as a fallback.
    last_programs: Mutex<Vec<Program>>,
}

impl RemoteSync {
    pub fn new(api: Arc<dyn DevotionalApi>, store: LocalStore) -> Self {
        Self {
            api,
            store,
            last_programs: Mutex::new(Vec::new()),
        }
    }

    /// Fetch the program list, always trying the network first. On success
    /// the local table is replaced with the fetched snapshot; on failure the
    /// last stored snapshot is returned instead.
    pub async fn fetch_and_sync_programs(&self, force_refresh: bool) -> Result<ProgramsSnapshot> {
        self.store.initialize().await?;
        tracing::debug!(force_refresh, "Fetching programs");

        match self.fetch_and_store_programs().await {
            Ok(programs) => {
                self.remember_programs(&programs);
                return Ok(ProgramsSnapshot {
                    programs,
                    source: ProgramSource::Remote,
                });
            }
            Err(e) => tracing::warn!("Program fetch failed, falling back to local data: {}", e),
        }

        match self.store.list_programs().await {
            Ok(programs) if !programs.is_empty() => {
                self.remember_programs(&programs);
                Ok(ProgramsSnapshot {
                    programs,
                    source: ProgramSource::LocalCache,
                })
            }
            Ok(_) => Ok(ProgramsSnapshot {
                programs: Vec::new(),
                source: ProgramSource::Empty,
            }),
            Err(e) => {
                tracing::warn!("No local programs available: {}", e);
                Ok(ProgramsSnapshot {
                    programs: Vec::new(),
                    source: ProgramSource::Empty,
                })
            }
        }
    }

    async fn fetch_and_store_programs(&self) -> Result<Vec<Program>> {
        let programs = self.api.fetch_programs().await?;
        self.store.replace_programs(&programs).await?;
        Ok(programs)
    }

    fn remember_programs(&self, programs: &[Program]) {
        if let Ok(mut cached) = self.last_programs.lock() {
            *cached = programs.to_vec();
        }
    }

    /// Programs from the most recent successful read, remote or local.
    #[allow(dead_code)]
    pub fn last_known_programs(&self) -> Vec<Program> {
        self.last_programs
            .lock()
            .map(|cached| cached.clone())
            .unwrap_or_default()
    }

    /// Pull every daily study and upsert them one by one. The first failure
    /// aborts the rest. Returns how many entries were written.
    pub async fn sync_daily_studies(&self) -> Result<usize> {
        self.store.initialize().await?;

        let studies = self.api.fetch_daily_studies().await.inspect_err(|e| {
            tracing::error!("Error fetching daily studies: {}", e);
        })?;

        for study in &studies {
            self.store.upsert_devotional(study).await?;
        }

        tracing::info!("Synced {} daily studies", studies.len());
        Ok(studies.len())
    }

    /// Network-only read of one date's study.
    pub async fn fetch_daily_study_by_date(&self, date: NaiveDate) -> Option<Devotional> {
        match self.api.fetch_daily_study(date).await {
            Ok(study) => study,
            Err(e) => {
                tracing::error!("Error fetching daily study for date {}: {}", date, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::error::AppError;

    /// In-process API whose responses can be switched between success and
    /// failure. `None` means the endpoint fails with a 503.
    #[derive(Default)]
    struct FakeApi {
        programs: Mutex<Option<Vec<Program>>>,
        studies: Mutex<Option<Vec<Devotional>>>,
        program_calls: AtomicUsize,
    }

    impl FakeApi {
        fn set_programs(&self, programs: Option<Vec<Program>>) {
            *self.programs.lock().unwrap() = programs;
        }

        fn set_studies(&self, studies: Option<Vec<Devotional>>) {
            *self.studies.lock().unwrap() = studies;
        }
    }

    fn unavailable() -> AppError {
        AppError::ApiStatus(StatusCode::SERVICE_UNAVAILABLE)
    }

    #[async_trait]
    impl DevotionalApi for FakeApi {
        async fn fetch_programs(&self) -> Result<Vec<Program>> {
            self.program_calls.fetch_add(1, Ordering::SeqCst);
            self.programs.lock().unwrap().clone().ok_or_else(unavailable)
        }

        async fn fetch_daily_studies(&self) -> Result<Vec<Devotional>> {
            self.studies.lock().unwrap().clone().ok_or_else(unavailable)
        }

        async fn fetch_daily_study(&self, date: NaiveDate) -> Result<Option<Devotional>> {
            let studies = self.studies.lock().unwrap().clone().ok_or_else(unavailable)?;
            let date = date.format("%Y-%m-%d").to_string();
            Ok(studies.into_iter().find(|s| s.date == date))
        }
    }

    fn program(id: i64, title: &str) -> Program {
        Program {
            id,
            title: title.to_string(),
            created_at: "2024-01-01".to_string(),
        }
    }

    fn study(id: i64, date: &str) -> Devotional {
        Devotional {
            id,
            program: "Open Heavens".to_string(),
            date: date.to_string(),
            topic: format!("Topic {id}"),
            content: format!("It's day {id}\nRead and pray."),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    async fn setup() -> (Arc<FakeApi>, LocalStore, RemoteSync) {
        let api = Arc::new(FakeApi::default());
        let store = LocalStore::open_in_memory().await.unwrap();
        let sync = RemoteSync::new(api.clone(), store.clone());
        (api, store, sync)
    }

    /// On-disk store plus a side connection for installing triggers that
    /// make specific writes fail.
    async fn setup_on_disk(
        dir: &tempfile::TempDir,
    ) -> (Arc<FakeApi>, LocalStore, RemoteSync, rusqlite::Connection) {
        let path = dir.path().join("devotion.db");
        let path = path.to_str().unwrap();
        let api = Arc::new(FakeApi::default());
        let store = LocalStore::open(path).await.unwrap();
        let sync = RemoteSync::new(api.clone(), store.clone());
        let side = rusqlite::Connection::open(path).unwrap();
        (api, store, sync, side)
    }

    #[tokio::test]
    async fn successful_fetch_writes_through() {
        let (api, store, sync) = setup().await;
        api.set_programs(Some(vec![program(1, "Open Heavens"), program(2, "Daily Manna")]));

        let snapshot = sync.fetch_and_sync_programs(false).await.unwrap();

        assert_eq!(snapshot.source, ProgramSource::Remote);
        assert_eq!(snapshot.programs.len(), 2);
        assert_eq!(store.list_programs().await.unwrap(), snapshot.programs);
        assert_eq!(sync.last_known_programs(), snapshot.programs);
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_previous_sync() {
        let (api, _store, sync) = setup().await;
        api.set_programs(Some(vec![program(1, "Open Heavens")]));
        sync.fetch_and_sync_programs(false).await.unwrap();

        api.set_programs(None);
        let snapshot = sync.fetch_and_sync_programs(true).await.unwrap();

        assert_eq!(snapshot.source, ProgramSource::LocalCache);
        assert_eq!(snapshot.programs, vec![program(1, "Open Heavens")]);
    }

    #[tokio::test]
    async fn network_failure_without_cache_is_empty() {
        let (api, _store, sync) = setup().await;
        api.set_programs(None);

        let snapshot = sync.fetch_and_sync_programs(false).await.unwrap();

        assert_eq!(snapshot.source, ProgramSource::Empty);
        assert!(snapshot.programs.is_empty());
        assert!(sync.last_known_programs().is_empty());
    }

    #[tokio::test]
    async fn every_call_hits_the_network_and_replaces_snapshot() {
        let (api, store, sync) = setup().await;
        api.set_programs(Some(vec![program(1, "A"), program(2, "B")]));
        sync.fetch_and_sync_programs(false).await.unwrap();

        api.set_programs(Some(vec![program(3, "C")]));
        sync.fetch_and_sync_programs(false).await.unwrap();

        assert_eq!(api.program_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.list_programs().await.unwrap(), vec![program(3, "C")]);
    }

    #[tokio::test]
    async fn concurrent_fetches_each_issue_a_request() {
        let (api, store, sync) = setup().await;
        api.set_programs(Some(vec![program(1, "A")]));

        let (a, b) = tokio::join!(
            sync.fetch_and_sync_programs(false),
            sync.fetch_and_sync_programs(false)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(api.program_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.list_programs().await.unwrap(), vec![program(1, "A")]);
    }

    #[tokio::test]
    async fn sync_daily_studies_upserts_everything() {
        let (api, store, sync) = setup().await;
        api.set_studies(Some(vec![study(1, "2024-05-01"), study(2, "2024-05-02")]));

        assert_eq!(sync.sync_daily_studies().await.unwrap(), 2);

        let cached = store.query_devotionals("Open Heavens", None).await.unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].content, "It's day 2\nRead and pray.");
    }

    #[tokio::test]
    async fn sync_daily_studies_propagates_network_failure() {
        let (api, store, sync) = setup().await;
        api.set_studies(None);

        let err = sync.sync_daily_studies().await.unwrap_err();
        assert!(err.is_network());
        assert!(store.query_devotionals("", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_through_falls_back_to_stored_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (api, store, sync, side) = setup_on_disk(&dir).await;
        api.set_programs(Some(vec![program(1, "A")]));
        sync.fetch_and_sync_programs(false).await.unwrap();

        side.execute_batch(
            "CREATE TRIGGER reject_program BEFORE INSERT ON programs
             WHEN NEW.id = 99
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        api.set_programs(Some(vec![program(2, "B"), program(99, "X")]));
        let snapshot = sync.fetch_and_sync_programs(false).await.unwrap();

        assert_eq!(snapshot.source, ProgramSource::LocalCache);
        assert_eq!(snapshot.programs, vec![program(1, "A")]);
        assert_eq!(store.list_programs().await.unwrap(), vec![program(1, "A")]);
    }

    #[tokio::test]
    async fn sync_daily_studies_stops_at_first_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (api, store, sync, side) = setup_on_disk(&dir).await;

        side.execute_batch(
            "CREATE TRIGGER reject_devotional BEFORE INSERT ON devotionals
             WHEN NEW.id = 2
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        api.set_studies(Some(vec![
            study(1, "2024-05-01"),
            study(2, "2024-05-02"),
            study(3, "2024-05-03"),
        ]));

        let err = sync.sync_daily_studies().await.unwrap_err();
        assert!(err.is_storage());

        let ids: Vec<i64> = store
            .query_devotionals("", None)
            .await
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn fetch_by_date_has_no_local_fallback() {
        let (api, store, sync) = setup().await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        api.set_studies(Some(vec![study(1, "2024-05-01"), study(2, "2024-05-02")]));

        assert_eq!(sync.fetch_daily_study_by_date(date).await.map(|s| s.id), Some(2));

        store.upsert_devotional(&study(2, "2024-05-02")).await.unwrap();
        api.set_studies(None);
        assert!(sync.fetch_daily_study_by_date(date).await.is_none());
    }
}
