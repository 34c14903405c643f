use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::config::SweeperConfig;
use crate::core::error::Result;
use crate::features::files::models::PurgeOutcome;
use crate::features::files::services::FileService;

/// Outcome counts of one sweep cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub purged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.scanned == 0
    }
}

/// Background worker that permanently removes files marked for deletion
pub struct DeletionSweeper {
    file_service: Arc<FileService>,
    config: SweeperConfig,
}

/// Running sweeper; dropping it without `shutdown` leaves the task running
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DeletionSweeper {
    pub fn new(file_service: Arc<FileService>, config: SweeperConfig) -> Self {
        Self {
            file_service,
            config,
        }
    }

    /// Start the sweep loop on the runtime
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });

        SweeperHandle { shutdown_tx, task }
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Starting deletion sweeper (interval: {:?}, grace period: {:?}, batch size: {})",
            self.config.interval,
            self.config.grace_period,
            self.config.batch_size
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(report) if !report.is_empty() => {
                            tracing::info!(
                                "Deletion sweep: scanned={}, purged={}, skipped={}, failed={}",
                                report.scanned,
                                report.purged,
                                report.skipped,
                                report.failed
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("Deletion sweep failed: {:?}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Deletion sweeper stopped");
    }

    /// Purge every due file, fetching `batch_size` at a time. A failing file
    /// is counted, logged and left for the next cycle; the rest still run.
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut failed_ids = Vec::new();

        loop {
            let page = self
                .file_service
                .pending_purge(self.config.grace_period, &failed_ids, self.config.batch_size)
                .await?;
            let page_len = page.len();
            report.scanned += page_len;

            for file in page {
                match self.file_service.purge(file.id).await {
                    Ok(PurgeOutcome::Purged) => report.purged += 1,
                    Ok(PurgeOutcome::Skipped) => report.skipped += 1,
                    Err(e) => {
                        tracing::error!("Failed to purge file {}: {:?}", file.id, e);
                        report.failed += 1;
                        failed_ids.push(file.id);
                    }
                }
            }

            // Purged and skipped files drop out of the due set, failed ones are excluded
            if (page_len as i64) < self.config.batch_size {
                break;
            }
        }

        Ok(report)
    }
}

impl SweeperHandle {
    /// Stop the loop after any in-flight sweep and wait for the task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Deletion sweeper task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::features::access::Scope;
    use crate::features::files::models::{FileFilter, FileType};
    use crate::features::files::repositories::FileRepository;
    use crate::features::files::services::CreateFileInput;
    use crate::features::favorites::repositories::FavoriteRepository;
    use crate::shared::test_helpers::{caller_of, favorite_service, file_service, MemoryStore};
    use std::time::Duration;
    use uuid::Uuid;

    fn sweeper_config(grace_period: Duration) -> SweeperConfig {
        SweeperConfig {
            enabled: true,
            interval: Duration::from_millis(20),
            grace_period,
            batch_size: 100,
        }
    }

    fn input(name: &str) -> CreateFileInput {
        CreateFileInput {
            name: name.to_string(),
            blob_handle: format!("uploads/{}", Uuid::now_v7()),
            file_type: FileType::Pdf,
        }
    }

    #[tokio::test]
    async fn test_sweep_purges_only_flagged_files() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &["org_a"]);
        let caller = caller_of(&alice);
        let scope = Scope::Organization("org_a".to_string());

        let doomed = service
            .create_file(Some(&caller), scope.clone(), input("old.pdf"))
            .await
            .unwrap();
        let kept = service
            .create_file(Some(&caller), scope.clone(), input("keep.pdf"))
            .await
            .unwrap();
        store.toggle(alice.id, doomed.id).await.unwrap();
        service.mark_for_deletion(Some(&caller), doomed.id).await.unwrap();

        let sweeper = DeletionSweeper::new(service.clone(), sweeper_config(Duration::ZERO));
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                scanned: 1,
                purged: 1,
                skipped: 0,
                failed: 0
            }
        );
        assert!(store.file(doomed.id).is_none());
        assert!(store.file(kept.id).is_some());
        assert_eq!(store.favorite_count(), 0);
        assert_eq!(store.blobs.released(), vec![doomed.blob_handle]);

        let deleted_view = service
            .list_files(
                Some(&caller),
                &scope,
                &FileFilter {
                    deleted_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(deleted_view.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_holds_back_files_inside_grace_period() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        let file = service
            .create_file(Some(&caller), Scope::Personal(alice.id), input("a.pdf"))
            .await
            .unwrap();
        service.mark_for_deletion(Some(&caller), file.id).await.unwrap();

        let sweeper =
            DeletionSweeper::new(service.clone(), sweeper_config(Duration::from_secs(3600)));
        let report = sweeper.sweep_once().await.unwrap();

        assert!(report.is_empty());
        assert!(store.file(file.id).is_some());
    }

    #[tokio::test]
    async fn test_restore_after_scan_wins_over_purge() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        let file = service
            .create_file(Some(&caller), Scope::Personal(alice.id), input("a.pdf"))
            .await
            .unwrap();
        service.mark_for_deletion(Some(&caller), file.id).await.unwrap();

        // Scan sees the file, then the user restores it before the purge
        let stale_scan = service.pending_purge(Duration::ZERO, &[], 100).await.unwrap();
        assert_eq!(stale_scan.len(), 1);
        service.restore(Some(&caller), file.id).await.unwrap();

        assert_eq!(
            service.purge(stale_scan[0].id).await.unwrap(),
            PurgeOutcome::Skipped
        );
        let survivor = store.get_by_id(file.id).await.unwrap().unwrap();
        assert!(!survivor.should_delete);
        assert!(store.blobs.released().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_isolates_failures() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        for name in ["a.pdf", "b.pdf"] {
            let file = service
                .create_file(Some(&caller), Scope::Personal(alice.id), input(name))
                .await
                .unwrap();
            service.mark_for_deletion(Some(&caller), file.id).await.unwrap();
        }
        store.blobs.fail_releases(true);

        let sweeper = DeletionSweeper::new(service.clone(), sweeper_config(Duration::ZERO));
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.purged, 0);
        assert_eq!(store.file_count(), 2);
    }

    #[tokio::test]
    async fn test_one_sweep_drains_more_than_a_batch() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            let file = service
                .create_file(Some(&caller), Scope::Personal(alice.id), input(name))
                .await
                .unwrap();
            service.mark_for_deletion(Some(&caller), file.id).await.unwrap();
        }

        let config = SweeperConfig {
            batch_size: 2,
            ..sweeper_config(Duration::ZERO)
        };
        let report = DeletionSweeper::new(service.clone(), config)
            .sweep_once()
            .await
            .unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.purged, 3);
        assert_eq!(store.file_count(), 0);
        assert_eq!(store.blobs.released().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_purges_do_not_stall_a_full_batch() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            let file = service
                .create_file(Some(&caller), Scope::Personal(alice.id), input(name))
                .await
                .unwrap();
            service.mark_for_deletion(Some(&caller), file.id).await.unwrap();
        }
        store.blobs.fail_releases(true);

        let config = SweeperConfig {
            batch_size: 1,
            ..sweeper_config(Duration::ZERO)
        };
        let report = DeletionSweeper::new(service.clone(), config)
            .sweep_once()
            .await
            .unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.failed, 3);
        assert_eq!(store.file_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_blob_release_is_retried_next_sweep() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        let file = service
            .create_file(Some(&caller), Scope::Personal(alice.id), input("a.pdf"))
            .await
            .unwrap();
        service.mark_for_deletion(Some(&caller), file.id).await.unwrap();
        let sweeper = DeletionSweeper::new(service.clone(), sweeper_config(Duration::ZERO));

        store.blobs.fail_releases(true);
        let first = sweeper.sweep_once().await.unwrap();
        assert_eq!((first.scanned, first.failed), (1, 1));
        assert!(store.file(file.id).unwrap().should_delete);

        store.blobs.fail_releases(false);
        let second = sweeper.sweep_once().await.unwrap();
        assert_eq!((second.scanned, second.purged), (1, 1));
        assert!(store.file(file.id).is_none());
        assert_eq!(store.blobs.released(), vec![file.blob_handle]);
    }

    #[tokio::test]
    async fn test_reused_blob_handle_cannot_reach_another_scope() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &["org_a"]);
        let bob = store.seed_user("bob", &["org_a"]);
        let org_scope = Scope::Organization("org_a".to_string());
        let payroll = service
            .create_file(Some(&caller_of(&alice)), org_scope.clone(), input("payroll.csv"))
            .await
            .unwrap();

        let listed = service
            .list_files(Some(&caller_of(&bob)), &org_scope, &FileFilter::default())
            .await
            .unwrap();
        let copy = service
            .create_file(
                Some(&caller_of(&bob)),
                Scope::Personal(bob.id),
                CreateFileInput {
                    name: "mine.csv".to_string(),
                    blob_handle: listed[0].file.blob_handle.clone(),
                    file_type: FileType::Csv,
                },
            )
            .await;
        assert!(matches!(copy, Err(AppError::Conflict(_))));

        let report = DeletionSweeper::new(service.clone(), sweeper_config(Duration::ZERO))
            .sweep_once()
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(store.file(payroll.id).is_some());
        assert!(store.blobs.released().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_sweeper_runs_and_shuts_down() {
        let store = MemoryStore::new();
        let service = Arc::new(file_service(&store));
        let alice = store.seed_user("alice", &[]);
        let caller = caller_of(&alice);
        let file = service
            .create_file(Some(&caller), Scope::Personal(alice.id), input("a.pdf"))
            .await
            .unwrap();
        service.mark_for_deletion(Some(&caller), file.id).await.unwrap();

        let handle =
            DeletionSweeper::new(service.clone(), sweeper_config(Duration::ZERO)).spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.shutdown().await;

        assert!(store.file(file.id).is_none());
    }

    #[tokio::test]
    async fn test_personal_file_lifecycle_walkthrough() {
        let store = MemoryStore::new();
        let files = Arc::new(file_service(&store));
        let favorites = favorite_service(&store, files.clone());
        let u1 = store.seed_user("u1", &[]);
        let u2 = store.seed_user("u2", &["org_x"]);
        let (c1, c2) = (caller_of(&u1), caller_of(&u2));
        let scope = Scope::Personal(u1.id);
        let deleted_view = FileFilter {
            deleted_only: true,
            ..Default::default()
        };

        // Create and list
        let file = files
            .create_file(
                Some(&c1),
                scope.clone(),
                CreateFileInput {
                    name: "a.csv".to_string(),
                    blob_handle: "uploads/a-csv".to_string(),
                    file_type: FileType::Csv,
                },
            )
            .await
            .unwrap();
        let listed = files
            .list_files(Some(&c1), &scope, &FileFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].file.name, "a.csv");
        assert!(!listed[0].file.should_delete);

        // Another user sees nothing, without an error
        let foreign = files
            .list_files(Some(&c2), &scope, &FileFilter::default())
            .await
            .unwrap();
        assert!(foreign.is_empty());

        // Favorite toggles on and off
        favorites.toggle_favorite(Some(&c1), file.id).await.unwrap();
        assert_eq!(favorites.list_favorites(Some(&c1), &scope).await.unwrap().len(), 1);
        favorites.toggle_favorite(Some(&c1), file.id).await.unwrap();
        assert!(favorites.list_favorites(Some(&c1), &scope).await.unwrap().is_empty());

        // Mark for deletion moves it to the deleted view
        favorites.toggle_favorite(Some(&c1), file.id).await.unwrap();
        files.mark_for_deletion(Some(&c1), file.id).await.unwrap();
        assert!(files
            .list_files(Some(&c1), &scope, &FileFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            files
                .list_files(Some(&c1), &scope, &deleted_view)
                .await
                .unwrap()
                .len(),
            1
        );

        // One sweep purges it everywhere and releases the blob once
        let sweeper = DeletionSweeper::new(files.clone(), sweeper_config(Duration::ZERO));
        assert_eq!(sweeper.sweep_once().await.unwrap().purged, 1);
        assert!(sweeper.sweep_once().await.unwrap().is_empty());

        for filter in [FileFilter::default(), deleted_view] {
            assert!(files
                .list_files(Some(&c1), &scope, &filter)
                .await
                .unwrap()
                .is_empty());
        }
        assert!(favorites.list_favorites(Some(&c1), &scope).await.unwrap().is_empty());
        assert_eq!(store.blobs.released(), vec!["uploads/a-csv".to_string()]);
    }
}
