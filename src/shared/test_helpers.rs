//! In-memory doubles for the repositories and blob store, plus router helpers
//! for handler tests.

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::Scope;
use crate::features::auth::AuthenticatedUser;
use crate::features::favorites::models::Favorite;
use crate::features::favorites::{FavoriteRepository, FavoriteService};
use crate::features::files::models::{File, FileFilter, FileListing, NewFile};
use crate::features::files::{FileRepository, FileService};
use crate::features::users::{User, UserRepository, UserService};
use crate::modules::storage::{BlobStore, UploadTarget};

pub const TEST_ISSUER: &str = "https://id.test";

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    /// Insertion order; listings read it back to front
    files: Vec<File>,
    favorites: Vec<Favorite>,
}

/// Users, files and favorites sharing one lock so purges cascade like the
/// database does
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    pub blobs: Arc<RecordingBlobStore>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MemoryState::default()),
            blobs: Arc::new(RecordingBlobStore::default()),
        })
    }

    /// Insert a user whose token identifier is `"{TEST_ISSUER}|{sub}"`
    pub fn seed_user(&self, sub: &str, org_ids: &[&str]) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            token_identifier: AuthenticatedUser::new(TEST_ISSUER, sub).token_identifier,
            name: sub.to_string(),
            image: None,
            org_ids: org_ids.iter().map(|id| id.to_string()).collect(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }

    pub fn favorite_count(&self) -> usize {
        self.state.lock().unwrap().favorites.len()
    }

    pub fn file(&self, id: Uuid) -> Option<File> {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }
}

fn in_scope(file: &File, scope: &Scope) -> bool {
    file.scope_kind == scope.kind() && file.scope_id == scope.id()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_token(&self, token_identifier: &str) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.token_identifier == token_identifier)
            .cloned())
    }

    async fn upsert(
        &self,
        token_identifier: &str,
        name: &str,
        image: Option<&str>,
    ) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        if let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.token_identifier == token_identifier)
        {
            user.name = name.to_string();
            user.image = image.map(str::to_string);
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::now_v7(),
            token_identifier: token_identifier.to_string(),
            name: name.to_string(),
            image: image.map(str::to_string),
            org_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn add_org_id(&self, token_identifier: &str, org_id: &str) -> Result<Option<User>> {
        let mut state = self.state.lock().unwrap();
        let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.token_identifier == token_identifier)
        else {
            return Ok(None);
        };

        if !user.is_member_of(org_id) {
            user.org_ids.push(org_id.to_string());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl FileRepository for MemoryStore {
    async fn insert(&self, new_file: NewFile) -> Result<File> {
        let mut state = self.state.lock().unwrap();
        if state
            .files
            .iter()
            .any(|f| f.blob_handle == new_file.blob_handle)
        {
            return Err(AppError::Conflict(format!(
                "Blob handle '{}' is already registered to another file",
                new_file.blob_handle
            )));
        }

        let now = Utc::now();
        let file = File {
            id: Uuid::now_v7(),
            name: new_file.name,
            scope_kind: new_file.scope.kind(),
            scope_id: new_file.scope.id(),
            blob_handle: new_file.blob_handle,
            file_type: new_file.file_type,
            owner_id: new_file.owner_id,
            should_delete: false,
            marked_for_deletion_at: None,
            created_at: now,
            updated_at: now,
        };
        state.files.push(file.clone());
        Ok(file)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<File>> {
        Ok(self.file(id))
    }

    async fn list_by_scope(
        &self,
        scope: &Scope,
        filter: &FileFilter,
        viewer_id: Uuid,
    ) -> Result<Vec<FileListing>> {
        let state = self.state.lock().unwrap();
        let listings = state
            .files
            .iter()
            .rev()
            .filter(|file| in_scope(file, scope))
            .map(|file| FileListing {
                is_favorited: state
                    .favorites
                    .iter()
                    .any(|fav| fav.file_id == file.id && fav.user_id == viewer_id),
                file: file.clone(),
            })
            .filter(|listing| filter.matches(&listing.file, listing.is_favorited))
            .collect();

        Ok(listings)
    }

    async fn set_should_delete(&self, id: Uuid, should_delete: bool) -> Result<Option<File>> {
        let mut state = self.state.lock().unwrap();
        let Some(file) = state.files.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };

        let now = Utc::now();
        file.marked_for_deletion_at = if should_delete {
            file.marked_for_deletion_at.or(Some(now))
        } else {
            None
        };
        file.should_delete = should_delete;
        file.updated_at = now;
        Ok(Some(file.clone()))
    }

    async fn list_pending_deletion(
        &self,
        cutoff: DateTime<Utc>,
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<File>> {
        let state = self.state.lock().unwrap();
        let mut due: Vec<File> = state
            .files
            .iter()
            .filter(|f| f.should_delete && f.marked_for_deletion_at.is_none_or(|at| at <= cutoff))
            .filter(|f| !exclude.contains(&f.id))
            .cloned()
            .collect();
        due.sort_by_key(|f| (f.marked_for_deletion_at, f.id));
        due.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(due)
    }

    async fn purge_if_flagged(&self, id: Uuid, blobs: &dyn BlobStore) -> Result<Option<File>> {
        let Some(file) = self.file(id).filter(|f| f.should_delete) else {
            return Ok(None);
        };

        // Nothing is removed unless the blob is gone
        blobs.release(&file.blob_handle).await?;

        let mut state = self.state.lock().unwrap();
        state.files.retain(|f| f.id != id);
        state.favorites.retain(|fav| fav.file_id != id);
        Ok(Some(file))
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn toggle(&self, user_id: Uuid, file_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.favorites.len();
        state
            .favorites
            .retain(|fav| !(fav.user_id == user_id && fav.file_id == file_id));
        if state.favorites.len() < before {
            return Ok(false);
        }

        state.favorites.push(Favorite {
            id: Uuid::now_v7(),
            file_id,
            user_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_for_user_in_scope(&self, user_id: Uuid, scope: &Scope) -> Result<Vec<Favorite>> {
        let state = self.state.lock().unwrap();
        let favorites = state
            .favorites
            .iter()
            .rev()
            .filter(|fav| fav.user_id == user_id)
            .filter(|fav| {
                state
                    .files
                    .iter()
                    .any(|file| file.id == fav.file_id && in_scope(file, scope))
            })
            .cloned()
            .collect();

        Ok(favorites)
    }
}

/// Blob store that hands out fake URLs and records released handles
#[derive(Default)]
pub struct RecordingBlobStore {
    released: Mutex<Vec<String>>,
    fail_release: AtomicBool,
}

impl RecordingBlobStore {
    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }

    pub fn fail_releases(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn issue_upload_target(&self) -> Result<UploadTarget> {
        let blob_handle = format!("uploads/{}", Uuid::now_v7());
        Ok(UploadTarget {
            upload_url: format!("https://blobs.test/{}?upload=1", blob_handle),
            blob_handle,
        })
    }

    async fn release(&self, handle: &str) -> Result<()> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService(format!(
                "Failed to delete blob '{}'",
                handle
            )));
        }
        self.released.lock().unwrap().push(handle.to_string());
        Ok(())
    }

    async fn resolve_url(&self, handle: &str) -> Result<String> {
        Ok(format!("https://blobs.test/{}?download=1", handle))
    }
}

pub fn identity(issuer: &str, sub: &str) -> AuthenticatedUser {
    AuthenticatedUser::new(issuer, sub)
}

/// The verified identity behind a seeded user
pub fn caller_of(user: &User) -> AuthenticatedUser {
    let sub = user
        .token_identifier
        .rsplit('|')
        .next()
        .unwrap_or_default()
        .to_string();
    AuthenticatedUser {
        token_identifier: user.token_identifier.clone(),
        sub,
    }
}

pub fn user_service(store: &Arc<MemoryStore>) -> Arc<UserService> {
    Arc::new(UserService::new(store.clone()))
}

pub fn file_service(store: &Arc<MemoryStore>) -> FileService {
    FileService::new(store.clone(), user_service(store), store.blobs.clone())
}

pub fn favorite_service(store: &Arc<MemoryStore>, files: Arc<FileService>) -> FavoriteService {
    FavoriteService::new(store.clone(), files, user_service(store))
}

/// Run every request of `router` as `caller`, as the optional auth middleware
/// would after accepting a token
pub fn with_caller(router: Router, caller: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let caller = caller.clone();
            async move {
                request.extensions_mut().insert(caller);
                next.run(request).await
            }
        },
    ))
}
