use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::application::validation::{validate_post_form, validate_upload};
use crate::data::post_repository::{OrderColumn, OrderDirection, PostPage, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::policy;
use crate::domain::post::Post;
use crate::infrastructure::assets::{AssetStore, ImageUpload};
use crate::presentation::dto::PostForm;

/// Orchestrates the post lifecycle over the repository and the asset store.
///
/// Anonymous mutations go through lookups scoped by id, origin and recency, so
/// the eligibility check is part of the mutation predicate; any anonymous
/// failure surfaces as the one existence-hiding `Denied` error. Admin
/// mutations skip the ownership policy entirely.
#[derive(Clone)]
pub struct PostService<R: PostRepository + 'static, S: AssetStore + 'static> {
    repo: Arc<R>,
    assets: Arc<S>,
}

impl<R, S> PostService<R, S>
where
    R: PostRepository + 'static,
    S: AssetStore + 'static,
{
    pub fn new(repo: Arc<R>, assets: Arc<S>) -> Self {
        Self { repo, assets }
    }

    pub fn assets(&self) -> &S {
        &self.assets
    }

    pub async fn list(
        &self,
        column: OrderColumn,
        direction: OrderDirection,
        page: u32,
        page_size: u32,
    ) -> Result<PostPage, DomainError> {
        self.repo.list(column, direction, page, page_size).await
    }

    #[instrument(skip(self, form, image))]
    pub async fn create(
        &self,
        form: PostForm,
        requester_ip: String,
        image: Option<ImageUpload>,
    ) -> Result<Post, DomainError> {
        self.validate(&form, image.as_ref())?;

        let mut post = Post::new(form.name, form.email, form.text, requester_ip);
        if let Some(upload) = image {
            post.image = Some(self.assets.store(&upload).await?);
        }
        self.repo.create(post).await
    }

    #[instrument(skip(self, form, image))]
    pub async fn update(
        &self,
        id: Uuid,
        form: PostForm,
        requester_ip: &str,
        now: DateTime<Utc>,
        image: Option<ImageUpload>,
    ) -> Result<Post, DomainError> {
        self.validate(&form, image.as_ref())?;

        let cutoff = now - policy::edit_window();
        let existing = self
            .repo
            .find_owned(id, requester_ip, cutoff)
            .await?
            .ok_or(DomainError::Denied)?;
        if !policy::is_mutable(&existing, requester_ip, now) {
            return Err(DomainError::Denied);
        }

        let mut post = existing.clone();
        post.name = form.name;
        post.email = form.email;
        post.text = form.text;
        post.updated_at = now;
        if let Some(upload) = image {
            if let Some(old) = &existing.image {
                self.discard_asset(old).await;
            }
            post.image = Some(self.assets.store(&upload).await?);
        }

        self.repo
            .update_owned(&post, requester_ip, cutoff)
            .await?
            .ok_or(DomainError::Denied)
    }

    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        id: Uuid,
        requester_ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let cutoff = now - policy::edit_window();
        let existing = self
            .repo
            .find_owned(id, requester_ip, cutoff)
            .await?
            .ok_or(DomainError::Denied)?;
        if !policy::is_mutable(&existing, requester_ip, now) {
            return Err(DomainError::Denied);
        }

        if let Some(reference) = &existing.image {
            self.discard_asset(reference).await;
        }
        if self.repo.delete_owned(id, requester_ip, cutoff).await? {
            Ok(())
        } else {
            Err(DomainError::Denied)
        }
    }

    /// Create-or-update without any ownership check; the caller is an
    /// authenticated admin, enforced by the route middleware.
    #[instrument(skip(self, form, image))]
    pub async fn admin_store(
        &self,
        form: PostForm,
        requester_ip: String,
        image: Option<ImageUpload>,
    ) -> Result<Post, DomainError> {
        let id = match form.id {
            Some(id) => id,
            None => return self.create(form, requester_ip, image).await,
        };
        self.validate(&form, image.as_ref())?;

        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(id))?;

        let mut post = existing.clone();
        post.name = form.name;
        post.email = form.email;
        post.text = form.text;
        post.updated_at = Utc::now();
        if let Some(upload) = image {
            if let Some(old) = &existing.image {
                self.discard_asset(old).await;
            }
            post.image = Some(self.assets.store(&upload).await?);
        }

        self.repo
            .update(&post)
            .await?
            .ok_or(DomainError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn admin_delete(&self, id: Uuid) -> Result<(), DomainError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(id))?;

        if let Some(reference) = &existing.image {
            self.discard_asset(reference).await;
        }
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(id))
        }
    }

    fn validate(&self, form: &PostForm, image: Option<&ImageUpload>) -> Result<(), DomainError> {
        let mut errors = validate_post_form(form);
        if let Some(upload) = image {
            errors.extend(validate_upload(upload));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// A stale blob is an acceptable leak; a post blocked from deletion by its
    /// own image is not.
    async fn discard_asset(&self, reference: &str) {
        if let Err(e) = self.assets.delete(reference).await {
            warn!(reference = %reference, "failed to delete stale asset: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    struct MemoryPostRepository {
        posts: Mutex<Vec<Post>>,
    }

    impl MemoryPostRepository {
        fn new() -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
            }
        }

        fn with(posts: Vec<Post>) -> Self {
            Self {
                posts: Mutex::new(posts),
            }
        }

        fn owned(posts: &[Post], id: Uuid, ip: &str, cutoff: DateTime<Utc>) -> Option<Post> {
            posts
                .iter()
                .find(|p| {
                    p.id == id && p.ip_address.as_deref() == Some(ip) && p.created_at >= cutoff
                })
                .cloned()
        }
    }

    #[async_trait]
    impl PostRepository for MemoryPostRepository {
        async fn create(&self, post: Post) -> Result<Post, DomainError> {
            self.posts.lock().unwrap().push(post.clone());
            Ok(post)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
            Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn find_owned(
            &self,
            id: Uuid,
            ip_address: &str,
            cutoff: DateTime<Utc>,
        ) -> Result<Option<Post>, DomainError> {
            let posts = self.posts.lock().unwrap();
            Ok(Self::owned(&posts, id, ip_address, cutoff))
        }

        async fn update(&self, post: &Post) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            match posts.iter_mut().find(|p| p.id == post.id) {
                Some(slot) => {
                    *slot = post.clone();
                    Ok(Some(post.clone()))
                }
                None => Ok(None),
            }
        }

        async fn update_owned(
            &self,
            post: &Post,
            ip_address: &str,
            cutoff: DateTime<Utc>,
        ) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            if Self::owned(&posts, post.id, ip_address, cutoff).is_none() {
                return Ok(None);
            }
            let slot = posts.iter_mut().find(|p| p.id == post.id).unwrap();
            *slot = post.clone();
            Ok(Some(post.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let before = posts.len();
            posts.retain(|p| p.id != id);
            Ok(posts.len() < before)
        }

        async fn delete_owned(
            &self,
            id: Uuid,
            ip_address: &str,
            cutoff: DateTime<Utc>,
        ) -> Result<bool, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            if Self::owned(&posts, id, ip_address, cutoff).is_none() {
                return Ok(false);
            }
            posts.retain(|p| p.id != id);
            Ok(true)
        }

        async fn list(
            &self,
            _column: OrderColumn,
            direction: OrderDirection,
            _page: u32,
            _page_size: u32,
        ) -> Result<PostPage, DomainError> {
            let mut posts = self.posts.lock().unwrap().clone();
            posts.sort_by_key(|p| p.created_at);
            if direction == OrderDirection::Desc {
                posts.reverse();
            }
            let total = posts.len() as i64;
            Ok(PostPage { posts, total })
        }
    }

    /// Records every store/delete call; optionally fails deletes.
    struct RecordingAssetStore {
        stored: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
        fail_deletes: bool,
    }

    impl RecordingAssetStore {
        fn new() -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                fail_deletes: false,
            }
        }

        fn failing_deletes() -> Self {
            Self {
                fail_deletes: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl AssetStore for RecordingAssetStore {
        async fn store(&self, upload: &ImageUpload) -> Result<String, DomainError> {
            let reference = format!("post-images/{}", upload.filename);
            self.stored.lock().unwrap().push(reference.clone());
            Ok(reference)
        }

        async fn delete(&self, reference: &str) -> Result<(), DomainError> {
            if self.fail_deletes {
                return Err(DomainError::Storage("disk on fire".into()));
            }
            self.deleted.lock().unwrap().push(reference.to_string());
            Ok(())
        }

        fn url_for(&self, reference: &str) -> String {
            format!("/storage/{}", reference)
        }
    }

    fn service(
        repo: MemoryPostRepository,
        assets: RecordingAssetStore,
    ) -> PostService<MemoryPostRepository, RecordingAssetStore> {
        PostService::new(Arc::new(repo), Arc::new(assets))
    }

    fn form(name: &str) -> PostForm {
        PostForm {
            id: None,
            name: name.into(),
            email: "a@x.com".into(),
            text: "hi".into(),
        }
    }

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            filename: name.into(),
            bytes: vec![1, 2, 3],
        }
    }

    fn aged_post(ip: &str, age: Duration) -> Post {
        let mut post = Post::new("A".into(), "a@x.com".into(), "hi".into(), ip.into());
        post.created_at = post.created_at - age;
        post.updated_at = post.created_at;
        post
    }

    #[tokio::test]
    async fn create_records_origin_and_stores_one_asset() {
        let svc = service(MemoryPostRepository::new(), RecordingAssetStore::new());

        let post = svc
            .create(form("A"), "1.2.3.4".into(), Some(upload("cat.png")))
            .await
            .unwrap();

        assert_eq!(post.ip_address.as_deref(), Some("1.2.3.4"));
        assert_eq!(post.image.as_deref(), Some("post-images/cat.png"));
        assert_eq!(svc.assets().stored.lock().unwrap().len(), 1);
        assert!(svc.assets().deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_without_image_touches_no_assets() {
        let svc = service(MemoryPostRepository::new(), RecordingAssetStore::new());

        let post = svc.create(form("A"), "1.2.3.4".into(), None).await.unwrap();

        assert!(post.image.is_none());
        assert!(svc.assets().stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_invalid_form() {
        let svc = service(MemoryPostRepository::new(), RecordingAssetStore::new());

        let mut bad = form("A");
        bad.email = "nope".into();
        let err = svc.create(bad, "1.2.3.4".into(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn update_within_window_from_origin_succeeds() {
        let post = aged_post("1.2.3.4", Duration::minutes(3));
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        let updated = svc
            .update(id, form("B"), "1.2.3.4", Utc::now(), None)
            .await
            .unwrap();
        assert_eq!(updated.name, "B");
    }

    #[tokio::test]
    async fn update_from_other_origin_is_denied() {
        let post = aged_post("1.2.3.4", Duration::minutes(1));
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        let err = svc
            .update(id, form("B"), "5.6.7.8", Utc::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Denied));
    }

    #[tokio::test]
    async fn update_after_window_is_denied() {
        let post = aged_post("1.2.3.4", Duration::minutes(6));
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        let err = svc
            .update(id, form("B"), "1.2.3.4", Utc::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Denied));
    }

    #[tokio::test]
    async fn missing_post_is_denied_not_not_found() {
        let svc = service(MemoryPostRepository::new(), RecordingAssetStore::new());

        let err = svc
            .update(Uuid::new_v4(), form("B"), "1.2.3.4", Utc::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Denied));
    }

    #[tokio::test]
    async fn replacing_image_deletes_old_and_stores_new() {
        let mut post = aged_post("1.2.3.4", Duration::minutes(1));
        post.image = Some("post-images/old.png".into());
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        let updated = svc
            .update(id, form("A"), "1.2.3.4", Utc::now(), Some(upload("new.png")))
            .await
            .unwrap();

        assert_eq!(updated.image.as_deref(), Some("post-images/new.png"));
        assert_eq!(
            *svc.assets().deleted.lock().unwrap(),
            vec!["post-images/old.png".to_string()]
        );
        assert_eq!(svc.assets().stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_without_image_keeps_reference_and_touches_no_assets() {
        let mut post = aged_post("1.2.3.4", Duration::minutes(1));
        post.image = Some("post-images/keep.png".into());
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        let updated = svc
            .update(id, form("A"), "1.2.3.4", Utc::now(), None)
            .await
            .unwrap();

        assert_eq!(updated.image.as_deref(), Some("post-images/keep.png"));
        assert!(svc.assets().stored.lock().unwrap().is_empty());
        assert!(svc.assets().deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_asset_then_record() {
        let mut post = aged_post("1.2.3.4", Duration::minutes(1));
        post.image = Some("post-images/a.png".into());
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        svc.delete(id, "1.2.3.4", Utc::now()).await.unwrap();

        assert!(svc.repo.find_by_id(id).await.unwrap().is_none());
        assert_eq!(
            *svc.assets().deleted.lock().unwrap(),
            vec!["post-images/a.png".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_without_image_makes_zero_asset_calls() {
        let post = aged_post("1.2.3.4", Duration::minutes(1));
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        svc.delete(id, "1.2.3.4", Utc::now()).await.unwrap();

        assert!(svc.assets().deleted.lock().unwrap().is_empty());
        assert!(svc.assets().stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn asset_delete_failure_does_not_block_record_delete() {
        let mut post = aged_post("1.2.3.4", Duration::minutes(1));
        post.image = Some("post-images/a.png".into());
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::failing_deletes(),
        );

        svc.delete(id, "1.2.3.4", Utc::now()).await.unwrap();
        assert!(svc.repo.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_store_ignores_origin_and_window() {
        let post = aged_post("1.2.3.4", Duration::hours(3));
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        let mut update = form("moderated");
        update.id = Some(id);
        let updated = svc
            .admin_store(update, "9.9.9.9".into(), None)
            .await
            .unwrap();

        assert_eq!(updated.name, "moderated");
        // the original submitter's origin is preserved
        assert_eq!(updated.ip_address.as_deref(), Some("1.2.3.4"));
    }

    #[tokio::test]
    async fn admin_delete_of_missing_post_is_not_found() {
        let svc = service(MemoryPostRepository::new(), RecordingAssetStore::new());

        let err = svc.admin_delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_delete_discards_asset() {
        let mut post = aged_post("1.2.3.4", Duration::hours(3));
        post.image = Some("post-images/a.png".into());
        let id = post.id;
        let svc = service(
            MemoryPostRepository::with(vec![post]),
            RecordingAssetStore::new(),
        );

        svc.admin_delete(id).await.unwrap();
        assert_eq!(svc.assets().deleted.lock().unwrap().len(), 1);
    }
}
