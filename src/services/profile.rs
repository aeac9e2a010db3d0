use crate::core::error::{IngestError, UpdateError};
use crate::media::layout::{ImageSlot, MediaLayout};
use crate::media::pipeline::ImagePipeline;
use crate::models::profile::ProfileImageUpdate;
use crate::models::user::{UserAccount, UserUpdate};
use crate::stores::user_store::UserStore;
use crate::utils::time::Clock;
use crate::validation::profile_form::ImageSources;
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sequences avatar/banner ingestion and commits the new references
pub struct ProfileService {
    store: Arc<dyn UserStore>,
    pipeline: Arc<ImagePipeline>,
    layout: MediaLayout,
    clock: Arc<dyn Clock>,
    remove_replaced: bool,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn UserStore>,
        pipeline: Arc<ImagePipeline>,
        layout: MediaLayout,
        clock: Arc<dyn Clock>,
        remove_replaced: bool,
    ) -> Self {
        Self {
            store,
            pipeline,
            layout,
            clock,
            remove_replaced,
        }
    }

    /// Replace a user's avatar and/or banner with images fetched from `sources`
    ///
    /// # Flow
    /// 1. Avatar (150x150), if requested. Failure aborts everything.
    /// 2. Banner (800x200), if requested. Failure aborts everything.
    /// 3. One partial account update with the new references.
    ///
    /// The account is only written after every requested image is on disk.
    /// Files written before a later failure stay behind unreferenced.
    pub async fn update_profile_images(
        &self,
        user_id: u32,
        sources: &ImageSources,
    ) -> Result<ProfileImageUpdate, UpdateError> {
        if sources.is_empty() {
            return Err(UpdateError::NothingToUpdate);
        }

        let previous = self
            .store
            .get_by_id(user_id)
            .ok_or(UpdateError::UserNotFound(user_id))?;

        let mut update = UserUpdate::default();

        if let Some(url) = &sources.avatar {
            let reference = self
                .ingest_slot(ImageSlot::Avatar, user_id, url)
                .await
                .map_err(UpdateError::AvatarProcessingFailed)?;
            update.avatar_url = Some(reference);
        }

        if let Some(url) = &sources.banner {
            let reference = match self.ingest_slot(ImageSlot::Banner, user_id, url).await {
                Ok(reference) => reference,
                Err(e) => {
                    if let Some(avatar) = &update.avatar_url {
                        warn!(user_id, orphan = %avatar, "Banner failed after avatar was stored");
                    }
                    return Err(UpdateError::BannerProcessingFailed(e));
                }
            };
            update.banner_url = Some(reference);
        }

        if let Err(e) = self.store.update_fields(user_id, &update) {
            warn!(
                user_id,
                avatar = ?update.avatar_url,
                banner = ?update.banner_url,
                error = %e,
                "Account update failed, stored images are unreferenced"
            );
            return Err(UpdateError::Persistence(e));
        }

        if self.remove_replaced {
            self.remove_replaced_files(&previous, &update).await;
        }

        info!(
            user_id,
            avatar = ?update.avatar_url,
            banner = ?update.banner_url,
            "Profile images updated"
        );

        Ok(ProfileImageUpdate {
            avatar_url: update.avatar_url,
            banner_url: update.banner_url,
        })
    }

    async fn ingest_slot(&self, slot: ImageSlot, user_id: u32, url: &Url) -> Result<String, IngestError> {
        let file_name = self
            .layout
            .asset_file_name(slot, user_id, self.clock.now_millis());
        let destination = self.layout.file_path(slot, &file_name);
        let (width, height) = slot.dimensions();

        debug!(user_id, slot = slot.role(), source = %url, "Ingesting profile image");

        match self.pipeline.ingest(url.as_str(), width, height, &destination).await {
            Ok(()) => Ok(self.layout.public_ref(slot, &file_name)),
            Err(e) => {
                warn!(user_id, slot = slot.role(), source = %url, error = %e, "Profile image ingestion failed");
                Err(e)
            }
        }
    }

    /// Best-effort removal of files no longer referenced after an update
    async fn remove_replaced_files(&self, previous: &UserAccount, update: &UserUpdate) {
        let replaced = [
            (ImageSlot::Avatar, previous.avatar_url.as_deref(), update.avatar_url.as_deref()),
            (ImageSlot::Banner, previous.banner_url.as_deref(), update.banner_url.as_deref()),
        ];

        for (slot, old, new) in replaced {
            let (Some(old), Some(new)) = (old, new) else {
                continue;
            };
            if old == new {
                continue;
            }
            let Some(path) = self.layout.resolve_ref(slot, old) else {
                continue;
            };

            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed replaced image"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove replaced image"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StoreError;
    use crate::media::test_support::spawn_image_server;
    use crate::stores::user_store::InMemoryUserStore;
    use crate::utils::time::ManualClock;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    const NOW: i64 = 1_700_000_000_000;

    struct Fixture {
        _temp_dir: TempDir,
        layout: MediaLayout,
        store: Arc<InMemoryUserStore>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let layout = MediaLayout::new(temp_dir.path().join("Media"));
            layout.ensure_directories().unwrap();

            let store = Arc::new(InMemoryUserStore::new());
            store
                .insert(UserAccount::new(7, "seven", "seven@example.com", "hash", NOW))
                .unwrap();

            Self {
                _temp_dir: temp_dir,
                layout,
                store,
                clock: Arc::new(ManualClock::new(NOW)),
            }
        }

        fn service(&self, remove_replaced: bool) -> ProfileService {
            self.service_with_store(self.store.clone(), remove_replaced)
        }

        fn service_with_store(&self, store: Arc<dyn UserStore>, remove_replaced: bool) -> ProfileService {
            let pipeline = ImagePipeline::new(Duration::from_secs(5), 1024 * 1024, 80).unwrap();
            ProfileService::new(
                store,
                Arc::new(pipeline),
                self.layout.clone(),
                self.clock.clone(),
                remove_replaced,
            )
        }

        fn files_in(&self, slot: ImageSlot) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(self.layout.slot_dir(slot))
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    fn sources(avatar: Option<String>, banner: Option<String>) -> ImageSources {
        ImageSources {
            avatar: avatar.map(|u| Url::parse(&u).unwrap()),
            banner: banner.map(|u| Url::parse(&u).unwrap()),
        }
    }

    fn dimensions(path: &Path) -> (u32, u32) {
        image::open(path).unwrap().to_rgb8().dimensions()
    }

    /// Store whose writes always fail
    struct ReadOnlyStore(InMemoryUserStore);

    impl UserStore for ReadOnlyStore {
        fn get_by_id(&self, id: u32) -> Option<UserAccount> {
            self.0.get_by_id(id)
        }

        fn update_fields(&self, _id: u32, _update: &UserUpdate) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
            self.0.insert(account)
        }
    }

    #[tokio::test]
    async fn test_avatar_and_banner_success() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();
        let service = fixture.service(false);

        let result = service
            .update_profile_images(
                7,
                &sources(Some(format!("{}/square.png", base)), Some(format!("{}/wide.png", base))),
            )
            .await
            .unwrap();

        let avatar_ref = format!("/Media/avatars/avatar_7_{}.jpg", NOW);
        let banner_ref = format!("/Media/banners/banner_7_{}.jpg", NOW);
        assert_eq!(result.avatar_url.as_deref(), Some(avatar_ref.as_str()));
        assert_eq!(result.banner_url.as_deref(), Some(banner_ref.as_str()));

        let user = fixture.store.get_by_id(7).unwrap();
        assert_eq!(user.avatar_url, Some(avatar_ref));
        assert_eq!(user.banner_url, Some(banner_ref));

        let avatar_path = fixture.layout.file_path(ImageSlot::Avatar, &format!("avatar_7_{}.jpg", NOW));
        let banner_path = fixture.layout.file_path(ImageSlot::Banner, &format!("banner_7_{}.jpg", NOW));
        assert_eq!(dimensions(&avatar_path), (150, 150));
        assert_eq!(dimensions(&banner_path), (800, 200));
    }

    #[tokio::test]
    async fn test_avatar_failure_aborts_everything() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();
        let service = fixture.service(false);

        let err = service
            .update_profile_images(
                7,
                &sources(Some(format!("{}/missing.png", base)), Some(format!("{}/wide.png", base))),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::AvatarProcessingFailed(IngestError::Status(404))));

        let user = fixture.store.get_by_id(7).unwrap();
        assert!(user.avatar_url.is_none());
        assert!(user.banner_url.is_none());
        assert!(fixture.files_in(ImageSlot::Avatar).is_empty());
        // Banner was never attempted
        assert!(fixture.files_in(ImageSlot::Banner).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_avatar_host() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fixture = Fixture::new();
        let err = fixture
            .service(false)
            .update_profile_images(7, &sources(Some(format!("http://{}/img.png", addr)), None))
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::AvatarProcessingFailed(IngestError::Fetch(_))));
        assert!(fixture.store.get_by_id(7).unwrap().avatar_url.is_none());
        assert!(fixture.files_in(ImageSlot::Avatar).is_empty());
    }

    #[tokio::test]
    async fn test_banner_failure_leaves_account_untouched() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();

        let err = fixture
            .service(false)
            .update_profile_images(
                7,
                &sources(Some(format!("{}/square.png", base)), Some(format!("{}/text.txt", base))),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::BannerProcessingFailed(IngestError::Decode(_))));

        let user = fixture.store.get_by_id(7).unwrap();
        assert!(user.avatar_url.is_none());
        assert!(user.banner_url.is_none());
        assert!(fixture.files_in(ImageSlot::Banner).is_empty());
    }

    #[tokio::test]
    async fn test_banner_only_keeps_avatar() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();
        fixture
            .store
            .update_fields(
                7,
                &UserUpdate {
                    avatar_url: Some("/Media/avatars/existing.jpg".to_string()),
                    banner_url: None,
                },
            )
            .unwrap();

        let result = fixture
            .service(false)
            .update_profile_images(7, &sources(None, Some(format!("{}/tall.png", base))))
            .await
            .unwrap();

        assert!(result.avatar_url.is_none());
        assert!(result.banner_url.is_some());

        let user = fixture.store.get_by_id(7).unwrap();
        assert_eq!(user.avatar_url.as_deref(), Some("/Media/avatars/existing.jpg"));
        assert_eq!(user.banner_url, result.banner_url);
    }

    #[tokio::test]
    async fn test_persistence_failure_reports_and_keeps_files() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();

        let inner = InMemoryUserStore::new();
        inner
            .insert(UserAccount::new(7, "seven", "seven@example.com", "hash", NOW))
            .unwrap();
        let service = fixture.service_with_store(Arc::new(ReadOnlyStore(inner)), false);

        let err = service
            .update_profile_images(7, &sources(Some(format!("{}/square.png", base)), None))
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::Persistence(StoreError::Unavailable(_))));
        assert_eq!(fixture.files_in(ImageSlot::Avatar), vec![format!("avatar_7_{}.jpg", NOW)]);
    }

    #[tokio::test]
    async fn test_nothing_to_update() {
        let fixture = Fixture::new();
        let err = fixture
            .service(false)
            .update_profile_images(7, &ImageSources::default())
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::NothingToUpdate));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();

        let err = fixture
            .service(false)
            .update_profile_images(99, &sources(Some(format!("{}/square.png", base)), None))
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::UserNotFound(99)));
        assert!(fixture.files_in(ImageSlot::Avatar).is_empty());
    }

    #[tokio::test]
    async fn test_previous_files_retained_by_default() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();
        let service = fixture.service(false);
        let avatar = sources(Some(format!("{}/square.png", base)), None);

        service.update_profile_images(7, &avatar).await.unwrap();
        fixture.clock.advance(1_000);
        service.update_profile_images(7, &avatar).await.unwrap();

        assert_eq!(
            fixture.files_in(ImageSlot::Avatar),
            vec![format!("avatar_7_{}.jpg", NOW), format!("avatar_7_{}.jpg", NOW + 1_000)]
        );
    }

    #[tokio::test]
    async fn test_replaced_files_removed_when_enabled() {
        let base = spawn_image_server().await;
        let fixture = Fixture::new();
        let service = fixture.service(true);
        let avatar = sources(Some(format!("{}/square.png", base)), None);

        service.update_profile_images(7, &avatar).await.unwrap();
        fixture.clock.advance(1_000);
        let second = service.update_profile_images(7, &avatar).await.unwrap();

        assert_eq!(
            fixture.files_in(ImageSlot::Avatar),
            vec![format!("avatar_7_{}.jpg", NOW + 1_000)]
        );
        assert_eq!(fixture.store.get_by_id(7).unwrap().avatar_url, second.avatar_url);
    }
}
