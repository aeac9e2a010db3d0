// Application state (AppState)

use crate::core::config::Config;
use crate::media::layout::MediaLayout;
use crate::media::pipeline::ImagePipeline;
use crate::services::profile::ProfileService;
use crate::stores::{presence_store::PresenceTracker, user_store::UserStore};
use crate::utils::time::Clock;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
///
/// Contains all shared components that are accessed by request handlers.
/// All fields are wrapped in Arc for efficient cloning across threads.
#[derive(Clone)]
pub struct AppState {
    /// Account store backing profile reads and image reference updates
    pub user_store: Arc<dyn UserStore>,

    /// Online-users tracker, touched by every request
    pub presence: Arc<PresenceTracker>,

    /// Avatar/banner update orchestration
    pub profile_service: Arc<ProfileService>,

    /// Where profile images live on disk
    pub layout: MediaLayout,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, user_store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let config = Arc::new(config);
        let layout = MediaLayout::new(config.media_root());

        let pipeline = Arc::new(ImagePipeline::new(
            Duration::from_secs(config.media.fetch_timeout_secs),
            config.media.max_image_bytes,
            config.media.jpeg_quality,
        )?);

        let profile_service = Arc::new(ProfileService::new(
            Arc::clone(&user_store),
            pipeline,
            layout.clone(),
            Arc::clone(&clock),
            config.media.remove_replaced,
        ));

        Ok(Self {
            user_store,
            presence: Arc::new(PresenceTracker::new(clock, config.presence.ttl_ms)),
            profile_service,
            layout,
            config,
        })
    }
}
