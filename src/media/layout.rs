use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Profile image slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Avatar,
    Banner,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 2] = [ImageSlot::Avatar, ImageSlot::Banner];

    /// Prefix used in generated file names
    pub fn role(self) -> &'static str {
        match self {
            ImageSlot::Avatar => "avatar",
            ImageSlot::Banner => "banner",
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            ImageSlot::Avatar => "avatars",
            ImageSlot::Banner => "banners",
        }
    }

    /// Output box as (width, height)
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ImageSlot::Avatar => (150, 150),
            ImageSlot::Banner => (800, 200),
        }
    }
}

/// On-disk and public naming of profile images
///
/// Files live at `<media_root>/<slot dir>/<role>_<user>_<millis>.jpg` and are
/// referenced from accounts as `/Media/<slot dir>/<file>`.
#[derive(Debug, Clone)]
pub struct MediaLayout {
    media_root: PathBuf,
}

impl MediaLayout {
    pub const PUBLIC_PREFIX: &'static str = "/Media";

    pub fn new(media_root: PathBuf) -> Self {
        Self { media_root }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn slot_dir(&self, slot: ImageSlot) -> PathBuf {
        self.media_root.join(slot.dir_name())
    }

    pub fn asset_file_name(&self, slot: ImageSlot, user_id: u32, timestamp_millis: i64) -> String {
        format!("{}_{}_{}.jpg", slot.role(), user_id, timestamp_millis)
    }

    pub fn file_path(&self, slot: ImageSlot, file_name: &str) -> PathBuf {
        self.slot_dir(slot).join(file_name)
    }

    pub fn public_ref(&self, slot: ImageSlot, file_name: &str) -> String {
        format!("{}/{}/{}", Self::PUBLIC_PREFIX, slot.dir_name(), file_name)
    }

    /// Map a stored reference back to a file inside this slot's directory.
    /// Anything else (defaults, remote URLs, other directories) yields `None`.
    pub fn resolve_ref(&self, slot: ImageSlot, reference: &str) -> Option<PathBuf> {
        let prefix = format!("{}/{}/", Self::PUBLIC_PREFIX, slot.dir_name());
        let file_name = reference.strip_prefix(&prefix)?;

        let is_plain_name = !file_name.is_empty()
            && !file_name.contains(|c| c == '/' || c == '\\')
            && file_name != "."
            && file_name != "..";

        is_plain_name.then(|| self.file_path(slot, file_name))
    }

    /// Create the avatar and banner directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for slot in ImageSlot::ALL {
            let dir = self.slot_dir(slot);
            std::fs::create_dir_all(&dir)
                .context(format!("Failed to create media directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
