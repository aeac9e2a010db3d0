use crate::core::error::UpdateError;
use reqwest::Url;
use serde::Deserialize;

/// Form body of `POST /profile/update-image`
#[derive(Debug, Default, Deserialize)]
pub struct ProfileImageForm {
    #[serde(rename = "avatarUrl", default)]
    pub avatar_url: Option<String>,

    #[serde(rename = "bannerUrl", default)]
    pub banner_url: Option<String>,
}

/// Image sources that passed validation. Blank fields become `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageSources {
    pub avatar: Option<Url>,
    pub banner: Option<Url>,
}

impl ImageSources {
    pub fn is_empty(&self) -> bool {
        self.avatar.is_none() && self.banner.is_none()
    }
}

impl ProfileImageForm {
    pub fn validate(self) -> Result<ImageSources, UpdateError> {
        Ok(ImageSources {
            avatar: parse_image_url("avatarUrl", self.avatar_url.as_deref())?,
            banner: parse_image_url("bannerUrl", self.banner_url.as_deref())?,
        })
    }
}

fn parse_image_url(field: &'static str, raw: Option<&str>) -> Result<Option<Url>, UpdateError> {
    let trimmed = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let url = Url::parse(trimmed).map_err(|e| UpdateError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UpdateError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UpdateError::InvalidUrl {
            field,
            reason: "missing host".to_string(),
        });
    }

    Ok(Some(url))
}
