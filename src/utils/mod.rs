use anyhow::Result;
use std::collections::HashSet;
use std::hash::Hash;
use url::Url;

use crate::youtube::VideoId;

/// Prefix of the short video URL reported for each transcript
pub const SHORT_VIDEO_URL_PREFIX: &str = "https://youtu.be/";

/// Validate a URL, requiring an HTTP(S) scheme
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

/// Trim a caller-supplied channel reference and add a scheme to bare YouTube URLs
pub fn normalize_reference(reference: &str) -> Result<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        anyhow::bail!("channel_url must not be empty");
    }

    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let bare_youtube = trimmed.starts_with("youtube.com")
        || trimmed.starts_with("www.youtube.com")
        || trimmed.starts_with("m.youtube.com");

    if !has_scheme && bare_youtube {
        Ok(format!("https://{}", trimmed))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Short watch URL for a video
pub fn video_url(id: &VideoId) -> String {
    format!("{}{}", SHORT_VIDEO_URL_PREFIX, id)
}

/// Drop repeated items, keeping the first occurrence of each
pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}
