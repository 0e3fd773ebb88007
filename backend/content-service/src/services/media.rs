//! Media classification and input validation for mutations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::Media;

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Captures the 11-character video id from the link shapes YouTube hands out.
static YOUTUBE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/|v/)|youtu\.be/)([a-z0-9_-]{11})(?:[?&#/]\S*)?$",
    )
    .expect("youtube link pattern is valid")
});

/// Normalized embed URL if `raw` is a recognized video link.
pub fn youtube_embed_url(raw: &str) -> Option<String> {
    YOUTUBE_LINK
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|id| format!("{}{}", YOUTUBE_EMBED_BASE, id.as_str()))
}

/// Classify a client-supplied media reference. Empty input means no media.
pub fn classify_media(raw: &str) -> Option<Media> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match youtube_embed_url(raw) {
        Some(embed_url) => Some(Media::Video { embed_url }),
        None => Some(Media::Image {
            url: raw.to_string(),
        }),
    }
}

/// Trimmed text, or a validation error naming `field` if nothing is left.
pub fn require_text(raw: &str, field: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMBED: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ";

    #[test]
    fn test_youtube_links_normalize_to_embed() {
        let links = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "  https://youtu.be/dQw4w9WgXcQ  ",
        ];

        for link in links {
            assert_eq!(youtube_embed_url(link).as_deref(), Some(EMBED), "{}", link);
        }
    }

    #[test]
    fn test_non_video_is_image() {
        assert_eq!(
            classify_media("https://cdn.example.com/cat.png"),
            Some(Media::Image {
                url: "https://cdn.example.com/cat.png".into()
            })
        );
        // Too short to be a video id
        assert!(matches!(
            classify_media("https://youtu.be/abc"),
            Some(Media::Image { .. })
        ));
        assert!(matches!(
            classify_media("https://vimeo.com/123456"),
            Some(Media::Image { .. })
        ));
    }

    #[test]
    fn test_video_classification() {
        assert_eq!(
            classify_media("https://youtu.be/dQw4w9WgXcQ"),
            Some(Media::Video {
                embed_url: EMBED.into()
            })
        );
    }

    #[test]
    fn test_empty_media_is_none() {
        assert_eq!(classify_media(""), None);
        assert_eq!(classify_media("   "), None);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("  hello ", "body").unwrap(), "hello");
        assert!(matches!(
            require_text(" \n\t", "body"),
            Err(AppError::ValidationError(_))
        ));
    }
}
