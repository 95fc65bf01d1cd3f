//! crates/somnova_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Store-assigned identifier for a user row.
pub type UserId = i64;

/// Store-assigned identifier for a dream row.
pub type DreamId = i64;

/// Represents a dreamer, keyed by their login email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// A single journal entry: the fragment the user submitted and the completed
/// narrative the generation service returned for it. Dreams are only ever
/// created and read, never edited.
#[derive(Debug, Clone)]
pub struct Dream {
    pub id: DreamId,
    pub user_id: UserId,
    pub content: String,
    pub completed_text: String,
    pub created_at: DateTime<Utc>,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// The raw multi-modal input collected by the dream form before completion.
/// Images and the voice clip are the decoded bytes of whatever the browser
/// captured.
#[derive(Debug, Clone, Default)]
pub struct DreamFragment {
    pub text: Option<String>,
    pub images: Vec<Vec<u8>>,
    pub voice_clip: Option<Vec<u8>>,
}

impl DreamFragment {
    /// True when the submission carried no text, images, or voice at all.
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty())
            && self.images.is_empty()
            && self.voice_clip.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fragment_is_empty() {
        let fragment = DreamFragment {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(fragment.is_empty());
        assert!(DreamFragment::default().is_empty());
    }

    #[test]
    fn any_modality_makes_fragment_non_empty() {
        let with_text = DreamFragment {
            text: Some("a bridge made of glass".to_string()),
            ..Default::default()
        };
        let with_image = DreamFragment {
            images: vec![vec![0xff, 0xd8]],
            ..Default::default()
        };
        let with_voice = DreamFragment {
            voice_clip: Some(vec![0x1a]),
            ..Default::default()
        };
        assert!(!with_text.is_empty());
        assert!(!with_image.is_empty());
        assert!(!with_voice.is_empty());
    }
}
