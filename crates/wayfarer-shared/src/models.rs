//! Domain model structs exchanged with the backend collaborators.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be stored as
//! a document body and handed directly to the presentation layer.  Field
//! names are camelCase on the wire, matching the backend's document format.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_POST_LIFETIME_HOURS;
use crate::types::{ChatId, DestinationId, MessageId, PostId, SpaceId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user profile.  `id` is stable per account; anonymous users keep their
/// id when they later upgrade to a permanent account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub is_anonymous: bool,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post (story)
// ---------------------------------------------------------------------------

/// Media kind carried by a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Photo,
    Video,
    Text,
    Audio,
    Gif,
}

impl ContentKind {
    /// Text posts carry no media; every other kind expects a content URL.
    pub fn requires_media(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Who can see a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Followers,
    Private,
}

/// A feed post / story.  Counts are non-negative by construction (unsigned).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub kind: ContentKind,
    /// URL of the uploaded media; `None` only for [`ContentKind::Text`].
    pub content_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub text: Option<String>,
    pub like_count: u32,
    pub comment_count: u32,
    pub share_count: u32,
    pub visibility: Visibility,
    /// Whether the post is promoted onto the main feed in addition to the
    /// author's story strip.
    pub on_main_feed: bool,
    pub aspect_ratio: f32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Post {
    /// A post is active while its expiry timestamp lies in the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Default expiry for a post created at `created_at`.
    pub fn default_expiry(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::hours(DEFAULT_POST_LIFETIME_HOURS)
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A one-to-one conversation summary as shown in the chat list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub partner_id: UserId,
    pub partner_name: String,
    pub partner_photo_url: Option<String>,
    pub last_message: String,
    pub unread_count: u32,
}

/// A single message inside a one-to-one chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    /// `true` when the current user is the sender.
    pub is_mine: bool,
}

// ---------------------------------------------------------------------------
// Space (community)
// ---------------------------------------------------------------------------

/// A community space.  The member list is a snapshot taken at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub description: String,
    pub member_ids: Vec<UserId>,
    pub cover_url: Option<String>,
    pub unread_count: u32,
}

/// A message posted inside a space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMessage {
    pub id: MessageId,
    pub space_id: SpaceId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Category chips shown above the destination list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    All,
    Beach,
    Cultural,
    Safari,
    Mountain,
    City,
}

impl Category {
    /// Chip label, also the tag value used by the per-item rule.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Beach => "Beach",
            Self::Cultural => "Cultural",
            Self::Safari => "Safari",
            Self::Mountain => "Mountain",
            Self::City => "City",
        }
    }
}

/// A browsable travel destination.  `is_favorite` is user-specific and is
/// toggled locally; persistence only happens through the backend-backed
/// repository variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: DestinationId,
    pub title: String,
    pub country: String,
    pub image_url: String,
    pub description: String,
    pub rating: f32,
    pub review_count: u32,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

impl Destination {
    /// Fixed categorization rule: `All` matches everything, otherwise the
    /// category label must appear among the item's tags (case-insensitive).
    pub fn matches_category(&self, category: Category) -> bool {
        match category {
            Category::All => true,
            other => self
                .tags
                .iter()
                .any(|t| t.eq_ignore_ascii_case(other.label())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(expires_at: DateTime<Utc>) -> Post {
        Post {
            id: PostId::new(),
            author_id: UserId::new(),
            author_name: "Asha".to_string(),
            author_photo_url: None,
            kind: ContentKind::Text,
            content_url: None,
            thumbnail_url: None,
            text: Some("hello".to_string()),
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            visibility: Visibility::Public,
            on_main_feed: false,
            aspect_ratio: 1.0,
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn post_active_until_expiry() {
        let now = Utc::now();
        assert!(sample_post(now + Duration::minutes(1)).is_active(now));
        assert!(!sample_post(now - Duration::minutes(1)).is_active(now));
        assert!(!sample_post(now).is_active(now));
    }

    #[test]
    fn text_posts_need_no_media() {
        assert!(!ContentKind::Text.requires_media());
        assert!(ContentKind::Photo.requires_media());
        assert!(ContentKind::Audio.requires_media());
    }

    #[test]
    fn category_rule_is_case_insensitive() {
        let dest = Destination {
            id: DestinationId::new(),
            title: "Pyramids of Giza".to_string(),
            country: "Egypt".to_string(),
            image_url: String::new(),
            description: String::new(),
            rating: 4.8,
            review_count: 1200,
            tags: vec!["cultural".to_string()],
            is_favorite: false,
        };
        assert!(dest.matches_category(Category::All));
        assert!(dest.matches_category(Category::Cultural));
        assert!(!dest.matches_category(Category::Beach));
    }

    #[test]
    fn records_round_trip_as_documents() {
        let post = sample_post(Utc::now());
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("authorName").is_some());
        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }
}
