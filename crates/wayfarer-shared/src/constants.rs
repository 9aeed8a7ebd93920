/// Application name
pub const APP_NAME: &str = "Wayfarer";

/// Document collection holding user profiles
pub const USERS_COLLECTION: &str = "users";

/// Document collection holding feed posts
pub const POSTS_COLLECTION: &str = "posts";

/// Document collection holding spaces (communities)
pub const SPACES_COLLECTION: &str = "spaces";

/// Document collection holding backend-persisted destinations
pub const DESTINATIONS_COLLECTION: &str = "destinations";

/// Per-space message collection name
pub fn space_messages_collection(space_id: &str) -> String {
    format!("spaces/{space_id}/messages")
}

/// Blob path for a post's primary media file
pub fn post_media_path(author_id: &str, post_id: &str) -> String {
    format!("posts/{author_id}/{post_id}/media")
}

/// Blob path for a post's thumbnail
pub fn post_thumbnail_path(author_id: &str, post_id: &str) -> String {
    format!("posts/{author_id}/{post_id}/thumb")
}

/// Blob path for a user's avatar image
pub fn avatar_path(user_id: &str) -> String {
    format!("avatars/{user_id}")
}

/// Maximum avatar upload size in bytes (5 MiB)
pub const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// Maximum post media upload size in bytes (50 MiB)
pub const MAX_MEDIA_SIZE: usize = 50 * 1024 * 1024;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default lifetime of a story post before it expires, in hours
pub const DEFAULT_POST_LIFETIME_HOURS: i64 = 24;
