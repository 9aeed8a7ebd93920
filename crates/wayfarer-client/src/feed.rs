//! Feed/story state holder.
//!
//! Streams the posts collection and exposes it as an observable ordered
//! list; every push from the backend fully replaces the local list.  Also
//! owns the post-creation pipeline (validate, upload media, write document).

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use wayfarer_backend::{BlobStore, Document, DocumentStore};
use wayfarer_shared::constants::{post_media_path, post_thumbnail_path, POSTS_COLLECTION};
use wayfarer_shared::{ClientError, ContentKind, Post, PostId, Result, User, Visibility};

use crate::observable::{Observable, Remote};

/// Incremental progress reported while a post is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// Media (and thumbnail) bytes are being uploaded to blob storage.
    Uploading,
    /// The post document is being written.
    Saving,
}

/// A post as composed on the create screen, before ids and URLs exist.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub media: Option<Bytes>,
    pub thumbnail: Option<Bytes>,
    pub text: Option<String>,
    pub kind: ContentKind,
    pub visibility: Visibility,
    pub promote_to_main_feed: bool,
    pub aspect_ratio: f32,
}

pub struct FeedController {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    posts: Observable<Remote<Vec<Post>>>,
}

impl FeedController {
    /// Subscribe to the posts collection and start mirroring it.  Must be
    /// called from within a runtime; the forwarding task ends when the
    /// controller is dropped.
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        let ctrl = Arc::new(Self {
            documents,
            blobs,
            posts: Observable::new(Remote::Loading),
        });

        let mut rx = ctrl.documents.watch(POSTS_COLLECTION);
        let weak = Arc::downgrade(&ctrl);
        tokio::spawn(async move {
            if let Some(ctrl) = weak.upgrade() {
                match ctrl.documents.list(POSTS_COLLECTION).await {
                    Ok(snapshot) => ctrl.apply_snapshot(snapshot),
                    Err(err) => ctrl.posts.set(Remote::Failed(err.to_string())),
                }
            }
            loop {
                match rx.recv().await {
                    Ok(snapshot) => match weak.upgrade() {
                        Some(ctrl) => ctrl.apply_snapshot(snapshot),
                        None => break,
                    },
                    // A lagged watcher just waits for the next full snapshot.
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "feed watcher lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        ctrl
    }

    /// The feed, in backend order.  Stream failures surface here as
    /// `Remote::Failed`; an empty collection is `Ready` with an empty list.
    pub fn posts(&self) -> &Observable<Remote<Vec<Post>>> {
        &self.posts
    }

    /// Unexpired posts in random order, for the story strip.
    pub fn story_strip(&self) -> Vec<Post> {
        let mut stories: Vec<Post> = self
            .posts
            .get()
            .ready()
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.is_active(Utc::now()))
            .collect();
        stories.shuffle(&mut rand::thread_rng());
        stories
    }

    /// Create a post: validate, upload media under the author's namespace,
    /// then write the post document.
    ///
    /// `on_progress` fires at least once before the call resolves; the
    /// returned `Result` is the single terminal outcome.  If the document
    /// write fails after an upload succeeded, the error is surfaced as-is
    /// and the uploaded blob is left in place (no rollback).
    pub async fn create_post(
        &self,
        author: &User,
        draft: NewPost,
        mut on_progress: impl FnMut(UploadPhase) + Send,
    ) -> Result<Post> {
        let text = draft.text.as_deref().map(str::trim).unwrap_or_default();
        if draft.kind == ContentKind::Text && text.is_empty() {
            return Err(ClientError::Validation(
                "a text post needs some text".to_string(),
            ));
        }
        if draft.kind.requires_media() && draft.media.is_none() {
            return Err(ClientError::Validation(
                "this post type needs a media file".to_string(),
            ));
        }

        let post_id = PostId::new();
        let mut content_url = None;
        let mut thumbnail_url = None;

        if let Some(media) = draft.media {
            on_progress(UploadPhase::Uploading);
            let path = post_media_path(author.id.as_str(), post_id.as_str());
            self.blobs.upload(&path, media).await?;
            content_url = Some(self.blobs.download_url(&path).await?);

            if let Some(thumb) = draft.thumbnail {
                let path = post_thumbnail_path(author.id.as_str(), post_id.as_str());
                self.blobs.upload(&path, thumb).await?;
                thumbnail_url = Some(self.blobs.download_url(&path).await?);
            }
        }

        on_progress(UploadPhase::Saving);
        let created_at = Utc::now();
        let post = Post {
            id: post_id,
            author_id: author.id.clone(),
            author_name: author.display_name.clone(),
            author_photo_url: author.photo_url.clone(),
            kind: draft.kind,
            content_url,
            thumbnail_url,
            text: (!text.is_empty()).then(|| text.to_string()),
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            visibility: draft.visibility,
            on_main_feed: draft.promote_to_main_feed,
            aspect_ratio: draft.aspect_ratio,
            created_at,
            expires_at: Post::default_expiry(created_at),
        };

        self.documents
            .set(
                POSTS_COLLECTION,
                post.id.as_str(),
                serde_json::to_value(&post).map_err(|e| ClientError::Network(e.to_string()))?,
            )
            .await?;

        info!(post = %post.id, author = %author.id.short(), "post created");
        Ok(post)
    }

    fn apply_snapshot(&self, snapshot: Vec<Document>) {
        let mut posts = Vec::with_capacity(snapshot.len());
        for doc in snapshot {
            match doc.decode::<Post>() {
                Ok(post) => posts.push(post),
                Err(err) => {
                    // An undecodable document is a stream failure, not a
                    // silently shorter list.
                    self.posts.set(Remote::Failed(err.to_string()));
                    return;
                }
            }
        }
        self.posts.set(Remote::Ready(posts));
    }
}
