/// Post service - every read and write on the post aggregate
///
/// Writes follow one pattern: load the aggregate, apply a pure mutation, then
/// compare-and-swap it back by version. A lost race re-reads and re-applies, so
/// concurrent likes from different users never overwrite each other.
use crate::db::PostStore;
use crate::models::{Comment, LikeToggle, Post, PostView, RepliesPage, Reply, ReplyView};
use crate::services::mention_parser::extract_mentions;
use crate::services::views::ViewBuilder;
use db_pool::Pagination;
use error_types::{Result, ServiceError};
use identity_client::{Identity, IdentityDirectory};
use resilience::RetryConfig;
use s3_utils::{MediaInput, ObjectStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    directory: Arc<dyn IdentityDirectory>,
    media: Arc<dyn ObjectStore>,
    views: ViewBuilder,
    write_retry: RetryConfig,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        directory: Arc<dyn IdentityDirectory>,
        media: Arc<dyn ObjectStore>,
        write_retry: RetryConfig,
    ) -> Self {
        let views = ViewBuilder::new(directory.clone());
        Self {
            posts,
            directory,
            media,
            views,
            write_retry,
        }
    }

    async fn load(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {post_id}")))
    }

    /// Apply `apply` to the current aggregate and store it if nobody else wrote
    /// in between. Errors from `apply` abort without writing anything.
    async fn mutate<R, F>(&self, post_id: Uuid, mut apply: F) -> Result<R>
    where
        F: FnMut(&mut Post) -> Result<R> + Send,
        R: Send,
    {
        let mut delays = self.write_retry.backoff();

        loop {
            let mut post = self.load(post_id).await?;
            let expected_version = post.version;

            let outcome = apply(&mut post)?;
            post.version = expected_version + 1;

            if self.posts.replace_if_version(&post, expected_version).await? {
                return Ok(outcome);
            }

            match delays.next() {
                Some(delay) => {
                    debug!(%post_id, expected_version, ?delay, "Post write lost a race, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(%post_id, "Post write retries exhausted");
                    return Err(ServiceError::Conflict(format!(
                        "post {post_id} is being modified concurrently, try again"
                    )));
                }
            }
        }
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        caption: Option<String>,
        media: Option<MediaInput>,
    ) -> Result<Post> {
        let has_caption = caption.as_deref().is_some_and(|c| !c.trim().is_empty());
        if !has_caption && media.is_none() {
            return Err(ServiceError::Validation(
                "a post needs a caption or media".into(),
            ));
        }

        let media_ref = match media {
            Some(input) => input.resolve(self.media.as_ref()).await?,
            None => None,
        };

        let post = Post::new(author_id, caption, media_ref)?;
        self.posts.insert(&post).await?;

        info!(post_id = %post.id, %author_id, has_media = post.media_ref.is_some(), "Post created");
        Ok(post)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<PostView> {
        let post = self.load(post_id).await?;
        self.views.post_view(&post).await
    }

    /// Posts by the account behind `handle`, newest first
    pub async fn get_profile_posts(&self, handle: &str) -> Result<Vec<PostView>> {
        let author = self
            .directory
            .resolve_by_handle(handle)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user @{handle}")))?;

        let posts = self.posts.find_by_authors(&[author.id]).await?;
        self.views.post_views(&posts).await
    }

    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        let toggle = self
            .mutate(post_id, |post| Ok(post.toggle_like(user_id)))
            .await?;

        debug!(%post_id, %user_id, liked = toggle.liked, "Post like toggled");
        Ok(toggle)
    }

    pub async fn get_post_likes(&self, post_id: Uuid) -> Result<Vec<Identity>> {
        let post = self.load(post_id).await?;
        self.views.likers(&post.likes).await
    }

    pub async fn add_comment(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Comment> {
        let comment = self
            .mutate(post_id, |post| post.add_comment(author_id, text))
            .await?;

        info!(%post_id, comment_id = %comment.id, %author_id, "Comment added");
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        requester_id: Uuid,
    ) -> Result<()> {
        let removed = self
            .mutate(post_id, |post| post.remove_comment(comment_id, requester_id))
            .await?;

        info!(%post_id, %comment_id, replies = removed.replies.len(), "Comment deleted");
        Ok(())
    }

    pub async fn toggle_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeToggle> {
        self.mutate(post_id, |post| {
            Ok(post.comment_mut(comment_id)?.toggle_like(user_id))
        })
        .await
    }

    pub async fn get_comment_likes(&self, post_id: Uuid, comment_id: Uuid) -> Result<Vec<Identity>> {
        let post = self.load(post_id).await?;
        let comment = post.comment(comment_id)?;
        self.views.likers(&comment.likes).await
    }

    /// Add a reply, tagging every mentioned handle that resolves.
    ///
    /// Unknown handles are dropped silently. The text keeps its `@handle`
    /// mentions and is stored with surrounding whitespace trimmed.
    pub async fn add_reply(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Reply> {
        if text.trim().is_empty() {
            return Err(ServiceError::Validation("reply text must not be empty".into()));
        }

        let handles = extract_mentions(text);
        let tagged: BTreeSet<Uuid> = if handles.is_empty() {
            BTreeSet::new()
        } else {
            let resolved = self.directory.resolve_handles(&handles).await?;
            debug!(
                mentioned = handles.len(),
                resolved = resolved.len(),
                "Resolved reply mentions"
            );
            resolved.into_iter().map(|identity| identity.id).collect()
        };

        let reply = self
            .mutate(post_id, |post| {
                post.comment_mut(comment_id)?
                    .add_reply(author_id, text, tagged.clone())
            })
            .await?;

        info!(%post_id, %comment_id, reply_id = %reply.id, tagged = reply.tagged_user_ids.len(), "Reply added");
        Ok(reply)
    }

    pub async fn delete_reply(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        reply_id: Uuid,
        requester_id: Uuid,
    ) -> Result<()> {
        self.mutate(post_id, |post| {
            post.comment_mut(comment_id)?
                .remove_reply(reply_id, requester_id)
        })
        .await?;

        info!(%post_id, %comment_id, %reply_id, "Reply deleted");
        Ok(())
    }

    pub async fn toggle_reply_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        reply_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeToggle> {
        self.mutate(post_id, |post| {
            Ok(post
                .comment_mut(comment_id)?
                .reply_mut(reply_id)?
                .toggle_like(user_id))
        })
        .await
    }

    pub async fn get_reply_likes(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        reply_id: Uuid,
    ) -> Result<Vec<Identity>> {
        let post = self.load(post_id).await?;
        let reply = post.comment(comment_id)?.reply(reply_id)?;
        self.views.likers(&reply.likes).await
    }

    /// Replies oldest first, one page at a time
    pub async fn get_replies_page(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        page: Pagination,
    ) -> Result<RepliesPage> {
        let post = self.load(post_id).await?;
        let (replies, total_replies) = post.comment(comment_id)?.replies_page(page);

        let profiles = self
            .views
            .profiles(replies.iter().flat_map(|r| {
                std::iter::once(r.author_id).chain(r.tagged_user_ids.iter().copied())
            }))
            .await?;

        Ok(RepliesPage {
            replies: replies
                .iter()
                .map(|r| ReplyView::build(r, &profiles))
                .collect(),
            total_replies,
        })
    }

    pub async fn health_check(&self) -> Result<()> {
        self.posts.health_check().await
    }
}
