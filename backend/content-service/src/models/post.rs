//! Post aggregate
//!
//! A post owns its comments, and each comment owns its replies. Every mutation
//! goes through the root so one stored row is always internally consistent.

use chrono::{DateTime, Utc};
use db_pool::Pagination;
use error_types::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: usize,
}

/// Add `user_id` if absent, remove it if present.
fn toggle(likes: &mut BTreeSet<Uuid>, user_id: Uuid) -> LikeToggle {
    let liked = if likes.remove(&user_id) {
        false
    } else {
        likes.insert(user_id);
        true
    };

    LikeToggle {
        liked,
        likes_count: likes.len(),
    }
}

fn non_empty_text(text: &str, what: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{what} text must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub likes: BTreeSet<Uuid>,
    pub tagged_user_ids: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn toggle_like(&mut self, user_id: Uuid) -> LikeToggle {
        toggle(&mut self.likes, user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub likes: BTreeSet<Uuid>,
    /// Insertion order is display order
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn toggle_like(&mut self, user_id: Uuid) -> LikeToggle {
        toggle(&mut self.likes, user_id)
    }

    pub fn add_reply(
        &mut self,
        author_id: Uuid,
        text: &str,
        tagged_user_ids: BTreeSet<Uuid>,
    ) -> Result<Reply> {
        let reply = Reply {
            id: Uuid::new_v4(),
            author_id,
            text: non_empty_text(text, "reply")?,
            likes: BTreeSet::new(),
            tagged_user_ids,
            created_at: Utc::now(),
        };
        self.replies.push(reply.clone());
        Ok(reply)
    }

    pub fn reply(&self, reply_id: Uuid) -> Result<&Reply> {
        self.replies
            .iter()
            .find(|r| r.id == reply_id)
            .ok_or_else(|| ServiceError::NotFound(format!("reply {reply_id}")))
    }

    pub fn reply_mut(&mut self, reply_id: Uuid) -> Result<&mut Reply> {
        self.replies
            .iter_mut()
            .find(|r| r.id == reply_id)
            .ok_or_else(|| ServiceError::NotFound(format!("reply {reply_id}")))
    }

    /// Remove a reply on behalf of `requester_id`, who must be its author.
    pub fn remove_reply(&mut self, reply_id: Uuid, requester_id: Uuid) -> Result<Reply> {
        let index = self
            .replies
            .iter()
            .position(|r| r.id == reply_id)
            .ok_or_else(|| ServiceError::NotFound(format!("reply {reply_id}")))?;

        if self.replies[index].author_id != requester_id {
            return Err(ServiceError::Authorization(
                "only the author can delete this reply".into(),
            ));
        }
        Ok(self.replies.remove(index))
    }

    /// Replies oldest first, cut to one page, plus the total count.
    ///
    /// The sort is stable, so replies sharing a timestamp keep insertion order
    /// and consecutive pages never overlap.
    pub fn replies_page(&self, page: Pagination) -> (Vec<Reply>, usize) {
        let mut ordered: Vec<&Reply> = self.replies.iter().collect();
        ordered.sort_by_key(|r| r.created_at);

        let items = page.slice(&ordered).iter().map(|r| (*r).clone()).collect();
        (items, self.replies.len())
    }
}

/// Aggregate root, stored as one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub caption: Option<String>,
    pub media_ref: Option<String>,
    pub likes: BTreeSet<Uuid>,
    /// Insertion order is display order
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every successful write; used for compare-and-swap
    #[serde(default, skip_serializing)]
    pub version: i64,
}

impl Post {
    /// New post. At least one of caption and media is required.
    pub fn new(author_id: Uuid, caption: Option<String>, media_ref: Option<String>) -> Result<Self> {
        let caption = caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let media_ref = media_ref.filter(|m| !m.trim().is_empty());

        if caption.is_none() && media_ref.is_none() {
            return Err(ServiceError::Validation(
                "a post needs a caption or media".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            caption,
            media_ref,
            likes: BTreeSet::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
            version: 0,
        })
    }

    pub fn toggle_like(&mut self, user_id: Uuid) -> LikeToggle {
        toggle(&mut self.likes, user_id)
    }

    pub fn add_comment(&mut self, author_id: Uuid, text: &str) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            author_id,
            text: non_empty_text(text, "comment")?,
            likes: BTreeSet::new(),
            replies: Vec::new(),
            created_at: Utc::now(),
        };
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub fn comment(&self, comment_id: Uuid) -> Result<&Comment> {
        self.comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| ServiceError::NotFound(format!("comment {comment_id}")))
    }

    pub fn comment_mut(&mut self, comment_id: Uuid) -> Result<&mut Comment> {
        self.comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| ServiceError::NotFound(format!("comment {comment_id}")))
    }

    /// Remove a comment and its replies on behalf of `requester_id`, who must
    /// be its author.
    pub fn remove_comment(&mut self, comment_id: Uuid, requester_id: Uuid) -> Result<Comment> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| ServiceError::NotFound(format!("comment {comment_id}")))?;

        if self.comments[index].author_id != requester_id {
            return Err(ServiceError::Authorization(
                "only the author can delete this comment".into(),
            ));
        }
        Ok(self.comments.remove(index))
    }

    /// Every identity referenced by the aggregate, for batched profile lookup.
    pub fn referenced_user_ids(&self) -> BTreeSet<Uuid> {
        let mut ids = BTreeSet::from([self.author_id]);
        for comment in &self.comments {
            ids.insert(comment.author_id);
            for reply in &comment.replies {
                ids.insert(reply.author_id);
                ids.extend(reply.tagged_user_ids.iter().copied());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post() -> Post {
        Post::new(Uuid::new_v4(), Some("hello".into()), None).unwrap()
    }

    #[test]
    fn test_new_post_requires_caption_or_media() {
        let author = Uuid::new_v4();
        assert!(matches!(
            Post::new(author, Some("   ".into()), None),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            Post::new(author, None, Some("".into())),
            Err(ServiceError::Validation(_))
        ));

        let media_only = Post::new(author, None, Some("https://cdn/a.png".into())).unwrap();
        assert!(media_only.caption.is_none());
        assert_eq!(media_only.version, 0);
    }

    #[test]
    fn test_double_toggle_restores_count() {
        let mut post = post();
        let user = Uuid::new_v4();

        let first = post.toggle_like(user);
        assert_eq!(first, LikeToggle { liked: true, likes_count: 1 });

        let second = post.toggle_like(user);
        assert_eq!(second, LikeToggle { liked: false, likes_count: 0 });
    }

    #[test]
    fn test_likes_from_different_users_accumulate() {
        let mut post = post();
        post.toggle_like(Uuid::new_v4());
        let toggle = post.toggle_like(Uuid::new_v4());
        assert_eq!(toggle.likes_count, 2);
    }

    #[test]
    fn test_empty_comment_rejected() {
        let mut post = post();
        let err = post.add_comment(Uuid::new_v4(), "  \n ").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_comments_keep_insertion_order() {
        let mut post = post();
        let a = post.add_comment(Uuid::new_v4(), "first").unwrap();
        let b = post.add_comment(Uuid::new_v4(), "second").unwrap();

        let ids: Vec<Uuid> = post.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_only_author_removes_comment() {
        let mut post = post();
        let author = Uuid::new_v4();
        let comment = post.add_comment(author, "mine").unwrap();
        post.comment_mut(comment.id)
            .unwrap()
            .add_reply(Uuid::new_v4(), "reply", BTreeSet::new())
            .unwrap();

        let err = post.remove_comment(comment.id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
        assert_eq!(post.comments.len(), 1);

        let removed = post.remove_comment(comment.id, author).unwrap();
        assert_eq!(removed.replies.len(), 1);
        assert!(post.comments.is_empty());

        let err = post.remove_comment(comment.id, author).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_only_author_removes_reply() {
        let mut post = post();
        let comment = post.add_comment(Uuid::new_v4(), "c").unwrap();
        let replier = Uuid::new_v4();
        let comment = post.comment_mut(comment.id).unwrap();
        let reply = comment.add_reply(replier, "r", BTreeSet::new()).unwrap();

        assert!(matches!(
            comment.remove_reply(reply.id, Uuid::new_v4()),
            Err(ServiceError::Authorization(_))
        ));
        assert_eq!(comment.replies.len(), 1);

        comment.remove_reply(reply.id, replier).unwrap();
        assert!(matches!(
            comment.reply(reply.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_replies_pages_are_disjoint_and_complete() {
        let mut post = post();
        let comment = post.add_comment(Uuid::new_v4(), "c").unwrap();
        let comment = post.comment_mut(comment.id).unwrap();
        for i in 0..7 {
            comment
                .add_reply(Uuid::new_v4(), &format!("reply {i}"), BTreeSet::new())
                .unwrap();
        }

        let mut collected = Vec::new();
        for page in 1..=3 {
            let (items, total) = comment.replies_page(Pagination::new(page, 3).unwrap());
            assert_eq!(total, 7);
            collected.extend(items.into_iter().map(|r| r.text));
        }

        let expected: Vec<String> = (0..7).map(|i| format!("reply {i}")).collect();
        assert_eq!(collected, expected);

        let (beyond, total) = comment.replies_page(Pagination::new(4, 3).unwrap());
        assert!(beyond.is_empty());
        assert_eq!(total, 7);
    }

    #[test]
    fn test_replies_page_orders_by_creation_time() {
        let mut post = post();
        let comment = post.add_comment(Uuid::new_v4(), "c").unwrap();
        let comment = post.comment_mut(comment.id).unwrap();
        let late = comment.add_reply(Uuid::new_v4(), "late", BTreeSet::new()).unwrap();
        let early = comment.add_reply(Uuid::new_v4(), "early", BTreeSet::new()).unwrap();
        comment.reply_mut(early.id).unwrap().created_at = late.created_at - Duration::seconds(5);

        let (items, _) = comment.replies_page(Pagination::new(1, 10).unwrap());
        assert_eq!(items[0].id, early.id);
        assert_eq!(items[1].id, late.id);
    }

    #[test]
    fn test_referenced_user_ids() {
        let mut post = post();
        let commenter = Uuid::new_v4();
        let replier = Uuid::new_v4();
        let tagged = Uuid::new_v4();
        let comment = post.add_comment(commenter, "c").unwrap();
        post.comment_mut(comment.id)
            .unwrap()
            .add_reply(replier, "r", BTreeSet::from([tagged]))
            .unwrap();

        let ids = post.referenced_user_ids();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains(&post.author_id));
        assert!(ids.contains(&tagged));
    }
}
