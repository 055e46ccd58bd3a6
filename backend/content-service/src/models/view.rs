//! Display-ready projections of the post aggregate
//!
//! Raw ids are swapped for profile summaries; like sets become counts plus the
//! liker ids so clients can render "liked by you".

use super::post::{Comment, Post, Reply};
use chrono::{DateTime, Utc};
use identity_client::Identity;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Lookup table from id to profile, falling back to a placeholder.
pub struct Profiles(pub HashMap<Uuid, Identity>);

impl Profiles {
    pub fn get(&self, id: Uuid) -> Identity {
        self.0.get(&id).cloned().unwrap_or_else(|| Identity::unknown(id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    pub id: Uuid,
    pub author: Identity,
    pub text: String,
    pub likes: Vec<Uuid>,
    pub likes_count: usize,
    pub tagged_users: Vec<Identity>,
    pub created_at: DateTime<Utc>,
}

impl ReplyView {
    pub fn build(reply: &Reply, profiles: &Profiles) -> Self {
        Self {
            id: reply.id,
            author: profiles.get(reply.author_id),
            text: reply.text.clone(),
            likes: reply.likes.iter().copied().collect(),
            likes_count: reply.likes.len(),
            tagged_users: reply
                .tagged_user_ids
                .iter()
                .map(|id| profiles.get(*id))
                .collect(),
            created_at: reply.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: Identity,
    pub text: String,
    pub likes: Vec<Uuid>,
    pub likes_count: usize,
    pub replies_count: usize,
    pub replies: Vec<ReplyView>,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn build(comment: &Comment, profiles: &Profiles) -> Self {
        Self {
            id: comment.id,
            author: profiles.get(comment.author_id),
            text: comment.text.clone(),
            likes: comment.likes.iter().copied().collect(),
            likes_count: comment.likes.len(),
            replies_count: comment.replies.len(),
            replies: comment
                .replies
                .iter()
                .map(|r| ReplyView::build(r, profiles))
                .collect(),
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: Identity,
    pub caption: String,
    pub media_ref: Option<String>,
    pub likes: Vec<Uuid>,
    pub likes_count: usize,
    pub comments_count: usize,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
}

impl PostView {
    pub fn build(post: &Post, profiles: &Profiles) -> Self {
        Self {
            id: post.id,
            author: profiles.get(post.author_id),
            caption: post.caption.clone().unwrap_or_default(),
            media_ref: post.media_ref.clone(),
            likes: post.likes.iter().copied().collect(),
            likes_count: post.likes.len(),
            comments_count: post.comments.len(),
            comments: post
                .comments
                .iter()
                .map(|c| CommentView::build(c, profiles))
                .collect(),
            created_at: post.created_at,
        }
    }
}

/// One page of replies plus the comment's total reply count
#[derive(Debug, Clone, Serialize)]
pub struct RepliesPage {
    pub replies: Vec<ReplyView>,
    pub total_replies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_unknown_author_gets_placeholder() {
        let author = Uuid::new_v4();
        let mut post = Post::new(author, Some("hi".into()), None).unwrap();
        post.toggle_like(Uuid::new_v4());
        let comment = post.add_comment(Uuid::new_v4(), "c").unwrap();
        post.comment_mut(comment.id)
            .unwrap()
            .add_reply(Uuid::new_v4(), "r", BTreeSet::new())
            .unwrap();

        let view = PostView::build(&post, &Profiles(HashMap::new()));

        assert_eq!(view.author.id, author);
        assert!(view.author.handle.is_empty());
        assert_eq!(view.likes_count, 1);
        assert_eq!(view.comments_count, 1);
        assert_eq!(view.comments[0].replies_count, 1);
        assert_eq!(view.caption, "hi");
    }
}
