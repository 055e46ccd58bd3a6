use crate::models::{Post, PostView, Profiles};
use error_types::Result;
use identity_client::{Identity, IdentityDirectory};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Resolves the ids inside posts to profile summaries with one batched lookup.
#[derive(Clone)]
pub struct ViewBuilder {
    directory: Arc<dyn IdentityDirectory>,
}

impl ViewBuilder {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    pub async fn profiles(&self, ids: impl IntoIterator<Item = Uuid>) -> Result<Profiles> {
        let ids: Vec<Uuid> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        Ok(Profiles(self.directory.resolve_ids(&ids).await?))
    }

    pub async fn post_view(&self, post: &Post) -> Result<PostView> {
        let profiles = self.profiles(post.referenced_user_ids()).await?;
        Ok(PostView::build(post, &profiles))
    }

    pub async fn post_views(&self, posts: &[Post]) -> Result<Vec<PostView>> {
        let profiles = self
            .profiles(posts.iter().flat_map(|p| p.referenced_user_ids()))
            .await?;
        Ok(posts.iter().map(|p| PostView::build(p, &profiles)).collect())
    }

    /// Profiles for a like set, in set order; unknown ids are dropped.
    pub async fn likers(&self, likes: &BTreeSet<Uuid>) -> Result<Vec<Identity>> {
        let ids: Vec<Uuid> = likes.iter().copied().collect();
        let mut resolved = self.directory.resolve_ids(&ids).await?;
        Ok(ids.iter().filter_map(|id| resolved.remove(id)).collect())
    }
}
