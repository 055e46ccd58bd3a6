/// Feed assembly - followees of the viewer plus the viewer, newest first
///
/// Stateless and read-only. The follow graph is the only input that may be
/// unavailable; any failure there is reported as a retryable dependency error.
use crate::db::PostStore;
use crate::models::PostView;
use crate::services::views::ViewBuilder;
use error_types::{Result, ServiceError};
use graph_service::FollowGraphStore;
use identity_client::IdentityDirectory;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct FeedAssembler {
    graph: Arc<dyn FollowGraphStore>,
    posts: Arc<dyn PostStore>,
    views: ViewBuilder,
}

impl FeedAssembler {
    pub fn new(
        graph: Arc<dyn FollowGraphStore>,
        posts: Arc<dyn PostStore>,
        directory: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self {
            graph,
            posts,
            views: ViewBuilder::new(directory),
        }
    }

    pub async fn build_feed(&self, viewer_id: Uuid) -> Result<Vec<PostView>> {
        let mut authors = self.graph.list_followees(viewer_id).await.map_err(|e| {
            warn!(%viewer_id, error = %e, "Follow graph lookup failed");
            match e {
                ServiceError::Dependency(_) => e,
                other => ServiceError::Dependency(format!("follow graph: {other}")),
            }
        })?;
        authors.insert(viewer_id);

        let author_ids: Vec<Uuid> = authors.into_iter().collect();
        let mut posts = self.posts.find_by_authors(&author_ids).await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(%viewer_id, authors = author_ids.len(), posts = posts.len(), "Feed assembled");
        self.views.post_views(&posts).await
    }
}
