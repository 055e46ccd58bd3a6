/// Data models for content-service
///
/// - `post`: the post aggregate with its comment, reply and like sub-trees
/// - `view`: display-ready projections with author profiles resolved
pub mod post;
pub mod view;

pub use post::{Comment, LikeToggle, Post, Reply};
pub use view::{CommentView, PostView, Profiles, RepliesPage, ReplyView};
