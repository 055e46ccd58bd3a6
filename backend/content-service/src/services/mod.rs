/// Business logic layer for content-service
///
/// - Post service: the post aggregate and its sub-trees
/// - Feed assembler: follow graph joined against the post store
/// - Mention parser: handles referenced in reply text
pub mod feed;
pub mod mention_parser;
pub mod posts;
pub mod views;

pub use feed::FeedAssembler;
pub use mention_parser::extract_mentions;
pub use posts::PostService;
pub use views::ViewBuilder;
