//! Moderation — review of completed intake forms.

pub mod model;
pub mod relay;
pub mod render;

pub use model::{DecisionKind, ModerationDecision, SubmissionRecord};
pub use relay::ModerationRelay;
pub use render::escape_markdown_v2;
