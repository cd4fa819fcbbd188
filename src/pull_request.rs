//! Release pull request title and body.
pub mod body;
pub mod title;

pub use body::{PullRequestBody, ReleaseData};
pub use title::PullRequestTitle;
