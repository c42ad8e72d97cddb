mod contest;
mod credential;
mod problem;
mod standings;

pub use contest::*;
pub use credential::*;
pub use problem::*;
pub use standings::*;
