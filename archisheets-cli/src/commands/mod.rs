mod auth;
mod chapter;
mod config_cmd;
mod doc;
mod placeholder;
mod project;
mod session;

pub use auth::AuthCommand;
pub use chapter::ChapterCommand;
pub use config_cmd::ConfigCommand;
pub use doc::DocCommand;
pub use placeholder::PlaceholderCommand;
pub use project::ProjectCommand;
