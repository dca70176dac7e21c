mod compose;
mod create;
mod query;
mod show;
mod transfer;

pub use compose::{ComponentOptions, cmd_add_component, cmd_add_files};
pub use create::cmd_create;
pub use query::{cmd_dates, cmd_files, cmd_target, cmd_versions};
pub use show::cmd_show;
pub use transfer::{cmd_fetch, cmd_publish};
