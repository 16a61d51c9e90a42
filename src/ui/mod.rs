//! Terminal output for buildc commands
//!
//! Uses `cliclack` for prompts and spinners and `indicatif` for the sync
//! progress bar, with plain line output in CI and other non-interactive
//! environments.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{remark, step_error, step_ok, step_ok_detail, step_warn_hint};
pub use progress::{SyncProgress, TaskSpinner};
pub use prompts::confirm;
