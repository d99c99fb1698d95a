//! Terminal output for the host CLI
//!
//! Uses `cliclack` and `indicatif` in interactive terminals and falls back to
//! plain `[OK]`/`[WARN]` lines in CI or when output is piped.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, outro_success, remark, section, step_info, step_ok,
    step_ok_detail, step_warn_hint,
};
pub use progress::{PrecacheProgress, TaskSpinner};
pub use prompts::confirm;
