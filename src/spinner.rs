use std::time::Duration;

use indicatif::ProgressBar;

/// Start a stderr spinner on a 100ms tick. The engine finishes and clears it
/// before running any page handler, so prompts are never garbled, and starts
/// a fresh one once the handler returns.
#[must_use]
pub fn start(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
