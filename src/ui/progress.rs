//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows once started in interactive mode)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar over the leaves being synchronized.
///
/// Shows an indicatif bar in interactive mode and one line per library
/// in CI.
pub struct SyncProgress {
    bar: Option<ProgressBar>,
    total: u64,
    done: u64,
}

impl SyncProgress {
    pub fn new(ctx: &UiContext, label: &str, total: usize) -> Self {
        let total = total as u64;
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total);
            if let Ok(template) = ProgressStyle::default_bar().template(
                "  {spinner:.blue} {prefix}  {bar:20.blue/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
            ) {
                bar.set_style(
                    template
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("{} {} libraries...", label, total);
            None
        };
        Self {
            bar,
            total,
            done: 0,
        }
    }

    /// Announce the library about to be processed
    pub fn start_item(&self, name: &str) {
        match self.bar {
            Some(ref bar) => bar.set_message(shorten(name)),
            None => println!("  [{}/{}] {}", self.done + 1, self.total, name),
        }
    }

    /// Mark the current library as done
    pub fn finish_item(&mut self) {
        self.done += 1;
        if let Some(ref bar) = self.bar {
            bar.set_position(self.done);
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Keep the bar message on one line
fn shorten(name: &str) -> String {
    const MAX: usize = 60;
    if name.chars().count() > MAX {
        let head: String = name.chars().take(MAX - 3).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}
