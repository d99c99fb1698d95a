//! Spinners and the precache progress bar, with plain CI fallbacks

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }
}

/// Progress over the manifest while a version installs
///
/// Interactive terminals get an indicatif bar; CI gets one line per URL.
pub struct PrecacheProgress {
    bar: Option<ProgressBar>,
}

impl PrecacheProgress {
    pub fn new(ctx: &UiContext, version: &str, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            if let Ok(bar_style) = ProgressStyle::default_bar().template(
                "  {spinner:.cyan} Precaching {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}",
            ) {
                bar.set_style(bar_style.progress_chars("━╸─"));
            }
            bar.set_prefix(version.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Precaching {} ({} URLs)...", version, total);
            None
        };
        Self { bar }
    }

    /// Record one fetched manifest URL
    pub fn on_asset(&self, url: &str, ok: bool) {
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.set_message(url.to_string());
            }
            None => {
                let marker = if ok {
                    style("[OK]").green()
                } else {
                    style("[FAIL]").red()
                };
                println!("  {} {}", marker, url);
            }
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
