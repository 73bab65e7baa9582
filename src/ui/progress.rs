//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

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
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

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

/// Progress of the manifest fetches during install.
///
/// An indicatif bar in interactive mode, one line per entry in CI.
pub struct InstallProgress {
    bar: Option<ProgressBar>,
}

impl InstallProgress {
    pub fn new(ctx: &UiContext, version: &str, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            let bar_style = ProgressStyle::default_bar()
                .template("  {spinner:.blue} Installing {prefix}  {bar:20.blue/dim} {pos}/{len} {msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(bar_style);
            bar.set_prefix(version.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Installing {} ({} assets)...", version, total);
            None
        };
        Self { bar }
    }

    /// Called once per manifest entry that was fetched
    pub fn on_fetched(&self, url: &Url) {
        match self.bar {
            Some(ref bar) => {
                bar.inc(1);
                bar.set_message(short_url(url));
            }
            None => println!("  fetched {}", url),
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Last path segment of a URL, for compact progress messages
fn short_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Activating...");
        spinner.stop("Done");
    }

    #[test]
    fn install_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = InstallProgress::new(&ctx, "v2", 1);
        progress.on_fetched(&Url::parse("https://scanner.example/logo.png").unwrap());
        progress.finish();
    }

    #[test]
    fn short_url_uses_last_segment() {
        let url = Url::parse("https://cdn.example/npm/quagga2/dist/quagga.min.js").unwrap();
        assert_eq!(short_url(&url), "quagga.min.js");

        let root = Url::parse("https://cdn.example/").unwrap();
        assert_eq!(short_url(&root), "https://cdn.example/");
    }
}
