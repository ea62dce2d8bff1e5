//! Sign-in window handling.
//!
//! The OAuth-style sign-in runs in an external browser window; the only
//! completion signal is the window closing. A trait-based abstraction keeps
//! the flow testable without spawning real browsers.

use std::process::{Child, Command};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

/// An opened sign-in window
pub trait SignInWindow: Send + Sync {
    /// Whether the window has been closed by the user
    fn is_closed(&self) -> bool;
}

/// Opens sign-in windows
pub trait SignInLauncher: Send + Sync {
    fn open(&self, url: &Url) -> Result<Box<dyn SignInWindow>>;
}

/// Build the window URL for a stored sign-in path, tagging the request the
/// way the service expects from external tooling.
pub fn signin_url(path: &str) -> Result<Url> {
    let mut url = Url::parse(path).with_context(|| format!("Invalid sign-in path: {path}"))?;
    url.query_pairs_mut().append_pair("extensionId", "cookie");
    Ok(url)
}

/// Poll until the window reports closed. There is deliberately no timeout:
/// the flow stays pending for as long as the user keeps the window open.
pub async fn wait_until_closed(window: &dyn SignInWindow, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; consume it so polling starts
    // one interval after the window opened.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if window.is_closed() {
            return;
        }
    }
}

/// Launcher that opens the platform browser as a child process
pub struct BrowserLauncher;

impl BrowserLauncher {
    pub fn new() -> Self {
        Self
    }

    fn command(url: &Url) -> Command {
        if let Ok(browser) = std::env::var("BROWSER") {
            let mut cmd = Command::new(browser);
            cmd.arg(url.as_str());
            return cmd;
        }
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            // -W keeps the child alive until the window is closed
            cmd.args(["-W", "-n", url.as_str()]);
            cmd
        }
        #[cfg(not(target_os = "macos"))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url.as_str());
            cmd
        }
    }
}

impl Default for BrowserLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl SignInLauncher for BrowserLauncher {
    fn open(&self, url: &Url) -> Result<Box<dyn SignInWindow>> {
        let child = Self::command(url)
            .spawn()
            .context("Failed to open the sign-in window")?;
        tracing::debug!(url = %url, pid = child.id(), "sign-in window opened");
        Ok(Box::new(BrowserWindow {
            child: Mutex::new(child),
        }))
    }
}

/// Window backed by the spawned browser process.
///
/// `is_closed` reports process exit; launchers that detach immediately make
/// the flow resolve on the first poll after spawn.
struct BrowserWindow {
    child: Mutex<Child>,
}

impl SignInWindow for BrowserWindow {
    fn is_closed(&self) -> bool {
        let mut child = match self.child.lock() {
            Ok(child) => child,
            Err(_) => return true,
        };
        match child.try_wait() {
            Ok(status) => status.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "sign-in window status check failed");
                true
            }
        }
    }
}
