//! Registration wizard: a fixed linear sequence of forms driven by
//! submissions and two asynchronous collaborators (the lookup endpoint and
//! the external sign-in window).
//!
//! The wizard is an ordered list of step identifiers plus a single current
//! index, owned by [`RegisterWizard`]. Views never move the wizard
//! themselves: they call the transition methods and subscribe to the typed
//! [`ProgressEvent`] broadcast to stay in sync.
//!
//! Asynchronous submissions are split in two so the event loop stays
//! responsive: `begin_*` validates the guard and returns a call object, the
//! caller runs it (usually on a spawned task), and `complete_*` applies the
//! outcome. The `submit_*` helpers run both halves inline for callers that
//! can await.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::api::{parse_github_url, parse_trailing_repo, AdminApi, AdminError, RepoInfo};
use crate::config::Config;

pub mod signin;
pub mod types;

pub use types::{ProgressEvent, StepForm, WizardStep};

#[cfg(test)]
mod tests;

use signin::{signin_url, wait_until_closed, SignInLauncher, SignInWindow};

/// Wizard controller owning the step sequence and per-step form state
pub struct RegisterWizard {
    api: Arc<dyn AdminApi>,
    launcher: Arc<dyn SignInLauncher>,
    endpoints: crate::config::EndpointsConfig,
    post_signin_step: WizardStep,
    disconnect_regress_steps: usize,
    signin_poll_interval: Duration,
    forms: Vec<StepForm>,
    current: usize,
    repo_info: Option<RepoInfo>,
    progress: broadcast::Sender<ProgressEvent>,
}

/// In-flight repository lookup
pub struct LookupCall {
    api: Arc<dyn AdminApi>,
    pub owner: String,
    pub repo: String,
}

impl LookupCall {
    pub async fn run(self) -> Result<RepoInfo, AdminError> {
        self.api.repo_info(&self.owner, &self.repo).await
    }
}

/// In-flight sign-in: poll the window, then fetch profile and fresh info
pub struct SignInCall {
    api: Arc<dyn AdminApi>,
    window: Box<dyn SignInWindow>,
    poll_interval: Duration,
    pub owner: String,
    pub repo: String,
}

impl SignInCall {
    pub async fn run(self) -> Result<RepoInfo, AdminError> {
        wait_until_closed(self.window.as_ref(), self.poll_interval).await;
        tracing::debug!(owner = %self.owner, repo = %self.repo, "sign-in window closed");
        let profile = self.api.profile(&self.owner, &self.repo).await?;
        let mut info = self.api.repo_info(&self.owner, &self.repo).await?;
        info.auth_info = Some(profile);
        Ok(info)
    }
}

/// In-flight disconnect; returns refreshed info on success
pub struct DisconnectCall {
    api: Arc<dyn AdminApi>,
    pub owner: String,
    pub repo: String,
}

impl DisconnectCall {
    pub async fn run(self) -> Result<RepoInfo, AdminError> {
        self.api.disconnect(&self.owner, &self.repo).await?;
        self.api.repo_info(&self.owner, &self.repo).await
    }
}

impl RegisterWizard {
    pub fn new(api: Arc<dyn AdminApi>, launcher: Arc<dyn SignInLauncher>, config: &Config) -> Self {
        let step_count = WizardStep::all().len();
        let mut forms = vec![StepForm::default(); step_count];
        forms[0].enabled = true;
        let (progress, _) = broadcast::channel(32);
        Self {
            api,
            launcher,
            endpoints: config.endpoints.clone(),
            post_signin_step: config.wizard.post_signin_step.into(),
            disconnect_regress_steps: config.wizard.disconnect_regress_steps,
            signin_poll_interval: Duration::from_millis(config.wizard.signin_poll_interval_ms),
            forms,
            current: 0,
            repo_info: None,
            progress,
        }
    }

    /// Subscribe to transition events for a progress view
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    pub fn current_step(&self) -> WizardStep {
        WizardStep::from_index(self.current).expect("current index is always a valid step")
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.forms.len()
    }

    pub fn form(&self, step: WizardStep) -> &StepForm {
        &self.forms[step.index()]
    }

    pub fn repo_info(&self) -> Option<&RepoInfo> {
        self.repo_info.as_ref()
    }

    fn form_mut(&mut self, step: WizardStep) -> &mut StepForm {
        &mut self.forms[step.index()]
    }

    /// Move the wizard by `steps`, leaving exactly one form enabled, and
    /// broadcast the transition with the same step delta.
    fn shift(&mut self, steps: usize, forward: bool) {
        let target = if forward {
            self.current + steps
        } else {
            self.current.saturating_sub(steps)
        };
        debug_assert!(target < self.forms.len());
        let target = target.min(self.forms.len() - 1);
        for (i, form) in self.forms.iter_mut().enumerate() {
            form.enabled = i == target;
        }
        self.current = target;
        tracing::debug!(step = self.current_step().id(), "wizard moved");
        let _ = self.progress.send(ProgressEvent::Step { forward, steps });
    }

    fn advance(&mut self, steps: usize) {
        self.shift(steps, true);
    }

    fn regress(&mut self, steps: usize) {
        self.shift(steps, false);
    }

    /// Re-enable the active form and show the failure inline. No transition.
    fn fail_current(&mut self, err: &AdminError) {
        tracing::warn!(step = self.current_step().id(), error = %err, "submission failed");
        let message = err.message().to_string();
        let form = &mut self.forms[self.current];
        form.busy = false;
        form.enabled = true;
        form.error = Some(message);
    }

    /// Submit the github step. Returns the lookup call if the URL parses to
    /// an owner/repo pair; otherwise the submission is ignored.
    pub fn begin_github(&mut self, url: &str) -> Option<LookupCall> {
        if self.current_step() != WizardStep::Github || self.form(WizardStep::Github).busy {
            return None;
        }
        let Some((owner, repo)) = parse_github_url(url) else {
            tracing::debug!(input = url, "not a github repository url");
            return None;
        };
        let form = self.form_mut(WizardStep::Github);
        form.busy = true;
        form.enabled = false;
        form.error = None;
        Some(LookupCall {
            api: self.api.clone(),
            owner,
            repo,
        })
    }

    /// Apply a lookup outcome: populate the info table, store the sign-in
    /// and disconnect target paths, and advance to the sign-in step.
    pub fn complete_github(&mut self, result: Result<RepoInfo, AdminError>) {
        match result {
            Ok(info) => {
                let login = self.endpoints.login_url(&info.owner, &info.repo);
                let disconnect = self.endpoints.disconnect_url(&info.owner, &info.repo);
                self.form_mut(WizardStep::SignIn).target_path = Some(login);
                self.form_mut(WizardStep::Disconnect).target_path = Some(disconnect);
                self.repo_info = Some(info);
                self.form_mut(WizardStep::Github).busy = false;
                self.advance(1);
            }
            Err(err) => self.fail_current(&err),
        }
    }

    /// Submit the sign-in step: open the window on the stored path and hand
    /// back the polling call. The wizard stays pending until the window
    /// closes; there is no timeout.
    pub fn begin_signin(&mut self) -> Option<SignInCall> {
        if self.current_step() != WizardStep::SignIn || self.form(WizardStep::SignIn).busy {
            return None;
        }
        let Some(path) = self.form(WizardStep::SignIn).target_path.clone() else {
            return None;
        };
        let url = match signin_url(&path) {
            Ok(url) => url,
            Err(e) => {
                self.fail_current(&AdminError::service("signin", e.to_string()));
                return None;
            }
        };
        let Some((owner, repo)) = parse_trailing_repo(&path) else {
            self.fail_current(&AdminError::service("signin", "sign-in path has no owner/repo"));
            return None;
        };
        match self.launcher.open(&url) {
            Ok(window) => {
                let form = self.form_mut(WizardStep::SignIn);
                form.busy = true;
                form.enabled = false;
                form.error = None;
                Some(SignInCall {
                    api: self.api.clone(),
                    window,
                    poll_interval: self.signin_poll_interval,
                    owner,
                    repo,
                })
            }
            Err(e) => {
                self.fail_current(&AdminError::network("signin", e.to_string()));
                None
            }
        }
    }

    /// Apply a sign-in outcome: attach the profile, refresh the info table,
    /// and advance to the configured connect step.
    pub fn complete_signin(&mut self, result: Result<RepoInfo, AdminError>) {
        match result {
            Ok(info) => {
                self.repo_info = Some(info);
                self.form_mut(WizardStep::SignIn).busy = false;
                let steps = self.post_signin_step.index() - WizardStep::SignIn.index();
                self.advance(steps);
            }
            Err(err) => self.fail_current(&err),
        }
    }

    /// Connect via the user path, skipping the app step
    pub fn submit_connect_user(&mut self) {
        if self.current_step() == WizardStep::ConnectUser {
            self.advance(2);
        }
    }

    /// Connect via the app installation path
    pub fn submit_connect_app(&mut self) {
        if self.current_step() == WizardStep::ConnectApp {
            self.advance(1);
        }
    }

    /// Submit the disconnect step. The owner/repo pair comes from the
    /// trailing segments of the stored path.
    pub fn begin_disconnect(&mut self) -> Option<DisconnectCall> {
        if self.current_step() != WizardStep::Disconnect || self.form(WizardStep::Disconnect).busy {
            return None;
        }
        let Some(path) = self.form(WizardStep::Disconnect).target_path.clone() else {
            return None;
        };
        let Some((owner, repo)) = parse_trailing_repo(&path) else {
            tracing::debug!(path = %path, "disconnect path has no owner/repo");
            return None;
        };
        let form = self.form_mut(WizardStep::Disconnect);
        form.busy = true;
        form.enabled = false;
        form.error = None;
        Some(DisconnectCall {
            api: self.api.clone(),
            owner,
            repo,
        })
    }

    /// Apply a disconnect outcome: on success replace the info table with the
    /// refreshed state (dropping the signed-in profile) and regress the
    /// configured number of steps; on failure stay put with an inline error.
    pub fn complete_disconnect(&mut self, result: Result<RepoInfo, AdminError>) {
        match result {
            Ok(info) => {
                self.repo_info = Some(info);
                self.form_mut(WizardStep::Disconnect).busy = false;
                self.regress(self.disconnect_regress_steps);
            }
            Err(err) => self.fail_current(&err),
        }
    }

    /// Reset every form to its initial state, discard the looked-up info,
    /// and notify the progress view.
    pub fn reset(&mut self) {
        for (i, form) in self.forms.iter_mut().enumerate() {
            *form = StepForm {
                enabled: i == 0,
                ..StepForm::default()
            };
        }
        self.current = 0;
        self.repo_info = None;
        let _ = self.progress.send(ProgressEvent::Reset);
    }

    /// Run the github submission inline
    pub async fn submit_github(&mut self, url: &str) {
        if let Some(call) = self.begin_github(url) {
            let result = call.run().await;
            self.complete_github(result);
        }
    }

    /// Run the sign-in submission inline. Blocks until the window closes.
    pub async fn submit_signin(&mut self) {
        if let Some(call) = self.begin_signin() {
            let result = call.run().await;
            self.complete_signin(result);
        }
    }

    /// Run the disconnect submission inline
    pub async fn submit_disconnect(&mut self) {
        if let Some(call) = self.begin_disconnect() {
            let result = call.run().await;
            self.complete_disconnect(result);
        }
    }
}
