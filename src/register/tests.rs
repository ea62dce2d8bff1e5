//! Tests for the registration wizard

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::signin::{SignInLauncher, SignInWindow};
use super::{ProgressEvent, RegisterWizard, WizardStep};
use crate::api::{AdminApi, AdminError, LogEntry, Profile, RepoInfo};
use crate::config::{Config, PostSignInStep};

/// Scripted admin service
#[derive(Default)]
struct MockApi {
    lookup_error: Option<String>,
    disconnect_failure: Option<(u16, String)>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminApi for MockApi {
    async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, AdminError> {
        self.calls.lock().unwrap().push(format!("info {owner}/{repo}"));
        if let Some(message) = &self.lookup_error {
            return Err(AdminError::service("lookup", message.clone()));
        }
        Ok(RepoInfo {
            owner: owner.to_string(),
            repo: repo.to_string(),
            auth_info: None,
            extra: BTreeMap::new(),
        })
    }

    async fn profile(&self, owner: &str, repo: &str) -> Result<Profile, AdminError> {
        self.calls.lock().unwrap().push(format!("profile {owner}/{repo}"));
        Ok(Profile {
            name: "Jane Doe".to_string(),
            email: "jane@acme.dev".to_string(),
        })
    }

    async fn disconnect(&self, owner: &str, repo: &str) -> Result<(), AdminError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("disconnect {owner}/{repo}"));
        if let Some((status, text)) = &self.disconnect_failure {
            return Err(AdminError::http("disconnect", *status, text.clone()));
        }
        Ok(())
    }

    async fn logs(
        &self,
        _owner: &str,
        _repo: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, AdminError> {
        Ok(Vec::new())
    }

    async fn invalidate(&self, _fields: &[(String, String)]) -> Result<String, AdminError> {
        Ok(String::new())
    }
}

/// Window that closes after a fixed number of polls
struct CountdownWindow {
    remaining: AtomicUsize,
}

impl SignInWindow for CountdownWindow {
    fn is_closed(&self) -> bool {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return true;
        }
        self.remaining.fetch_sub(1, Ordering::SeqCst);
        false
    }
}

/// Launcher recording opened URLs, handing out countdown windows
struct MockLauncher {
    window_polls: usize,
    opened: Mutex<Vec<String>>,
}

impl MockLauncher {
    fn new(window_polls: usize) -> Self {
        Self {
            window_polls,
            opened: Mutex::new(Vec::new()),
        }
    }

    fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl SignInLauncher for MockLauncher {
    fn open(&self, url: &reqwest::Url) -> anyhow::Result<Box<dyn SignInWindow>> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(Box::new(CountdownWindow {
            remaining: AtomicUsize::new(self.window_polls),
        }))
    }
}

fn make_wizard(api: Arc<MockApi>, launcher: Arc<MockLauncher>, config: &Config) -> RegisterWizard {
    RegisterWizard::new(api, launcher, config)
}

fn enabled_count(wizard: &RegisterWizard) -> usize {
    WizardStep::all()
        .iter()
        .filter(|s| wizard.form(**s).enabled)
        .count()
}

/// Drain pending progress events into a cumulative index delta
fn cumulative_delta(rx: &mut broadcast::Receiver<ProgressEvent>) -> i64 {
    let mut delta = 0i64;
    while let Ok(event) = rx.try_recv() {
        match event {
            ProgressEvent::Reset => delta = 0,
            ProgressEvent::Step { forward, steps } => {
                if forward {
                    delta += steps as i64;
                } else {
                    delta -= steps as i64;
                }
            }
        }
    }
    delta
}

#[test]
fn test_new_wizard_starts_on_github_with_only_github_enabled() {
    let wizard = make_wizard(
        Arc::new(MockApi::default()),
        Arc::new(MockLauncher::new(0)),
        &Config::default(),
    );
    assert_eq!(wizard.current_step(), WizardStep::Github);
    assert!(wizard.form(WizardStep::Github).enabled);
    assert_eq!(enabled_count(&wizard), 1);
    assert!(wizard.repo_info().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_forward_walk_keeps_one_form_enabled_and_progress_in_sync() {
    let api = Arc::new(MockApi::default());
    let launcher = Arc::new(MockLauncher::new(2));
    let mut wizard = make_wizard(api.clone(), launcher.clone(), &Config::default());
    let mut progress = wizard.subscribe_progress();

    wizard.submit_github("https://github.com/acme/site").await;
    assert_eq!(wizard.current_step(), WizardStep::SignIn);
    assert_eq!(enabled_count(&wizard), 1);
    assert_eq!(cumulative_delta(&mut progress), wizard.current_index() as i64);
    assert_eq!(api.calls(), vec!["info acme/site"]);

    // Downstream forms got their target paths from the lookup
    assert_eq!(
        wizard.form(WizardStep::SignIn).target_path.as_deref(),
        Some("https://admin.siteworks.dev/login/acme/site")
    );
    assert_eq!(
        wizard.form(WizardStep::Disconnect).target_path.as_deref(),
        Some("https://admin.siteworks.dev/register/disconnect/acme/site")
    );

    wizard.submit_signin().await;
    assert_eq!(wizard.current_step(), WizardStep::ConnectUser);
    assert_eq!(enabled_count(&wizard), 1);
    assert_eq!(cumulative_delta(&mut progress), wizard.current_index() as i64);

    // The window was opened on the stored path, tagged for the service
    assert_eq!(
        launcher.opened(),
        vec!["https://admin.siteworks.dev/login/acme/site?extensionId=cookie"]
    );
    let info = wizard.repo_info().unwrap();
    assert_eq!(
        info.auth_info.as_ref().map(Profile::display).as_deref(),
        Some("Jane Doe <jane@acme.dev>")
    );

    // Connect-user skips the app step straight to disconnect
    wizard.submit_connect_user();
    assert_eq!(wizard.current_step(), WizardStep::Disconnect);
    assert_eq!(enabled_count(&wizard), 1);
    assert_eq!(cumulative_delta(&mut progress), wizard.current_index() as i64);
}

#[tokio::test]
async fn test_lookup_error_never_advances() {
    let api = Arc::new(MockApi {
        lookup_error: Some("unknown repository".to_string()),
        ..MockApi::default()
    });
    let mut wizard = make_wizard(api, Arc::new(MockLauncher::new(0)), &Config::default());
    let mut progress = wizard.subscribe_progress();

    wizard.submit_github("https://github.com/acme/site").await;

    assert_eq!(wizard.current_step(), WizardStep::Github);
    let form = wizard.form(WizardStep::Github);
    assert!(form.enabled);
    assert!(!form.busy);
    assert_eq!(form.error.as_deref(), Some("unknown repository"));
    assert!(wizard.repo_info().is_none());
    assert_eq!(cumulative_delta(&mut progress), 0);
}

#[tokio::test]
async fn test_unparseable_github_url_is_ignored() {
    let api = Arc::new(MockApi::default());
    let mut wizard = make_wizard(api.clone(), Arc::new(MockLauncher::new(0)), &Config::default());

    wizard.submit_github("https://github.com/acme").await;
    wizard.submit_github("not a url").await;

    assert_eq!(wizard.current_step(), WizardStep::Github);
    assert!(wizard.form(WizardStep::Github).enabled);
    assert!(api.calls().is_empty());
}

#[test]
fn test_signin_without_stored_path_is_ignored() {
    let mut wizard = make_wizard(
        Arc::new(MockApi::default()),
        Arc::new(MockLauncher::new(0)),
        &Config::default(),
    );
    // Not on the sign-in step and no stored path either way
    assert!(wizard.begin_signin().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_success_regresses_two_steps_and_refreshes_info() {
    let api = Arc::new(MockApi::default());
    let launcher = Arc::new(MockLauncher::new(0));
    let mut wizard = make_wizard(api.clone(), launcher, &Config::default());
    let mut progress = wizard.subscribe_progress();

    wizard.submit_github("https://github.com/acme/site").await;
    wizard.submit_signin().await;
    wizard.submit_connect_user();
    assert_eq!(wizard.current_step(), WizardStep::Disconnect);

    wizard.submit_disconnect().await;
    assert_eq!(wizard.current_step(), WizardStep::ConnectUser);
    assert_eq!(enabled_count(&wizard), 1);
    assert_eq!(cumulative_delta(&mut progress), wizard.current_index() as i64);
    assert!(api.calls().contains(&"disconnect acme/site".to_string()));
    // The refreshed info no longer carries the signed-in profile
    assert!(wizard.repo_info().unwrap().auth_info.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_failure_stays_put_with_inline_error() {
    let api = Arc::new(MockApi {
        disconnect_failure: Some((502, "disconnect rejected".to_string())),
        ..MockApi::default()
    });
    let mut wizard = make_wizard(api, Arc::new(MockLauncher::new(0)), &Config::default());

    wizard.submit_github("https://github.com/acme/site").await;
    wizard.submit_signin().await;
    wizard.submit_connect_user();

    wizard.submit_disconnect().await;
    assert_eq!(wizard.current_step(), WizardStep::Disconnect);
    let form = wizard.form(WizardStep::Disconnect);
    assert!(form.enabled);
    assert_eq!(form.error.as_deref(), Some("disconnect rejected"));
}

#[tokio::test(start_paused = true)]
async fn test_configured_disconnect_regress_steps() {
    let mut config = Config::default();
    config.wizard.disconnect_regress_steps = 1;
    let mut wizard = make_wizard(
        Arc::new(MockApi::default()),
        Arc::new(MockLauncher::new(0)),
        &config,
    );

    wizard.submit_github("https://github.com/acme/site").await;
    wizard.submit_signin().await;
    wizard.submit_connect_user();

    wizard.submit_disconnect().await;
    assert_eq!(wizard.current_step(), WizardStep::ConnectApp);
}

#[tokio::test(start_paused = true)]
async fn test_configured_post_signin_branch_to_connect_app() {
    let mut config = Config::default();
    config.wizard.post_signin_step = PostSignInStep::ConnectApp;
    let mut wizard = make_wizard(
        Arc::new(MockApi::default()),
        Arc::new(MockLauncher::new(1)),
        &config,
    );
    let mut progress = wizard.subscribe_progress();

    wizard.submit_github("https://github.com/acme/site").await;
    wizard.submit_signin().await;
    assert_eq!(wizard.current_step(), WizardStep::ConnectApp);
    assert_eq!(cumulative_delta(&mut progress), wizard.current_index() as i64);

    wizard.submit_connect_app();
    assert_eq!(wizard.current_step(), WizardStep::Disconnect);
    assert_eq!(cumulative_delta(&mut progress), wizard.current_index() as i64);
}

#[tokio::test(start_paused = true)]
async fn test_reset_returns_to_github_with_cleared_forms() {
    let mut wizard = make_wizard(
        Arc::new(MockApi::default()),
        Arc::new(MockLauncher::new(0)),
        &Config::default(),
    );
    let mut progress = wizard.subscribe_progress();

    wizard.submit_github("https://github.com/acme/site").await;
    wizard.submit_signin().await;
    wizard.reset();

    assert_eq!(wizard.current_step(), WizardStep::Github);
    assert_eq!(enabled_count(&wizard), 1);
    assert!(wizard.form(WizardStep::Github).enabled);
    assert!(wizard.repo_info().is_none());
    for step in WizardStep::all() {
        let form = wizard.form(*step);
        assert!(form.error.is_none());
        assert!(form.target_path.is_none());
        assert!(!form.busy);
    }

    // A reset event zeroes the subscriber's accumulated delta
    assert_eq!(cumulative_delta(&mut progress), 0);
}

#[test]
fn test_connect_submissions_ignored_off_step() {
    let mut wizard = make_wizard(
        Arc::new(MockApi::default()),
        Arc::new(MockLauncher::new(0)),
        &Config::default(),
    );
    wizard.submit_connect_user();
    wizard.submit_connect_app();
    assert_eq!(wizard.current_step(), WizardStep::Github);
}
