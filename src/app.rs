//! Application shell: terminal lifecycle, key routing, and the message loop
//! that completes spawned submissions.
//!
//! Screens never block the loop. Submissions hand back call objects that run
//! on spawned tasks and report through the app channel; the forms stay
//! disabled until their message arrives, so reentry is serialized without
//! locks.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{AdminApi, AdminError, LogEntry, RepoInfo};
use crate::config::Config;
use crate::invalidation::CredentialsForm;
use crate::logview::{parse_custom_datetime, FetchOutcome, LogViewer};
use crate::register::signin::{signin_url, wait_until_closed, SignInLauncher};
use crate::register::{RegisterWizard, WizardStep};
use crate::ui::{
    InvalidationFocus, InvalidationView, LogsFocus, LogsView, ProgressView, RegisterView,
};

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Register,
    Logs,
    Invalidation,
}

/// Results reported back from spawned submissions
enum AppMsg {
    LookupDone(Result<RepoInfo, AdminError>),
    SignInDone(Result<RepoInfo, AdminError>),
    DisconnectDone(Result<RepoInfo, AdminError>),
    LogsDone(Result<Vec<LogEntry>, AdminError>),
    LogsSignInClosed,
    InvalidationDone(Result<String, AdminError>),
}

pub struct App {
    config: Config,
    launcher: Arc<dyn SignInLauncher>,
    screen: Screen,
    wizard: RegisterWizard,
    register_view: RegisterView,
    progress: ProgressView,
    viewer: LogViewer,
    logs_view: LogsView,
    creds: CredentialsForm,
    invalidation_view: InvalidationView,
    should_quit: bool,
    tx: mpsc::UnboundedSender<AppMsg>,
    rx: mpsc::UnboundedReceiver<AppMsg>,
}

impl App {
    pub fn new(
        config: Config,
        api: Arc<dyn AdminApi>,
        launcher: Arc<dyn SignInLauncher>,
        screen: Screen,
        initial_provider: Option<&str>,
    ) -> Self {
        let wizard = RegisterWizard::new(api.clone(), launcher.clone(), &config);
        let progress = ProgressView::new(wizard.subscribe_progress(), wizard.step_count());
        let viewer = LogViewer::new(api.clone());
        let mut logs_view = LogsView::new();
        logs_view.sync_timeframe_fields();
        let creds = CredentialsForm::new(api, initial_provider);
        let invalidation_view = InvalidationView::new(&creds);
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            config,
            launcher,
            screen,
            wizard,
            register_view: RegisterView::new(),
            progress,
            viewer,
            logs_view,
            creds,
            invalidation_view,
            should_quit: false,
            tx,
            rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms);
        loop {
            while let Ok(msg) = self.rx.try_recv() {
                self.handle_message(msg);
            }
            self.progress.sync();
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }
            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        match self.screen {
            Screen::Register => {
                self.register_view
                    .render(frame, area, &self.wizard, &self.progress);
            }
            Screen::Logs => self.logs_view.render(frame, area, &self.viewer),
            Screen::Invalidation => self.invalidation_view.render(frame, area, &self.creds),
        }
    }

    fn handle_message(&mut self, msg: AppMsg) {
        match msg {
            AppMsg::LookupDone(result) => self.wizard.complete_github(result),
            AppMsg::SignInDone(result) => self.wizard.complete_signin(result),
            AppMsg::DisconnectDone(result) => self.wizard.complete_disconnect(result),
            AppMsg::LogsDone(result) => {
                match self.viewer.complete_fetch(result, &self.config.endpoints) {
                    FetchOutcome::Done => {}
                    FetchOutcome::NeedsSignIn { owner, repo } => {
                        self.start_logs_signin(&owner, &repo);
                    }
                }
            }
            AppMsg::LogsSignInClosed => self.refetch_logs(),
            AppMsg::InvalidationDone(result) => self.creds.complete_submit(result),
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match code {
                KeyCode::Char('q') | KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('r') => {
                    self.reset_screen();
                    return;
                }
                _ => {}
            }
        }
        match code {
            KeyCode::F(1) => {
                self.screen = Screen::Register;
                return;
            }
            KeyCode::F(2) => {
                self.screen = Screen::Logs;
                return;
            }
            KeyCode::F(3) => {
                self.screen = Screen::Invalidation;
                return;
            }
            _ => {}
        }

        match self.screen {
            Screen::Register => self.handle_register_key(code),
            Screen::Logs => self.handle_logs_key(code),
            Screen::Invalidation => self.handle_invalidation_key(code),
        }
    }

    fn reset_screen(&mut self) {
        match self.screen {
            Screen::Register => {
                self.wizard.reset();
                self.register_view.clear_inputs();
            }
            Screen::Logs => {
                self.viewer.clear();
                self.logs_view.github_url.clear();
                self.logs_view.filter.clear();
                self.logs_view.table_state.select(None);
                self.logs_view.sync_timeframe_fields();
            }
            Screen::Invalidation => {
                self.creds.reset();
                self.invalidation_view.clear_fields();
            }
        }
    }

    // ─── Register screen ────────────────────────────────────────────────────

    fn handle_register_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.submit_register(),
            _ => {
                let step = self.wizard.current_step();
                if step == WizardStep::Github && self.wizard.form(step).enabled {
                    self.register_view.github_url.handle_key(code);
                }
            }
        }
    }

    fn submit_register(&mut self) {
        match self.wizard.current_step() {
            WizardStep::Github => {
                let url = self.register_view.github_url.value();
                if let Some(call) = self.wizard.begin_github(&url) {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppMsg::LookupDone(call.run().await));
                    });
                }
            }
            WizardStep::SignIn => {
                if let Some(call) = self.wizard.begin_signin() {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppMsg::SignInDone(call.run().await));
                    });
                }
            }
            WizardStep::ConnectUser => self.wizard.submit_connect_user(),
            WizardStep::ConnectApp => self.wizard.submit_connect_app(),
            WizardStep::Disconnect => {
                if let Some(call) = self.wizard.begin_disconnect() {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppMsg::DisconnectDone(call.run().await));
                    });
                }
            }
        }
    }

    // ─── Logs screen ────────────────────────────────────────────────────────

    fn handle_logs_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Tab => self.logs_view.focus_next(),
            KeyCode::BackTab => self.logs_view.focus_prev(),
            KeyCode::Enter if self.logs_view.focus != LogsFocus::Table => self.submit_logs(),
            _ => match self.logs_view.focus {
                LogsFocus::Url => {
                    self.logs_view.github_url.handle_key(code);
                }
                LogsFocus::Timeframe => {
                    if self.logs_view.timeframe.handle_key(code) {
                        self.logs_view.sync_timeframe_fields();
                    }
                }
                LogsFocus::From => {
                    self.logs_view.from.handle_key(code);
                }
                LogsFocus::To => {
                    self.logs_view.to.handle_key(code);
                }
                LogsFocus::Filter => {
                    if self.logs_view.filter.handle_key(code) {
                        let filter = self.logs_view.filter.value();
                        self.viewer.set_filter(&filter);
                        self.logs_view.table_state.select(None);
                    }
                }
                LogsFocus::Table => match code {
                    KeyCode::Up | KeyCode::Char('k') => self.logs_view.select_prev(&self.viewer),
                    KeyCode::Down | KeyCode::Char('j') => self.logs_view.select_next(&self.viewer),
                    KeyCode::Char('o') => self.open_selected_link(),
                    _ => {}
                },
            },
        }
    }

    /// Resolve the timeframe and start a fetch
    fn submit_logs(&mut self) {
        let Some((from, to)) = self.resolve_timeframe() else {
            return;
        };
        let url = self.logs_view.github_url.value();
        if let Some(call) = self.viewer.begin_fetch(&url, from, to) {
            self.logs_view.filter.clear();
            self.logs_view.table_state.select(None);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppMsg::LogsDone(call.run().await));
            });
        }
    }

    /// Retry the last query once the sign-in window has closed
    fn refetch_logs(&mut self) {
        let Some((from, to)) = self.resolve_timeframe() else {
            return;
        };
        if let Some(call) = self.viewer.begin_refetch(from, to) {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppMsg::LogsDone(call.run().await));
            });
        }
    }

    fn resolve_timeframe(
        &mut self,
    ) -> Option<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
        let preset = self.logs_view.preset();
        if preset.is_custom() {
            let from = parse_custom_datetime(&self.logs_view.from.value());
            let to = parse_custom_datetime(&self.logs_view.to.value());
            match (from, to) {
                (Some(from), Some(to)) => Some((from, to)),
                _ => {
                    tracing::debug!("custom timeframe does not parse");
                    None
                }
            }
        } else {
            self.logs_view.sync_timeframe_fields();
            preset.range(chrono::Local::now())
        }
    }

    /// Auth failure on the log fetch: open the sign-in window, refetch when
    /// it closes
    fn start_logs_signin(&mut self, owner: &str, repo: &str) {
        let path = self.config.endpoints.login_url(owner, repo);
        let opened = signin_url(&path).and_then(|url| self.launcher.open(&url));
        match opened {
            Ok(window) => {
                let every = Duration::from_millis(self.config.wizard.signin_poll_interval_ms);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    wait_until_closed(window.as_ref(), every).await;
                    let _ = tx.send(AppMsg::LogsSignInClosed);
                });
            }
            Err(e) => tracing::warn!(error = %e, "could not open the sign-in window"),
        }
    }

    fn open_selected_link(&mut self) {
        let Some(link) = self.logs_view.selected_link(&self.viewer) else {
            return;
        };
        let opened = reqwest::Url::parse(&link)
            .map_err(anyhow::Error::from)
            .and_then(|url| self.launcher.open(&url));
        if let Err(e) = opened {
            tracing::debug!(link = %link, error = %e, "could not open link");
        }
    }

    // ─── Invalidation screen ────────────────────────────────────────────────

    fn handle_invalidation_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Tab => {
                let count = self.invalidation_view.fields.len();
                self.invalidation_view.focus_next(count);
            }
            KeyCode::Enter => self.submit_invalidation(),
            _ if self.invalidation_view.focus == InvalidationFocus::Provider => match code {
                KeyCode::Up | KeyCode::Char('k') => self.invalidation_view.select_prev_provider(),
                KeyCode::Down | KeyCode::Char('j') => self.invalidation_view.select_next_provider(),
                KeyCode::Char(' ') => {
                    let provider = self.invalidation_view.highlighted_provider();
                    self.creds.select_provider(provider);
                    self.invalidation_view.rebuild_fields(provider);
                }
                _ => {}
            },
            _ => match self.invalidation_view.focus {
                InvalidationFocus::SiteUrl => {
                    self.invalidation_view.site_url.handle_key(code);
                }
                InvalidationFocus::Field(i) => {
                    if let Some(field) = self.invalidation_view.fields.get_mut(i) {
                        field.handle_key(code);
                    }
                }
                InvalidationFocus::Provider => {}
            },
        }
    }

    fn submit_invalidation(&mut self) {
        self.invalidation_view.sync_to_model(&mut self.creds);
        if let Some(call) = self.creds.begin_submit() {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AppMsg::InvalidationDone(call.run().await));
            });
        }
    }
}
