//! Type definitions for the registration wizard

use crate::config::PostSignInStep;

/// Steps in the registration sequence. Index order is the forward direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Repository lookup from a GitHub URL
    Github,
    /// Sign in through the external window
    SignIn,
    /// Connect as a user
    ConnectUser,
    /// Connect as an app installation
    ConnectApp,
    /// Disconnect the registration
    Disconnect,
}

impl WizardStep {
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Github,
            WizardStep::SignIn,
            WizardStep::ConnectUser,
            WizardStep::ConnectApp,
            WizardStep::Disconnect,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            WizardStep::Github => 0,
            WizardStep::SignIn => 1,
            WizardStep::ConnectUser => 2,
            WizardStep::ConnectApp => 3,
            WizardStep::Disconnect => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<WizardStep> {
        WizardStep::all().get(index).copied()
    }

    /// Stable identifier, also the value accepted in configuration
    pub fn id(self) -> &'static str {
        match self {
            WizardStep::Github => "github",
            WizardStep::SignIn => "signin",
            WizardStep::ConnectUser => "connect-user",
            WizardStep::ConnectApp => "connect-app",
            WizardStep::Disconnect => "disconnect",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Github => "GitHub Repository",
            WizardStep::SignIn => "Sign In",
            WizardStep::ConnectUser => "Connect User",
            WizardStep::ConnectApp => "Connect App",
            WizardStep::Disconnect => "Disconnect",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WizardStep::Github => "Enter the GitHub URL of the site repository",
            WizardStep::SignIn => "Sign in with the service in the opened window",
            WizardStep::ConnectUser => "Connect the repository to your user account",
            WizardStep::ConnectApp => "Connect the repository through the app installation",
            WizardStep::Disconnect => "Remove the connection for this repository",
        }
    }
}

impl From<PostSignInStep> for WizardStep {
    fn from(step: PostSignInStep) -> Self {
        match step {
            PostSignInStep::ConnectUser => WizardStep::ConnectUser,
            PostSignInStep::ConnectApp => WizardStep::ConnectApp,
        }
    }
}

/// Per-step form state. Exactly one form is enabled at any time.
#[derive(Debug, Clone, Default)]
pub struct StepForm {
    pub enabled: bool,
    /// A submission is in flight; the form stays disabled until it resolves
    pub busy: bool,
    /// Inline error from the last failed submission
    pub error: Option<String>,
    /// Endpoint path stored on the form by an earlier step
    pub target_path: Option<String>,
}

/// Typed transition event for the decoupled progress-bar view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The wizard returned to its initial state
    Reset,
    /// The wizard moved by `steps` in the given direction
    Step { forward: bool, steps: usize },
}
