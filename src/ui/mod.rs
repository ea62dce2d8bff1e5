//! TUI views for the console screens

pub mod form_field;
pub mod invalidation_view;
pub mod logs_view;
pub mod progress;
pub mod register_view;

pub use form_field::FormField;
pub use invalidation_view::{InvalidationFocus, InvalidationView};
pub use logs_view::{LogsFocus, LogsView};
pub use progress::ProgressView;
pub use register_view::RegisterView;
