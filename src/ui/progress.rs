//! Progress-bar view for the registration wizard.
//!
//! The view subscribes to the wizard's transition broadcast and tracks its
//! own position; wizard and bar share no references.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

use crate::register::ProgressEvent;

pub struct ProgressView {
    events: Receiver<ProgressEvent>,
    index: usize,
    total: usize,
}

impl ProgressView {
    pub fn new(events: Receiver<ProgressEvent>, total: usize) -> Self {
        Self {
            events,
            index: 0,
            total,
        }
    }

    /// Drain pending transition events into the tracked position
    pub fn sync(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(ProgressEvent::Reset) => self.index = 0,
                Ok(ProgressEvent::Step { forward, steps }) => {
                    if forward {
                        self.index = (self.index + steps).min(self.total.saturating_sub(1));
                    } else {
                        self.index = self.index.saturating_sub(steps);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "progress view lagged behind wizard events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let span = self.total.saturating_sub(1).max(1);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Progress "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(self.index as f64 / span as f64)
            .label(format!("Step {} of {}", self.index + 1, self.total));
        frame.render_widget(gauge, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    #[test]
    fn test_sync_tracks_forward_and_backward_steps() {
        let (tx, rx) = broadcast::channel(8);
        let mut view = ProgressView::new(rx, 5);

        tx.send(ProgressEvent::Step {
            forward: true,
            steps: 1,
        })
        .unwrap();
        tx.send(ProgressEvent::Step {
            forward: true,
            steps: 2,
        })
        .unwrap();
        view.sync();
        assert_eq!(view.index(), 3);

        tx.send(ProgressEvent::Step {
            forward: false,
            steps: 2,
        })
        .unwrap();
        view.sync();
        assert_eq!(view.index(), 1);
    }

    #[test]
    fn test_reset_returns_to_start() {
        let (tx, rx) = broadcast::channel(8);
        let mut view = ProgressView::new(rx, 5);
        tx.send(ProgressEvent::Step {
            forward: true,
            steps: 4,
        })
        .unwrap();
        tx.send(ProgressEvent::Reset).unwrap();
        view.sync();
        assert_eq!(view.index(), 0);
    }

    #[test]
    fn test_position_is_clamped_to_the_step_range() {
        let (tx, rx) = broadcast::channel(8);
        let mut view = ProgressView::new(rx, 5);
        tx.send(ProgressEvent::Step {
            forward: false,
            steps: 2,
        })
        .unwrap();
        view.sync();
        assert_eq!(view.index(), 0);
    }
}
