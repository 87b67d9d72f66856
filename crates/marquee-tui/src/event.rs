use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tracing::trace;

/// Event handler for terminal events
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms.max(1)),
        }
    }

    /// Wait for the next event.
    ///
    /// Terminal input is polled without blocking so marquee tasks on the same
    /// runtime keep running; with no input a `Tick` follows after the tick rate.
    pub async fn next(&self) -> Result<Option<AppEvent>> {
        if event::poll(Duration::ZERO)? {
            return match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events, ignore release events
                    if key.kind == KeyEventKind::Press {
                        Ok(Some(AppEvent::Key(key)))
                    } else {
                        trace!(code = ?key.code, kind = ?key.kind, "Ignoring key event");
                        Ok(None)
                    }
                }
                Event::Resize(w, h) => Ok(Some(AppEvent::Resize(w, h))),
                other => {
                    trace!(event = ?other, "Ignoring terminal event");
                    Ok(None)
                }
            };
        }

        tokio::time::sleep(self.tick_rate).await;
        Ok(Some(AppEvent::Tick))
    }
}

/// Application events
#[derive(Debug)]
pub enum AppEvent {
    /// A key was pressed
    Key(KeyEvent),
    /// Terminal was resized
    Resize(u16, u16),
    /// Tick event for redraws
    Tick,
}
