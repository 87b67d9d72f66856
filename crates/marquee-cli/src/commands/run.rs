use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block, Borders},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use marquee_core::{AppConfig, MarqueeController, MarqueeEvent};
use marquee_tui::{AppEvent, CellMetrics, EventHandler, MarqueeWidget};

pub async fn run(config: AppConfig, text: String) -> Result<()> {
    let metrics = Arc::new(CellMetrics::default());
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let controller = MarqueeController::builder(config.marquee.clone(), text.clone(), metrics.clone())
        .with_event_sender(event_tx)
        .build()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle("Marquee"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = main_loop(&mut terminal, &config, &text, &controller, &metrics, event_rx).await;

    controller.unmount();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn main_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    config: &AppConfig,
    text: &str,
    controller: &MarqueeController,
    metrics: &CellMetrics,
    mut marquee_rx: mpsc::UnboundedReceiver<MarqueeEvent>,
) -> Result<()> {
    let events = EventHandler::new(config.ui.tick_rate_ms);
    let mut mounted = false;

    loop {
        let mut container_width = 0;
        terminal.draw(|frame| {
            container_width = draw(frame, config, text, controller);
        })?;

        // Layout decides the container width, so mount only after the first draw
        if metrics.set_container_width(container_width) && mounted {
            controller.content_size_changed();
        }
        if !mounted {
            controller.mount();
            mounted = true;
        }

        while let Ok(event) = marquee_rx.try_recv() {
            match event {
                MarqueeEvent::Completed => {
                    info!("Marquee cycle complete, exiting");
                    return Ok(());
                }
                MarqueeEvent::MeasurementFailed { message } => {
                    warn!(%message, "Marquee measurement failed");
                }
                other => debug!(event = ?other, "Marquee event"),
            }
        }

        match events.next().await? {
            Some(AppEvent::Key(key)) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Char(' ') => {
                    if controller.is_animating() {
                        controller.stop();
                    } else {
                        controller.start(Duration::ZERO);
                    }
                }
                KeyCode::Char('r') => controller.reset(),
                _ => {}
            },
            Some(AppEvent::Resize(w, h)) => debug!(w, h, "Terminal resized"),
            Some(AppEvent::Tick) | None => {}
        }
    }
}

/// Draw the marquee box and return the width available to the text
fn draw(frame: &mut Frame, config: &AppConfig, text: &str, controller: &MarqueeController) -> u16 {
    let area = marquee_area(frame.area(), config.ui.width, config.ui.show_border);

    let mut widget = MarqueeWidget::new(text).offset(controller.offset(), controller.is_animating());
    let inner_width = if config.ui.show_border {
        widget = widget.block(
            Block::default()
                .borders(Borders::ALL)
                .title(" q:quit space:start/stop r:reset "),
        );
        area.width.saturating_sub(2)
    } else {
        area.width
    };

    frame.render_widget(widget, area);
    inner_width
}

/// Centered box, `width` cells wide (0 = full width)
fn marquee_area(screen: Rect, width: u16, border: bool) -> Rect {
    let height = if border { 3 } else { 1 };
    let width = if width == 0 {
        screen.width
    } else {
        let chrome = if border { 2 } else { 0 };
        width.saturating_add(chrome).min(screen.width)
    };

    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(screen);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    area
}
