use std::sync::Arc;

use anyhow::Result;

use marquee_core::{AppConfig, DistanceCalculator};
use marquee_tui::CellMetrics;

pub async fn run(config: &AppConfig, text: &str) -> Result<()> {
    let width = if config.ui.width > 0 {
        config.ui.width
    } else {
        crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80)
    };

    let calculator = DistanceCalculator::new(Arc::new(CellMetrics::new(width)));
    let metrics = calculator.measure(text).await?;

    println!("Container: {} cells", metrics.container_width);
    println!("Content:   {} cells", metrics.content_width);

    if metrics.content_fits() {
        println!("Fits, no scrolling needed.");
        return Ok(());
    }

    let duration = config.marquee.duration_for(metrics.distance())?;
    println!("Overflow:  {} cells", metrics.distance());
    println!(
        "Scrolls in {} ms at {} cells/s",
        duration.as_millis(),
        config.marquee.speed
    );
    if config.marquee.looping {
        println!(
            "Restarts after {} ms",
            config.marquee.reset_delay().as_millis()
        );
    }

    Ok(())
}
