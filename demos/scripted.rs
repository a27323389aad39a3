//! Headless scripted run: drives the hub with queued events and prints
//! the captured frames as plain text. Useful for eyeballing dispatch and
//! relayout without a terminal takeover.
//!
//! ```bash
//! cargo run --example scripted
//! ```

use crossterm::style::Color;

use gridwin::{
    ConsoleBuffer, EventHub, HeadlessSurface, Panel, PanelGeometry, PanelOptions, PanelWidget,
    Screen, Size, fixed, height_minus, width_minus,
};

struct BannerWidget;

impl PanelWidget for BannerWidget {
    fn update_layout(&mut self, buffer: &mut ConsoleBuffer) {
        buffer.clear();
        buffer.print(1, 0, "gridwin scripted demo", Color::Reset, Color::Reset);
        for x in 0..buffer.width() {
            buffer.set(x, 1, '=', Color::Reset, Color::Reset);
        }
    }
}

struct TickerWidget {
    ticks: u64,
}

impl PanelWidget for TickerWidget {
    fn update_layout(&mut self, buffer: &mut ConsoleBuffer) {
        self.ticks += 1;
        buffer.clear();
        let line = format!(
            "frame {:>3} on a {}x{} grid",
            self.ticks,
            buffer.width(),
            buffer.height()
        );
        buffer.print(1, 0, &line, Color::Reset, Color::Reset);
    }
}

fn print_frame(frame: &ConsoleBuffer) {
    println!("+{}+", "-".repeat(frame.width() as usize));
    for y in 0..frame.height() {
        println!("|{}|", frame.row_text(y));
    }
    println!("+{}+", "-".repeat(frame.width() as usize));
}

fn main() -> gridwin::Result<()> {
    let (surface, handle) = HeadlessSurface::new(34, 6);
    let mut hub = EventHub::new(Box::new(surface));

    let screen = Screen::new(&mut hub, "banner");
    let banner = Panel::new(
        &hub,
        "banner",
        PanelGeometry::new(fixed(0), fixed(0), width_minus(0), fixed(2)),
        PanelOptions::default(),
        Box::new(BannerWidget),
    );
    let ticker = Panel::new(
        &hub,
        "ticker",
        PanelGeometry::new(fixed(0), fixed(2), width_minus(0), height_minus(2)),
        PanelOptions {
            real_time_update: true,
            ..PanelOptions::default()
        },
        Box::new(TickerWidget { ticks: 0 }),
    );
    screen.add_panel(&hub, &banner);
    screen.add_panel(&hub, &ticker);
    screen.show(&mut hub);

    for _ in 0..3 {
        hub.tick()?;
    }
    if let Some(frame) = handle.last_frame() {
        println!("after three ticks:");
        print_frame(&frame);
    }

    handle.push_resize(Size::new(42, 7));
    hub.tick()?;
    if let Some(frame) = handle.last_frame() {
        println!("after a resize to 42x7:");
        print_frame(&frame);
    }

    let metrics = hub.metrics();
    println!(
        "frames={} layout_refreshes={} resizes={}",
        metrics.frames, metrics.layout_refreshes, metrics.resizes
    );

    screen.dispose(&mut hub);
    Ok(())
}
