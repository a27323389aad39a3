//! Roguelike-style composition demo: a map camera, a side menu, and a
//! centered modal alert stacked on one screen.
//!
//! ```bash
//! cargo run --example main_game
//! ```
//!
//! The alert sits on top and swallows the first key to dismiss itself.
//! After that the menu handles Up/Down/Enter, the map shimmers every
//! frame, and Esc or `q` quits. Resize the terminal to watch the layout
//! recompute.

use crossterm::event::KeyCode;
use crossterm::style::Color;

use gridwin::{
    ConsoleBuffer, EventCtx, EventHub, HubConfig, KeyHandler, KeyListener, KeyPressEvent,
    LogLevel, Logger, Panel, PanelGeometry, PanelOptions, PanelWidget, Screen, Size, StderrSink,
    SurfaceConfig, fixed, height_minus, width_minus,
};

const MENU_WIDTH: u16 = 12;

struct MapWidget {
    seed: u64,
    phase: u64,
}

impl MapWidget {
    fn new(seed: u64) -> Self {
        Self { seed, phase: 0 }
    }
}

impl PanelWidget for MapWidget {
    fn update_layout(&mut self, buffer: &mut ConsoleBuffer) {
        self.phase = self.phase.wrapping_add(1);
        let mut state = self.seed;
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                // xorshift keeps the terrain stable per cell while the
                // water glyphs animate with the frame phase.
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                match state % 5 {
                    0 => buffer.set(x, y, '#', Color::Grey, Color::Black),
                    1 | 2 => buffer.set(x, y, '.', Color::DarkGreen, Color::Black),
                    3 => {
                        let wave = if (self.phase / 8 + x as u64) % 2 == 0 {
                            '~'
                        } else {
                            '-'
                        };
                        buffer.set(x, y, wave, Color::Blue, Color::Black);
                    }
                    _ => buffer.set(x, y, ',', Color::DarkYellow, Color::Black),
                }
            }
        }
    }
}

struct MenuWidget {
    entries: Vec<&'static str>,
    selected: usize,
}

impl MenuWidget {
    fn new() -> Self {
        Self {
            entries: vec!["explore", "inventory", "rest", "journal", "descend"],
            selected: 0,
        }
    }
}

impl PanelWidget for MenuWidget {
    fn update_layout(&mut self, buffer: &mut ConsoleBuffer) {
        buffer.clear();
        for y in 0..buffer.height() {
            buffer.set(0, y, '|', Color::DarkGrey, Color::Reset);
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            let (fg, bg) = if idx == self.selected {
                (Color::Black, Color::White)
            } else {
                (Color::White, Color::Reset)
            };
            buffer.print(2, idx as u16 + 1, entry, fg, bg);
        }
    }

    fn on_key_press(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx) {
        match event.code() {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                ctx.request_refresh();
                event.cancel();
            }
            KeyCode::Down => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
                ctx.request_refresh();
                event.cancel();
            }
            KeyCode::Enter => {
                // Claimed so the map never sees menu activations.
                event.cancel();
            }
            _ => {}
        }
    }
}

struct AlertWidget {
    message: String,
}

impl PanelWidget for AlertWidget {
    fn update_layout(&mut self, buffer: &mut ConsoleBuffer) {
        buffer.fill(gridwin::Cell::new(' ', Color::White, Color::DarkBlue));
        buffer.print(1, 2, &self.message, Color::White, Color::DarkBlue);
    }

    fn on_key_press(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx) {
        // Modal: dismiss on any key and keep it from everyone behind us.
        ctx.request_hide();
        event.cancel();
    }
}

struct QuitListener;

impl KeyListener for QuitListener {
    fn on_key_press(&mut self, event: &mut KeyPressEvent, ctx: &mut EventCtx) {
        match event.code() {
            KeyCode::Esc | KeyCode::Char('q') => {
                ctx.request_exit();
                event.cancel();
            }
            KeyCode::Char('f') => {
                ctx.request_toggle_fullscreen();
                event.cancel();
            }
            _ => {}
        }
    }
}

fn build_main_screen(hub: &mut EventHub) -> Screen {
    let screen = Screen::new(hub, "main_game");

    let map = Panel::new(
        hub,
        "map",
        PanelGeometry::new(fixed(0), fixed(0), width_minus(MENU_WIDTH), height_minus(0)),
        PanelOptions {
            accepts_keyboard: true,
            real_time_update: true,
        },
        Box::new(MapWidget::new(0x5eed_cafe)),
    );

    let menu = Panel::new(
        hub,
        "menu",
        PanelGeometry::new(
            width_minus(MENU_WIDTH),
            fixed(0),
            fixed(MENU_WIDTH),
            height_minus(0),
        ),
        PanelOptions {
            accepts_keyboard: true,
            ..PanelOptions::default()
        },
        Box::new(MenuWidget::new()),
    );

    let message = "Press any key to dismiss this overlay".to_string();
    let alert_width = message.chars().count() as u16 + 2;
    let alert = Panel::new(
        hub,
        "alert",
        PanelGeometry::new(
            move |size: Size| (size.width / 2).saturating_sub(alert_width / 2),
            |size: Size| (size.height / 2).saturating_sub(2),
            move |_| alert_width,
            |_| 5,
        ),
        PanelOptions {
            accepts_keyboard: true,
            ..PanelOptions::default()
        },
        Box::new(AlertWidget { message }),
    );

    screen.add_panel(hub, &map);
    screen.add_panel(hub, &menu);
    screen.add_panel(hub, &alert);
    screen
}

fn main() -> gridwin::Result<()> {
    let logger = Logger::new(StderrSink).with_min_level(LogLevel::Warn);
    let surface_config = SurfaceConfig {
        title: "gridwin main game".to_string(),
        width: 60,
        height: 40,
        ..SurfaceConfig::default()
    };
    let hub_config = HubConfig {
        logger: Some(logger),
        ..HubConfig::default()
    };

    let mut hub = EventHub::init_with(surface_config, hub_config)?;

    let screen = build_main_screen(&mut hub);
    screen.show(&mut hub);

    // Started last, so the quit handler is offered every key first and
    // lets anything it does not recognize fall through.
    let quit = KeyHandler::new(&hub, "quit", Box::new(QuitListener));
    quit.start_handling(&mut hub);

    hub.run()?;

    screen.dispose(&mut hub);
    Ok(())
}
