//! Display surfaces for the volume overlay

use crate::error::{AppError, AppResult};
use crate::ui::{self, OverlayView};
use crate::volume::VolumeLevel;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;

/// A window-like surface owned by the presentation loop.
///
/// Calls are cheap state changes; drawing and input handling happen in
/// [`DisplaySurface::pump_events`], once per UI tick.
pub trait DisplaySurface {
    fn show(&mut self);
    fn hide(&mut self);
    fn set_text(&mut self, text: &str);

    /// Show a volume level. Surfaces that can draw more than text override this.
    fn set_level(&mut self, level: VolumeLevel) {
        self.set_text(&format!("Volume: {}", level));
    }

    /// `false` once the user closed the surface or it was destroyed
    fn is_alive(&self) -> bool;
    fn destroy(&mut self) -> AppResult<()>;
    fn pump_events(&mut self) -> AppResult<()>;
}

/// Full-screen terminal with a centered volume box
pub struct TerminalOverlay {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    view: OverlayView,
    dirty: bool,
    alive: bool,
}

impl TerminalOverlay {
    /// Take over the terminal
    pub fn new() -> AppResult<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;

        Ok(Self {
            terminal: Some(terminal),
            view: OverlayView::default(),
            dirty: true,
            alive: true,
        })
    }

    /// Esc, `q` or Ctrl+C close the overlay
    fn handle_input(&mut self) -> AppResult<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => self.alive = false,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.alive = false
                    }
                    _ => {}
                },
                Event::Resize(_, _) => self.dirty = true,
                _ => {}
            }
        }
        Ok(())
    }
}

impl DisplaySurface for TerminalOverlay {
    fn show(&mut self) {
        self.view.visible = true;
        self.dirty = true;
    }

    fn hide(&mut self) {
        self.view.visible = false;
        self.dirty = true;
    }

    fn set_text(&mut self, text: &str) {
        self.view.text = text.to_string();
        self.view.ratio = None;
        self.dirty = true;
    }

    fn set_level(&mut self, level: VolumeLevel) {
        self.view.text = format!("Volume: {}", level);
        self.view.ratio = Some(level.percent() as f64 / VolumeLevel::MAX as f64);
        self.dirty = true;
    }

    fn is_alive(&self) -> bool {
        self.alive && self.terminal.is_some()
    }

    /// Restore the terminal. Safe to call more than once.
    fn destroy(&mut self) -> AppResult<()> {
        self.alive = false;
        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    fn pump_events(&mut self) -> AppResult<()> {
        if self.terminal.is_none() {
            return Ok(());
        }
        self.handle_input()?;

        if self.dirty
            && let Some(terminal) = self.terminal.as_mut()
        {
            let view = &self.view;
            terminal
                .draw(|f| ui::render_overlay(f, view))
                .map_err(|e| AppError::Display(e.to_string()))?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for TerminalOverlay {
    fn drop(&mut self) {
        // Leave the terminal usable even if the loop bailed out early
        let _ = self.destroy();
    }
}

/// Headless surface that logs what a window would do
#[derive(Default)]
pub struct LogDisplay {
    visible: bool,
    destroyed: bool,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySurface for LogDisplay {
    fn show(&mut self) {
        self.visible = true;
        info!("Overlay shown");
    }

    fn hide(&mut self) {
        self.visible = false;
        info!("Overlay hidden");
    }

    fn set_text(&mut self, text: &str) {
        info!("Overlay text: {}", text);
    }

    fn is_alive(&self) -> bool {
        !self.destroyed
    }

    fn destroy(&mut self) -> AppResult<()> {
        if !self.destroyed {
            self.destroyed = true;
            info!("Overlay destroyed (visible: {})", self.visible);
        }
        Ok(())
    }

    fn pump_events(&mut self) -> AppResult<()> {
        Ok(())
    }
}
