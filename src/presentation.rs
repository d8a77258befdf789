//! Presentation loop: overlay visibility and the auto-hide countdown

use crate::channel::{CommandReceiver, UiCommand};
use crate::constants::ui::UPDATE_INTERVAL_MS;
use crate::display::DisplaySurface;
use crate::error::AppResult;
use crate::state::StopSignal;
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Overlay state, owned by the presentation loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub visibility: Visibility,
    pub hide_deadline: Option<Instant>,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            visibility: Visibility::Hidden,
            hide_deadline: None,
        }
    }
}

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Applies commands and deadlines to a display surface
pub struct Presenter<D> {
    display: D,
    window: WindowState,
    hide_delay: Duration,
}

impl<D: DisplaySurface> Presenter<D> {
    pub fn new(display: D, hide_delay: Duration) -> Self {
        Self {
            display,
            window: WindowState::default(),
            hide_delay,
        }
    }

    pub fn window(&self) -> &WindowState {
        &self.window
    }

    #[cfg(test)]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Apply one command received at `now`
    pub fn handle(&mut self, command: UiCommand, now: Instant) -> Flow {
        match command {
            UiCommand::ShowVolume(level) => {
                self.display.set_level(level);
                if self.window.visibility == Visibility::Hidden {
                    self.display.show();
                    self.window.visibility = Visibility::Visible;
                }
                // Rearming replaces any pending deadline
                self.window.hide_deadline = Some(now + self.hide_delay);
                Flow::Continue
            }
            UiCommand::HideWindow => {
                self.hide();
                Flow::Continue
            }
            UiCommand::Shutdown => Flow::Exit,
        }
    }

    /// Hide the overlay if its deadline has passed
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.window.hide_deadline
            && now >= deadline
        {
            debug!("Auto-hide after {:?}", now - deadline + self.hide_delay);
            self.hide();
        }
    }

    fn hide(&mut self) {
        self.window.hide_deadline = None;
        if self.window.visibility == Visibility::Visible {
            self.display.hide();
            self.window.visibility = Visibility::Hidden;
        }
    }

    pub fn pump_events(&mut self) -> AppResult<()> {
        self.display.pump_events()
    }

    pub fn is_alive(&self) -> bool {
        self.display.is_alive()
    }

    /// Tear the display down
    pub fn close(&mut self) -> AppResult<()> {
        self.window.hide_deadline = None;
        self.display.destroy()
    }
}

/// Run the presentation loop until shutdown, a stop signal, Ctrl+C, or the
/// display closing. The display is destroyed before returning.
pub async fn run<D: DisplaySurface>(
    mut presenter: Presenter<D>,
    mut commands: CommandReceiver,
    stop: StopSignal,
) -> AppResult<()> {
    let mut interval = tokio::time::interval(Duration::from_millis(UPDATE_INTERVAL_MS));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c, if !interrupted => {
                info!("Interrupted, stopping");
                interrupted = true;
                stop.trigger();
            }
            _ = interval.tick() => {}
        }

        let now = Instant::now();
        if drain(&mut presenter, &mut commands, now) == Flow::Exit {
            info!("Shutdown received");
            break Ok(());
        }

        presenter.tick(now);
        if let Err(e) = presenter.pump_events() {
            break Err(e);
        }

        if !presenter.is_alive() {
            info!("Display closed, stopping");
            break Ok(());
        }
        if stop.is_set() || commands.is_closed() {
            // The worker queues its last commands before raising the flag
            if drain(&mut presenter, &mut commands, Instant::now()) == Flow::Exit {
                info!("Shutdown received");
            }
            break Ok(());
        }
    };

    if commands.dropped() > 0 {
        warn!("{} UI commands were dropped while the overlay lagged", commands.dropped());
    }
    debug!("Final overlay state: {:?}", presenter.window());
    stop.trigger();
    let closed = presenter.close();
    result.and(closed)
}

/// Apply every queued command, stopping at `Shutdown`
fn drain<D: DisplaySurface>(
    presenter: &mut Presenter<D>,
    commands: &mut CommandReceiver,
    now: Instant,
) -> Flow {
    while let Some(command) = commands.try_recv() {
        if presenter.handle(command, now) == Flow::Exit {
            return Flow::Exit;
        }
    }
    Flow::Continue
}
