//! Command channel from the acquisition loop to the presentation loop
//!
//! Backed by a bounded `tokio::sync::broadcast` channel with a single
//! receiver: sends never block, and when the presentation side falls behind
//! the oldest commands are overwritten first.

use crate::constants::ui::MAX_CHANNEL_CAPACITY;
use crate::volume::VolumeLevel;
use log::{trace, warn};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// A command for the presentation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Display the given level and (re)start the auto-hide countdown
    ShowVolume(VolumeLevel),
    /// Hide the overlay now
    HideWindow,
    /// Tear down the display and stop
    Shutdown,
}

/// Create a connected sender/receiver pair holding up to `capacity` commands
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = broadcast::channel(capacity.clamp(1, MAX_CHANNEL_CAPACITY));
    (
        CommandSender { tx },
        CommandReceiver {
            rx,
            closed: false,
            dropped: 0,
        },
    )
}

/// Producer half, owned by the acquisition loop
pub struct CommandSender {
    tx: broadcast::Sender<UiCommand>,
}

impl CommandSender {
    pub fn show_volume(&self, level: VolumeLevel) {
        self.send(UiCommand::ShowVolume(level));
    }

    pub fn hide(&self) {
        self.send(UiCommand::HideWindow);
    }

    /// Send the final `Shutdown`. Consumes the sender, so nothing can follow it.
    pub fn shutdown(self) {
        self.send(UiCommand::Shutdown);
    }

    fn send(&self, command: UiCommand) {
        // Only fails when the presentation loop is already gone
        if self.tx.send(command).is_err() {
            trace!("No presentation loop listening for {:?}", command);
        }
    }
}

/// Consumer half, owned by the presentation loop
pub struct CommandReceiver {
    rx: broadcast::Receiver<UiCommand>,
    closed: bool,
    dropped: u64,
}

impl CommandReceiver {
    /// Take the next pending command without waiting.
    ///
    /// `None` means nothing is queued right now (or the sender is gone, see
    /// [`CommandReceiver::is_closed`]).
    pub fn try_recv(&mut self) -> Option<UiCommand> {
        loop {
            match self.rx.try_recv() {
                Ok(command) => return Some(command),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.closed = true;
                    return None;
                }
                Err(TryRecvError::Lagged(n)) => {
                    self.dropped += n;
                    warn!("Presentation loop fell behind, dropped {} oldest commands", n);
                }
            }
        }
    }

    /// Whether the sender has gone away and everything it sent was received
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Commands lost to overflow so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut CommandReceiver) -> Vec<UiCommand> {
        std::iter::from_fn(|| rx.try_recv()).collect()
    }

    #[test]
    fn test_empty_channel_is_not_an_error() {
        let (_tx, mut rx) = command_channel(4);
        assert_eq!(rx.try_recv(), None);
        assert!(!rx.is_closed());
    }

    #[test]
    fn test_preserves_send_order() {
        let (tx, mut rx) = command_channel(16);
        tx.show_volume(VolumeLevel::new(10));
        tx.show_volume(VolumeLevel::new(20));
        tx.hide();
        tx.show_volume(VolumeLevel::new(30));

        assert_eq!(
            drain(&mut rx),
            vec![
                UiCommand::ShowVolume(VolumeLevel::new(10)),
                UiCommand::ShowVolume(VolumeLevel::new(20)),
                UiCommand::HideWindow,
                UiCommand::ShowVolume(VolumeLevel::new(30)),
            ]
        );
    }

    #[test]
    fn test_shutdown_is_last_and_closes() {
        let (tx, mut rx) = command_channel(16);
        tx.show_volume(VolumeLevel::new(10));
        tx.shutdown();

        let received = drain(&mut rx);
        assert_eq!(received.last(), Some(&UiCommand::Shutdown));
        assert_eq!(rx.try_recv(), None);
        assert!(rx.is_closed());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let (tx, mut rx) = command_channel(4);
        for p in 1..=10 {
            tx.show_volume(VolumeLevel::new(p));
        }
        tx.shutdown();

        let received = drain(&mut rx);
        assert_eq!(rx.dropped(), 7);
        assert_eq!(
            received,
            vec![
                UiCommand::ShowVolume(VolumeLevel::new(8)),
                UiCommand::ShowVolume(VolumeLevel::new(9)),
                UiCommand::ShowVolume(VolumeLevel::new(10)),
                UiCommand::Shutdown,
            ]
        );
    }

    #[test]
    fn test_send_without_receiver_does_not_panic() {
        let (tx, rx) = command_channel(4);
        drop(rx);
        tx.show_volume(VolumeLevel::new(5));
        tx.shutdown();
    }

    #[test]
    fn test_oversized_capacity_is_capped() {
        let (tx, mut rx) = command_channel(usize::MAX);
        tx.show_volume(VolumeLevel::new(12));
        assert_eq!(rx.try_recv(), Some(UiCommand::ShowVolume(VolumeLevel::new(12))));
    }

    #[test]
    fn test_crosses_threads() {
        let (tx, mut rx) = command_channel(256);
        let producer = std::thread::spawn(move || {
            for p in 0..=100 {
                tx.show_volume(VolumeLevel::new(p));
            }
            tx.shutdown();
        });
        producer.join().unwrap();

        let received = drain(&mut rx);
        assert_eq!(received.len(), 102);
        assert_eq!(received[0], UiCommand::ShowVolume(VolumeLevel::new(0)));
        assert_eq!(received[100], UiCommand::ShowVolume(VolumeLevel::new(100)));
        assert_eq!(received[101], UiCommand::Shutdown);
    }
}
