use tokio::sync::{mpsc, watch};

use snake_common::{Game, KeyCode, log};

use crate::server_config::ScriptedPress;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub keycode: KeyCode,
}

/// Single-reader end of the input channel. Presses are applied to the game
/// only between ticks, never while an update is running.
pub struct InputQueue {
    receiver: mpsc::UnboundedReceiver<KeyPress>,
}

impl InputQueue {
    pub fn channel() -> (mpsc::UnboundedSender<KeyPress>, InputQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, InputQueue { receiver })
    }

    /// Applies every queued press in arrival order. A later press for the
    /// same player replaces an earlier one. Returns how many presses hit a
    /// bound key.
    pub fn drain_into(&mut self, game: &mut Game) -> usize {
        let mut applied = 0;
        while let Ok(press) = self.receiver.try_recv() {
            if game.handle_key(press.keycode).is_some() {
                applied += 1;
            }
        }
        applied
    }
}

/// Feeds scripted presses into the queue. `ticks` carries the number of the
/// last completed tick; presses for the next tick are sent as soon as it
/// changes. Ends when the tick loop drops its sender.
pub async fn run_script(
    mut script: Vec<ScriptedPress>,
    mut ticks: watch::Receiver<u64>,
    sender: mpsc::UnboundedSender<KeyPress>,
) {
    script.sort_by_key(|press| press.tick);
    let mut pending = script.into_iter().peekable();

    loop {
        let next_tick = *ticks.borrow_and_update() + 1;
        while let Some(press) = pending.next_if(|press| press.tick <= next_tick) {
            if press.tick < next_tick {
                log!("Dropping scripted key {} for past tick {}", press.keycode, press.tick);
                continue;
            }
            if sender.send(KeyPress { keycode: press.keycode }).is_err() {
                return;
            }
        }

        if pending.peek().is_none() || ticks.changed().await.is_err() {
            return;
        }
    }
}
