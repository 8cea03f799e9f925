use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;

use snake_common::{EngineError, Game, PlayerId, TickReport, log};

use crate::input::InputQueue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    AllDead,
    LastStanding(PlayerId),
    Frozen,
    Interrupted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub deaths: usize,
    pub pickups: usize,
    pub reason: StopReason,
}

pub struct RunOptions {
    pub tick_interval: Duration,
    pub max_ticks: Option<u64>,
    pub render: bool,
}

/// Decides whether the loop ends after `report`. A solo game runs until its
/// player dies; with several players it ends once at most one is alive.
pub fn stop_reason(
    game: &Game,
    report: &TickReport,
    initial_players: usize,
    max_ticks: Option<u64>,
) -> Option<StopReason> {
    let alive = game.alive_count();
    if initial_players <= 1 {
        if alive == 0 {
            return Some(StopReason::AllDead);
        }
    } else if alive <= 1 {
        let survivor = game.players().find(|p| p.is_alive()).map(|p| p.id());
        return Some(match survivor {
            Some(id) => StopReason::LastStanding(id),
            None => StopReason::AllDead,
        });
    }

    if report.moved.is_empty() {
        return Some(StopReason::Frozen);
    }
    if max_ticks.is_some_and(|limit| report.tick >= limit) {
        return Some(StopReason::TickLimit);
    }
    None
}

fn log_report(report: &TickReport) {
    for death in &report.deaths {
        log!(
            "Tick {}: player {} died at {} ({:?})",
            report.tick,
            death.player_id,
            death.position,
            death.cause
        );
    }
    if let Some(id) = report.halted_at {
        log!("Tick {}: halted at dead player {}", report.tick, id);
    }
}

/// Advances the game once per interval until a stop condition or Ctrl+C.
/// Input is drained only between updates. The number of the completed tick
/// is published on `ticks` after every update.
pub async fn run_game(
    game: &mut Game,
    mut input: InputQueue,
    ticks: watch::Sender<u64>,
    options: RunOptions,
) -> Result<RunSummary, EngineError> {
    let initial_players = game.player_count();
    let mut timer = IntervalStream::new(interval(options.tick_interval));
    // The first interval tick fires immediately.
    timer.next().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut summary = RunSummary {
        ticks: 0,
        deaths: 0,
        pickups: 0,
        reason: StopReason::Interrupted,
    };

    if options.render {
        log!("Initial map:\n{}", game.map());
    }

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log!("Shutdown signal received after tick {}", summary.ticks);
                summary.reason = StopReason::Interrupted;
                break;
            }
            tick = timer.next() => {
                if tick.is_none() {
                    break;
                }

                input.drain_into(game);
                let report = game.update()?;
                game.stamp_players();
                log_report(&report);
                if options.render {
                    log!("Tick {}:\n{}", report.tick, game.map());
                }

                summary.ticks = report.tick;
                summary.deaths += report.deaths.len();
                summary.pickups += report.pickups.len();
                // Only the scripted input task listens; it may already be done.
                let _ = ticks.send(report.tick);

                if let Some(reason) = stop_reason(game, &report, initial_players, options.max_ticks) {
                    summary.reason = reason;
                    break;
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_common::{Action, GameSettings, Map, SessionRng, Vec2, build_game};

    fn open_game(players: &[(Vec2, Vec2)]) -> Game {
        let mut game = Game::new(Map::new(16, 16).unwrap());
        for (head, tail) in players {
            let id = game.add_player();
            game.spawn_player(id, *head, *tail).unwrap();
        }
        game
    }

    #[test]
    fn test_tick_limit_stops_solo_game() {
        let mut game = open_game(&[(Vec2::new(3, 4), Vec2::new(3, 3))]);
        let report = game.update().unwrap();
        game.stamp_players();

        assert_eq!(stop_reason(&game, &report, 1, Some(2)), None);
        let report = game.update().unwrap();
        assert_eq!(stop_reason(&game, &report, 1, Some(2)), Some(StopReason::TickLimit));
        assert_eq!(stop_reason(&game, &report, 1, None), None);
    }

    #[test]
    fn test_last_standing_ends_multiplayer_game() {
        let mut game = open_game(&[
            (Vec2::new(3, 4), Vec2::new(3, 3)),
            (Vec2::new(9, 4), Vec2::new(9, 3)),
        ]);
        game.map_mut().set_cell(Vec2::new(9, 5), snake_common::Cell::Wall);
        game.set_action(PlayerId::new(0), Action::MoveUp).unwrap();

        let report = game.update().unwrap();
        game.stamp_players();

        assert_eq!(report.deaths.len(), 1);
        assert_eq!(
            stop_reason(&game, &report, 2, None),
            Some(StopReason::LastStanding(PlayerId::new(0)))
        );
    }

    #[test]
    fn test_dead_solo_player_ends_game() {
        let mut game = open_game(&[(Vec2::new(3, 4), Vec2::new(3, 3))]);
        game.map_mut().set_cell(Vec2::new(3, 5), snake_common::Cell::Wall);

        let report = game.update().unwrap();
        assert_eq!(stop_reason(&game, &report, 1, None), Some(StopReason::AllDead));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_game_reaches_tick_limit() {
        let settings = GameSettings::default();
        let mut game = build_game(&settings, &mut SessionRng::new(3)).unwrap();
        let (_sender, queue) = InputQueue::channel();
        let (tick_tx, tick_rx) = watch::channel(0);

        let options = RunOptions {
            tick_interval: Duration::from_millis(settings.tick_interval_ms),
            max_ticks: Some(5),
            render: false,
        };
        let summary = run_game(&mut game, queue, tick_tx, options).await.unwrap();

        assert_eq!(summary.reason, StopReason::TickLimit);
        assert_eq!(summary.ticks, 5);
        assert_eq!(*tick_rx.borrow(), 5);
        assert_eq!(game.player(PlayerId::new(0)).unwrap().front(), Some(Vec2::new(16, 21)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_game_stops_when_player_dies() {
        let settings = GameSettings::default();
        let mut game = build_game(&settings, &mut SessionRng::new(3)).unwrap();
        let (_sender, queue) = InputQueue::channel();
        let (tick_tx, _tick_rx) = watch::channel(0);

        let options = RunOptions {
            tick_interval: Duration::from_millis(10),
            max_ticks: None,
            render: false,
        };
        let summary = run_game(&mut game, queue, tick_tx, options).await.unwrap();

        assert_eq!(summary.reason, StopReason::AllDead);
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.ticks, 15);
    }
}
