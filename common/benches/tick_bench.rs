use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use snake_common::settings::RandomPowerUps;
use snake_common::{build_game, Action, GameRules, GameSettings, KeyBindingTable, PlayerId, SessionRng};
use snake_common::game::{DeadPlayerPolicy, DeadPlayerBehavior};

fn bench_settings() -> GameSettings {
    GameSettings {
        width: 128,
        height: 128,
        player_count: 8,
        random_power_ups: RandomPowerUps { count: 200, power: 3 },
        rules: GameRules {
            dead_player_policy: DeadPlayerPolicy::SkipPlayer,
            dead_player_behavior: DeadPlayerBehavior::Disappear,
            ..GameRules::default()
        },
        ..GameSettings::default()
    }
}

fn bench_hundred_ticks() {
    let settings = bench_settings();
    let mut game = build_game(&settings, &mut SessionRng::new(7)).expect("bench settings are valid");

    let turns = [Action::MoveLeft, Action::MoveUp, Action::MoveRight, Action::MoveUp];
    for tick in 0..100 {
        for player in 0..settings.player_count {
            let action = turns[(tick / 5 + player as usize) % turns.len()];
            let _ = game.set_action(PlayerId::new(player), action);
        }
        black_box(game.update().expect("engine invariant broken"));
        game.stamp_players();
    }
}

fn bench_key_lookups() {
    let mut table = KeyBindingTable::new();
    for key in 0..256u16 {
        table.map(key * 3, PlayerId::new(u32::from(key % 4)), Action::MoveUp).expect("allocation");
    }
    for key in 0..1024u16 {
        black_box(table.lookup(key));
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("tick_100_8_players", |b| b.iter(bench_hundred_ticks));
    c.bench_function("key_lookup_1024", |b| b.iter(bench_key_lookups));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
