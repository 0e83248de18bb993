use sf3_env::{
    EnvConfig, EnvError, Environment, Frames, Phase, ScriptBook, SimConfig, SimulatedArcade, Wins,
    next_stage, run_random_baseline,
};

fn environment(config: EnvConfig, seed: u64) -> Environment<SimulatedArcade, ScriptBook> {
    let book = ScriptBook::builtin().unwrap();
    let arcade = SimulatedArcade::new(
        config.adapter_options(),
        SimConfig::for_book(&book, config.difficulty),
        seed,
    );
    Environment::new(arcade, book, config).unwrap()
}

#[test]
fn full_game_against_simulated_arcade() {
    let mut env = environment(EnvConfig::default(), 11);
    let frames = env.start().unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(env.phase(), Phase::Fighting);

    let mut wins = Wins::default();
    let mut rounds = 0;
    let mut step = 0usize;
    loop {
        let out = env.step(step % 9, (step / 9) % 10).unwrap();
        step += 1;
        assert_eq!(out.rewards.p1, -out.rewards.p2);
        assert!(matches!(out.frames, Frames::Stack(ref f) if f.len() == 3));
        if !out.round_done {
            continue;
        }
        rounds += 1;
        let now = env.state().expected_wins;
        assert_eq!((now.p1 + now.p2), (wins.p1 + wins.p2) + 1);
        wins = now;
        if out.game_done {
            assert!(wins.game_decided());
            break;
        }
        assert!(matches!(env.step(0, 0), Err(EnvError::CallOrder(_))));
        env.next_round().unwrap();
    }
    assert!((2..=3).contains(&rounds));

    let expected_stage = next_stage(1, wins).unwrap();
    env.next_round().unwrap();
    assert_eq!(env.state().stage, expected_stage);
    assert_eq!(env.state().expected_wins, Wins::default());
    assert_eq!(env.state().games, 1);
    assert_eq!(env.phase(), Phase::Fighting);

    env.close().unwrap();
    assert!(env.adapter().is_closed());
    assert!(matches!(env.step(0, 0), Err(EnvError::CallOrder(_))));
}

#[test]
fn random_baseline_plays_several_games() {
    let config = EnvConfig {
        frames_per_step: 1,
        frame_ratio: 2,
        ..Default::default()
    };
    let mut env = environment(config, 5);
    let stats = run_random_baseline(&mut env, 3, 5).unwrap();
    assert_eq!(stats.games, 3);
    assert!(stats.rounds >= 6 && stats.rounds <= 9);
    assert!(stats.p1_games_won <= 3);
    assert!((1..=10).contains(&stats.final_stage));
    assert_eq!(env.phase(), Phase::GameOver);
}

#[test]
fn single_frame_steps() {
    let config = EnvConfig {
        frames_per_step: 1,
        ..Default::default()
    };
    let mut env = environment(config, 2);
    assert!(matches!(env.start().unwrap(), Frames::Single(_)));
    let out = env.step(8, 9).unwrap();
    assert!(matches!(out.frames, Frames::Single(_)));
}
