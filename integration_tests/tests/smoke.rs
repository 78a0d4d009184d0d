mod common;

use core_sim::SimulationSession;

#[test]
fn session_initializes_from_test_config() {
    let config = common::test_config();
    assert_eq!(config.seed, Some(2024));
    assert_eq!(config.notifications.channel_capacity, 16);

    let mut session = SimulationSession::init(config);
    let state = session.current_state();
    assert_eq!((state.turn, state.day, state.seed), (1, 1, 2024));
    assert!(state.provinces.is_empty());
    assert!(state.relations.is_empty());

    // a single advance exercises the scheduler and the store end to end
    session.advance_turn().expect("active session");
    assert_eq!(session.current_state().turn, 2);
}
