#[cfg(test)]
mod tests {
    use crate::battle::engine::BattleRules;
    use crate::battle::runner::BattleRunner;
    use crate::battle::state::{BattleOutcome, BattlePhase, BattleSession, PlayerAction, OPPONENT_SIDE, PLAYER_SIDE};
    use crate::battle::tests::common::{create_test_battle, predictable_rng, test_data, TestMonsterBuilder};
    use crate::errors::BattleError;
    use pretty_assertions::assert_eq;

    fn runner(session: BattleSession) -> BattleRunner {
        BattleRunner::new(session, test_data(), BattleRules::default(), predictable_rng())
    }

    #[test]
    fn test_submission_resolves_with_ai_opponent() {
        // Arrange
        let mut runner = runner(create_test_battle(
            vec![TestMonsterBuilder::new("Sparchu", 5).build()],
            vec![TestMonsterBuilder::new("Larvea", 5).build()],
        ));
        assert!(runner.awaiting(PLAYER_SIDE));

        // Act
        let result = runner
            .submit_action(
                PLAYER_SIDE,
                PlayerAction::Attack {
                    ability: "scratch".to_string(),
                },
            )
            .unwrap()
            .expect("the AI fills in the opponent and the turn resolves");

        // Assert
        assert_eq!(result.phase, BattlePhase::SelectingAction);
        assert_eq!(result.outcome, None);
        assert_eq!(runner.session().turn_number, 2);
        assert_eq!(runner.session().opponent().active_monster().unwrap().health, 62);
    }

    #[test]
    fn test_invalid_submission_can_be_retried() {
        let mut runner = runner(create_test_battle(
            vec![TestMonsterBuilder::new("Sparchu", 5).build()],
            vec![TestMonsterBuilder::new("Larvea", 5).build()],
        ));

        let result = runner.submit_action(
            PLAYER_SIDE,
            PlayerAction::Attack {
                ability: "fire".to_string(),
            },
        );
        assert!(matches!(result, Err(BattleError::InsufficientEnergy { .. })));
        assert!(runner.awaiting(PLAYER_SIDE));
        assert_eq!(runner.session().turn_number, 1);

        let result = runner.submit_action(PLAYER_SIDE, PlayerAction::Defend).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn test_flee_ends_battle_and_returns_roster() {
        let mut runner = runner(create_test_battle(
            vec![TestMonsterBuilder::new("Sparchu", 5).with_health(40).build()],
            vec![TestMonsterBuilder::new("Larvea", 5).build()],
        ));

        let result = runner.submit_action(PLAYER_SIDE, PlayerAction::Flee).unwrap().unwrap();

        assert_eq!(result.outcome, Some(BattleOutcome::Fled));
        assert!(runner.is_battle_ended());
        assert_eq!(
            runner.submit_action(PLAYER_SIDE, PlayerAction::Defend).unwrap_err(),
            BattleError::BattleOver
        );
        let roster = runner.into_player_roster();
        assert_eq!(roster.get(0).unwrap().health, 40);
    }

    #[test]
    fn test_only_the_player_acts_during_replacement() {
        let mut runner = runner(create_test_battle(
            vec![
                TestMonsterBuilder::new("Larvea", 1).with_health(1).build(),
                TestMonsterBuilder::new("Sparchu", 5).build(),
            ],
            vec![TestMonsterBuilder::new("Jacana", 5).build()],
        ));
        let result = runner.submit_action(PLAYER_SIDE, PlayerAction::Defend).unwrap().unwrap();
        assert_eq!(result.phase, BattlePhase::AwaitingReplacement);

        assert_eq!(
            runner.submit_action(OPPONENT_SIDE, PlayerAction::Defend).unwrap_err(),
            BattleError::ReplacementRequired(PLAYER_SIDE)
        );
        assert!(!runner.awaiting(OPPONENT_SIDE));

        let result = runner
            .submit_action(PLAYER_SIDE, PlayerAction::Switch { slot: 1 })
            .unwrap()
            .unwrap();
        assert_eq!(result.phase, BattlePhase::SelectingAction);
        assert_eq!(runner.session().player().active, 1);
    }
}
