// Validation and application of player commands against the game state.

use super::state::{GameState, PlayerId, ProjectileId};
use super::tuning::Rules;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Launch `word` at the opponent. Any word is accepted.
    Fire { word: String },
    RaiseShield,
}

/// Side effect the caller has to carry out after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    /// Nothing changed (absent player, or shield already up).
    Ignored,
    ProjectileSpawned(ProjectileId),
    /// The shield went up; a shield timer must be armed for this player.
    ShieldRaised,
}

pub fn apply_command(
    state: &mut GameState,
    rules: &Rules,
    player_id: PlayerId,
    command: PlayerCommand,
) -> CommandEffect {
    match command {
        PlayerCommand::Fire { word } => state
            .spawn_projectile(player_id, word, rules)
            .map_or(CommandEffect::Ignored, CommandEffect::ProjectileSpawned),
        PlayerCommand::RaiseShield => match state.players.get_mut(&player_id) {
            Some(player) if !player.shield => {
                player.shield = true;
                CommandEffect::ShieldRaised
            }
            _ => CommandEffect::Ignored,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Player;

    fn duel(rules: &Rules) -> GameState {
        let mut state = GameState::new();
        state.players.insert(1, Player::spawn(1, &rules.player));
        state.players.insert(2, Player::spawn(2, &rules.player));
        state
    }

    #[test]
    fn fire_appends_a_projectile_owned_by_the_sender() {
        let rules = Rules::default();
        let mut state = duel(&rules);

        let effect = apply_command(
            &mut state,
            &rules,
            2,
            PlayerCommand::Fire {
                word: "POKA-YOKE".into(),
            },
        );

        assert!(matches!(effect, CommandEffect::ProjectileSpawned(_)));
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].owner, 2);
        assert_eq!(state.projectiles[0].word, "POKA-YOKE");
    }

    #[test]
    fn any_word_is_accepted_as_ammunition() {
        let rules = Rules::default();
        let mut state = duel(&rules);

        let effect = apply_command(
            &mut state,
            &rules,
            1,
            PlayerCommand::Fire {
                word: "not in any word bank".into(),
            },
        );

        assert!(matches!(effect, CommandEffect::ProjectileSpawned(_)));
    }

    #[test]
    fn commands_from_absent_players_are_ignored() {
        let rules = Rules::default();
        let mut state = GameState::new();

        let fire = apply_command(
            &mut state,
            &rules,
            1,
            PlayerCommand::Fire { word: "JIT".into() },
        );
        let shield = apply_command(&mut state, &rules, 1, PlayerCommand::RaiseShield);

        assert_eq!(fire, CommandEffect::Ignored);
        assert_eq!(shield, CommandEffect::Ignored);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn raising_an_active_shield_is_idempotent() {
        let rules = Rules::default();
        let mut state = duel(&rules);

        let first = apply_command(&mut state, &rules, 2, PlayerCommand::RaiseShield);
        let second = apply_command(&mut state, &rules, 2, PlayerCommand::RaiseShield);

        assert_eq!(first, CommandEffect::ShieldRaised);
        assert_eq!(second, CommandEffect::Ignored);
        assert!(state.player(2).is_some_and(|p| p.shield));
        assert!(state.player(1).is_some_and(|p| !p.shield));
    }
}
