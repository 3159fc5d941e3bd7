use crate::types::{GuildProgressState, ProgressOutcome, UserProgress, BANKRUPTCY_THRESHOLD, MILESTONE_LEVELS};

/// Computes and applies the milestone/bankruptcy transition for one balance
/// update, mutating `state` in place. Mirrors the source exactly: pending
/// levels are anything at or below `new_balance` not yet seen (a "catch-up"
/// jump still fires every level it passed, not just the nearest one); a
/// bankruptcy transition clears `milestones_seen` so the user can re-earn
/// the same sequence of milestones from scratch.
pub fn update(
    state: &mut GuildProgressState,
    user_key: &str,
    previous_balance: f64,
    new_balance: f64,
) -> ProgressOutcome {
    let entry = state.users.entry(user_key.to_string()).or_insert_with(UserProgress::default);

    let mut pending = Vec::new();
    for &level in MILESTONE_LEVELS {
        if entry.milestones_seen.contains(&level) {
            continue;
        }
        if new_balance >= level as f64 {
            pending.push(level);
        }
    }
    entry.milestones_seen.extend(pending.iter().copied());

    let bankrupt = previous_balance > BANKRUPTCY_THRESHOLD && new_balance <= BANKRUPTCY_THRESHOLD;
    if bankrupt {
        entry.milestones_seen.clear();
    }

    ProgressOutcome {
        milestones_reached: pending,
        bankrupt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_multiple_levels_at_once_reports_all_of_them() {
        let mut state = GuildProgressState::default();
        let outcome = update(&mut state, "discord:1", 0.0, 120.0);
        assert_eq!(outcome.milestones_reached, vec![10, 50, 100]);
        assert!(!outcome.bankrupt);
        assert_eq!(state.users["discord:1"].milestones_seen, vec![10, 50, 100]);
    }

    #[test]
    fn already_seen_levels_are_not_repeated() {
        let mut state = GuildProgressState::default();
        update(&mut state, "discord:1", 0.0, 15.0);
        let outcome = update(&mut state, "discord:1", 15.0, 40.0);
        assert!(outcome.milestones_reached.is_empty());
    }

    #[test]
    fn bankruptcy_transition_resets_milestones_seen() {
        let mut state = GuildProgressState::default();
        update(&mut state, "discord:1", 0.0, 60.0);
        assert_eq!(state.users["discord:1"].milestones_seen.len(), 2);

        let outcome = update(&mut state, "discord:1", 60.0, 0.0);
        assert!(outcome.bankrupt);
        assert!(state.users["discord:1"].milestones_seen.is_empty());
    }

    #[test]
    fn starting_at_zero_does_not_trigger_bankruptcy() {
        let mut state = GuildProgressState::default();
        let outcome = update(&mut state, "discord:1", 0.0, 0.0);
        assert!(!outcome.bankrupt);
    }

    #[test]
    fn re_earning_after_bankruptcy_fires_milestones_again() {
        let mut state = GuildProgressState::default();
        update(&mut state, "discord:1", 0.0, 60.0);
        update(&mut state, "discord:1", 60.0, 0.0);
        let outcome = update(&mut state, "discord:1", 0.0, 10.0);
        assert_eq!(outcome.milestones_reached, vec![10]);
    }
}
