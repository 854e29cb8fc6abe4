//! Classification to corrective actions.

use std::collections::BTreeSet;

use super::types::{Action, ActionPolicy, Classification};

/// Decide which actions to take for one torrent.
///
/// Pure: nothing is sent to the torrent client here. Each rule is evaluated
/// independently, so a paused and queued CRITICAL torrent can get both
/// actions. LOW and HEALTHY never produce actions.
pub fn plan(
    classification: Classification,
    is_paused: bool,
    is_queued: bool,
    policy: &ActionPolicy,
) -> BTreeSet<Action> {
    let mut actions = BTreeSet::new();

    let resume_allowed = match classification {
        Classification::Critical => policy.resume_critical,
        Classification::Rare => policy.resume_rare,
        Classification::Low | Classification::Healthy => false,
    };
    if is_paused && resume_allowed {
        actions.insert(Action::Resume);
    }

    // Queue position is meaningless for torrents outside the queue.
    if policy.set_priorities && classification.is_at_risk() && is_queued {
        actions.insert(Action::BoostPriority);
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> ActionPolicy {
        ActionPolicy {
            resume_critical: true,
            resume_rare: true,
            set_priorities: true,
        }
    }

    #[test]
    fn test_critical_paused_resumes() {
        let policy = ActionPolicy {
            resume_critical: true,
            resume_rare: false,
            set_priorities: false,
        };
        let actions = plan(Classification::Critical, true, false, &policy);
        assert_eq!(actions, BTreeSet::from([Action::Resume]));
    }

    #[test]
    fn test_critical_not_paused_does_not_resume() {
        let actions = plan(Classification::Critical, false, false, &all_on());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_rare_respects_resume_rare_flag() {
        let policy = ActionPolicy {
            resume_critical: true,
            resume_rare: false,
            set_priorities: false,
        };
        assert!(plan(Classification::Rare, true, false, &policy).is_empty());

        let policy = ActionPolicy {
            resume_rare: true,
            ..policy
        };
        assert_eq!(
            plan(Classification::Rare, true, false, &policy),
            BTreeSet::from([Action::Resume])
        );
    }

    #[test]
    fn test_resume_critical_disabled() {
        let policy = ActionPolicy {
            resume_critical: false,
            ..all_on()
        };
        assert!(plan(Classification::Critical, true, false, &policy).is_empty());
    }

    #[test]
    fn test_boost_requires_queued() {
        assert!(plan(Classification::Rare, false, false, &all_on()).is_empty());
        assert_eq!(
            plan(Classification::Rare, false, true, &all_on()),
            BTreeSet::from([Action::BoostPriority])
        );
    }

    #[test]
    fn test_boost_requires_set_priorities() {
        let policy = ActionPolicy {
            set_priorities: false,
            ..all_on()
        };
        assert!(plan(Classification::Critical, false, true, &policy).is_empty());
    }

    #[test]
    fn test_both_actions() {
        let actions = plan(Classification::Critical, true, true, &all_on());
        assert_eq!(
            actions,
            BTreeSet::from([Action::Resume, Action::BoostPriority])
        );
    }

    #[test]
    fn test_low_and_healthy_never_act() {
        for paused in [false, true] {
            for queued in [false, true] {
                assert!(plan(Classification::Low, paused, queued, &all_on()).is_empty());
                assert!(plan(Classification::Healthy, paused, queued, &all_on()).is_empty());
            }
        }
    }

    #[test]
    fn test_plan_is_idempotent() {
        let first = plan(Classification::Rare, true, true, &all_on());
        let second = plan(Classification::Rare, true, true, &all_on());
        assert_eq!(first, second);
    }
}
