// Level progression: experience is level-relative and resets to the remainder on level-up.

use super::catalog::{level_threshold, MAX_LEVEL};

/// Experience still needed to leave `level`. Zero at or above the cap.
pub fn exp_to_next_level(level: u32, exp: i64) -> i64 {
    if level >= MAX_LEVEL {
        return 0;
    }
    match level_threshold(level) {
        Some(threshold) => (threshold - exp).max(0),
        None => 0,
    }
}

/// Add `gained` experience to a (level, experience) pair.
///
/// Advances at most one level per call, even if the total would cross several
/// thresholds; the leftover carries into the next grant. Returns whether a
/// level-up occurred.
pub fn apply_experience(level: &mut u32, experience: &mut i64, gained: i64) -> bool {
    let total = *experience + gained;
    if *level < MAX_LEVEL {
        if let Some(threshold) = level_threshold(*level) {
            if total >= threshold {
                *level += 1;
                *experience = total - threshold;
                return true;
            }
        }
    }
    *experience = total;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_to_next_level_fresh_user() {
        assert_eq!(exp_to_next_level(1, 0), 100);
        assert_eq!(exp_to_next_level(1, 90), 10);
        assert_eq!(exp_to_next_level(3, 50), 400);
    }

    #[test]
    fn test_exp_to_next_level_at_cap() {
        assert_eq!(exp_to_next_level(10, 0), 0);
        assert_eq!(exp_to_next_level(12, 5000), 0);
    }

    #[test]
    fn test_single_threshold_crossing() {
        let (mut level, mut exp) = (1, 90);
        assert!(apply_experience(&mut level, &mut exp, 20));
        assert_eq!(level, 2);
        assert_eq!(exp, 10);
    }

    #[test]
    fn test_exact_threshold_levels_up() {
        let (mut level, mut exp) = (2, 200);
        assert!(apply_experience(&mut level, &mut exp, 50));
        assert_eq!(level, 3);
        assert_eq!(exp, 0);
    }

    #[test]
    fn test_large_grant_advances_one_level_only() {
        let (mut level, mut exp) = (1, 0);
        assert!(apply_experience(&mut level, &mut exp, 500));
        assert_eq!(level, 2);
        assert_eq!(exp, 400);

        // The leftover already exceeds level 2's threshold; the next grant moves on.
        assert!(apply_experience(&mut level, &mut exp, 0));
        assert_eq!(level, 3);
        assert_eq!(exp, 150);
    }

    #[test]
    fn test_below_threshold_accumulates() {
        let (mut level, mut exp) = (1, 10);
        assert!(!apply_experience(&mut level, &mut exp, 35));
        assert_eq!(level, 1);
        assert_eq!(exp, 45);
    }

    #[test]
    fn test_cap_accumulates_without_leveling() {
        let (mut level, mut exp) = (MAX_LEVEL, 3990);
        assert!(!apply_experience(&mut level, &mut exp, 120));
        assert_eq!(level, MAX_LEVEL);
        assert_eq!(exp, 4110);
    }
}
