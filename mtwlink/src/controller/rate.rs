//! Update rate selection.

/// Pick the supported rate closest to `desired`.
///
/// Ties go to the rate listed first. Returns 0 when `supported` is empty.
///
/// # Example
///
/// ```
/// use mtwlink::controller::select_update_rate;
///
/// assert_eq!(select_update_rate(&[50, 60, 120], 75), 60);
/// assert_eq!(select_update_rate(&[], 75), 0);
/// ```
pub fn select_update_rate(supported: &[u32], desired: u32) -> u32 {
    supported
        .iter()
        .copied()
        .min_by_key(|rate| rate.abs_diff(desired))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_closest_below() {
        assert_eq!(select_update_rate(&[50, 60, 120], 75), 60);
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(select_update_rate(&[60, 75, 80, 100, 120], 75), 75);
    }

    #[test]
    fn test_empty() {
        assert_eq!(select_update_rate(&[], 75), 0);
    }

    #[test]
    fn test_tie_keeps_first() {
        assert_eq!(select_update_rate(&[70, 80], 75), 70);
        assert_eq!(select_update_rate(&[80, 70], 75), 80);
    }

    proptest! {
        /// Property: a single supported rate is always chosen.
        #[test]
        fn prop_single_rate_always_chosen(desired in any::<u32>()) {
            prop_assert_eq!(select_update_rate(&[100], desired), 100);
        }

        /// Property: the result is a member with minimal distance.
        #[test]
        fn prop_result_is_closest_member(
            rates in proptest::collection::vec(1u32..1000, 1..16),
            desired in 0u32..1200,
        ) {
            let chosen = select_update_rate(&rates, desired);
            prop_assert!(rates.contains(&chosen));
            let best = rates.iter().map(|r| r.abs_diff(desired)).min().unwrap();
            prop_assert_eq!(chosen.abs_diff(desired), best);
            let first = rates.iter().find(|r| r.abs_diff(desired) == best).copied();
            prop_assert_eq!(Some(chosen), first);
        }
    }
}
