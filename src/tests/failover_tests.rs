#[cfg(test)]
mod tests {
    use crate::sync::failover::NodeSelector;

    fn selector() -> NodeSelector {
        NodeSelector::new(
            "http://main.invalid".to_string(),
            "http://backup.invalid".to_string(),
            2,
        )
    }

    #[test]
    fn starts_on_primary() {
        let s = selector();
        assert_eq!(s.current_url(), "http://main.invalid");
        assert_eq!(s.retries(), 0);
    }

    #[test]
    fn switches_after_budget_is_spent() {
        let mut s = selector();
        // two retries fit in the budget of 2
        assert!(!s.record_failure());
        assert!(!s.record_failure());
        assert_eq!(s.retries(), 2);
        assert_eq!(s.current_url(), "http://main.invalid");
        // the third failure trips the switch and resets the counter
        assert!(s.record_failure());
        assert_eq!(s.current_url(), "http://backup.invalid");
        assert_eq!(s.retries(), 0);
    }

    #[test]
    fn success_resets_the_counter() {
        let mut s = selector();
        assert!(!s.record_failure());
        assert!(!s.record_failure());
        s.record_success();
        assert_eq!(s.retries(), 0);
        // the budget is fresh again, no switch on the next failure
        assert!(!s.record_failure());
        assert_eq!(s.current_url(), "http://main.invalid");
    }

    #[test]
    fn switches_back_to_primary_when_backup_fails_too() {
        let mut s = selector();
        for _ in 0..2 {
            assert!(!s.record_failure());
        }
        assert!(s.record_failure());
        assert_eq!(s.current_url(), "http://backup.invalid");

        for _ in 0..2 {
            assert!(!s.record_failure());
        }
        assert!(s.record_failure());
        assert_eq!(s.current_url(), "http://main.invalid");
    }

    #[test]
    fn zero_budget_switches_on_first_failure() {
        let mut s = NodeSelector::new("a".to_string(), "b".to_string(), 0);
        assert!(s.record_failure());
        assert_eq!(s.current_url(), "b");
    }
}
