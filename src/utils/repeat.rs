use log::Level;

/// Picks the log level for a failure that can recur every tick: `Warn` when
/// it first appears, `Debug` while the same failure keeps repeating.
#[derive(Debug)]
pub(crate) struct RepeatedFailure<K> {
    last: Option<K>,
}

impl<K> Default for RepeatedFailure<K> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<K: PartialEq> RepeatedFailure<K> {
    pub fn level(&mut self, kind: K) -> Level {
        if self.last.as_ref() == Some(&kind) {
            return Level::Debug;
        }
        self.last = Some(kind);
        Level::Warn
    }

    /// Forget the last failure once things work again.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_once_then_debug() {
        let mut failures = RepeatedFailure::default();
        assert_eq!(failures.level("xprop missing"), Level::Warn);
        assert_eq!(failures.level("xprop missing"), Level::Debug);
        assert_eq!(failures.level("xprop missing"), Level::Debug);
    }

    #[test]
    fn test_new_failure_warns_again() {
        let mut failures = RepeatedFailure::default();
        assert_eq!(failures.level(1), Level::Warn);
        assert_eq!(failures.level(2), Level::Warn);
        assert_eq!(failures.level(2), Level::Debug);
    }

    #[test]
    fn test_clear_rearms_warning() {
        let mut failures = RepeatedFailure::default();
        failures.level(());
        failures.clear();
        assert_eq!(failures.level(()), Level::Warn);
    }
}
