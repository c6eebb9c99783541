use super::{StoppingRule, Verdict};
use crate::state::TraversalState;

/// Extends a contig for as long as there is exactly one way to go:
/// accepts at the first dead end or junction, never rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContigStopper;

impl StoppingRule for ContigStopper {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict {
        if state.num_adjacent != 1 {
            Verdict::Accept
        } else {
            Verdict::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stopper::testing::Fixture;

    #[test]
    fn accepts_off_unique_paths() {
        let fix = Fixture::new(&[0], &[]);
        let v = fix.vertex("ACGTA", &[0]);
        let mut rule = ContigStopper;
        assert_eq!(rule.step(&fix.state(&v, 0, 1, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&v, 0, 2, 0)), Verdict::Accept);
        assert_eq!(rule.step(&fix.state(&v, 0, 3, 2)), Verdict::Accept);
        assert!(!rule.tolerates_cycles());
    }
}
