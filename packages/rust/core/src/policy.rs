//! What the pipeline does when a listed title is already stored.

use ordertrack_shared::OnKnown;

/// Next action after meeting a known title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// End the candidate loop.
    Stop,
    /// Move on to the next candidate.
    Skip,
}

/// Known-title policy.
///
/// The listing is newest-first, so under [`StopAtFirstKnown`] everything
/// after the first known title is assumed stored already. New items listed
/// below a known one are missed if that ordering ever breaks.
///
/// [`StopAtFirstKnown`]: KnownTitlePolicy::StopAtFirstKnown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KnownTitlePolicy {
    #[default]
    StopAtFirstKnown,
    SkipKnown,
}

impl KnownTitlePolicy {
    /// Decide the step for a candidate whose title is already stored.
    pub fn on_known(self) -> Step {
        match self {
            Self::StopAtFirstKnown => Step::Stop,
            Self::SkipKnown => Step::Skip,
        }
    }
}

impl From<OnKnown> for KnownTitlePolicy {
    fn from(value: OnKnown) -> Self {
        match value {
            OnKnown::Stop => Self::StopAtFirstKnown,
            OnKnown::Skip => Self::SkipKnown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_stops() {
        assert_eq!(KnownTitlePolicy::default().on_known(), Step::Stop);
    }

    #[test]
    fn config_maps_to_policy() {
        assert_eq!(
            KnownTitlePolicy::from(OnKnown::Skip).on_known(),
            Step::Skip
        );
        assert_eq!(
            KnownTitlePolicy::from(OnKnown::Stop),
            KnownTitlePolicy::StopAtFirstKnown
        );
    }
}
