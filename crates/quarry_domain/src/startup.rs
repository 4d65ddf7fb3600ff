#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum StartupPhase {
    Uninitialized,
    ReloadDecided,
    DefaultResolved,
    Ready,
}

impl StartupPhase {
    fn successor(self) -> Option<StartupPhase> {
        match self {
            StartupPhase::Uninitialized => Some(StartupPhase::ReloadDecided),
            StartupPhase::ReloadDecided => Some(StartupPhase::DefaultResolved),
            StartupPhase::DefaultResolved => Some(StartupPhase::Ready),
            StartupPhase::Ready => None,
        }
    }

    /// Moves one step forward. Skipping a phase or going back is refused.
    pub fn advance_to(&mut self, next: StartupPhase) -> bool {
        if self.successor() != Some(next) {
            return false;
        }
        *self = next;
        true
    }

    pub fn reload_decided(self) -> bool {
        self >= StartupPhase::ReloadDecided
    }

    pub fn is_ready(self) -> bool {
        self == StartupPhase::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order_only() {
        let mut phase = StartupPhase::Uninitialized;
        assert!(!phase.advance_to(StartupPhase::DefaultResolved));
        assert!(phase.advance_to(StartupPhase::ReloadDecided));
        assert!(!phase.advance_to(StartupPhase::ReloadDecided));
        assert!(!phase.advance_to(StartupPhase::Ready));
        assert!(phase.advance_to(StartupPhase::DefaultResolved));
        assert!(phase.advance_to(StartupPhase::Ready));
        assert!(!phase.advance_to(StartupPhase::Ready));
        assert!(!phase.advance_to(StartupPhase::ReloadDecided));
        assert!(phase.is_ready());
    }
}
