//! Animation gate.
//!
//! While a move is being animated the gate is busy and playback refuses to
//! change position. Each acquisition hands out a [`Ticket`]; only the matching
//! ticket can free the gate, so a late completion from a cancelled animation
//! is ignored instead of releasing a newer one.

/// Proof of a single gate acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Free,
    Busy(Ticket),
}

/// Two-state lock scoped to one visual transition.
#[derive(Debug, Clone)]
pub struct AnimationGate {
    state: GateState,
    issued: u64,
}

impl Default for AnimationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Free,
            issued: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, GateState::Busy(_))
    }

    /// Take the gate. Returns `None` if it is already held.
    pub fn acquire(&mut self) -> Option<Ticket> {
        if self.is_busy() {
            return None;
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.state = GateState::Busy(ticket);
        Some(ticket)
    }

    /// Free the gate if `ticket` is the one currently holding it.
    pub fn release(&mut self, ticket: Ticket) -> bool {
        if self.state == GateState::Busy(ticket) {
            self.state = GateState::Free;
            true
        } else {
            false
        }
    }

    /// Free the gate unconditionally, orphaning any outstanding ticket.
    pub fn cancel(&mut self) {
        self.state = GateState::Free;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_exclusive() {
        let mut gate = AnimationGate::new();
        let ticket = gate.acquire().unwrap();
        assert!(gate.is_busy());
        assert!(gate.acquire().is_none());

        assert!(gate.release(ticket));
        assert!(!gate.is_busy());
        assert!(!gate.release(ticket));
    }

    #[test]
    fn cancelled_ticket_cannot_release_newer_hold() {
        let mut gate = AnimationGate::new();
        let stale = gate.acquire().unwrap();
        gate.cancel();

        let fresh = gate.acquire().unwrap();
        assert_ne!(stale, fresh);
        assert!(!gate.release(stale));
        assert!(gate.is_busy());
        assert!(gate.release(fresh));
    }
}
