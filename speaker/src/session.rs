//! Transient per-identity clip slot state.

/// Enrollment lifecycle of one identity's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnrollState {
    /// Slots are being filled; nothing committed this round.
    Collecting,
    /// A fingerprint was committed from the current slots.
    Complete,
}

/// Clip slots collected for one identity before commit.
///
/// Slots are addressed 1-based by callers (matching the upload protocol)
/// and may be overwritten freely while collecting. This state is never
/// persisted; a process restart simply restarts collection.
pub(crate) struct Session {
    slots: Vec<Option<Vec<u8>>>,
    state: EnrollState,
}

impl Session {
    pub(crate) fn new(required_clips: usize) -> Self {
        Self {
            slots: vec![None; required_clips],
            state: EnrollState::Collecting,
        }
    }

    /// Store canonical audio at a 1-based slot, overwriting prior content.
    ///
    /// A clip arriving after a committed enrollment starts a fresh round:
    /// all slots are cleared before the new clip is stored.
    pub(crate) fn put_slot(&mut self, slot: usize, audio: Vec<u8>) {
        if self.state == EnrollState::Complete {
            for s in &mut self.slots {
                *s = None;
            }
            self.state = EnrollState::Collecting;
        }
        self.slots[slot - 1] = Some(audio);
    }

    /// Number of filled slots.
    pub(crate) fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.filled() == self.slots.len()
    }

    /// Filled slots in slot order.
    pub(crate) fn clips(&self) -> impl Iterator<Item = &[u8]> {
        self.slots.iter().filter_map(|s| s.as_deref())
    }

    pub(crate) fn mark_complete(&mut self) {
        self.state = EnrollState::Complete;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_in_any_order() {
        let mut s = Session::new(3);
        assert_eq!(s.filled(), 0);
        s.put_slot(3, vec![3]);
        s.put_slot(1, vec![1]);
        assert_eq!(s.filled(), 2);
        assert!(!s.is_full());

        s.put_slot(2, vec![2]);
        assert!(s.is_full());

        let clips: Vec<&[u8]> = s.clips().collect();
        assert_eq!(clips, vec![&[1u8][..], &[2u8][..], &[3u8][..]]);
    }

    #[test]
    fn overwrite_keeps_latest() {
        let mut s = Session::new(2);
        s.put_slot(1, vec![0xAA]);
        s.put_slot(1, vec![0xBB]);
        assert_eq!(s.filled(), 1);
        assert_eq!(s.clips().next().unwrap(), &[0xBB]);
    }

    #[test]
    fn new_clip_after_complete_resets() {
        let mut s = Session::new(2);
        s.put_slot(1, vec![1]);
        s.put_slot(2, vec![2]);
        s.mark_complete();

        s.put_slot(2, vec![9]);
        assert_eq!(s.state, EnrollState::Collecting);
        assert_eq!(s.filled(), 1);
        assert_eq!(s.clips().next().unwrap(), &[9]);
    }

    #[test]
    fn failed_commit_preserves_slots() {
        let mut s = Session::new(2);
        s.put_slot(1, vec![1]);
        s.put_slot(2, vec![2]);
        // No mark_complete: commit failed. Overwriting one slot keeps
        // the other and the session stays full for a retry.
        s.put_slot(1, vec![7]);
        assert!(s.is_full());
        let clips: Vec<&[u8]> = s.clips().collect();
        assert_eq!(clips, vec![&[7u8][..], &[2u8][..]]);
    }
}
