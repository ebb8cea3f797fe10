//! Per-connection session state

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::net::SocketAddr;

/// State owned by exactly one connection task
///
/// Tracks which catalog indices this client has already been offered and
/// carries a private random generator, seeded from OS entropy at connect
/// time. Nothing here is shared with other sessions.
#[derive(Debug)]
pub struct SessionState {
    /// Client id assigned by the supervisor, used for logging
    pub id: u32,
    /// Peer address, used for logging
    pub addr: SocketAddr,
    told_jokes: HashSet<usize>,
    rng: StdRng,
}

impl SessionState {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self::with_rng(id, addr, StdRng::from_entropy())
    }

    /// Deterministic session for tests and benchmarks
    pub fn with_seed(id: u32, addr: SocketAddr, seed: u64) -> Self {
        Self::with_rng(id, addr, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: u32, addr: SocketAddr, rng: StdRng) -> Self {
        Self {
            id,
            addr,
            told_jokes: HashSet::new(),
            rng,
        }
    }

    /// Picks an untold index uniformly at random and marks it told.
    ///
    /// The index is recorded before the joke is delivered, so a dialogue that
    /// restarts or fails never offers it again. Returns `None` once every
    /// index below `catalog_len` has been used.
    pub fn pick_untold(&mut self, catalog_len: usize) -> Option<usize> {
        let available: Vec<usize> = (0..catalog_len)
            .filter(|i| !self.told_jokes.contains(i))
            .collect();

        let index = *available.choose(&mut self.rng)?;
        self.told_jokes.insert(index);
        Some(index)
    }

    pub fn has_told(&self, index: usize) -> bool {
        self.told_jokes.contains(&index)
    }

    pub fn told_count(&self) -> usize {
        self.told_jokes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8079".parse().unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = SessionState::new(7, test_addr());
        assert_eq!(session.id, 7);
        assert_eq!(session.addr, test_addr());
        assert_eq!(session.told_count(), 0);
    }

    #[test]
    fn test_pick_untold_exhausts_catalog_without_repeats() {
        let mut session = SessionState::with_seed(1, test_addr(), 42);
        let mut seen = Vec::new();

        for _ in 0..5 {
            let index = session.pick_untold(5).unwrap();
            assert!(index < 5);
            assert!(!seen.contains(&index), "index {} offered twice", index);
            assert!(session.has_told(index));
            seen.push(index);
        }

        assert_eq!(session.told_count(), 5);
        assert_eq!(session.pick_untold(5), None);
        assert_eq!(session.told_count(), 5);
    }

    #[test]
    fn test_pick_untold_with_empty_catalog() {
        let mut session = SessionState::with_seed(1, test_addr(), 0);
        assert_eq!(session.pick_untold(0), None);
    }

    #[test]
    fn test_sessions_have_independent_state() {
        let mut first = SessionState::with_seed(1, test_addr(), 1);
        let mut second = SessionState::with_seed(2, test_addr(), 1);

        let index = first.pick_untold(3).unwrap();
        assert!(first.has_told(index));
        assert!(!second.has_told(index));

        // Same seed, same untouched history: same first choice
        assert_eq!(second.pick_untold(3), Some(index));
    }

    #[test]
    fn test_selection_covers_all_indices() {
        // Over many fresh sessions every index should get picked first at least once
        let mut firsts = HashSet::new();
        for seed in 0..200 {
            let mut session = SessionState::with_seed(1, test_addr(), seed);
            firsts.insert(session.pick_untold(4).unwrap());
        }
        assert_eq!(firsts.len(), 4);
    }
}
