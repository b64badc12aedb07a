//! In-memory board repository.
//!
//! Keeps the last saved board in process memory. Hosts without durable
//! storage and tests use it; `set_failing` makes every call fail so save
//! failure paths can be driven deterministically.

use crate::model::board::Board;
use crate::repo::board_repo::{BoardRepository, RepoError, RepoResult};
use std::cell::{Cell, RefCell};

#[derive(Debug, Default)]
pub struct MemoryBoardRepository {
    stored: RefCell<Option<Board>>,
    save_count: Cell<usize>,
    failing: Cell<bool>,
}

impl MemoryBoardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `board`.
    pub fn with_board(board: Board) -> Self {
        let repo = Self::default();
        repo.stored.replace(Some(board));
        repo
    }

    /// Last successfully saved (or seeded) board.
    pub fn stored(&self) -> Option<Board> {
        self.stored.borrow().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count.get()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.failing.get() {
            return Err(RepoError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl BoardRepository for MemoryBoardRepository {
    fn load(&self) -> RepoResult<Board> {
        self.check_available()?;
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, board: &Board) -> RepoResult<()> {
        self.check_available()?;
        board.validate()?;
        self.stored.replace(Some(board.clone()));
        self.save_count.set(self.save_count.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryBoardRepository;
    use crate::model::board::Board;
    use crate::repo::board_repo::{BoardRepository, RepoError};

    #[test]
    fn failing_store_rejects_both_directions() {
        let repo = MemoryBoardRepository::new();
        repo.set_failing(true);
        assert!(matches!(repo.load(), Err(RepoError::Unavailable(_))));
        assert!(matches!(
            repo.save(&Board::empty()),
            Err(RepoError::Unavailable(_))
        ));
        assert_eq!(repo.save_count(), 0);

        repo.set_failing(false);
        repo.save(&Board::empty()).unwrap();
        assert_eq!(repo.save_count(), 1);
        assert_eq!(repo.stored(), Some(Board::empty()));
    }
}
