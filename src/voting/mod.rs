pub mod categories;
pub mod confirm;
pub mod leaderboard;

pub use categories::{CATEGORIES, Category, VOTE_PRICE_CENTS};
pub use confirm::{Confirmation, PaidVote, confirm_vote_session};
