pub mod bids;
pub mod players;
pub mod rounds;
pub mod team_tiebreakers;
pub mod teams;
pub mod tiebreakers;

pub use bids::Entity as Bids;
pub use players::Entity as Players;
pub use rounds::Entity as Rounds;
pub use team_tiebreakers::Entity as TeamTiebreakers;
pub use teams::Entity as Teams;
pub use tiebreakers::Entity as Tiebreakers;
