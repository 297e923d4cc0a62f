mod follows;
mod ingredients;
mod memberships;
mod recipes;
mod shopping_cart;
mod tags;
mod users;

pub use follows::*;
pub use ingredients::*;
pub use memberships::*;
pub use recipes::*;
pub use shopping_cart::*;
pub use tags::*;
pub use users::*;
