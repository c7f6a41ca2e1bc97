mod drawing;
mod ledger;
mod level;
mod reward;
mod shop;
mod token;
mod user;

pub use drawing::*;
pub use ledger::*;
pub use level::*;
pub use reward::*;
pub use shop::*;
pub use token::*;
pub use user::*;
