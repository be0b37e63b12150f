mod components;
mod layout;
mod snowflake;

pub use components::*;
pub use layout::*;
pub use snowflake::*;
