mod registry;
mod snowflake;
mod status;
#[cfg(test)]
mod tests;

pub use registry::*;
pub use snowflake::*;
pub use status::*;
