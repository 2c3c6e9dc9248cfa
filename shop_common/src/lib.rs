mod helpers;
mod money;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Money, DEFAULT_CURRENCY, SUBUNITS_PER_UNIT};
pub use secret::Secret;
