mod stars;

pub mod helpers;
pub mod op;
mod secret;

pub use secret::Secret;
pub use stars::{Stars, StarsConversionError, STARS_CURRENCY_CODE};
