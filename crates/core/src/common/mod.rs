pub mod locale;

pub use locale::{Locale, format_amount};
