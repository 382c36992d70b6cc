//! Message text subsystem.
//!
//! # Data Flow
//! ```text
//! Component (message tree, possibly translatable)
//!     → translation.rs (render for a locale)
//!     → serializer.rs (plain for logs, legacy or JSON for the wire)
//! ```

pub mod component;
pub mod locale;
pub mod serializer;
pub mod translation;

pub use component::{Component, Content, NamedColor, TextColor};
pub use locale::{Locale, LocaleParseError};
pub use translation::TranslationRegistry;
