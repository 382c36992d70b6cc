//! Display locales.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid locale tag {0:?}")]
pub struct LocaleParseError(pub String);

/// A language with an optional country, e.g. `en_US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    pub fn new(language: impl Into<String>, country: Option<&str>) -> Self {
        Self {
            language: language.into().to_ascii_lowercase(),
            country: country.map(|c| c.to_ascii_uppercase()),
        }
    }

    /// `en_US`, the locale every bundle falls back to.
    pub fn en_us() -> Self {
        Self::new("en", Some("US"))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// The same locale without its country.
    pub fn language_only(&self) -> Option<Self> {
        self.country.as_ref().map(|_| Self {
            language: self.language.clone(),
            country: None,
        })
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::en_us()
    }
}

impl FromStr for Locale {
    type Err = LocaleParseError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut parts = tag.split(|c: char| c == '_' || c == '-');
        let language = parts.next().unwrap_or_default();
        let country = parts.next();
        let valid = |s: &str, len: std::ops::RangeInclusive<usize>| {
            len.contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic())
        };
        if !valid(language, 2..=3)
            || country.is_some_and(|c| !valid(c, 2..=2))
            || parts.next().is_some()
        {
            return Err(LocaleParseError(tag.to_string()));
        }
        Ok(Self::new(language, country))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{}", self.language, country),
            None => f.write_str(&self.language),
        }
    }
}
