//! Translation registry.
//!
//! Maps `(locale, key)` to a message pattern. Rendering is a pure function of
//! the message tree and the locale: no I/O, no failure. Keys the registry
//! does not know stay translatable so the client can still try them.

use std::collections::HashMap;

use dashmap::DashMap;

use super::component::{Component, Content};
use super::locale::Locale;

/// Built-in English messages used by the gate's rejection paths.
const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("gate.kick.banned", "You are banned from this server."),
    ("gate.kick.outdated-client", "Incompatible client version! Please use {0}."),
    (
        "gate.kick.legacy-client",
        "Your client is extremely old. Please update to a newer version of Minecraft.",
    ),
    ("gate.kick.server-full", "The server is full."),
    ("gate.kick.transfers-disabled", "This server does not accept transfers."),
    ("gate.kick.unknown-host", "There is no server configured for {0}."),
    ("gate.kick.no-session-layer", "This proxy is not accepting players right now."),
];

#[derive(Debug)]
pub struct TranslationRegistry {
    bundles: DashMap<Locale, HashMap<String, String>>,
    fallback: Locale,
}

impl TranslationRegistry {
    /// An empty registry falling back to `en_US`.
    pub fn new() -> Self {
        Self {
            bundles: DashMap::new(),
            fallback: Locale::en_us(),
        }
    }

    /// A registry preloaded with the built-in English messages.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_bundle(
            Locale::en_us(),
            DEFAULT_MESSAGES
                .iter()
                .map(|(key, pattern)| (key.to_string(), pattern.to_string())),
        );
        registry
    }

    pub fn register(&self, locale: Locale, key: impl Into<String>, pattern: impl Into<String>) {
        self.bundles
            .entry(locale)
            .or_default()
            .insert(key.into(), pattern.into());
    }

    /// Merge messages into a locale's bundle, replacing existing keys.
    pub fn register_bundle<I>(&self, locale: Locale, messages: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.bundles.entry(locale).or_default().extend(messages);
    }

    pub fn contains(&self, key: &str, locale: &Locale) -> bool {
        self.lookup(key, locale).is_some()
    }

    /// Pattern for `key`: exact locale, then language only, then the fallback.
    fn lookup(&self, key: &str, locale: &Locale) -> Option<String> {
        let candidates = [
            Some(locale.clone()),
            locale.language_only(),
            Some(self.fallback.clone()),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(bundle) = self.bundles.get(&candidate) {
                if let Some(pattern) = bundle.get(key) {
                    return Some(pattern.clone());
                }
            }
        }
        None
    }

    /// Render every translatable node of `component` for `locale`.
    pub fn render(&self, component: &Component, locale: &Locale) -> Component {
        let children: Vec<Component> = component
            .children
            .iter()
            .map(|child| self.render(child, locale))
            .collect();

        match &component.content {
            Content::Text(_) => Component {
                content: component.content.clone(),
                color: component.color,
                children,
            },
            Content::Translatable { key, args } => {
                let args: Vec<Component> =
                    args.iter().map(|arg| self.render(arg, locale)).collect();
                match self.lookup(key, locale) {
                    Some(pattern) => {
                        let mut parts = format_pattern(&pattern, &args);
                        parts.extend(children);
                        if parts.len() == 1 {
                            let mut only = parts.remove(0);
                            only.color = only.color.or(component.color);
                            return only;
                        }
                        Component {
                            content: Content::Text(String::new()),
                            color: component.color,
                            children: parts,
                        }
                    }
                    None => Component {
                        content: Content::Translatable {
                            key: key.clone(),
                            args,
                        },
                        color: component.color,
                        children,
                    },
                }
            }
        }
    }
}

impl Default for TranslationRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Split a `{0}`-style pattern into text and argument components.
fn format_pattern(pattern: &str, args: &[Component]) -> Vec<Component> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let placeholder = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|idx| (idx, close)));
        match placeholder {
            Some((idx, close)) if idx < args.len() => {
                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    parts.push(Component::text(std::mem::take(&mut literal)));
                }
                parts.push(args[idx].clone());
                rest = &after[close + 1..];
            }
            _ => {
                literal.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(Component::text(literal));
    }
    parts
}
