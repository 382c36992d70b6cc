//! Message trees.

use std::fmt;

/// The sixteen classic chat colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    pub const ALL: [NamedColor; 16] = [
        NamedColor::Black,
        NamedColor::DarkBlue,
        NamedColor::DarkGreen,
        NamedColor::DarkAqua,
        NamedColor::DarkRed,
        NamedColor::DarkPurple,
        NamedColor::Gold,
        NamedColor::Gray,
        NamedColor::DarkGray,
        NamedColor::Blue,
        NamedColor::Green,
        NamedColor::Aqua,
        NamedColor::Red,
        NamedColor::LightPurple,
        NamedColor::Yellow,
        NamedColor::White,
    ];

    /// Name used in JSON chat.
    pub fn name(&self) -> &'static str {
        match self {
            NamedColor::Black => "black",
            NamedColor::DarkBlue => "dark_blue",
            NamedColor::DarkGreen => "dark_green",
            NamedColor::DarkAqua => "dark_aqua",
            NamedColor::DarkRed => "dark_red",
            NamedColor::DarkPurple => "dark_purple",
            NamedColor::Gold => "gold",
            NamedColor::Gray => "gray",
            NamedColor::DarkGray => "dark_gray",
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Aqua => "aqua",
            NamedColor::Red => "red",
            NamedColor::LightPurple => "light_purple",
            NamedColor::Yellow => "yellow",
            NamedColor::White => "white",
        }
    }

    /// Character following `§` in legacy formatting.
    pub fn legacy_code(&self) -> char {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(15);
        std::char::from_digit(idx as u32, 16).unwrap_or('f')
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            NamedColor::Black => (0, 0, 0),
            NamedColor::DarkBlue => (0, 0, 170),
            NamedColor::DarkGreen => (0, 170, 0),
            NamedColor::DarkAqua => (0, 170, 170),
            NamedColor::DarkRed => (170, 0, 0),
            NamedColor::DarkPurple => (170, 0, 170),
            NamedColor::Gold => (255, 170, 0),
            NamedColor::Gray => (170, 170, 170),
            NamedColor::DarkGray => (85, 85, 85),
            NamedColor::Blue => (85, 85, 255),
            NamedColor::Green => (85, 255, 85),
            NamedColor::Aqua => (85, 255, 255),
            NamedColor::Red => (255, 85, 85),
            NamedColor::LightPurple => (255, 85, 255),
            NamedColor::Yellow => (255, 255, 85),
            NamedColor::White => (255, 255, 255),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextColor {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl TextColor {
    /// Nearest named colour, by squared RGB distance.
    pub fn downsample(&self) -> NamedColor {
        match *self {
            TextColor::Named(named) => named,
            TextColor::Rgb(r, g, b) => {
                let distance = |named: &NamedColor| {
                    let (nr, ng, nb) = named.rgb();
                    let dr = r as i32 - nr as i32;
                    let dg = g as i32 - ng as i32;
                    let db = b as i32 - nb as i32;
                    dr * dr + dg * dg + db * db
                };
                NamedColor::ALL
                    .iter()
                    .copied()
                    .min_by_key(distance)
                    .unwrap_or(NamedColor::White)
            }
        }
    }
}

impl From<NamedColor> for TextColor {
    fn from(named: NamedColor) -> Self {
        TextColor::Named(named)
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextColor::Named(named) => f.write_str(named.name()),
            TextColor::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Rendered through a [`TranslationRegistry`](super::TranslationRegistry).
    Translatable { key: String, args: Vec<Component> },
}

/// A node of a message tree. Children inherit the parent's colour unless
/// they set their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub content: Content,
    pub color: Option<TextColor>,
    pub children: Vec<Component>,
}

impl Component {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::Text(text.into()),
            color: None,
            children: Vec::new(),
        }
    }

    pub fn translatable(key: impl Into<String>) -> Self {
        Self::translatable_with(key, Vec::new())
    }

    pub fn translatable_with(key: impl Into<String>, args: Vec<Component>) -> Self {
        Self {
            content: Content::Translatable {
                key: key.into(),
                args,
            },
            color: None,
            children: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::text("")
    }

    pub fn color(mut self, color: impl Into<TextColor>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn append(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Component::text(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Component::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_codes() {
        assert_eq!(NamedColor::Black.legacy_code(), '0');
        assert_eq!(NamedColor::Red.legacy_code(), 'c');
        assert_eq!(NamedColor::White.legacy_code(), 'f');
    }

    #[test]
    fn downsample_picks_nearest() {
        assert_eq!(TextColor::Rgb(250, 80, 80).downsample(), NamedColor::Red);
        assert_eq!(TextColor::Rgb(1, 2, 3).downsample(), NamedColor::Black);
        assert_eq!(TextColor::Rgb(250, 165, 10).downsample(), NamedColor::Gold);
        assert_eq!(TextColor::Named(NamedColor::Aqua).downsample(), NamedColor::Aqua);
    }

    #[test]
    fn builder() {
        let c = Component::text("a")
            .color(NamedColor::Red)
            .append(Component::text("b"));
        assert_eq!(c.color, Some(TextColor::Named(NamedColor::Red)));
        assert_eq!(c.children.len(), 1);
    }
}
