//! Component serializers: plain text for logs, legacy `§` codes for pre-netty
//! clients, and JSON chat for everything else.

use serde_json::{json, Map, Value};

use super::component::{Component, Content, NamedColor, TextColor};

/// Concatenated text of the tree. Untranslated keys appear verbatim.
pub fn plain(component: &Component) -> String {
    let mut out = String::new();
    write_plain(component, &mut out);
    out
}

fn write_plain(component: &Component, out: &mut String) {
    match &component.content {
        Content::Text(text) => out.push_str(text),
        Content::Translatable { key, .. } => out.push_str(key),
    }
    for child in &component.children {
        write_plain(child, out);
    }
}

/// Legacy section-sign formatting. RGB colours are downsampled.
pub fn legacy_section(component: &Component) -> String {
    let mut out = String::new();
    let mut current = None;
    write_legacy(component, None, &mut current, &mut out);
    out
}

fn write_legacy(
    component: &Component,
    inherited: Option<NamedColor>,
    current: &mut Option<NamedColor>,
    out: &mut String,
) {
    let color = component.color.map(|c| c.downsample()).or(inherited);
    let text = match &component.content {
        Content::Text(text) => text.as_str(),
        Content::Translatable { key, .. } => key.as_str(),
    };
    if !text.is_empty() {
        if let Some(color) = color {
            if *current != Some(color) {
                out.push('§');
                out.push(color.legacy_code());
                *current = Some(color);
            }
        }
        out.push_str(text);
    }
    for child in &component.children {
        write_legacy(child, color, current, out);
    }
}

/// JSON chat. With `downsample`, RGB colours become the nearest named colour
/// for clients older than 1.16.
pub fn json(component: &Component, downsample: bool) -> Value {
    let mut object = Map::new();
    match &component.content {
        Content::Text(text) => {
            object.insert("text".into(), Value::String(text.clone()));
        }
        Content::Translatable { key, args } => {
            object.insert("translate".into(), Value::String(key.clone()));
            if !args.is_empty() {
                let with = args.iter().map(|arg| json(arg, downsample)).collect();
                object.insert("with".into(), Value::Array(with));
            }
        }
    }
    if let Some(color) = component.color {
        let color = match color {
            TextColor::Rgb(..) if downsample => TextColor::Named(color.downsample()),
            other => other,
        };
        object.insert("color".into(), json!(color.to_string()));
    }
    if !component.children.is_empty() {
        let extra = component
            .children
            .iter()
            .map(|child| json(child, downsample))
            .collect();
        object.insert("extra".into(), Value::Array(extra));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Component {
        Component::text("Banned: ")
            .color(NamedColor::Red)
            .append(Component::text("spam").color(TextColor::Rgb(250, 250, 90)))
            .append(Component::text("!"))
    }

    #[test]
    fn plain_text() {
        assert_eq!(plain(&sample()), "Banned: spam!");
        assert_eq!(plain(&Component::translatable("some.key")), "some.key");
    }

    #[test]
    fn legacy_codes_reemitted_after_child() {
        assert_eq!(legacy_section(&sample()), "§cBanned: §espam§c!");
    }

    #[test]
    fn legacy_uncoloured() {
        assert_eq!(legacy_section(&Component::text("plain")), "plain");
    }

    #[test]
    fn json_modern_keeps_hex() {
        let value = json(&sample(), false);
        assert_eq!(value["text"], "Banned: ");
        assert_eq!(value["color"], "red");
        assert_eq!(value["extra"][0]["color"], "#fafa5a");
        assert_eq!(value["extra"][1]["text"], "!");
    }

    #[test]
    fn json_downsampled() {
        let value = json(&sample(), true);
        assert_eq!(value["extra"][0]["color"], "yellow");
    }

    #[test]
    fn json_translatable() {
        let value = json(
            &Component::translatable_with("k", vec![Component::text("a")]),
            false,
        );
        assert_eq!(value, json!({"translate": "k", "with": [{"text": "a"}]}));
    }
}
