//! Property definitions, code styles and the built-in properties.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named bundle of property defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStyle {
    /// ktfix's own style (default).
    #[default]
    KtfixOfficial,
    /// IntelliJ IDEA default formatting.
    IntellijIdea,
    /// Android Studio / Android Kotlin style guide.
    AndroidStudio,
}

impl CodeStyle {
    /// All code styles.
    pub const ALL: [Self; 3] = [Self::KtfixOfficial, Self::IntellijIdea, Self::AndroidStudio];

    /// Returns the configuration value naming this style.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KtfixOfficial => "ktfix_official",
            Self::IntellijIdea => "intellij_idea",
            Self::AndroidStudio => "android_studio",
        }
    }
}

impl fmt::Display for CodeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown code style '{s}'"))
    }
}

/// Declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// `true` / `false`.
    Boolean,
    /// Integer, or `off` to disable.
    Integer,
    /// Free text.
    Text,
    /// One of a fixed set of lowercase values.
    OneOf(&'static [&'static str]),
}

/// A resolved property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Integer property switched off.
    Off,
    /// Text or enumerated value.
    Text(String),
}

impl PropertyValue {
    /// Returns the boolean value, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value; `None` for `off` and non-integers.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text value, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Off => f.write_str("off"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Definition of a configuration property.
///
/// Defaults are written as raw strings and parsed with the declared type, the
/// same way user-supplied values are.
#[derive(Debug)]
pub struct PropertyDef {
    /// Property name as written in configuration files.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Declared type.
    pub kind: PropertyType,
    /// Default when neither user nor code style provides a value.
    pub default: &'static str,
    /// Per-code-style defaults.
    pub style_defaults: &'static [(CodeStyle, &'static str)],
    /// Whether a `ktfix-property` comment may override it for a section.
    pub scopable: bool,
}

impl PropertyDef {
    /// Parses a raw value with the declared type.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the value does not fit the type.
    pub fn parse(&self, raw: &str) -> Result<PropertyValue, String> {
        let value = raw.trim();
        match self.kind {
            PropertyType::Boolean => match value.to_ascii_lowercase().as_str() {
                "true" => Ok(PropertyValue::Boolean(true)),
                "false" => Ok(PropertyValue::Boolean(false)),
                _ => Err(format!("'{value}' is not a boolean")),
            },
            PropertyType::Integer => {
                if value.eq_ignore_ascii_case("off") {
                    return Ok(PropertyValue::Off);
                }
                value
                    .parse()
                    .map(PropertyValue::Integer)
                    .map_err(|_| format!("'{value}' is not an integer or 'off'"))
            }
            PropertyType::Text => Ok(PropertyValue::Text(value.to_string())),
            PropertyType::OneOf(allowed) => {
                let lower = value.to_ascii_lowercase();
                if allowed.contains(&lower.as_str()) {
                    Ok(PropertyValue::Text(lower))
                } else {
                    Err(format!(
                        "'{value}' is not one of: {}",
                        allowed.join(", ")
                    ))
                }
            }
        }
    }

    /// Returns the raw default for a code style, if the style overrides it.
    #[must_use]
    pub fn style_default(&self, style: CodeStyle) -> Option<&'static str> {
        self.style_defaults
            .iter()
            .find(|(s, _)| *s == style)
            .map(|(_, v)| *v)
    }
}

/// Active code style.
pub static CODE_STYLE: PropertyDef = PropertyDef {
    name: "code_style",
    description: "Code style preset providing property defaults",
    kind: PropertyType::OneOf(&["ktfix_official", "intellij_idea", "android_studio"]),
    default: "ktfix_official",
    style_defaults: &[],
    scopable: true,
};

/// Maximum line length, `off` to disable.
pub static MAX_LINE_LENGTH: PropertyDef = PropertyDef {
    name: "max_line_length",
    description: "Maximum number of characters on a line",
    kind: PropertyType::Integer,
    default: "off",
    style_defaults: &[
        (CodeStyle::KtfixOfficial, "140"),
        (CodeStyle::AndroidStudio, "100"),
    ],
    scopable: false,
};

/// Whether files end with a line break.
pub static INSERT_FINAL_NEWLINE: PropertyDef = PropertyDef {
    name: "insert_final_newline",
    description: "Whether a file must end with a newline",
    kind: PropertyType::Boolean,
    default: "true",
    style_defaults: &[],
    scopable: false,
};

/// Line separator of formatted output.
pub static END_OF_LINE: PropertyDef = PropertyDef {
    name: "end_of_line",
    description: "Line separator of formatted output, auto keeps the input's",
    kind: PropertyType::OneOf(&["lf", "crlf", "auto"]),
    default: "auto",
    style_defaults: &[],
    scopable: false,
};

/// Enables `@formatter:off` / `@formatter:on` regions.
pub static FORMATTER_TAGS_ENABLED: PropertyDef = PropertyDef {
    name: "ij_formatter_tags_enabled",
    description: "Honor formatter off/on tags in comments",
    kind: PropertyType::Boolean,
    default: "false",
    style_defaults: &[],
    scopable: false,
};

/// Tag opening an unformatted region.
pub static FORMATTER_OFF_TAG: PropertyDef = PropertyDef {
    name: "ij_formatter_off_tag",
    description: "Comment text that starts an unformatted region",
    kind: PropertyType::Text,
    default: "@formatter:off",
    style_defaults: &[],
    scopable: false,
};

/// Tag closing an unformatted region.
pub static FORMATTER_ON_TAG: PropertyDef = PropertyDef {
    name: "ij_formatter_on_tag",
    description: "Comment text that ends an unformatted region",
    kind: PropertyType::Text,
    default: "@formatter:on",
    style_defaults: &[],
    scopable: false,
};

/// Properties every engine knows, independent of loaded rules.
#[must_use]
pub fn builtin_properties() -> [&'static PropertyDef; 7] {
    [
        &CODE_STYLE,
        &MAX_LINE_LENGTH,
        &INSERT_FINAL_NEWLINE,
        &END_OF_LINE,
        &FORMATTER_TAGS_ENABLED,
        &FORMATTER_OFF_TAG,
        &FORMATTER_ON_TAG,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accepts_off() {
        assert_eq!(MAX_LINE_LENGTH.parse("off"), Ok(PropertyValue::Off));
        assert_eq!(MAX_LINE_LENGTH.parse(" 120 "), Ok(PropertyValue::Integer(120)));
        assert!(MAX_LINE_LENGTH.parse("wide").is_err());
    }

    #[test]
    fn one_of_is_case_insensitive() {
        assert_eq!(
            CODE_STYLE.parse("Android_Studio"),
            Ok(PropertyValue::Text("android_studio".to_string()))
        );
        assert!(CODE_STYLE.parse("eclipse").is_err());
    }

    #[test]
    fn style_defaults() {
        assert_eq!(MAX_LINE_LENGTH.style_default(CodeStyle::AndroidStudio), Some("100"));
        assert_eq!(MAX_LINE_LENGTH.style_default(CodeStyle::IntellijIdea), None);
    }

    #[test]
    fn code_style_round_trips_through_text() {
        for style in CodeStyle::ALL {
            assert_eq!(style.as_str().parse::<CodeStyle>(), Ok(style));
        }
    }
}
