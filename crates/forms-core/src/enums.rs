//! Enum types for the form model.
//!
//! Each enum has:
//! - Custom Serialize (as the camelCase wire string)
//! - Custom Deserialize (known variants + catch-all Custom(String))
//! - `as_str()`, `is_default()`, `Display` impl

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }

            /// All built-in variants, in declaration order.
            pub fn builtins() -> &'static [$name] {
                &[ $( Self::$variant, )+ ]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// FieldType
// ===========================================================================

define_enum! {
    /// Widget kind of a form field.
    FieldType, default = Text, custom_variant = Custom,
    variants: [
        (Text, "text"),
        (Number, "number"),
        (Textarea, "textarea"),
        (Select, "select"),
        (Radio, "radio"),
        (Checkbox, "checkbox"),
        (Date, "date"),
    ]
}

impl FieldType {
    /// Choice types carry an `options` list.
    pub fn needs_options(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Numeric types carry `min`/`max`/`step`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number)
    }

    /// Types whose value is an array (multi-select checkbox group).
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::Checkbox)
    }

    /// Types whose value is free-form text.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Textarea)
    }
}

// ===========================================================================
// RuleType
// ===========================================================================

define_enum! {
    /// Kind of validation rule attached to a field.
    RuleType, default = Required, custom_variant = Custom,
    variants: [
        (Required, "required"),
        (NotEmpty, "notEmpty"),
        (MinLength, "minLength"),
        (MaxLength, "maxLength"),
        (Email, "email"),
        (Password, "password"),
    ]
}

impl RuleType {
    /// Whether the rule takes a numeric parameter.
    pub fn takes_length(&self) -> bool {
        matches!(self, Self::MinLength | Self::MaxLength)
    }

    /// Stock message used when the author leaves the message blank.
    pub fn default_message(&self, length: Option<u64>) -> String {
        let n = length.unwrap_or(0);
        match self {
            Self::Required => "This field is required".to_string(),
            Self::NotEmpty => "This field cannot be empty".to_string(),
            Self::MinLength => format!("Minimum {} characters required", n),
            Self::MaxLength => format!("Maximum {} characters allowed", n),
            Self::Email => "Please enter a valid email address".to_string(),
            Self::Password => {
                "Password must be at least 8 characters and contain a number".to_string()
            }
            Self::Custom(_) => "Invalid input".to_string(),
        }
    }
}
