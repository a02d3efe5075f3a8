//! Compiler options consulted by the lookup rules.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Java language level (feature release). `1.5`..`1.8` are stored as 5..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JavaVersion(pub u16);

impl JavaVersion {
    pub const JAVA_1_3: JavaVersion = JavaVersion(3);
    pub const JAVA_1_4: JavaVersion = JavaVersion(4);
    pub const JAVA_5: JavaVersion = JavaVersion(5);
    pub const JAVA_6: JavaVersion = JavaVersion(6);
    pub const JAVA_7: JavaVersion = JavaVersion(7);
    pub const JAVA_8: JavaVersion = JavaVersion(8);
    pub const JAVA_11: JavaVersion = JavaVersion(11);
    pub const JAVA_16: JavaVersion = JavaVersion(16);
    pub const JAVA_17: JavaVersion = JavaVersion(17);
    pub const JAVA_21: JavaVersion = JavaVersion(21);

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // "1.8" and "8" name the same release.
        let normalized = text.strip_prefix("1.").unwrap_or(text);
        normalized.parse::<u16>().ok().map(JavaVersion)
    }

    pub fn supports_generics(self) -> bool {
        self >= Self::JAVA_5
    }

    pub fn supports_boxing(self) -> bool {
        self >= Self::JAVA_5
    }

    pub fn supports_varargs(self) -> bool {
        self >= Self::JAVA_5
    }

    /// From 1.4 on, a name inherited by an enclosing class simply shadows the
    /// same name declared further out; before, the clash was reported.
    pub fn inherited_shadows_enclosing(self) -> bool {
        self >= Self::JAVA_1_4
    }

    /// javac 6 accepted two methods whose parameters only agree after
    /// erasure as long as their return types differ.
    pub fn tolerates_erasure_clash_with_distinct_returns(self) -> bool {
        self == Self::JAVA_6
    }

    pub fn supports_default_methods(self) -> bool {
        self >= Self::JAVA_8
    }

    pub fn supports_records(self) -> bool {
        self >= Self::JAVA_16
    }

    pub fn supports_sealed(self) -> bool {
        self >= Self::JAVA_17
    }
}

impl Default for JavaVersion {
    fn default() -> Self {
        Self::JAVA_17
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= 8 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for JavaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JavaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u16),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(JavaVersion(n)),
            Raw::Text(text) => JavaVersion::parse(&text).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid Java version `{text}`"))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    pub source_level: JavaVersion,
    /// Whether `@NonNull`/`@Nullable` type annotations take part in
    /// substitution.
    pub null_type_annotations: bool,
    /// Report raw types in signatures even where they are forced by an
    /// overridden binary method.
    pub report_unavoidable_generic_problems: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            source_level: JavaVersion::default(),
            null_type_annotations: false,
            report_unavoidable_generic_problems: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid compiler options: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for OptionsError {
    fn from(err: toml::de::Error) -> Self {
        // The default rendering carries a source snippet; keep the message only.
        OptionsError::Toml(err.message().to_string())
    }
}

impl CompilerOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_source_level(mut self, level: JavaVersion) -> Self {
        self.source_level = level;
        self
    }
}
