//! Artifact coordinates and the `group:artifact:type[:classifier]:version`
//! notation.

use std::fmt;
use std::str::FromStr;

use jarpath_util::errors::JarpathError;

use crate::DEFAULT_PACKAGING;

/// A fully qualified artifact coordinate.
///
/// Fields are private so a coordinate cannot change once constructed; use
/// [`Coordinate::with_version`] to derive a coordinate at another version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    group: String,
    artifact: String,
    packaging: String,
    classifier: Option<String>,
    version: String,
}

/// The version-less part of a coordinate used to detect conflicting
/// declarations of the same artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub group: String,
    pub artifact: String,
    pub packaging: String,
    pub classifier: Option<String>,
}

impl Coordinate {
    /// Build a coordinate with the default packaging and no classifier.
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            packaging: DEFAULT_PACKAGING.to_string(),
            classifier: None,
            version: version.into(),
        }
    }

    /// Replace the packaging type.
    pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
        self.packaging = packaging.into();
        self
    }

    /// Set or clear the classifier. An empty classifier is treated as none.
    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier.filter(|c| !c.is_empty());
        self
    }

    /// A copy of this coordinate at a different version.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    /// Parse a notation, defaulting the packaging to `jar` for the
    /// three-field form.
    pub fn parse(notation: &str) -> Result<Self, JarpathError> {
        Self::parse_with_default(notation, DEFAULT_PACKAGING)
    }

    /// Parse a notation, using `default_packaging` for the three-field form.
    ///
    /// Accepted forms:
    /// - `group:artifact:version`
    /// - `group:artifact:type:version`
    /// - `group:artifact:type:classifier:version`
    pub fn parse_with_default(
        notation: &str,
        default_packaging: &str,
    ) -> Result<Self, JarpathError> {
        let notation = notation.trim();
        let parts: Vec<&str> = notation.split(':').collect();
        let (group, artifact, packaging, classifier, version) = match parts.as_slice() {
            [g, a, v] => (*g, *a, default_packaging, None, *v),
            [g, a, t, v] => (*g, *a, *t, None, *v),
            [g, a, t, c, v] => (*g, *a, *t, Some(*c), *v),
            _ => {
                return Err(notation_error(
                    notation,
                    format!("expected 3 to 5 fields, found {}", parts.len()),
                ))
            }
        };

        for (name, value) in [
            ("group", group),
            ("artifact", artifact),
            ("type", packaging),
            ("version", version),
        ] {
            if value.is_empty() {
                return Err(notation_error(notation, format!("empty {name}")));
            }
        }

        Ok(Self::new(group, artifact, version)
            .with_packaging(packaging)
            .with_classifier(classifier.map(str::to_string)))
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn packaging(&self) -> &str {
        &self.packaging
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Identity key: every field except the version.
    pub fn key(&self) -> IdentityKey {
        IdentityKey {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            packaging: self.packaging.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// Canonical notation, always including the type.
    pub fn notation(&self) -> String {
        self.to_string()
    }

    /// File extension for the artifact's packaging.
    pub fn extension(&self) -> &str {
        match self.packaging.as_str() {
            "bundle" | "maven-plugin" | "ejb" | "test-jar" => "jar",
            other => other,
        }
    }

    /// Repository file name: `artifact-version[-classifier].ext`.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.artifact, self.version, c, self.extension()),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension()),
        }
    }
}

fn notation_error(notation: &str, reason: String) -> JarpathError {
    JarpathError::Notation {
        notation: notation.to_string(),
        reason,
    }
}

impl FromStr for Coordinate {
    type Err = JarpathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.packaging)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        write!(f, ":{}", self.version)
    }
}

impl IdentityKey {
    /// Whether `coordinate` has this identity.
    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        self.group == coordinate.group
            && self.artifact == coordinate.artifact
            && self.packaging == coordinate.packaging
            && self.classifier == coordinate.classifier
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.packaging)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}
