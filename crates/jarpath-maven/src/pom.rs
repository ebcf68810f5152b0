//! POM descriptor parsing: dependency declarations, parent inheritance,
//! property interpolation, managed versions.

use std::collections::BTreeMap;

use jarpath_core::coordinate::Coordinate;
use jarpath_core::dependency::{DependencyEdge, Exclusion, WILDCARD};
use jarpath_core::scope::Scope;
use jarpath_util::errors::JarpathError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Upper bound on `${...}` substitutions in one value; guards against
/// self-referencing properties.
const MAX_INTERPOLATIONS: usize = 64;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, Default)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone, Default)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub exclusions: Vec<PomExclusion>,
}

/// An exclusion within a dependency declaration.
#[derive(Debug, Clone, Default)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Coordinate of the parent POM, if one is declared.
    pub fn parent_coordinate(&self) -> Option<Coordinate> {
        let parent = self.parent.as_ref()?;
        if parent.group_id.is_empty() || parent.artifact_id.is_empty() || parent.version.is_empty()
        {
            return None;
        }
        Some(
            Coordinate::new(&parent.group_id, &parent.artifact_id, &parent.version)
                .with_packaging("pom"),
        )
    }

    /// Resolve `${property}` references in a string using POM properties
    /// and built-in project variables. Unknown references are left as-is.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut cursor = 0;
        for _ in 0..MAX_INTERPOLATIONS {
            let Some(start) = result[cursor..].find("${").map(|i| i + cursor) else {
                break;
            };
            let Some(len) = result[start..].find('}') else {
                break;
            };
            let key = &result[start + 2..start + len];
            match self.resolve_property(key) {
                Some(value) => result.replace_range(start..start + len + 1, &value),
                None => cursor = start + len + 1,
            }
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(str::to_string),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(str::to_string),
            "project.packaging" | "pom.packaging" => self.packaging.clone(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate all property references in dependencies and dependency
    /// management.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        let interpolate_opt = |value: &mut Option<String>| {
            if let Some(v) = value.as_mut() {
                *v = snapshot.interpolate(v);
            }
        };
        for dep in self
            .dependencies
            .iter_mut()
            .chain(self.dependency_management.iter_mut())
        {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            interpolate_opt(&mut dep.version);
            interpolate_opt(&mut dep.scope);
            interpolate_opt(&mut dep.classifier);
            interpolate_opt(&mut dep.type_);
        }
    }

    /// Merge a parent POM's properties, identity and dependency management
    /// into this POM. Values declared here take precedence.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(str::to_string);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(str::to_string);
        }
        for dm in &parent.dependency_management {
            let declared = self
                .dependency_management
                .iter()
                .any(|d| d.group_id == dm.group_id && d.artifact_id == dm.artifact_id);
            if !declared {
                self.dependency_management.push(dm.clone());
            }
        }
        for dep in &parent.dependencies {
            let declared = self
                .dependencies
                .iter()
                .any(|d| d.group_id == dep.group_id && d.artifact_id == dep.artifact_id);
            if !declared {
                self.dependencies.push(dep.clone());
            }
        }
    }

    /// Dependency management entry for a given group:artifact.
    pub fn managed(&self, group_id: &str, artifact_id: &str) -> Option<&PomDependency> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
    }

    /// Look up a version from dependency management for a given group:artifact.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.managed(group_id, artifact_id)
            .and_then(|d| d.version.as_deref())
    }

    /// Convert the declared dependencies into edges from `from`.
    ///
    /// Versionless dependencies take their version and default scope from
    /// dependency management; entries that still lack a version, or that
    /// reference unresolved properties, are skipped.
    pub fn dependency_edges(&self, from: &Coordinate) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        for dep in &self.dependencies {
            let managed = self.managed(&dep.group_id, &dep.artifact_id);
            let version = dep
                .version
                .clone()
                .or_else(|| managed.and_then(|m| m.version.clone()));
            let Some(version) = version.filter(|v| !v.is_empty()) else {
                tracing::warn!(
                    "{from}: no version for {}:{}, skipping",
                    dep.group_id,
                    dep.artifact_id
                );
                continue;
            };
            if [&dep.group_id, &dep.artifact_id, &version]
                .iter()
                .any(|v| v.is_empty() || v.contains("${"))
            {
                tracing::warn!(
                    "{from}: unresolved dependency {}:{}:{version}, skipping",
                    dep.group_id,
                    dep.artifact_id
                );
                continue;
            }

            let scope_text = dep
                .scope
                .as_deref()
                .or_else(|| managed.and_then(|m| m.scope.as_deref()))
                .unwrap_or("compile");
            let scope = scope_text.parse::<Scope>().unwrap_or_else(|_| {
                tracing::warn!("{from}: unknown scope `{scope_text}`, using compile");
                Scope::Compile
            });
            if scope == Scope::Import {
                continue;
            }

            let to = Coordinate::new(&dep.group_id, &dep.artifact_id, version)
                .with_packaging(dep.type_.as_deref().unwrap_or("jar"))
                .with_classifier(dep.classifier.clone());
            let mut edge = DependencyEdge::new(from.clone(), to, scope).optional(dep.optional);
            for excl in &dep.exclusions {
                let artifact = excl.artifact_id.as_deref().unwrap_or(WILDCARD);
                edge = edge.exclude(Exclusion::new(&excl.group_id, artifact));
            }
            edges.push(edge);
        }
        edges
    }
}

/// Parse a POM XML string into a `Pom` struct.
pub fn parse_pom(xml: &str) -> Result<Pom, JarpathError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut dep: Option<PomDependency> = None;
    let mut exclusion: Option<PomExclusion> = None;
    let mut parent: Option<ParentRef> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                text.clear();

                let p: Vec<&str> = path.iter().map(String::as_str).collect();
                match p.as_slice() {
                    ["project", "dependencies", "dependency"]
                    | ["project", "dependencyManagement", "dependencies", "dependency"] => {
                        dep = Some(PomDependency::default());
                    }
                    [.., "dependency", "exclusions", "exclusion"] if dep.is_some() => {
                        exclusion = Some(PomExclusion::default());
                    }
                    ["project", "parent"] => parent = Some(ParentRef::default()),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text = e.unescape().map(|t| t.into_owned()).unwrap_or_default();
            }
            Ok(Event::End(_)) => {
                let p: Vec<&str> = path.iter().map(String::as_str).collect();
                match p.as_slice() {
                    ["project", "properties", name] => {
                        pom.properties.insert(name.to_string(), text.clone());
                    }
                    ["project", field] => match *field {
                        "groupId" => pom.group_id = Some(text.clone()),
                        "artifactId" => pom.artifact_id = Some(text.clone()),
                        "version" => pom.version = Some(text.clone()),
                        "packaging" => pom.packaging = Some(text.clone()),
                        _ => {}
                    },
                    ["project", "parent", field] => {
                        if let Some(parent) = parent.as_mut() {
                            match *field {
                                "groupId" => parent.group_id = text.clone(),
                                "artifactId" => parent.artifact_id = text.clone(),
                                "version" => parent.version = text.clone(),
                                _ => {}
                            }
                        }
                    }
                    ["project", "parent"] => pom.parent = parent.take(),
                    [.., "exclusion", field] => {
                        if let Some(excl) = exclusion.as_mut() {
                            match *field {
                                "groupId" => excl.group_id = text.clone(),
                                "artifactId" => excl.artifact_id = Some(text.clone()),
                                _ => {}
                            }
                        }
                    }
                    [.., "exclusions", "exclusion"] => {
                        if let (Some(d), Some(excl)) = (dep.as_mut(), exclusion.take()) {
                            d.exclusions.push(excl);
                        }
                    }
                    ["project", "dependencies", "dependency"] => {
                        pom.dependencies.extend(dep.take());
                    }
                    ["project", "dependencyManagement", "dependencies", "dependency"] => {
                        pom.dependency_management.extend(dep.take());
                    }
                    [.., "dependency", field] => {
                        if let Some(d) = dep.as_mut() {
                            match *field {
                                "groupId" => d.group_id = text.clone(),
                                "artifactId" => d.artifact_id = text.clone(),
                                "version" => d.version = Some(text.clone()),
                                "scope" => d.scope = Some(text.clone()),
                                "optional" => d.optional = text.trim() == "true",
                                "classifier" => d.classifier = Some(text.clone()),
                                "type" => d.type_ = Some(text.clone()),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }

                path.pop();
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(JarpathError::Descriptor {
                    message: format!(
                        "Failed to parse POM XML at byte {}: {e}",
                        reader.buffer_position()
                    ),
                });
            }
            _ => {}
        }
    }

    Ok(pom)
}
