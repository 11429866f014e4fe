//! Package records as read from manifests, the installed set and the lock file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::version::{normalize_version, stability_of};

/// Which dependency list an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Requires,
    DevRequires,
}

impl LinkKind {
    pub fn description(&self) -> &'static str {
        match self {
            LinkKind::Requires => "requires",
            LinkKind::DevRequires => "requires (for development)",
        }
    }
}

/// A dependency edge: `source` needs `target` matching `constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyLink {
    pub source: String,
    pub target: String,
    pub constraint: String,
    pub kind: LinkKind,
}

impl DependencyLink {
    pub fn new(source: &str, target: &str, constraint: &str, kind: LinkKind) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            constraint: constraint.to_string(),
            kind,
        }
    }
}

impl fmt::Display for DependencyLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.source,
            self.kind.description(),
            self.target,
            self.constraint
        )
    }
}

/// Where an ordinary (non-linked) package is installed from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Dist {
    /// `zip`, `tar` or `path`
    #[serde(rename = "type")]
    pub dist_type: String,
    pub url: String,
}

/// JSON shape shared by manifests, `installed.json` and the lock file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PackageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_normalized: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub require: Map<String, Value>,
    #[serde(rename = "require-dev", default, skip_serializing_if = "Map::is_empty")]
    pub require_dev: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<Dist>,
    /// Fields this tool does not interpret; kept so they can be passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A fully parsed package.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub pretty_version: String,
    pub version_normalized: String,
    pub package_type: String,
    pub description: Option<String>,
    pub requires: Vec<DependencyLink>,
    pub dev_requires: Vec<DependencyLink>,
    pub dist: Option<Dist>,
    pub extra: Map<String, Value>,
}

impl Package {
    /// Minimal package with no dependencies and no dist.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            pretty_version: version.to_string(),
            version_normalized: normalize_version(version),
            package_type: "library".to_string(),
            description: None,
            requires: Vec::new(),
            dev_requires: Vec::new(),
            dist: None,
            extra: Map::new(),
        }
    }

    /// Build a package from its JSON record.
    ///
    /// Fails with a human readable reason when the record has no usable
    /// name, no version, or a constraint that is not a string.
    pub fn from_record(record: PackageRecord) -> Result<Self, String> {
        let name = record
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "missing package name".to_string())?;
        check_package_name(&name)?;
        let pretty_version = record
            .version
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("missing version for {}", name))?;
        let version_normalized = record
            .version_normalized
            .unwrap_or_else(|| normalize_version(&pretty_version));

        let requires = parse_constraints(&name, &record.require, LinkKind::Requires)?;
        let dev_requires = parse_constraints(&name, &record.require_dev, LinkKind::DevRequires)?;

        Ok(Self {
            name,
            pretty_version,
            version_normalized,
            package_type: record.package_type.unwrap_or_else(|| "library".to_string()),
            description: record.description,
            requires,
            dev_requires,
            dist: record.dist,
            extra: record.extra,
        })
    }
}

/// A package name is one or more `/` separated segments, none of them
/// empty, `.` or `..`, so it can only ever name a directory below the
/// vendor directory.
pub fn check_package_name(name: &str) -> Result<(), String> {
    let unsafe_segment = name.split('/').find(|segment| {
        segment.is_empty()
            || *segment == "."
            || *segment == ".."
            || segment.contains(['\\', ':'])
    });
    match unsafe_segment {
        Some(segment) => Err(format!(
            "invalid package name {:?}: segment {:?} is not allowed",
            name, segment
        )),
        None => Ok(()),
    }
}

fn parse_constraints(
    source: &str,
    map: &Map<String, Value>,
    kind: LinkKind,
) -> Result<Vec<DependencyLink>, String> {
    map.iter()
        .map(|(target, constraint)| match constraint {
            Value::String(c) => Ok(DependencyLink::new(source, target, c, kind)),
            other => Err(format!(
                "constraint for {} must be a string, got {}",
                target, other
            )),
        })
        .collect()
}

/// Read access to package metadata.
///
/// Resolvers and installers only look at packages through this trait, so a
/// linked package can present overridden values without copying the record.
pub trait PackageInfo {
    fn name(&self) -> &str;
    fn pretty_version(&self) -> &str;
    /// Normalized version.
    fn version(&self) -> &str;
    fn package_type(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn requires(&self) -> &[DependencyLink];
    fn dev_requires(&self) -> &[DependencyLink];
    fn dist_type(&self) -> Option<&str>;
    fn dist_url(&self) -> Option<&str>;
    fn installation_source(&self) -> Option<&str>;
    fn stability(&self) -> &str;
    fn extra(&self) -> &Map<String, Value>;
}

impl PackageInfo for Package {
    fn name(&self) -> &str {
        &self.name
    }

    fn pretty_version(&self) -> &str {
        &self.pretty_version
    }

    fn version(&self) -> &str {
        &self.version_normalized
    }

    fn package_type(&self) -> &str {
        &self.package_type
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn requires(&self) -> &[DependencyLink] {
        &self.requires
    }

    fn dev_requires(&self) -> &[DependencyLink] {
        &self.dev_requires
    }

    fn dist_type(&self) -> Option<&str> {
        self.dist.as_ref().map(|d| d.dist_type.as_str())
    }

    fn dist_url(&self) -> Option<&str> {
        self.dist.as_ref().map(|d| d.url.as_str())
    }

    fn installation_source(&self) -> Option<&str> {
        self.dist.as_ref().map(|_| "dist")
    }

    fn stability(&self) -> &str {
        stability_of(&self.pretty_version)
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Fixture builders.
#[cfg(test)]
impl Package {
    pub fn with_requires(mut self, requires: &[(&str, &str)]) -> Self {
        self.requires = requires
            .iter()
            .map(|(target, constraint)| {
                DependencyLink::new(&self.name, target, constraint, LinkKind::Requires)
            })
            .collect();
        self
    }

    pub fn with_dev_requires(mut self, requires: &[(&str, &str)]) -> Self {
        self.dev_requires = requires
            .iter()
            .map(|(target, constraint)| {
                DependencyLink::new(&self.name, target, constraint, LinkKind::DevRequires)
            })
            .collect();
        self
    }

    pub fn with_dist(mut self, dist_type: &str, url: &str) -> Self {
        self.dist = Some(Dist {
            dist_type: dist_type.to_string(),
            url: url.to_string(),
        });
        self
    }
}
