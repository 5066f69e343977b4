use crate::VendorError;
use pkgsync_schema::DependencyMap;
use serde::Serialize;
use std::fmt;

const GITHUB_PREFIX: &str = "https://github.com/";
const GIT_SUFFIX: &str = ".git";

/// One exact-version package to vendor, derived from an `owner/project` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageDescriptor {
    pub owner: String,
    pub project: String,
    pub version: String,
}

impl PackageDescriptor {
    pub fn parse(key: &str, version: &str) -> Result<Self, VendorError> {
        let (owner, project) = split_key(key)
            .ok_or_else(|| VendorError::MalformedPackageKey(key.to_owned()))?;
        Ok(Self {
            owner: owner.to_owned(),
            project: project.to_owned(),
            version: version.to_owned(),
        })
    }

    /// Directory name under the owner directory: `project-version`.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.project, self.version)
    }

    /// Namespace the package's generated native code uses for itself.
    pub fn native_name(&self) -> String {
        native_name(&self.owner, &self.project)
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.owner, self.project, self.version)
    }
}

fn split_key(key: &str) -> Option<(&str, &str)> {
    let mut parts = key.split('/');
    let owner = parts.next()?;
    let project = parts.next()?;
    if parts.next().is_some() || owner.is_empty() || project.is_empty() {
        return None;
    }
    Some((owner, project))
}

pub fn packages_from_exact_deps(deps: &DependencyMap) -> Result<Vec<PackageDescriptor>, VendorError> {
    deps.iter()
        .map(|(key, version)| PackageDescriptor::parse(key, version))
        .collect()
}

/// `{base}/{owner}/{project}/archive/{version}.tar.gz`
pub fn archive_url(base_url: &str, package: &PackageDescriptor) -> String {
    format!(
        "{}/{}/{}/archive/{}.tar.gz",
        base_url.trim_end_matches('/'),
        package.owner,
        package.project,
        package.version
    )
}

/// Generated identifier prefix of a native module, e.g. `_elm_lang$navigation`.
pub fn native_name(owner: &str, project: &str) -> String {
    format!("_{}${}", owner.replace('-', "_"), project.replace('-', "_"))
}

/// Owner and project from `https://github.com/{owner}/{project}.git`.
pub fn parse_repository_url(url: &str) -> Result<(String, String), VendorError> {
    url.strip_prefix(GITHUB_PREFIX)
        .and_then(|rest| rest.strip_suffix(GIT_SUFFIX))
        .and_then(split_key)
        .map(|(owner, project)| (owner.to_owned(), project.to_owned()))
        .ok_or_else(|| VendorError::UnrecognizedRepositoryUrl(url.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigation() -> PackageDescriptor {
        PackageDescriptor::parse("elm-lang/navigation", "2.0.0").unwrap()
    }

    #[test]
    fn descriptors_from_exact_deps() {
        let deps: DependencyMap = [("elm-lang/navigation", "2.0.0")].into_iter().collect();
        let packages = packages_from_exact_deps(&deps).unwrap();
        assert_eq!(packages, vec![navigation()]);
    }

    #[test]
    fn rejects_keys_without_exactly_two_parts() {
        for key in ["core", "a/b/c", "/core", "elm-lang/", ""] {
            assert!(
                matches!(
                    PackageDescriptor::parse(key, "1.0.0"),
                    Err(VendorError::MalformedPackageKey(_))
                ),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn github_archive_url() {
        assert_eq!(
            archive_url("https://github.com", &navigation()),
            "https://github.com/elm-lang/navigation/archive/2.0.0.tar.gz"
        );
        assert_eq!(
            archive_url("http://127.0.0.1:8080/", &navigation()),
            "http://127.0.0.1:8080/elm-lang/navigation/archive/2.0.0.tar.gz"
        );
    }

    #[test]
    fn native_name_underscores_hyphens() {
        assert_eq!(native_name("elm-lang", "navigation"), "_elm_lang$navigation");
        assert_eq!(navigation().native_name(), "_elm_lang$navigation");
        assert_eq!(native_name("NoRedInk", "elm-ops-tooling"), "_NoRedInk$elm_ops_tooling");
    }

    #[test]
    fn repository_url_parsing() {
        assert_eq!(
            parse_repository_url("https://github.com/NoRedInk/noredink.git").unwrap(),
            ("NoRedInk".to_owned(), "noredink".to_owned())
        );
    }

    #[test]
    fn repository_url_rejects_other_shapes() {
        for url in [
            "",
            "git@github.com:NoRedInk/noredink.git",
            "https://github.com/NoRedInk/noredink",
            "https://gitlab.com/NoRedInk/noredink.git",
            "https://github.com/noredink.git",
        ] {
            assert!(
                matches!(
                    parse_repository_url(url),
                    Err(VendorError::UnrecognizedRepositoryUrl(_))
                ),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn display_and_dir_name() {
        let p = navigation();
        assert_eq!(p.to_string(), "elm-lang/navigation 2.0.0");
        assert_eq!(p.dir_name(), "navigation-2.0.0");
    }
}
