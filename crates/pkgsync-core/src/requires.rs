use crate::CoreError;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Matches `#= require name`, `# = require "name"`, `#=require 'name'`.
/// The name must be followed by a quote or whitespace, usually the newline.
const REQUIRE_PATTERN: &str = r#"^#[ ]*=[ ]*require[ "']*(.+?)["'\s]+"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Requirements {
    /// Required names whose file exists, transitively.
    pub found: Vec<String>,
    /// Required names whose file could not be read.
    pub missing: Vec<String>,
}

/// Follow `#= require` directives from `start` through `assets_dir`.
///
/// Each required name resolves to `<assets_dir>/<name>.js.coffee`. Every
/// file is read at most once, so require cycles terminate.
pub fn find_requirements(assets_dir: &Path, start: &Path) -> Result<Requirements, CoreError> {
    let pattern = Regex::new(REQUIRE_PATTERN)?;

    let mut found = BTreeSet::new();
    let mut missing = BTreeSet::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending = require_lines(&pattern, &fs::read_to_string(start)?);

    while let Some(name) = pending.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let path = requirement_path(assets_dir, &name);
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("following {}", path.display());
                pending.extend(require_lines(&pattern, &content));
                found.insert(name);
            }
            Err(e) => {
                debug!("cannot read {}: {e}", path.display());
                missing.insert(name);
            }
        }
    }

    Ok(Requirements {
        found: found.into_iter().collect(),
        missing: missing.into_iter().collect(),
    })
}

fn requirement_path(assets_dir: &Path, name: &str) -> PathBuf {
    assets_dir.join(format!("{name}.js.coffee"))
}

fn require_lines(pattern: &Regex, content: &str) -> Vec<String> {
    content
        .split_inclusive('\n')
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .collect()
}
