//! End-to-end vendoring with an in-process archive source.

use flate2::write::GzEncoder;
use flate2::Compression;
use pkgsync_schema::Manifest;
use pkgsync_vendor::{install, ArchiveFetcher, PackageDescriptor, VendorError, VendorLayout};
use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const NATIVE_JS: &str = "var _elm_lang$core$Native_Utils = function() {\n\
    return { eq: _elm_lang$core$Native_Utils.eq };\n}();\n";

/// Serves the same gzipped tarball for every package and counts calls.
struct FixtureFetcher {
    tarball: Vec<u8>,
    calls: Cell<usize>,
}

impl FixtureFetcher {
    fn new(top_dir: &str) -> Self {
        let mut builder = tar::Builder::new(Vec::new());
        append(
            &mut builder,
            &format!("{top_dir}/elm-package.json"),
            br#"{"source-directories": ["src", "src2"]}"#,
        );
        append(
            &mut builder,
            &format!("{top_dir}/src/Native/Utils.js"),
            NATIVE_JS.as_bytes(),
        );
        append(&mut builder, &format!("{top_dir}/src/Basics.elm"), b"module Basics exposing (..)\n");
        let tar = builder.into_inner().unwrap();

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&tar).unwrap();
        Self {
            tarball: enc.finish().unwrap(),
            calls: Cell::new(0),
        }
    }
}

fn append(builder: &mut tar::Builder<Vec<u8>>, path: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_path(path).unwrap();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, data).unwrap();
}

impl ArchiveFetcher for FixtureFetcher {
    fn fetch(&self, _package: &PackageDescriptor, dest: &Path) -> Result<(), VendorError> {
        self.calls.set(self.calls.get() + 1);
        fs::write(dest, &self.tarball)?;
        Ok(())
    }
}

fn write_json(path: &Path, value: &serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

struct Project {
    root: tempfile::TempDir,
    native: PathBuf,
    consumers: Vec<PathBuf>,
    layout: VendorLayout,
}

fn project() -> Project {
    let root = tempfile::tempdir().unwrap();
    let native = root.path().join("elm-native-package.json");
    write_json(&native, &serde_json::json!({"elm-lang/core": "1.0.0"}));

    let one = root.path().join("elm-package-one.json");
    write_json(
        &one,
        &serde_json::json!({
            "repository": "https://github.com/NoRedInk/elm-ops-tooling.git",
            "source-directories": ["."],
            "dependencies": {},
        }),
    );
    let two = root.path().join("elm-package-two.json");
    write_json(
        &two,
        &serde_json::json!({
            "repository": "https://github.com/NoRedInk/elm-ops-tooling-two.git",
            "source-directories": ["src"],
            "dependencies": {},
        }),
    );

    let layout = VendorLayout::new(root.path().join("vendor"));
    Project {
        root,
        native,
        consumers: vec![one, two],
        layout,
    }
}

#[test]
fn installing_twice_fetches_once() {
    let p = project();
    let fetcher = FixtureFetcher::new("core-1.0.0");

    let first = install(&p.native, &p.consumers, &p.layout, &fetcher).unwrap();
    assert_eq!(first.vendor.vendored.len(), 1);
    assert_eq!(first.vendor.updated_manifests.len(), 2);

    let second = install(&p.native, &p.consumers, &p.layout, &fetcher).unwrap();
    assert!(second.vendor.vendored.is_empty());
    assert_eq!(second.vendor.skipped.len(), 1);
    assert!(second.vendor.updated_manifests.is_empty());

    assert_eq!(fetcher.calls.get(), 1);
}

#[test]
fn install_places_archive_and_sources() {
    let p = project();
    let fetcher = FixtureFetcher::new("core-1.0.0");
    install(&p.native, &p.consumers, &p.layout, &fetcher).unwrap();

    let owner = p.root.path().join("vendor/elm-lang");
    assert!(owner.join("core-1.0.0-tar.gz").is_file());
    assert!(owner.join("core-1.0.0/src/Basics.elm").is_file());

    let one = Manifest::load(&p.consumers[0]).unwrap();
    assert_eq!(
        one.source_directories().unwrap(),
        vec![".", "vendor/elm-lang/core-1.0.0/src", "vendor/elm-lang/core-1.0.0/src2"]
    );
}

#[test]
fn install_renames_native_namespace_to_last_consumer() {
    let p = project();
    let fetcher = FixtureFetcher::new("core-1.0.0");
    let report = install(&p.native, &p.consumers, &p.layout, &fetcher).unwrap();

    assert_eq!(
        report.vendor.repository.as_deref(),
        Some("https://github.com/NoRedInk/elm-ops-tooling-two.git")
    );
    assert_eq!(report.renamed_files, 1);

    let js = fs::read_to_string(
        p.root
            .path()
            .join("vendor/elm-lang/core-1.0.0/src/Native/Utils.js"),
    )
    .unwrap();
    assert!(js.contains("var _NoRedInk$elm_ops_tooling_two$Native_Utils"));
    assert!(!js.contains("_elm_lang$core"));
}

#[test]
fn archive_with_unexpected_top_dir_fails_registration() {
    // the tarball unpacks to a directory other than project-version, so the
    // vendored manifest is not where the layout expects it
    let p = project();
    let fetcher = FixtureFetcher::new("core-main");
    let err = install(&p.native, &p.consumers, &p.layout, &fetcher).unwrap_err();
    assert!(matches!(err, VendorError::Manifest(_)));
}
