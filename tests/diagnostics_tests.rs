//! Integration tests for the installation self test.
//!
//! Builds reader/writer config trees in temp directories and checks the
//! printed report.

use satpy_core::config::PathResolver;
use satpy_core::diagnostics::{
    Capability, CapabilityProbe, ComponentKind, DiagnosticChecker, configs_for_component,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct NothingInstalled;

impl CapabilityProbe for NothingInstalled {
    fn probe(&self, name: &str) -> Capability {
        Capability::Unavailable(format!("{} is not installed", name))
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_full_report() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("pkg");
    let user = temp.path().join("user");

    write(&pkg.join("readers/ahi_hsd.yaml"), "reader:\n  name: ahi_hsd\n");
    write(
        &pkg.join("readers/viirs_sdr.yaml"),
        "reader:\n  name: viirs_sdr\n  reader: !MultiFileReader\n    group_keys: [start_time]\n",
    );
    write(&pkg.join("readers/no_name.yaml"), "file_types: {}\n");
    write(&user.join("readers/amsr2.yaml"), "reader:\n  name: amsr2_l1b\n---\nextra: true\n");
    write(&pkg.join("writers/geotiff.yaml"), "writer:\n  name: geotiff\n");

    let resolver = PathResolver::new(vec![user]).with_package_dir(&pkg);
    let report = DiagnosticChecker::new(resolver)
        .with_probe(Box::new(NothingInstalled))
        .check(None, None, None);

    let expected = "\
Readers
=======
ahi_hsd:  ok
amsr2_l1b:  error
viirs_sdr:  could not determine a constructor for the tag '!MultiFileReader'

Writers
=======
geotiff:  ok

Extras
======
gdal:  gdal is not installed
proj:  proj is not installed

";
    assert_eq!(report.to_string(), expected);
}

#[test]
fn test_known_tags_pass_strict_parse() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("pkg");
    write(
        &pkg.join("readers/viirs_sdr.yaml"),
        "reader:\n  name: viirs_sdr\n  reader: !MultiFileReader {}\n",
    );
    let resolver = PathResolver::new(Vec::new()).with_package_dir(&pkg);
    let no_extras: Vec<String> = Vec::new();
    let report = DiagnosticChecker::new(resolver)
        .with_known_tags(["!MultiFileReader"])
        .with_probe(Box::new(NothingInstalled))
        .check(None, None, Some(no_extras.as_slice()));
    assert_eq!(report.readers["viirs_sdr"], "ok");
    assert!(report.extras.is_empty());
}

#[test]
fn test_filters_limit_components() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("pkg");
    write(&pkg.join("readers/a.yaml"), "reader:\n  name: a\n");
    write(&pkg.join("readers/b.yaml"), "reader:\n  name: b\n");
    write(&pkg.join("writers/w.yaml"), "writer:\n  name: w\n");

    let resolver = PathResolver::new(Vec::new()).with_package_dir(&pkg);
    let readers = vec!["b".to_string()];
    let writers: Vec<String> = Vec::new();
    let report = DiagnosticChecker::new(resolver)
        .with_probe(Box::new(NothingInstalled))
        .check(Some(readers.as_slice()), Some(writers.as_slice()), None);
    assert_eq!(report.readers.keys().collect::<Vec<_>>(), vec!["b"]);
    assert!(report.writers.is_empty());
}

#[test]
fn test_builtin_configs_are_valid() {
    let resolver = PathResolver::new(Vec::new());
    let readers = configs_for_component(&resolver, ComponentKind::Reader, None);
    let writers = configs_for_component(&resolver, ComponentKind::Writer, None);
    assert!(!readers.is_empty());
    assert!(!writers.is_empty());

    let no_extras: Vec<String> = Vec::new();
    let report = DiagnosticChecker::new(resolver)
        .with_probe(Box::new(NothingInstalled))
        .check(None, None, Some(no_extras.as_slice()));
    assert!(report.readers.values().all(|status| status == "ok"));
    assert!(report.writers.values().all(|status| status == "ok"));
    assert!(report.readers.contains_key("ahi_hsd"));
    assert!(report.writers.contains_key("geotiff"));
}
