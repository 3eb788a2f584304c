//! `qxbuild generate-config`: filter the configuration directory into the
//! application target.
//!
//! Every file under `<configuration>/<namespace>` is copied with `${key}`
//! placeholders replaced from the project properties. Directory properties
//! are rewritten relative to the application target with `/`, so the
//! generated `config.json` stays valid wherever the project is checked out.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use qxbuild_core::relpath::relativize;
use qxbuild_core::BuildError;
use regex::{Captures, Regex};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::layout::ProjectLayout;

/// Resolved property map written next to the generated config.
pub const PATHS_FILE: &str = "paths.json";

pub const PROP_NAMESPACE: &str = "qooxdoo.application.namespace";
pub const PROP_CONFIG: &str = "qooxdoo.application.config";
pub const PROP_SOURCE_ENCODING: &str = "qooxdoo.build.sourceEncoding";
pub const PROP_SDK_PARENT: &str = "qooxdoo.sdk.parentDirectory";
pub const PROP_SDK_VERSION: &str = "qooxdoo.sdk.version";
pub const PROP_RESOURCES: &str = "qooxdoo.application.resourcesDirectory";
pub const PROP_SOURCES: &str = "qooxdoo.application.sourcesDirectory";
pub const PROP_TEST: &str = "qooxdoo.application.testDirectory";
pub const PROP_OUTPUT: &str = "qooxdoo.application.outputDirectory";
pub const PROP_CACHE: &str = "qooxdoo.application.cacheDirectory";
pub const PROP_TRANSLATION: &str = "qooxdoo.application.translationDirectory";

/// Directory properties rewritten relative to the application target.
const RELATIVIZED: &[&str] = &[
    PROP_SDK_PARENT,
    PROP_RESOURCES,
    PROP_SOURCES,
    PROP_TEST,
    PROP_OUTPUT,
    PROP_CACHE,
    PROP_TRANSLATION,
];

#[derive(Debug)]
pub struct GeneratedConfig {
    pub files: usize,
    pub properties: BTreeMap<String, String>,
}

/// Project properties with absolute directory values. `qooxdoo.sdk.version`
/// is present only when the SDK carries a `version.txt`.
pub fn build_properties(layout: &ProjectLayout) -> BTreeMap<String, String> {
    let abs = |p: &Path| p.display().to_string();
    let mut props = BTreeMap::from([
        (PROP_NAMESPACE.to_string(), layout.namespace.clone()),
        (PROP_CONFIG.to_string(), layout.config_file.clone()),
        (PROP_SOURCE_ENCODING.to_string(), layout.source_encoding.clone()),
        (PROP_SDK_PARENT.to_string(), abs(&layout.sdk_parent_dir)),
        (PROP_RESOURCES.to_string(), abs(&layout.resources_dir)),
        (PROP_SOURCES.to_string(), abs(&layout.sources_dir)),
        (PROP_TEST.to_string(), abs(&layout.test_dir)),
        (PROP_OUTPUT.to_string(), abs(&layout.output_dir)),
        (PROP_CACHE.to_string(), abs(&layout.cache_dir)),
        (PROP_TRANSLATION.to_string(), abs(&layout.translation_dir)),
    ]);
    if let Some(version) = layout.sdk_version() {
        props.insert(PROP_SDK_VERSION.to_string(), version);
    }
    props
}

/// Rewrite directory properties relative to `app_target`. A property that
/// cannot be relativized keeps its absolute value.
pub fn relativize_properties(props: &mut BTreeMap<String, String>, app_target: &Path) {
    let base = app_target.display().to_string();
    debug!("Relativizing path properties against '{}':", base);
    for key in RELATIVIZED {
        let Some(value) = props.get_mut(*key) else {
            continue;
        };
        match relativize(value, &base, '/', Some(false)) {
            Ok(relative) => {
                debug!("  - {}: {} => {}", key, value, relative);
                *value = relative;
            }
            Err(e) => warn!("  - {}: cannot relativize path '{}': {}", key, value, e),
        }
    }
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("placeholder regex is valid")
    })
}

/// Replace `${key}` with its property value. Unknown keys are left as written.
pub fn filter_text(text: &str, props: &BTreeMap<String, String>) -> String {
    placeholder()
        .replace_all(text, |caps: &Captures| match props.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn require_dir(path: &Path, what: &str) -> Result<(), BuildError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(BuildError::configuration(
            path,
            format!("{} does not exist or is not a directory", what),
        ))
    }
}

fn require_file(path: &Path, what: &str) -> Result<(), BuildError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BuildError::configuration(
            path,
            format!("{} does not exist or is not a file", what),
        ))
    }
}

pub fn generate_config(layout: &ProjectLayout) -> Result<GeneratedConfig> {
    let config_dir = layout.config_dir();
    require_dir(&config_dir, "qooxdoo configuration directory")?;
    require_file(&config_dir.join(&layout.manifest_file), "qooxdoo manifest file")?;
    require_file(&config_dir.join(&layout.config_file), "qooxdoo configuration file")?;

    let app_target = layout.application_target();
    let mut properties = build_properties(layout);
    relativize_properties(&mut properties, &app_target);

    fs::create_dir_all(&app_target)
        .with_context(|| format!("Failed to create {}", app_target.display()))?;

    let mut files = 0;
    for entry in WalkDir::new(&config_dir).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", config_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(&config_dir).unwrap_or(entry.path());
        let dest = app_target.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let bytes = fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        let out = match String::from_utf8(bytes) {
            Ok(text) => filter_text(&text, &properties).into_bytes(),
            // binary resources are copied as-is
            Err(e) => e.into_bytes(),
        };
        fs::write(&dest, out).with_context(|| format!("Failed to write {}", dest.display()))?;
        files += 1;
    }

    let paths_file = app_target.join(PATHS_FILE);
    fs::write(&paths_file, serde_json::to_string_pretty(&properties)?)
        .with_context(|| format!("Failed to write {}", paths_file.display()))?;

    info!(
        "Generated {} configuration file(s) into {}",
        files,
        app_target.display()
    );
    Ok(GeneratedConfig { files, properties })
}

/// `qxbuild generate-config`
pub fn cmd_generate_config(layout: &ProjectLayout) -> Result<()> {
    let generated = generate_config(layout)?;
    for (key, value) in &generated.properties {
        debug!("  {} = {}", key, value);
    }
    Ok(())
}
