//! `qxbuild status`: staleness diagnosis without running the generator.

use anyhow::Result;
use chrono::{DateTime, Utc};
use qxbuild_core::generation::{check_staleness, GenerationMarker, Staleness};
use serde::Serialize;

use crate::layout::ProjectLayout;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub project_dir: String,
    pub namespace: String,
    pub job: String,
    pub application_target: String,
    pub stale: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_file: Option<String>,
    pub last_generation: Option<DateTime<Utc>>,
    pub last_job: Option<String>,
}

pub fn status_report(layout: &ProjectLayout) -> StatusReport {
    let app_target = layout.application_target();
    let marker = GenerationMarker::load(&app_target);
    let staleness = check_staleness(marker.as_ref(), &layout.source_roots(), &layout.job, false);
    let changed_file = match &staleness {
        Staleness::SourceChanged { path } => Some(path.display().to_string()),
        _ => None,
    };
    StatusReport {
        project_dir: layout.project_dir.display().to_string(),
        namespace: layout.namespace.clone(),
        job: layout.job.clone(),
        application_target: app_target.display().to_string(),
        stale: staleness.is_stale(),
        reason: staleness.describe(),
        changed_file,
        last_generation: marker
            .as_ref()
            .and_then(|m| DateTime::from_timestamp_millis(m.timestamp)),
        last_job: marker.map(|m| m.job),
    }
}

/// `qxbuild status [--json]`
pub fn cmd_status(layout: &ProjectLayout, json: bool) -> Result<()> {
    let report = status_report(layout);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Application: {} ({})", report.namespace, report.application_target);
    match (&report.last_generation, &report.last_job) {
        (Some(at), Some(job)) => println!("Last generation: job '{}' at {}", job, at.to_rfc3339()),
        _ => println!("Last generation: none"),
    }
    if report.stale {
        println!("Status: stale, {}", report.reason);
    } else {
        println!("Status: up to date ({})", report.reason);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::layout_in;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_report_without_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let report = status_report(&layout_in(tmp.path()));
        assert!(report.stale);
        assert_eq!(report.last_job, None);
        assert_eq!(report.reason, Staleness::NoMarker.describe());
    }

    #[test]
    fn test_report_names_changed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout_in(tmp.path());
        GenerationMarker::new(1_000, "build")
            .store(&layout.application_target())
            .unwrap();
        fs::create_dir_all(&layout.sources_dir).unwrap();
        let class = layout.sources_dir.join("Application.js");
        fs::write(&class, "qx.Class.define()").unwrap();
        fs::File::options()
            .write(true)
            .open(&class)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_millis(1_500))
            .unwrap();

        let report = status_report(&layout);
        assert!(report.stale);
        assert_eq!(report.changed_file.as_deref(), Some(class.display().to_string().as_str()));
        assert_eq!(report.last_generation.map(|t| t.timestamp_millis()), Some(1_000));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["last_job"], "build");
        assert_eq!(json["stale"], true);
    }

    #[test]
    fn test_shared_configuration_file_makes_report_stale() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout_in(tmp.path());
        GenerationMarker::new(1_000, "build")
            .store(&layout.application_target())
            .unwrap();
        fs::create_dir_all(layout.config_dir()).unwrap();
        let shared = layout.configuration_dir.join("shared.json");
        fs::write(&shared, "{}").unwrap();

        let report = status_report(&layout);
        assert!(report.stale, "{}", report.reason);
        assert_eq!(report.changed_file.as_deref(), Some(shared.display().to_string().as_str()));
    }

    #[test]
    fn test_report_up_to_date() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout_in(tmp.path());
        GenerationMarker::new(i64::MAX / 2, "build")
            .store(&layout.application_target())
            .unwrap();

        let report = status_report(&layout);
        assert!(!report.stale);
        assert!(report.changed_file.is_none());
    }
}
