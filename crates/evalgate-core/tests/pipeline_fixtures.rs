use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use evalgate_core::error::{GateError, Result};
use evalgate_core::models::{
    BaselineSource, CommandStatus, CommentMode, CommentOutcome, CommentTarget, GateConfig,
    MetricThreshold, PublishedArtifact, RemoteBaseline, RemoteBaselineRequest,
};
use evalgate_core::{
    ArtifactPublisher, BaselineLookup, BaselineSettings, Collaborators, CommandRunner,
    CommentPublisher, RunSettings, SUMMARY_MARKER, run_pipeline,
};
use serde_json::Value;
use tempfile::{TempDir, tempdir};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Value {
    let raw = fs::read_to_string(fixture_path(name)).expect("read fixture");
    serde_json::from_str(&raw).expect("parse fixture")
}

/// Stands in for the evaluation command: writes a fixture report and exits.
struct FixtureCommand {
    fixture: Option<&'static str>,
    report_path: PathBuf,
    status: CommandStatus,
}

impl CommandRunner for FixtureCommand {
    fn run(&self, _command: &str) -> Result<CommandStatus> {
        if let Some(fixture) = self.fixture {
            fs::copy(fixture_path(fixture), &self.report_path)?;
        }
        Ok(self.status.clone())
    }
}

struct FixtureLookup {
    fixture: &'static str,
}

impl BaselineLookup for FixtureLookup {
    fn lookup(&self, _request: &RemoteBaselineRequest) -> Result<Option<RemoteBaseline>> {
        Ok(Some(RemoteBaseline {
            document: load_fixture(self.fixture),
            run_id: 41,
            run_url: "https://github.test/octo/evals/actions/runs/41".to_string(),
            artifact_id: 7,
        }))
    }
}

#[derive(Default)]
struct RecordingArtifacts {
    fail: bool,
    uploads: RefCell<Vec<(String, PathBuf, u32)>>,
}

impl ArtifactPublisher for RecordingArtifacts {
    fn publish(&self, name: &str, path: &Path, retention_days: u32) -> Result<PublishedArtifact> {
        if self.fail {
            return Err(GateError::Publish("storage rejected upload".to_string()));
        }
        self.uploads
            .borrow_mut()
            .push((name.to_string(), path.to_path_buf(), retention_days));
        Ok(PublishedArtifact {
            name: name.to_string(),
            artifact_id: Some(991),
            size_bytes: 128,
        })
    }
}

#[derive(Default)]
struct RecordingComments {
    fail: bool,
    bodies: RefCell<Vec<(u64, String, CommentMode)>>,
}

impl CommentPublisher for RecordingComments {
    fn publish(
        &self,
        target: &CommentTarget,
        body: &str,
        mode: CommentMode,
    ) -> Result<CommentOutcome> {
        if self.fail {
            return Err(GateError::GitHub(
                "POST comments was rejected with 403 Forbidden".to_string(),
            ));
        }
        self.bodies
            .borrow_mut()
            .push((target.issue_number, body.to_string(), mode));
        Ok(CommentOutcome::Created { comment_id: 5 })
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempdir().expect("tempdir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn settings(&self) -> RunSettings {
        RunSettings {
            title: "Eval gate".to_string(),
            command: "./run-evals.sh".to_string(),
            report_path: self.path("report.json"),
            report_label: "report.json".to_string(),
            gate: GateConfig::default(),
            baseline: BaselineSettings {
                local_path: None,
                workspace_dir: self.dir.path().to_path_buf(),
                workflow: None,
                branch: "main".to_string(),
                artifact_name: "evalgate-report".to_string(),
                report_file_name: "report.json".to_string(),
                token: Some("token".to_string()),
                repository: None,
                exclude_run_id: Some(42),
            },
            artifact_name: "evalgate-report".to_string(),
            upload_artifact: false,
            retention_days: 14,
            comment_mode: CommentMode::Off,
            comment_target: None,
            run_url: None,
            output_path: Some(self.path("github_output")),
            step_summary_path: Some(self.path("step_summary.md")),
        }
    }

    fn command(&self, fixture: &'static str) -> FixtureCommand {
        FixtureCommand {
            fixture: Some(fixture),
            report_path: self.path("report.json"),
            status: CommandStatus::success(),
        }
    }
}

#[test]
fn passing_report_without_baseline_passes() {
    let workspace = Workspace::new();
    let command = workspace.command("report_all_passed.json");

    let run = run_pipeline(
        &workspace.settings(),
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: None,
            comments: None,
        },
    )
    .expect("gate run");

    assert!(run.result.passed);
    assert_eq!(run.result.failed_scenario_count, 0);
    assert!(run.result.reasons.is_empty());
    assert!(run.diff.is_none());
    assert_eq!(run.baseline_source, BaselineSource::NotConfigured);
    assert!(run.summary.starts_with(SUMMARY_MARKER));
    assert!(run.warnings.is_empty(), "{:?}", run.warnings);

    let outputs = fs::read_to_string(workspace.path("github_output")).expect("outputs");
    assert!(outputs.contains("passed=true\n"));
    assert!(outputs.contains("score=1\n"));
    assert!(outputs.contains("score_delta=\n"));
    let summary = fs::read_to_string(workspace.path("step_summary.md")).expect("summary");
    assert!(summary.starts_with(SUMMARY_MARKER));
}

#[test]
fn failed_scenario_fails_gate_with_single_reason() {
    let workspace = Workspace::new();
    let command = workspace.command("report_one_failed.json");

    let run = run_pipeline(
        &workspace.settings(),
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: None,
            comments: None,
        },
    )
    .expect("gate run");

    assert!(!run.result.passed);
    assert_eq!(run.result.reasons, vec!["1 scenario(s) failed".to_string()]);
    assert!(run.summary.contains("### Failure reasons"));
    assert!(run.summary.contains("expected refusal, got answer"));
}

#[test]
fn remote_baseline_regressions_fail_in_fixed_order() {
    let workspace = Workspace::new();
    let command = workspace.command("report_regressed.json");
    let lookup = FixtureLookup {
        fixture: "baseline_regressed.json",
    };
    let mut settings = workspace.settings();
    settings.gate.max_score_drop = Some(0.02);
    settings.gate.max_metric_regressions = vec![
        MetricThreshold {
            key: "cost_usd".to_string(),
            max_increase: 0.0,
        },
        MetricThreshold {
            key: "latency_ms".to_string(),
            max_increase: 50.0,
        },
    ];
    settings.baseline.workflow = Some("evals.yml".to_string());
    settings.baseline.repository =
        Some(evalgate_core::github::Repository::parse("octo/evals").expect("repository"));

    let run = run_pipeline(
        &settings,
        Collaborators {
            command: &command,
            baseline: Some(&lookup),
            artifacts: None,
            comments: None,
        },
    )
    .expect("gate run");

    assert!(!run.result.passed);
    assert_eq!(
        run.result.reasons,
        vec![
            "score drop exceeded max_score_drop (0.050000000000000044 > 0.02)".to_string(),
            "metric regression: latency_ms increased by 80 (threshold 50)".to_string(),
        ]
    );
    assert_eq!(run.baseline_source.run_id(), Some(41));
    assert!(
        run.summary
            .contains("[baseline run](https://github.test/octo/evals/actions/runs/41)")
    );
    let outputs = fs::read_to_string(workspace.path("github_output")).expect("outputs");
    assert!(outputs.contains("baseline_found=true\n"));
    assert!(outputs.contains("baseline_run_id=41\n"));
}

#[test]
fn missing_report_is_fatal_even_when_command_succeeds() {
    let workspace = Workspace::new();
    let command = FixtureCommand {
        fixture: None,
        report_path: workspace.path("report.json"),
        status: CommandStatus::success(),
    };

    let err = run_pipeline(
        &workspace.settings(),
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: None,
            comments: None,
        },
    )
    .expect_err("missing report");

    assert_eq!(err.code(), "REPORT_UNAVAILABLE");
}

#[test]
fn command_failure_is_a_reason_when_enabled() {
    let workspace = Workspace::new();
    let mut command = workspace.command("report_all_passed.json");
    command.status = CommandStatus::exited(3);

    let run = run_pipeline(
        &workspace.settings(),
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: None,
            comments: None,
        },
    )
    .expect("gate run");

    assert!(!run.result.passed);
    assert_eq!(run.result.reasons, vec!["command failed (exit 3)".to_string()]);

    let mut settings = workspace.settings();
    settings.gate.fail_on_command_error = false;
    let run = run_pipeline(
        &settings,
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: None,
            comments: None,
        },
    )
    .expect("gate run");
    assert!(run.result.passed);
}

#[test]
fn publishing_uses_artifact_and_comment_collaborators() {
    let workspace = Workspace::new();
    let command = workspace.command("report_all_passed.json");
    let artifacts = RecordingArtifacts::default();
    let comments = RecordingComments::default();
    let mut settings = workspace.settings();
    settings.upload_artifact = true;
    settings.retention_days = 5;
    settings.comment_mode = CommentMode::Update;
    settings.comment_target = Some(CommentTarget {
        owner: "octo".to_string(),
        repo: "evals".to_string(),
        issue_number: 12,
    });

    let run = run_pipeline(
        &settings,
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: Some(&artifacts),
            comments: Some(&comments),
        },
    )
    .expect("gate run");

    assert_eq!(
        run.artifact.as_ref().and_then(|artifact| artifact.artifact_id),
        Some(991)
    );
    assert_eq!(run.comment, Some(CommentOutcome::Created { comment_id: 5 }));

    let uploads = artifacts.uploads.borrow();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "evalgate-report");
    assert_eq!(uploads[0].1, workspace.path("report.json"));
    assert_eq!(uploads[0].2, 5);

    let bodies = comments.bodies.borrow();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].0, 12);
    assert_eq!(bodies[0].1, run.summary);
    assert_eq!(bodies[0].2, CommentMode::Update);
    assert!(run.summary.contains("artifact: `evalgate-report`"));
}

#[test]
fn publish_failures_become_warnings_without_changing_the_gate() {
    let workspace = Workspace::new();
    let command = workspace.command("report_all_passed.json");
    let artifacts = RecordingArtifacts {
        fail: true,
        ..RecordingArtifacts::default()
    };
    let comments = RecordingComments {
        fail: true,
        ..RecordingComments::default()
    };
    let mut settings = workspace.settings();
    settings.upload_artifact = true;
    settings.comment_mode = CommentMode::Create;
    settings.comment_target = Some(CommentTarget {
        owner: "octo".to_string(),
        repo: "evals".to_string(),
        issue_number: 12,
    });

    let run = run_pipeline(
        &settings,
        Collaborators {
            command: &command,
            baseline: None,
            artifacts: Some(&artifacts),
            comments: Some(&comments),
        },
    )
    .expect("gate run");

    assert!(run.result.passed);
    assert!(run.artifact.is_none());
    assert!(run.comment.is_none());
    assert_eq!(run.warnings.len(), 2, "{:?}", run.warnings);
    assert!(run.warnings[0].starts_with("artifact upload failed"));
    assert!(run.warnings[1].starts_with("summary comment failed"));
}
