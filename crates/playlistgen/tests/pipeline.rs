use std::fs;
use std::path::Path;

use anyhow::Result;
use playlistgen::app::pipeline::{
    self, EmitOutcome, PipelineRequest, RunReport, SkipReason,
};
use playlistgen::infra::config::Config;
use tempfile::TempDir;

const LOGIN: &str = "Feature: Login

  Scenario: User logs in successfully
    Given the user enters valid credentials
    When they submit the form
    Then the dashboard is shown

  Scenario: User is locked out
    Given the user enters invalid credentials three times
    Then the account is locked
";

const BROKEN: &str = "Feature: Broken
  Scenario: unterminated
    Given valid credentials in a docstring
      \"\"\"
      never closed
";

fn write(root: &Path, relative: &str, contents: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn run_in(temp: &TempDir, config: Config, step_text: &str) -> Result<RunReport> {
    let request = PipelineRequest {
        root: temp.path().join("features"),
        step_text: step_text.into(),
        destination: temp.path().join("out.playlist"),
    };
    pipeline::run(config, &request)
}

fn names(report: &RunReport) -> Vec<&str> {
    report.names.iter().map(|name| name.as_str()).collect()
}

#[test]
fn selects_scenarios_by_step_text_end_to_end() -> Result<()> {
    let temp = tempfile::tempdir()?;
    write(&temp.path().join("features"), "login/basic.feature", LOGIN)?;

    let report = run_in(&temp, Config::default(), "valid credentials")?;

    assert!(report.is_success());
    assert_eq!(names(&report), vec!["login.LoginFeature.Userlogsinsuccessfully"]);

    let written = fs::read_to_string(temp.path().join("out.playlist"))?;
    assert!(written.contains(
        "<Property Name=\"TestWithNormalizedFullyQualifiedName\" \
         Value=\"login.LoginFeature.Userlogsinsuccessfully\" />"
    ));
    Ok(())
}

#[test]
fn feature_in_root_folder_has_no_leading_dot() -> Result<()> {
    let temp = tempfile::tempdir()?;
    write(&temp.path().join("features"), "basic.feature", LOGIN)?;

    let report = run_in(&temp, Config::default(), "valid credentials")?;
    assert_eq!(names(&report), vec!["LoginFeature.Userlogsinsuccessfully"]);
    Ok(())
}

#[test]
fn empty_step_text_selects_every_scenario() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    write(&root, "login/basic.feature", LOGIN)?;
    write(
        &root,
        "billing/pay.feature",
        "Feature: Billing\n  Scenario: Pay invoice\n    When the invoice is paid\n",
    )?;

    let report = run_in(&temp, Config::default(), "")?;
    assert_eq!(
        names(&report),
        vec![
            "billing.BillingFeature.Payinvoice",
            "login.LoginFeature.Userlogsinsuccessfully",
            "login.LoginFeature.Userislockedout",
        ]
    );
    assert_eq!(report.scenarios_matched, 3);
    Ok(())
}

#[test]
fn one_malformed_file_does_not_abort_the_run() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    for index in 0..9 {
        write(
            &root,
            &format!("area{index}/spec.feature"),
            &format!(
                "Feature: Area{index}\n  Scenario: Scenario {index}\n    Given valid credentials\n"
            ),
        )?;
    }
    write(&root, "area4/broken.feature", BROKEN)?;

    let report = run_in(&temp, Config::default(), "valid credentials")?;

    assert!(report.is_success());
    assert_eq!(report.files_discovered, 10);
    assert_eq!(report.names.len(), 9);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("area4/broken.feature"));
    assert!(matches!(report.skipped[0].reason, SkipReason::ParseFailure(_)));
    assert_eq!(report.names[4].as_str(), "area4.Area4Feature.Scenario4");
    Ok(())
}

#[test]
fn files_without_a_feature_are_skipped_quietly() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    write(&root, "empty.feature", "")?;
    write(&root, "notes.feature", "# todo: write this feature\n")?;
    write(&root, "login/basic.feature", LOGIN)?;

    let report = run_in(&temp, Config::default(), "valid credentials")?;

    assert!(report.is_success());
    assert_eq!(report.names.len(), 1);
    assert_eq!(
        report
            .skipped
            .iter()
            .map(|skip| &skip.reason)
            .collect::<Vec<_>>(),
        vec![&SkipReason::NoDocument, &SkipReason::NoDocument]
    );
    Ok(())
}

#[test]
fn repeated_runs_write_identical_bytes() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    for folder in ["z", "a/b", "m", "a", "a/c d"] {
        write(&root, &format!("{folder}/one.feature"), LOGIN)?;
        write(&root, &format!("{folder}/two.feature"), LOGIN)?;
    }

    run_in(&temp, Config::default(), "credentials")?;
    let first = fs::read(temp.path().join("out.playlist"))?;

    let mut sequential = Config::default();
    sequential.scan.set_parallel(false);
    run_in(&temp, sequential, "credentials")?;
    let second = fs::read(temp.path().join("out.playlist"))?;

    run_in(&temp, Config::default(), "credentials")?;
    let third = fs::read(temp.path().join("out.playlist"))?;

    assert_eq!(first, second);
    assert_eq!(first, third);
    Ok(())
}

#[test]
fn duplicate_names_are_kept() -> Result<()> {
    let temp = tempfile::tempdir()?;
    write(
        &temp.path().join("features"),
        "dup.feature",
        "Feature: Dup
  Scenario: Same title
    Given a step
  Scenario: Same, title!
    Given a step
",
    )?;

    let report = run_in(&temp, Config::default(), "a step")?;
    assert_eq!(
        names(&report),
        vec!["DupFeature.Sametitle", "DupFeature.Sametitle"]
    );
    Ok(())
}

#[test]
fn namespace_from_config_prefixes_names() -> Result<()> {
    let temp = tempfile::tempdir()?;
    write(&temp.path().join("features"), "login/basic.feature", LOGIN)?;

    let mut config = Config::default();
    config.naming.root_namespace = Some("Acme.Specs".into());
    let report = run_in(&temp, config, "valid credentials")?;

    assert_eq!(
        names(&report),
        vec!["Acme.Specs.login.LoginFeature.Userlogsinsuccessfully"]
    );
    Ok(())
}

#[test]
fn missing_root_fails_without_writing() -> Result<()> {
    let temp = tempfile::tempdir()?;

    let report = run_in(&temp, Config::default(), "anything")?;

    assert!(!report.is_success());
    assert!(matches!(report.outcome, EmitOutcome::Failed { .. }));
    assert!(!temp.path().join("out.playlist").exists());
    Ok(())
}

#[test]
fn unwritable_destination_fails_the_run() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    write(&root, "login/basic.feature", LOGIN)?;

    let request = PipelineRequest {
        root,
        step_text: "valid credentials".into(),
        destination: temp.path().join("no/such/dir/out.playlist"),
    };
    let report = pipeline::run(Config::default(), &request)?;

    assert!(!report.is_success());
    assert_eq!(report.names.len(), 1);
    match &report.outcome {
        EmitOutcome::Failed { reason } => assert!(reason.contains("out.playlist")),
        other => panic!("expected failure, got {other:?}"),
    }
    Ok(())
}

#[test]
fn localized_feature_files_are_selected() -> Result<()> {
    let temp = tempfile::tempdir()?;
    write(
        &temp.path().join("features"),
        "connexion/base.feature",
        "# language: fr
Fonctionnalité: Connexion

  Scénario: Connexion réussie
    Soit un utilisateur avec des identifiants valides
",
    )?;

    let report = run_in(&temp, Config::default(), "identifiants valides")?;

    assert!(report.skipped.is_empty());
    assert_eq!(
        names(&report),
        vec!["connexion.ConnexionFeature.Connexionrussie"]
    );
    Ok(())
}

#[test]
fn folders_named_like_build_output_are_scanned() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    write(&root, "bin/tools.feature", LOGIN)?;
    write(&root, "admin/obj/x.feature", LOGIN)?;

    let report = run_in(&temp, Config::default(), "valid credentials")?;

    assert_eq!(report.files_discovered, 2);
    assert_eq!(
        names(&report),
        vec![
            "admin.obj.LoginFeature.Userlogsinsuccessfully",
            "bin.LoginFeature.Userlogsinsuccessfully",
        ]
    );
    Ok(())
}

#[test]
fn configured_ignore_paths_replace_the_defaults() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path().join("features");
    write(&root, "bin/tools.feature", LOGIN)?;
    write(&root, "login/basic.feature", LOGIN)?;

    let mut config = Config::default();
    config.ignore.set_paths(vec!["bin/".into()]);
    let report = run_in(&temp, config, "valid credentials")?;

    assert_eq!(report.files_discovered, 1);
    assert_eq!(names(&report), vec!["login.LoginFeature.Userlogsinsuccessfully"]);
    Ok(())
}
