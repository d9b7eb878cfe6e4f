//! Stack creation workflow tests

use std::time::Duration;

use serde_json::json;

use stackdeploy::deploy::fsm::DeploymentState;
use stackdeploy::deploy::validation::EMPTY_CONTENT_ERROR;
use stackdeploy::deploy::workflow::{DeployOutcome, WorkflowOptions};
use stackdeploy::models::access_control::{AccessControlData, Ownership};
use stackdeploy::models::environment::Container;
use stackdeploy::models::stack::{DeploymentMethod, EnvVar, StackEngine, UploadedFile};
use stackdeploy::models::template::{CustomTemplate, TemplateOption};
use stackdeploy::services::Route;

use crate::fakes::{harness, harness_with, FakeBackend, COMPOSE_FILE};

fn nginx_template() -> CustomTemplate {
    CustomTemplate {
        id: 9,
        title: "Nginx".to_string(),
        description: "Reverse proxy".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_empty_editor_is_rejected_locally() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();

    let outcome = h.view.deploy_stack().await;

    assert_eq!(outcome, DeployOutcome::Rejected(EMPTY_CONTENT_ERROR.to_string()));
    assert_eq!(h.view.state.form_validation_error, EMPTY_CONTENT_ERROR);
    assert_eq!(h.view.submission_state(), DeploymentState::Idle);
    assert!(h.backend.calls().is_empty());
    assert!(h.backend.applied.lock().unwrap().is_empty());
    assert!(!h.view.action_in_progress());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_restricted_without_users_is_rejected() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);
    h.view.form.access_control = AccessControlData {
        ownership: Ownership::Restricted,
        ..Default::default()
    };

    let outcome = h.view.deploy_stack().await;

    assert_eq!(
        outcome,
        DeployOutcome::Rejected("You must specify at least one team or user.".to_string())
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_non_admin_restricted_needs_team() {
    let mut h = harness_with(FakeBackend::default(), false, WorkflowOptions::default());
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);
    h.view.form.access_control = AccessControlData {
        ownership: Ownership::Restricted,
        authorized_users: vec![7],
        ..Default::default()
    };

    let outcome = h.view.deploy_stack().await;

    assert_eq!(
        outcome,
        DeployOutcome::Rejected("You must specify at least a team.".to_string())
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_compose_upload_uses_only_compose_upload() {
    let mut h = harness(FakeBackend::default());
    h.view.init_view().await;
    assert_eq!(h.view.engine(), StackEngine::Compose);

    h.view.form.name = "web".to_string();
    h.view.set_method(DeploymentMethod::Upload);
    h.view
        .upload_file(Some(UploadedFile::new("docker-compose.yml", COMPOSE_FILE)));
    h.view.form.env = vec![
        EnvVar::new("A", "1"),
        EnvVar::new("", "x"),
        EnvVar::new("B", ""),
    ];

    let outcome = h.view.deploy_stack().await;

    assert_eq!(outcome, DeployOutcome::Deployed);
    assert_eq!(h.backend.calls(), vec!["compose_upload".to_string()]);
    assert_eq!(*h.backend.last_env.lock().unwrap(), vec![EnvVar::new("A", "1")]);
    assert_eq!(
        h.backend.last_file.lock().unwrap().as_ref().map(|f| f.name.clone()),
        Some("docker-compose.yml".to_string())
    );
    assert_eq!(h.view.submission_state(), DeploymentState::Succeeded);
}

#[tokio::test]
async fn test_swarm_editor_uses_swarm_content() {
    let mut h = harness(FakeBackend::swarm_manager());
    h.view.init_view().await;
    assert_eq!(h.view.engine(), StackEngine::Swarm);

    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);
    assert_eq!(h.backend.calls(), vec!["swarm_content".to_string()]);
    assert_eq!(
        h.backend.last_content.lock().unwrap().as_deref(),
        Some(COMPOSE_FILE)
    );
}

#[tokio::test]
async fn test_repository_method_uses_repository() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();
    h.view.set_method(DeploymentMethod::Repository);
    h.view.form.repository.repository_url = "https://example.com/stacks.git".to_string();

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);
    assert_eq!(h.backend.calls(), vec!["compose_repository".to_string()]);
    assert_eq!(
        h.backend.last_repository_url.lock().unwrap().as_deref(),
        Some("https://example.com/stacks.git")
    );
}

#[tokio::test]
async fn test_success_applies_ownership_notifies_and_navigates() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);
    h.view.form.access_control.ownership = Ownership::Private;

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);

    let applied = h.backend.applied.lock().unwrap().clone();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].0, 7);
    assert_eq!(applied[0].1.as_ref().map(|rc| rc.id), Some(42));
    assert_eq!(h.notifier.successes(), vec!["Stack successfully deployed".to_string()]);
    assert_eq!(h.navigator.routes(), vec![Route::Stacks { endpoint_id: 1 }]);
}

#[tokio::test]
async fn test_nested_data_payload_is_unwrapped() {
    let backend = FakeBackend {
        payload: json!({"data": {"Id": 2, "ResourceControl": {"Id": 77}}}),
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);

    let applied = h.backend.applied.lock().unwrap().clone();
    assert_eq!(applied[0].1.as_ref().map(|rc| rc.id), Some(77));
}

#[tokio::test]
async fn test_missing_resource_control_still_applies_nothing() {
    let backend = FakeBackend {
        payload: json!({"Id": 3}),
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);

    let applied = h.backend.applied.lock().unwrap().clone();
    assert_eq!(applied.len(), 1);
    assert!(applied[0].1.is_none());
}

#[tokio::test]
async fn test_malformed_resource_control_fails_the_chain() {
    let backend = FakeBackend {
        payload: json!({"Id": 1, "ResourceControl": {"Id": "9"}}),
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    let outcome = h.view.deploy_stack().await;

    assert!(matches!(outcome, DeployOutcome::Failed(_)));
    assert!(h.backend.applied.lock().unwrap().is_empty());
    assert!(h.notifier.successes().is_empty());
    assert_eq!(
        h.notifier.errors(),
        vec![("Deployment error".to_string(), "Unable to deploy stack".to_string())]
    );
}

#[tokio::test]
async fn test_cancelled_deployment_returns_to_idle() {
    let backend = FakeBackend {
        hang_create: true,
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    let cancelled = tokio::time::timeout(Duration::from_millis(50), h.view.deploy_stack()).await;
    assert!(cancelled.is_err());
    assert_eq!(*h.backend.flag_observations.lock().unwrap(), vec![true]);

    // Nothing is in flight once the future is gone
    assert!(!h.view.action_in_progress());
    assert_eq!(h.view.submission_state(), DeploymentState::Failed);

    h.view.editor_update("");
    let outcome = h.view.deploy_stack().await;

    assert_eq!(outcome, DeployOutcome::Rejected(EMPTY_CONTENT_ERROR.to_string()));
    assert_eq!(h.view.submission_state(), DeploymentState::Idle);
}

#[tokio::test]
async fn test_action_in_progress_spans_the_remote_chain() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);
    assert!(!h.view.action_in_progress());

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);

    // Observed once by the creation call, once by the access control call
    assert_eq!(*h.backend.flag_observations.lock().unwrap(), vec![true, true]);
    assert!(!h.view.action_in_progress());
}

#[tokio::test]
async fn test_creation_failure_keeps_form_and_clears_flag() {
    let backend = FakeBackend {
        fail_create: true,
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    let outcome = h.view.deploy_stack().await;

    assert!(matches!(outcome, DeployOutcome::Failed(_)));
    assert_eq!(h.view.submission_state(), DeploymentState::Failed);
    assert!(!h.view.action_in_progress());
    assert!(h.backend.applied.lock().unwrap().is_empty());
    assert!(h.notifier.successes().is_empty());
    assert!(h.navigator.routes().is_empty());
    assert_eq!(
        h.notifier.errors(),
        vec![("Deployment error".to_string(), "Unable to deploy stack".to_string())]
    );
    assert_eq!(h.view.form.name, "web");
    assert_eq!(h.view.form.stack_file_content, COMPOSE_FILE);
}

#[tokio::test]
async fn test_access_control_failure_is_a_failure() {
    let backend = FakeBackend {
        fail_apply: true,
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    let outcome = h.view.deploy_stack().await;

    assert!(matches!(outcome, DeployOutcome::Failed(_)));
    assert_eq!(h.backend.calls().len(), 1);
    assert!(h.notifier.successes().is_empty());
    assert!(h.navigator.routes().is_empty());
    assert_eq!(h.notifier.errors().len(), 1);
    assert!(!h.view.action_in_progress());
}

#[tokio::test]
async fn test_resubmit_after_failure() {
    let backend = FakeBackend {
        fail_create: true,
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    assert!(matches!(h.view.deploy_stack().await, DeployOutcome::Failed(_)));
    assert!(matches!(h.view.deploy_stack().await, DeployOutcome::Failed(_)));
    assert_eq!(h.backend.calls().len(), 2);
}

#[tokio::test]
async fn test_upload_without_file_fails() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();
    h.view.set_method(DeploymentMethod::Upload);

    let outcome = h.view.deploy_stack().await;

    assert!(matches!(outcome, DeployOutcome::Failed(_)));
    assert!(h.backend.calls().is_empty());
    assert!(!h.view.action_in_progress());
}

#[tokio::test]
async fn test_busy_while_flag_is_held() {
    let mut h = harness(FakeBackend::default());
    h.view.form.name = "web".to_string();
    h.view.editor_update(COMPOSE_FILE);

    let flag = h.view.action_flag();
    let guard = flag.try_acquire().unwrap();
    assert!(h.view.action_in_progress());

    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Busy);
    assert!(h.backend.calls().is_empty());

    drop(guard);
    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);
}

#[tokio::test]
async fn test_yaml_errors_are_advisory_by_default() {
    let mut h = harness(FakeBackend::default());
    h.view.init_view().await;
    h.view.form.name = "web".to_string();
    h.view
        .editor_update("services:\n  db:\n    image: postgres\n    container_name: db\n");

    assert!(!h.view.yaml_validation_error().is_empty());
    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);
}

#[tokio::test]
async fn test_yaml_errors_block_when_configured() {
    let options = WorkflowOptions {
        block_on_yaml_errors: true,
        ..Default::default()
    };
    let mut h = harness_with(FakeBackend::default(), true, options);
    h.view.init_view().await;
    h.view.form.name = "web".to_string();
    h.view.editor_update("services: [unclosed");

    let outcome = h.view.deploy_stack().await;

    assert_eq!(
        outcome,
        DeployOutcome::Rejected("There is an error in the yaml syntax".to_string())
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_editor_update_reports_collisions() {
    let mut h = harness(FakeBackend::default());
    h.view.init_view().await;
    assert_eq!(h.view.container_names(), ["db".to_string(), "web".to_string()]);

    h.view.editor_update(
        "services:\n  a:\n    container_name: db\n  b:\n    container_name: web\n",
    );
    assert_eq!(
        h.view.yaml_validation_error(),
        "These container names are already used by another containers running in this environment: db, web."
    );

    h.view.editor_update(COMPOSE_FILE);
    assert_eq!(h.view.yaml_validation_error(), "");
}

#[tokio::test]
async fn test_upload_file_reports_collision() {
    let mut h = harness(FakeBackend::default());
    h.view.init_view().await;

    h.view.upload_file(Some(UploadedFile::new(
        "stack.yml",
        "services:\n  a:\n    container_name: db\n",
    )));
    assert_eq!(
        h.view.yaml_upload_error(),
        "This container name is already used by another container running in this environment: db."
    );
    assert_eq!(h.view.yaml_validation_error(), "");
}

#[tokio::test]
async fn test_remove_environment_variable() {
    let mut h = harness(FakeBackend::default());
    h.view.form.env = vec![
        EnvVar::new("A", "1"),
        EnvVar::new("B", "2"),
        EnvVar::new("C", "3"),
    ];

    assert_eq!(h.view.remove_environment_variable(5), None);
    assert_eq!(h.view.form.env.len(), 3);

    assert_eq!(h.view.remove_environment_variable(1), Some(EnvVar::new("B", "2")));
    assert_eq!(
        h.view.form.env,
        vec![EnvVar::new("A", "1"), EnvVar::new("C", "3")]
    );

    h.view.add_environment_variable();
    assert_eq!(h.view.form.env.last(), Some(&EnvVar::default()));
}

#[tokio::test]
async fn test_init_view_loads_everything() {
    let backend = FakeBackend {
        templates: vec![nginx_template()],
        ..Default::default()
    };
    let mut h = harness(backend);

    h.view.init_view().await;

    assert_eq!(h.view.templates().len(), 1);
    assert_eq!(h.view.templates()[0].label, "Nginx - Reverse proxy");
    assert_eq!(h.view.compose_syntax_max_version(), Some("3.9"));
    assert_eq!(h.view.containers().len(), 2);
    assert_eq!(
        *h.backend.template_engines.lock().unwrap(),
        vec![StackEngine::Compose]
    );
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_init_view_failures_are_isolated() {
    let backend = FakeBackend {
        templates: vec![nginx_template()],
        fail_containers: true,
        ..Default::default()
    };
    let mut h = harness(backend);

    h.view.init_view().await;

    assert_eq!(h.view.templates().len(), 1);
    assert_eq!(h.view.compose_syntax_max_version(), Some("3.9"));
    assert!(h.view.containers().is_empty());
    assert_eq!(
        h.notifier.errors(),
        vec![("Failure".to_string(), "Unable to retrieve Containers".to_string())]
    );
}

#[tokio::test]
async fn test_init_view_reports_each_failure() {
    let backend = FakeBackend {
        fail_templates: true,
        fail_environment: true,
        containers: vec![Container {
            id: "c9".to_string(),
            names: vec!["/cache".to_string()],
        }],
        ..Default::default()
    };
    let mut h = harness(backend);

    h.view.init_view().await;

    let contexts: Vec<String> = h.notifier.errors().into_iter().map(|(_, c)| c).collect();
    assert_eq!(contexts.len(), 2);
    assert!(contexts.contains(&"Unable to retrieve Custom Templates".to_string()));
    assert!(contexts.contains(&"Unable to retrieve the ComposeSyntaxMaxVersion".to_string()));
    assert_eq!(h.view.container_names(), ["cache".to_string()]);
    assert!(h.view.compose_syntax_max_version().is_none());
}

#[tokio::test]
async fn test_mode_failure_falls_back_to_compose() {
    let backend = FakeBackend {
        fail_mode: true,
        ..FakeBackend::swarm_manager()
    };
    let mut h = harness(backend);

    h.view.init_view().await;

    assert_eq!(h.view.engine(), StackEngine::Compose);
    assert_eq!(
        h.notifier.errors(),
        vec![("Failure".to_string(), "Unable to retrieve the environment mode".to_string())]
    );
}

#[tokio::test]
async fn test_change_template_loads_content() {
    let backend = FakeBackend {
        templates: vec![nginx_template()],
        template_file: COMPOSE_FILE.to_string(),
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.init_view().await;

    let option = h.view.templates()[0].clone();
    h.view.on_change_template(option).await;

    assert_eq!(h.view.form.stack_file_content, COMPOSE_FILE);
    assert_eq!(h.view.selected_template().map(|t| t.template.id), Some(9));

    h.view.form.name = "from-template".to_string();
    h.view.set_method(DeploymentMethod::Template);
    assert_eq!(h.view.deploy_stack().await, DeployOutcome::Deployed);
    assert_eq!(h.backend.calls(), vec!["compose_content".to_string()]);
}

#[tokio::test]
async fn test_change_template_failure_is_notified() {
    let backend = FakeBackend {
        fail_template_file: true,
        ..Default::default()
    };
    let mut h = harness(backend);
    h.view.editor_update(COMPOSE_FILE);

    h.view
        .on_change_template(TemplateOption::from(nginx_template()))
        .await;

    assert_eq!(h.view.form.stack_file_content, COMPOSE_FILE);
    assert_eq!(
        h.notifier.errors(),
        vec![("Failure".to_string(), "Unable to retrieve Custom Template file".to_string())]
    );
}
