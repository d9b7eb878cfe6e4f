//! Stack creation view model
//!
//! `CreateStackView` owns the form, the view state and the collaborators, and
//! sequences a deployment: local guards, the creation call picked from the
//! dispatch table, then the access control call.

use tracing::{debug, error, info, warn};

use crate::authn::session::UserDetails;
use crate::deploy::dispatch::{create_stack, StackSource};
use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm, DeploymentState};
use crate::deploy::guard::ActionFlag;
use crate::deploy::validation::{
    sanitize_env, validate_access_control, validate_yaml, YamlValidationError, EMPTY_CONTENT_ERROR,
};
use crate::errors::DeployerError;
use crate::models::access_control::AccessControlData;
use crate::models::environment::{container_names, Container};
use crate::models::stack::{DeploymentMethod, EnvVar, RepositoryOptions, StackEngine, UploadedFile};
use crate::models::template::TemplateOption;
use crate::services::{Route, Services};

const INTERRUPTED: &str = "Deployment interrupted";

/// Values entered by the user
#[derive(Debug, Default)]
pub struct DeploymentForm {
    pub name: String,
    pub stack_file_content: String,
    pub stack_file: Option<UploadedFile>,
    pub repository: RepositoryOptions,
    pub env: Vec<EnvVar>,
    pub access_control: AccessControlData,
}

/// Transient view state
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub method: DeploymentMethod,
    pub engine: StackEngine,
    pub form_validation_error: String,
    pub yaml_validation_error: Option<YamlValidationError>,
    pub yaml_upload_error: Option<YamlValidationError>,
}

/// Knobs for the workflow
#[derive(Debug, Clone, Copy)]
pub struct WorkflowOptions {
    /// Environment stacks are deployed to
    pub endpoint_id: u64,

    /// Treat a YAML validation error as a submission guard
    pub block_on_yaml_errors: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            endpoint_id: 1,
            block_on_yaml_errors: false,
        }
    }
}

/// How a call to [`CreateStackView::deploy_stack`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Stack created, ownership applied, user moved to the stack list
    Deployed,

    /// A local guard refused the form; nothing was sent
    Rejected(String),

    /// A remote call failed; the form is kept for another attempt
    Failed(String),

    /// Another submission is still running
    Busy,
}

/// View model of the stack creation screen
pub struct CreateStackView {
    services: Services,
    user: UserDetails,
    options: WorkflowOptions,
    fsm: DeploymentFsm,
    action: ActionFlag,

    /// Form values
    pub form: DeploymentForm,

    /// View state
    pub state: ViewState,

    templates: Vec<TemplateOption>,
    selected_template: Option<TemplateOption>,
    compose_syntax_max_version: Option<String>,
    containers: Vec<Container>,
    container_names: Vec<String>,
}

impl CreateStackView {
    /// Create an empty view for `user`
    pub fn new(services: Services, user: UserDetails, options: WorkflowOptions) -> Self {
        Self {
            services,
            user,
            options,
            fsm: DeploymentFsm::new(),
            action: ActionFlag::new(),
            form: DeploymentForm::default(),
            state: ViewState::default(),
            templates: Vec::new(),
            selected_template: None,
            compose_syntax_max_version: None,
            containers: Vec::new(),
            container_names: Vec::new(),
        }
    }

    pub fn engine(&self) -> StackEngine {
        self.state.engine
    }

    /// Submission state. A submission whose future was dropped mid-chain
    /// reads as failed.
    pub fn submission_state(&self) -> DeploymentState {
        match self.fsm.state() {
            DeploymentState::Submitting if !self.action.is_set() => DeploymentState::Failed,
            state => state,
        }
    }

    pub fn action_in_progress(&self) -> bool {
        self.action.is_set()
    }

    /// Handle on the in-progress flag that outlives borrows of the view
    pub fn action_flag(&self) -> ActionFlag {
        self.action.clone()
    }

    pub fn templates(&self) -> &[TemplateOption] {
        &self.templates
    }

    pub fn selected_template(&self) -> Option<&TemplateOption> {
        self.selected_template.as_ref()
    }

    pub fn compose_syntax_max_version(&self) -> Option<&str> {
        self.compose_syntax_max_version.as_deref()
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn container_names(&self) -> &[String] {
        &self.container_names
    }

    /// Editor YAML error, empty when there is none
    pub fn yaml_validation_error(&self) -> String {
        error_text(self.state.yaml_validation_error.as_ref())
    }

    /// Uploaded file YAML error, empty when there is none
    pub fn yaml_upload_error(&self) -> String {
        error_text(self.state.yaml_upload_error.as_ref())
    }

    pub fn set_method(&mut self, method: DeploymentMethod) {
        self.state.method = method;
    }

    pub fn add_environment_variable(&mut self) {
        self.form.env.push(EnvVar::default());
    }

    /// Remove the variable at `index`; out of range is a no-op
    pub fn remove_environment_variable(&mut self, index: usize) -> Option<EnvVar> {
        if index < self.form.env.len() {
            Some(self.form.env.remove(index))
        } else {
            None
        }
    }

    /// Editor content changed
    pub fn editor_update(&mut self, content: impl Into<String>) {
        self.form.stack_file_content = content.into();
        self.state.yaml_validation_error =
            validate_yaml(&self.form.stack_file_content, &self.container_names).err();
    }

    /// A file was picked (or the pick was cleared)
    pub fn upload_file(&mut self, file: Option<UploadedFile>) {
        if let Some(file) = &file {
            self.state.yaml_upload_error = validate_yaml(&file.text(), &self.container_names).err();
        }
        self.form.stack_file = file;
    }

    /// Load a custom template's file into the editor
    pub async fn on_change_template(&mut self, template: TemplateOption) {
        let template_id = template.template.id;
        self.selected_template = Some(template);

        match self.services.templates.custom_template_file(template_id).await {
            Ok(content) => self.editor_update(content),
            Err(e) => {
                self.services
                    .notifier
                    .error("Failure", &e, "Unable to retrieve Custom Template file");
            }
        }
    }

    /// Fetch templates, environment metadata and containers.
    ///
    /// The three fetches run concurrently; a failure is notified and leaves
    /// the others untouched.
    pub async fn init_view(&mut self) {
        let endpoint_id = self.options.endpoint_id;
        let services = self.services.clone();

        let templates_fetch = async {
            let engine = match services.environment.environment_mode(endpoint_id).await {
                Ok(mode) => StackEngine::from_mode(&mode),
                Err(e) => {
                    services
                        .notifier
                        .error("Failure", &e, "Unable to retrieve the environment mode");
                    StackEngine::Compose
                }
            };

            let templates = match services.templates.custom_templates(engine).await {
                Ok(templates) => Some(templates.into_iter().map(TemplateOption::from).collect::<Vec<_>>()),
                Err(e) => {
                    services
                        .notifier
                        .error("Failure", &e, "Unable to retrieve Custom Templates");
                    None
                }
            };

            (engine, templates)
        };

        let environment_fetch = async {
            match services.environment.current_environment(endpoint_id).await {
                Ok(environment) => Some(environment.compose_syntax_max_version),
                Err(e) => {
                    services.notifier.error(
                        "Failure",
                        &e,
                        "Unable to retrieve the ComposeSyntaxMaxVersion",
                    );
                    None
                }
            }
        };

        let containers_fetch = async {
            match services.environment.containers(endpoint_id).await {
                Ok(containers) => Some(containers),
                Err(e) => {
                    services
                        .notifier
                        .error("Failure", &e, "Unable to retrieve Containers");
                    None
                }
            }
        };

        let ((engine, templates), compose_version, containers) =
            tokio::join!(templates_fetch, environment_fetch, containers_fetch);

        info!("Deploying {} stacks to environment {}", engine, endpoint_id);
        self.state.engine = engine;
        if let Some(templates) = templates {
            self.templates = templates;
        }
        if let Some(version) = compose_version {
            self.compose_syntax_max_version = Some(version);
        }
        if let Some(containers) = containers {
            self.container_names = container_names(&containers);
            self.containers = containers;
        }
    }

    /// Validate the form and deploy the stack.
    ///
    /// The in-progress flag is held from the first network call until the
    /// creation and access control chain settles.
    pub async fn deploy_stack(&mut self) -> DeployOutcome {
        if self.action.is_set() {
            debug!("Deployment already in progress");
            return DeployOutcome::Busy;
        }

        self.return_to_idle();
        self.transition(DeploymentEvent::Submit);

        if let Some(reason) = self.check_guards() {
            warn!("Deployment rejected: {}", reason);
            self.state.form_validation_error = reason.clone();
            self.transition(DeploymentEvent::Reject(reason.clone()));
            return DeployOutcome::Rejected(reason);
        }
        self.state.form_validation_error.clear();
        self.transition(DeploymentEvent::Accept);

        let Some(_guard) = self.action.try_acquire() else {
            self.transition(DeploymentEvent::Fail("Deployment already in progress".to_string()));
            return DeployOutcome::Busy;
        };

        match self.submit().await {
            Ok(()) => {
                self.transition(DeploymentEvent::Succeed);
                DeployOutcome::Deployed
            }
            Err(e) => {
                error!("Stack deployment failed: {}", e);
                self.services
                    .notifier
                    .error("Deployment error", &e, "Unable to deploy stack");
                let message = e.to_string();
                self.transition(DeploymentEvent::Fail(message.clone()));
                DeployOutcome::Failed(message)
            }
        }
    }

    /// First failing submission guard, in order
    fn check_guards(&self) -> Option<String> {
        let method = self.state.method;

        if method == DeploymentMethod::Editor && self.form.stack_file_content.is_empty() {
            return Some(EMPTY_CONTENT_ERROR.to_string());
        }

        if let Some(error) = validate_access_control(&self.form.access_control, self.user.is_admin()) {
            return Some(error);
        }

        if self.options.block_on_yaml_errors {
            let yaml_error = match method {
                DeploymentMethod::Editor | DeploymentMethod::Template => {
                    self.state.yaml_validation_error.as_ref()
                }
                DeploymentMethod::Upload => self.state.yaml_upload_error.as_ref(),
                DeploymentMethod::Repository => None,
            };
            if let Some(error) = yaml_error {
                return Some(error.to_string());
            }
        }

        None
    }

    async fn submit(&self) -> Result<(), DeployerError> {
        let endpoint_id = self.options.endpoint_id;
        let env = sanitize_env(&self.form.env);
        let source = StackSource::for_method(
            self.state.method,
            &self.form.stack_file_content,
            self.form.stack_file.as_ref(),
            &self.form.repository,
        )?;

        info!(
            "Deploying stack '{}' ({} via {})",
            self.form.name, self.state.engine, self.state.method
        );
        let payload = create_stack(
            self.services.stacks.as_ref(),
            self.state.engine,
            &self.form.name,
            source,
            &env,
            endpoint_id,
        )
        .await?;

        let resource_control = payload.resource_control()?;
        self.services
            .resource_controls
            .apply_resource_control(self.user.id, &self.form.access_control, resource_control.as_ref())
            .await?;

        self.services.notifier.success("Stack successfully deployed");
        if let Err(e) = self.services.navigator.go(Route::Stacks { endpoint_id }).await {
            warn!("Unable to open the stack list: {}", e);
        }
        Ok(())
    }

    /// Settle whatever the previous submission left behind
    fn return_to_idle(&mut self) {
        match self.fsm.state() {
            DeploymentState::Idle => {}
            DeploymentState::Succeeded | DeploymentState::Failed => {
                self.transition(DeploymentEvent::Acknowledge);
            }
            DeploymentState::Validating => {
                self.transition(DeploymentEvent::Reject(INTERRUPTED.to_string()));
            }
            DeploymentState::Submitting => {
                warn!("Previous deployment was interrupted");
                self.transition(DeploymentEvent::Fail(INTERRUPTED.to_string()));
                self.transition(DeploymentEvent::Acknowledge);
            }
        }
    }

    fn transition(&mut self, event: DeploymentEvent) {
        if let Err(e) = self.fsm.process(event) {
            error!("{}", e);
        }
    }
}

fn error_text(error: Option<&YamlValidationError>) -> String {
    error.map(ToString::to_string).unwrap_or_default()
}
