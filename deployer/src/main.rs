//! Stack deployer - Entry Point
//!
//! Deploys a Swarm or Compose stack to the configured environment and
//! assigns its ownership.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use stackdeploy::authn::session::Session;
use stackdeploy::deploy::workflow::{CreateStackView, DeployOutcome, WorkflowOptions};
use stackdeploy::errors::DeployerError;
use stackdeploy::filesys::file::File;
use stackdeploy::http::client::HttpClient;
use stackdeploy::logs::{init_logging, LogOptions};
use stackdeploy::models::stack::{DeploymentMethod, EnvVar, UploadedFile};
use stackdeploy::services::notifier::{StackListNavigator, TerminalNotifier};
use stackdeploy::services::Services;
use stackdeploy::storage::layout::StorageLayout;
use stackdeploy::storage::settings::Settings;
use stackdeploy::utils::version_info;

use secrecy::SecretString;
use tracing::{error, info, warn};

const USAGE: &str = "Usage: stackdeploy --name=<stack> [--method=editor|upload|repository|template]
  [--file=<path>] [--template=<id>]
  [--repo-url=<url>] [--repo-ref=<ref>] [--compose-path=<path>] [--repo-user=<user>] [--repo-password=<password>]
  [--env=NAME=VALUE]... [--ownership=administrators|private|restricted|public] [--users=1,2] [--teams=3]
  [--url=<api url>] [--endpoint=<id>] [--token=<jwt>] [--log-level=<level>]
  [--init-config] [--version]";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();
    let mut env_pairs: Vec<String> = Vec::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            if clean_key == "env" {
                env_pairs.push(value.to_string());
            } else {
                cli_args.insert(clean_key.to_string(), value.to_string());
            }
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("help") {
        println!("{USAGE}");
        return;
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{version}"),
            Err(e) => eprintln!("Unable to render version: {e}"),
        }
        return;
    }

    // Retrieve the settings file
    let layout = StorageLayout::default();
    let settings_file = layout.settings_file();
    let mut settings = match Settings::load(&settings_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = apply_overrides(&mut settings, &cli_args) {
        eprintln!("{e}");
        std::process::exit(2);
    }

    if cli_args.contains_key("init-config") {
        match settings.save(&settings_file).await {
            Ok(()) => println!("Settings written to {}", settings_file.path().display()),
            Err(e) => {
                eprintln!("Unable to write settings: {e}");
                std::process::exit(2);
            }
        }
        return;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.json_logs,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = settings.validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    let code = match run(&settings, &cli_args, &env_pairs).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("{}", e);
            eprintln!("{e}\n\n{USAGE}");
            2
        }
    };
    std::process::exit(code);
}

/// Command line values win over the settings file
fn apply_overrides(settings: &mut Settings, cli_args: &HashMap<String, String>) -> Result<(), DeployerError> {
    if let Some(url) = cli_args.get("url") {
        settings.backend.base_url = url.clone();
    }
    if let Some(endpoint) = cli_args.get("endpoint") {
        settings.endpoint_id = endpoint
            .parse()
            .map_err(|_| DeployerError::ConfigError(format!("Invalid endpoint id: {}", endpoint)))?;
    }
    if let Some(token) = cli_args.get("token") {
        settings.backend.api_token = Some(SecretString::from(token.clone()));
    }
    if let Some(level) = cli_args.get("log-level") {
        settings.log_level = level.parse().map_err(DeployerError::ConfigError)?;
    }
    if let Some(block) = cli_args.get("block-on-yaml-errors") {
        settings.block_on_yaml_errors = block.parse().map_err(|_| {
            DeployerError::ConfigError(format!("Invalid value for --block-on-yaml-errors: {}", block))
        })?;
    }
    Ok(())
}

async fn run(
    settings: &Settings,
    cli_args: &HashMap<String, String>,
    env_pairs: &[String],
) -> Result<bool, DeployerError> {
    let token = settings.api_token().ok_or_else(|| {
        DeployerError::AuthError("No API token configured (settings, STACKDEPLOY_TOKEN or --token)".to_string())
    })?;
    let session = Session::from_token(token)?;
    if session.is_expired() {
        return Err(DeployerError::AuthError("API token has expired".to_string()));
    }

    let timeout = std::time::Duration::from_secs(settings.backend.timeout_secs);
    let client = Arc::new(HttpClient::with_token(&settings.backend.base_url, timeout, token)?);
    let navigator = Arc::new(StackListNavigator::new(client.clone()));
    let services = Services::with_backend(client, Arc::new(TerminalNotifier), navigator);

    let options = WorkflowOptions {
        endpoint_id: settings.endpoint_id,
        block_on_yaml_errors: settings.block_on_yaml_errors,
    };
    let mut view = CreateStackView::new(services, session.user_details(), options);
    view.init_view().await;

    fill_form(&mut view, cli_args, env_pairs).await?;

    let yaml_error = match view.state.method {
        DeploymentMethod::Upload => view.yaml_upload_error(),
        DeploymentMethod::Repository => String::new(),
        _ => view.yaml_validation_error(),
    };
    if !yaml_error.is_empty() {
        warn!("{}", yaml_error);
    }

    match view.deploy_stack().await {
        DeployOutcome::Deployed => {
            info!("Stack '{}' deployed", view.form.name);
            Ok(true)
        }
        DeployOutcome::Rejected(reason) => {
            eprintln!("{reason}");
            Ok(false)
        }
        DeployOutcome::Failed(_) | DeployOutcome::Busy => Ok(false),
    }
}

/// Copy the command line into the view, the way a user fills the form
async fn fill_form(
    view: &mut CreateStackView,
    cli_args: &HashMap<String, String>,
    env_pairs: &[String],
) -> Result<(), DeployerError> {
    view.form.name = cli_args
        .get("name")
        .cloned()
        .ok_or_else(|| DeployerError::ValidationError("--name is required".to_string()))?;

    let method = match cli_args.get("method") {
        Some(method) => method.parse().map_err(DeployerError::ValidationError)?,
        None => DeploymentMethod::Editor,
    };
    view.set_method(method);

    match method {
        DeploymentMethod::Editor => {
            let path = required(cli_args, "file")?;
            let content = File::new(path).read_string().await?;
            view.editor_update(content);
        }
        DeploymentMethod::Upload => {
            let path = required(cli_args, "file")?;
            let file = UploadedFile::from_path(&File::new(path)).await?;
            view.upload_file(Some(file));
        }
        DeploymentMethod::Template => {
            let id: u64 = required(cli_args, "template")?
                .parse()
                .map_err(|_| DeployerError::ValidationError("--template must be a numeric id".to_string()))?;
            let template = view
                .templates()
                .iter()
                .find(|option| option.template.id == id)
                .cloned()
                .ok_or_else(|| DeployerError::NotFound(format!("Custom template {}", id)))?;
            view.on_change_template(template).await;
        }
        DeploymentMethod::Repository => {
            let repository = &mut view.form.repository;
            repository.repository_url = required(cli_args, "repo-url")?.to_string();
            if let Some(reference) = cli_args.get("repo-ref") {
                repository.repository_reference_name = reference.clone();
            }
            if let Some(path) = cli_args.get("compose-path") {
                repository.compose_file_path_in_repository = path.clone();
            }
            if let Some(username) = cli_args.get("repo-user") {
                repository.repository_authentication = true;
                repository.repository_username = username.clone();
            }
            if let Some(password) = cli_args.get("repo-password") {
                repository.repository_authentication = true;
                repository.repository_password = SecretString::from(password.clone());
            }
        }
    }

    for pair in env_pairs {
        view.form.env.push(EnvVar::parse(pair)?);
    }

    let access_control = &mut view.form.access_control;
    if let Some(ownership) = cli_args.get("ownership") {
        access_control.ownership = ownership.parse().map_err(DeployerError::ValidationError)?;
    }
    if let Some(users) = cli_args.get("users") {
        access_control.authorized_users = parse_ids(users)?;
    }
    if let Some(teams) = cli_args.get("teams") {
        access_control.authorized_teams = parse_ids(teams)?;
    }

    Ok(())
}

fn required<'a>(cli_args: &'a HashMap<String, String>, key: &str) -> Result<&'a str, DeployerError> {
    cli_args
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| DeployerError::ValidationError(format!("--{} is required", key)))
}

fn parse_ids(list: &str) -> Result<Vec<u64>, DeployerError> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse()
                .map_err(|_| DeployerError::ValidationError(format!("Invalid id: {}", id)))
        })
        .collect()
}
