//! Terminal notifications and navigation

use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use tracing::{error, info};

use crate::errors::DeployerError;
use crate::models::stack::{Stack, StackEngine};
use crate::services::{Navigator, Notifier, Route, StackService};

/// Prints notifications on stderr and mirrors them to the log
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
        eprintln!("{} {}", "✔".green().bold(), message);
    }

    fn error(&self, title: &str, err: &DeployerError, context: &str) {
        error!("{}: {} ({})", title, context, err);
        eprintln!("{} {}: {}", "✘".red().bold(), title.red().bold(), context);
        eprintln!("  {}", err.to_string().dimmed());
    }
}

/// "Navigates" by printing the requested view on stdout
pub struct StackListNavigator {
    stacks: Arc<dyn StackService>,
}

impl StackListNavigator {
    pub fn new(stacks: Arc<dyn StackService>) -> Self {
        Self { stacks }
    }
}

#[async_trait]
impl Navigator for StackListNavigator {
    async fn go(&self, route: Route) -> Result<(), DeployerError> {
        match route {
            Route::Stacks { endpoint_id } => {
                let stacks = self.stacks.stacks(endpoint_id).await?;
                println!("{}", render_stack_list(&stacks));
                Ok(())
            }
        }
    }
}

/// Render stacks as an aligned table
pub fn render_stack_list(stacks: &[Stack]) -> String {
    if stacks.is_empty() {
        return "No stacks deployed".to_string();
    }

    let width = stacks
        .iter()
        .map(|stack| stack.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut lines = vec![format!("{:<6} {:<width$} {}", "ID", "NAME", "TYPE", width = width)];
    for stack in stacks {
        let engine = match stack.stack_type {
            1 => StackEngine::Swarm.to_string(),
            2 => StackEngine::Compose.to_string(),
            other => other.to_string(),
        };
        lines.push(format!(
            "{:<6} {:<width$} {}",
            stack.id,
            stack.name,
            engine,
            width = width
        ));
    }
    lines.join("\n")
}
