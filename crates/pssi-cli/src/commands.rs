use anyhow::Result;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::cli::{Commands, HostCommands, TaskCommands};
use crate::client::ApiClient;
use crate::poller::{PollOutcome, PollState, StatsPoller, StatsSource};
use pssi_ai::Credentials;
use pssi_api::ApiConfig;
use pssi_host::{HostStats, PythonRunner};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub async fn execute(command: Commands, client: ApiClient) -> Result<()> {
    match command {
        Commands::Serve { host, port } => {
            let mut config = ApiConfig::from_env()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let credentials = Credentials::from_env();
            println!("Starting API server on {}...", config.bind_address());
            if credentials.configured().is_empty() {
                println!("Warning: No AI provider keys configured.");
            }

            pssi_api::serve(config, credentials).await?;
        }

        Commands::Chat {
            prompt,
            provider,
            model,
        } => {
            let mut body = json!({ "prompt": prompt });
            if let Some(provider) = provider {
                body["provider"] = json!(provider);
            }
            if let Some(model) = model {
                body["model"] = json!(model);
            }

            let response: Value = client.post("/api/ai/chat", &body).await?;
            println!("{}", response["content"].as_str().unwrap_or_default());
            println!();
            println!(
                "  via {} ({})",
                response["provider"].as_str().unwrap_or("unknown"),
                response["model"].as_str().unwrap_or("unknown")
            );
        }

        Commands::Health => {
            let server: Value = client.get("/health").await?;
            println!(
                "Server: {} (v{})",
                server["status"].as_str().unwrap_or("unknown"),
                server["version"].as_str().unwrap_or("?")
            );

            let ai: Value = client.get("/api/ai/health").await?;
            println!("AI: {}", ai["status"].as_str().unwrap_or("unknown"));
            if let Some(providers) = ai["providers"].as_object() {
                for (name, configured) in providers {
                    let mark = if configured.as_bool().unwrap_or(false) { "✓" } else { "✗" };
                    println!("  {} {}", mark, name);
                }
            }
        }

        Commands::Task { command } => match command {
            TaskCommands::Submit {
                description,
                auto_execute,
            } => {
                println!("Submitting task...");
                let response: Value = client
                    .post(
                        "/api/tasks/automate",
                        &json!({ "task": description, "autoExecute": auto_execute }),
                    )
                    .await?;

                println!("✓ Task created: {}", response["taskId"].as_str().unwrap_or("?"));
                print_task(&response["task"]);

                let analysis = &response["analysis"];
                println!("\n  Analysis: {}", analysis["analysis"].as_str().unwrap_or_default());
                if let Some(steps) = analysis["steps"].as_array() {
                    for (i, step) in steps.iter().enumerate() {
                        println!("    {}. {}", i + 1, step.as_str().unwrap_or_default());
                    }
                }
                println!(
                    "  Safe: {}  Requires confirmation: {}",
                    analysis["safe"], analysis["requires_confirmation"]
                );
            }

            TaskCommands::Status { task_id } => {
                let task: Value = client.get(&format!("/api/tasks/{}", task_id)).await?;
                print_task(&task);
            }
        },

        Commands::Host { command } => match command {
            HostCommands::Stats => {
                let stats = HostStats::collect().await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }

            HostCommands::Run { name, args } => {
                let config = ApiConfig::from_env()?;
                let runner = PythonRunner::new(config.tasks_dir);
                let output = runner.run(&name, &args).await?;

                print!("{}", output.stdout);
                if !output.stderr.is_empty() {
                    eprint!("{}", output.stderr);
                }
            }
        },

        Commands::Stats { watch, interval_ms } => {
            if watch {
                watch_stats(client, Duration::from_millis(interval_ms)).await;
            } else {
                let mut state = PollState::default();
                let outcome = match client.fetch().await {
                    Ok(stats) => PollOutcome::Stats(stats),
                    Err(e) => PollOutcome::Failed(e),
                };
                state.apply(outcome);
                println!("{}", state.render());
            }
        }
    }

    Ok(())
}

fn print_task(task: &Value) {
    println!("Task: {}", task["id"].as_str().unwrap_or("?"));
    println!("  Description: {}", task["description"].as_str().unwrap_or_default());
    println!("  Status: {}", task["status"].as_str().unwrap_or("unknown"));
    println!("  Created: {}", task["timestamp"].as_str().unwrap_or("?"));

    if let Some(result) = task["result"].as_str() {
        println!("  Result: {}", result);
    }
    if let Some(error) = task["error"].as_str() {
        println!("  Error: {}", error);
    }
}

/// Redraw the stats screen until Ctrl-C. Enter retries after a failure.
async fn watch_stats(client: ApiClient, interval: Duration) {
    let (retry_tx, retry_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if retry_tx.send(()).is_err() {
                break;
            }
        }
    });

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let source = client.base_url().to_string();
    let poller = StatsPoller::new(client, interval);
    poller
        .run(retry_rx, shutdown, |state| {
            print!("{}", CLEAR_SCREEN);
            println!("PSSI stats from {} (every {} ms)\n", source, interval.as_millis());
            println!("{}", state.render());
        })
        .await;
}
