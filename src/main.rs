use anyhow::{Context, Result};
use orchid::cli::output::*;
use orchid::cli::{Cli, Command};
use orchid::{Orchestrator, OrchidConfig, TokioLauncher};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Diagnostics go to stderr, run output to stdout
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let mut config = OrchidConfig::new();
    if let Some(path) = &cli.path {
        config = config.with_root(path);
    }

    let orchestrator = Orchestrator::open(config)
        .await
        .context("Failed to open orchid root")?;

    match &cli.command {
        Command::Jobs => list_jobs(&orchestrator),
        Command::Actions => list_actions(&orchestrator),
        Command::Machines => list_machines(&orchestrator),
        Command::Scripts => list_scripts(&orchestrator),
        Command::Logs(cmd) => list_logs(&orchestrator, cmd.json).await?,
        Command::Run(cmd) => run_job(&orchestrator, &cmd.job).await?,
        Command::Exec(cmd) => orchestrator
            .execute_action(&cmd.action)
            .await
            .with_context(|| format!("Action {} failed", cmd.action))?,
        Command::Log(cmd) => follow_log(&orchestrator, &cmd.id).await?,
        Command::Ssh(cmd) => orchestrator
            .ssh(&cmd.machine)
            .await
            .with_context(|| format!("Session on {} failed", cmd.machine))?,
        Command::Scp(cmd) => orchestrator
            .scp(&cmd.from, &cmd.to)
            .await
            .context("Copy failed")?,
        Command::Mount(cmd) => orchestrator
            .mount(&cmd.machine, &cmd.remote, &cmd.local)
            .await
            .with_context(|| format!("Mounting {}:{} failed", cmd.machine, cmd.remote))?,
        Command::Unmount(cmd) => orchestrator
            .unmount(&cmd.local)
            .await
            .with_context(|| format!("Unmounting {} failed", cmd.local))?,
    }

    Ok(())
}

async fn run_job(orchestrator: &Orchestrator<TokioLauncher>, job_id: &str) -> Result<()> {
    let handle = orchestrator
        .start_run(job_id)
        .await
        .with_context(|| format!("Failed to start job {}", job_id))?;

    let log_id = handle.log_id.clone();
    println!("{} {} {}", ROCKET, style(job_id).bold(), style(&log_id).dim());

    // A run's own failure lives in its log and status, not in our exit code.
    // Only a run that dies without closing its log is reported here.
    let outcome = match orchestrator.watch(handle, |line| println!("{}", line)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Run {} could not be followed to its end: {}", log_id, e);
            println!("{}", format_outcome(&log_id, orchid::Outcome::Error));
            return Ok(());
        }
    };

    println!("{}", format_outcome(&log_id, outcome));
    Ok(())
}

async fn follow_log(orchestrator: &Orchestrator<TokioLauncher>, id: &str) -> Result<()> {
    let outcome = orchestrator
        .follow(id, |line| println!("{}", line))
        .await
        .with_context(|| format!("Failed to follow log {}", id))?;
    println!("{}", format_outcome(id, outcome));
    Ok(())
}

async fn list_logs(orchestrator: &Orchestrator<TokioLauncher>, json: bool) -> Result<()> {
    let records = orchestrator.logs().await.context("Failed to list logs")?;

    if json {
        let data = serde_json::json!({ "logs": records });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{} No runs recorded", INFO);
        return Ok(());
    }

    for record in &records {
        println!("{}", format_log_record(record));
    }
    Ok(())
}

fn list_jobs(orchestrator: &Orchestrator<TokioLauncher>) {
    println!("{} Jobs:", INFO);
    for job in orchestrator.jobs() {
        println!("{}", format_job(job));
    }
}

fn list_actions(orchestrator: &Orchestrator<TokioLauncher>) {
    println!("{} Actions:", INFO);
    for action in orchestrator.actions() {
        println!("{}", format_action(action));
    }
}

fn list_machines(orchestrator: &Orchestrator<TokioLauncher>) {
    println!("{} Machines:", INFO);
    for machine in orchestrator.machines() {
        println!("{}", format_machine(machine));
    }
}

fn list_scripts(orchestrator: &Orchestrator<TokioLauncher>) {
    println!("{} Scripts:", INFO);
    for script in orchestrator.scripts() {
        println!("  {}", style(script).bold());
    }
}
