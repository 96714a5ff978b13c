//! Smoke-test a canvas target: launch, wait for readiness, click through a
//! few layout entries and fail on unexpected diagnostics.
//!
//! Exit codes: 0 success, 1 harness failure, 2 usage error.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use canvasrig_harness::{HarnessConfig, HarnessError, Session, layout};
use canvasrig_web::{LaunchConfig, WebRig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
struct Args {
    url: String,
    headed: bool,
    clicks: Vec<String>,
    settle: Option<Duration>,
}

fn print_usage() {
    eprintln!(
        "Usage: canvasrig-smoke --url <URL> [--headed] [--click <group.entry>]... \
         [--settle-ms <n>]\n\
         \n\
         Example:\n\
           canvasrig-smoke --url http://localhost:8000 --click menu.start --click tribe.judah"
    );
}

enum Parsed {
    Run(Args),
    Help,
}

fn parse_args<I>(args: I) -> Result<Parsed, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut url: Option<String> = None;
    let mut headed = false;
    let mut clicks = Vec::new();
    let mut settle = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--url requires a value".to_string())?;
                url = Some(value);
            }
            "--headed" => headed = true,
            "--click" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--click requires a value".to_string())?;
                layout::lookup(&value).map_err(|err| format!("invalid --click: {err}"))?;
                clicks.push(value);
            }
            "--settle-ms" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--settle-ms requires a value".to_string())?;
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| "invalid --settle-ms value".to_string())?;
                settle = Some(Duration::from_millis(ms));
            }
            "-h" | "--help" => return Ok(Parsed::Help),
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    let url = url.ok_or_else(|| "missing --url".to_string())?;
    Ok(Parsed::Run(Args {
        url,
        headed,
        clicks,
        settle,
    }))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = matches!(
        env::var("CANVASRIG_LOG_JSON").as_deref(),
        Ok("1") | Ok("true")
    );
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn drive(rig: &WebRig, args: &Args) -> Result<(), HarnessError> {
    let host = rig.open_blank().await?;
    let mut session = Session::new(host, HarnessConfig::from_env());
    session.start_diagnostics().await?;
    session.host_mut().goto(&args.url).await?;
    session.await_ready().await?;
    session.checkpoint("ready")?;

    for name in &args.clicks {
        session.click_named(name).await?;
        match args.settle {
            Some(pause) => session.settle(pause).await,
            None => session.settle_default().await,
        }
        session.checkpoint(name)?;
    }
    session.assert_healthy("smoke")
}

async fn run(args: Args) -> Result<(), HarnessError> {
    let launch = LaunchConfig::from_env();
    let launch = if args.headed { launch.headed(true) } else { launch };
    let rig = WebRig::launch(launch).await?;
    let outcome = drive(&rig, &args).await;
    if let Err(err) = rig.close().await {
        tracing::warn!(error = %err, "browser did not close cleanly");
    }
    outcome
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(env::args().skip(1)) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("canvasrig-smoke: {msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };
    init_tracing();

    match run(args).await {
        Ok(()) => {
            tracing::info!("smoke run passed");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "smoke run failed");
            eprintln!("canvasrig-smoke error: {err}");
            ExitCode::from(1)
        }
    }
}
