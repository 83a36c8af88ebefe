//! forge: terminal front end for a running RoboForge gateway.
//!
//!   forge "hexapod lunar rover"        one-shot; exit code 1 on failure
//!   forge                              interactive; one prompt per line
//!   forge --gateway http://host:3000   override ROBOFORGE_GATEWAY_URL

use std::sync::Arc;

use roboforge_core::{
    ClientConfig, GenerationOrchestrator, GenerationResult, HttpGenerationClient, PhaseObserver,
    SubmissionPhase, TelemetryWindow, ViewState, Workbench,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env();
    let mut words: Vec<String> = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--gateway" => {
                if let Some(url) = args.next() {
                    config.gateway_url = url;
                }
            }
            "--help" | "-h" => {
                eprintln!("forge: RoboForge robot design generator");
                eprintln!("  forge \"PROMPT\"        Generate one design and exit");
                eprintln!("  forge                 Read prompts from stdin, one per line");
                eprintln!("  --gateway URL         Gateway base URL (default {})", config.gateway_url);
                return;
            }
            _ => words.push(a),
        }
    }

    let client = Arc::new(HttpGenerationClient::from_config(&config));
    let observer: PhaseObserver = Arc::new(|phase: SubmissionPhase| match phase {
        SubmissionPhase::DesigningInFlight => eprintln!("[forge] generating design..."),
        SubmissionPhase::ImagingInFlight => eprintln!("[forge] rendering concept image..."),
        SubmissionPhase::ImageFailed => eprintln!("[forge] image unavailable, continuing"),
        _ => {}
    });
    let orchestrator = Arc::new(
        GenerationOrchestrator::new(client.clone(), client).with_observer(observer),
    );
    let state = ViewState::new(TelemetryWindow::seeded(
        config.telemetry_window,
        &mut rand::thread_rng(),
    ));
    let bench = Workbench::new(orchestrator, state);
    let _ticker = bench.start_telemetry(config.telemetry_interval());

    if !words.is_empty() {
        bench.set_prompt(words.join(" ")).await;
        if !run_once(&bench).await {
            std::process::exit(1);
        }
        return;
    }

    eprintln!("RoboForge, gateway {}. Describe a robot (Ctrl-D to quit).", config.gateway_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("[forge] failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        bench.set_prompt(line).await;
        run_once(&bench).await;
    }
}

async fn run_once(bench: &Workbench) -> bool {
    let outcome = bench.submit().await;
    let state = bench.state();
    let state = state.read().await;
    match outcome {
        Ok(()) => {
            if let Some(result) = state.result() {
                render(result);
            }
            let t = state.telemetry().latest();
            println!(
                "Telemetry  torque {:.1} Nm | temp {:.1} C | battery {:.1}%",
                t.torque, t.temp, t.battery
            );
            true
        }
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            false
        }
    }
}

fn render(result: &GenerationResult) {
    let design = &result.design;
    println!();
    println!("== {} ==", design.name);
    println!("Purpose: {}", design.purpose);
    println!();
    println!("{}", design.specifications);
    if !design.components.is_empty() {
        println!();
        println!("Components:");
        for c in &design.components {
            println!("  - {} [{}]: {}", c.name, c.kind, c.description);
        }
    }
    println!();
    println!("Control logic:");
    println!("{}", design.control_logic);
    println!();
    match &result.image_url {
        Some(url) => println!("Concept image: {}", preview_uri(url)),
        None => println!("Concept image: unavailable"),
    }
}

/// Data URIs run to megabytes; show the header and size only.
fn preview_uri(url: &str) -> String {
    match url.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => {
            format!("{} ({} bytes base64)", header, data.len())
        }
        _ => url.to_string(),
    }
}
