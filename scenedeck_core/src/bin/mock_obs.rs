use scenedeck_core::mock_obs::{MockObs, MockState};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ADDR: &str = "127.0.0.1:4455";

fn parse_arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let addr = parse_arg_value(&args, "--addr")
        .or_else(|| std::env::var("SCENEDECK_MOCK_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let addr_file = parse_arg_value(&args, "--addr-file").map(PathBuf::from);
    let run_for_ms = parse_arg_value(&args, "--run-for-ms")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis);

    let mut state = MockState::sample();
    if let Some(password) = parse_arg_value(&args, "--password") {
        state = state.with_password(&password);
    }

    let mock = match MockObs::start_on(&addr, state).await {
        Ok(m) => m,
        Err(e) => {
            eprintln!("mock_obs bind failed on {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &addr_file {
        let _ = fs::write(path, mock.addr().to_string());
    }
    println!("mock_obs listening on ws://{}", mock.addr());

    match run_for_ms {
        Some(max) => tokio::time::sleep(max).await,
        None => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
