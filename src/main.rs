use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(run());
}

#[cfg(windows)]
fn run() -> i32 {
    use service_account::directory::windows::LocalMachine;

    let mut stdout = std::io::stdout().lock();
    service_account::cli::run(&LocalMachine, std::env::args_os(), &mut stdout)
}

#[cfg(not(windows))]
fn run() -> i32 {
    tracing::error!("service accounts can only be managed on Windows");
    println!("ERROR service accounts can only be managed on Windows.");
    service_account::cli::FAILURE
}
