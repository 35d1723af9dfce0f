use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    aw_cli::run().await
}
