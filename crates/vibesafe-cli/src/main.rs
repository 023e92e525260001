//! vibesafe CLI binary.
//!
//! This is the minimal entrypoint; all logic lives in the library crate.

#[tokio::main]
async fn main() {
    let code = vibesafe_cli::run().await;
    std::process::exit(code.as_i32());
}
