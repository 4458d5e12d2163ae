#[tokio::main]
async fn main() {
    if let Err(e) = triage_engine::run().await {
        eprintln!("triage-engine: {e}");
        std::process::exit(1);
    }
}
