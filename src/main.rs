#[tokio::main]
async fn main() {
    if let Err(e) = healbuddy_lib::run().await {
        eprintln!("healbuddy: {e}");
        std::process::exit(1);
    }
}
