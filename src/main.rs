mod cli;
use log::error;

#[tokio::main]
async fn main() {
    // A missing .env file is fine, settings may come from the real environment
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = cli::run().await {
        error!("{e}");
        std::process::exit(1);
    }
}
