use warden::cli::{output, Cli};

#[tokio::main]
async fn main() {
    if let Err(e) = Cli::run().await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}
