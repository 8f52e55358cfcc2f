mod action;
mod app;
mod config;
mod error;
mod filter;
mod models;
mod router;
mod state;
mod store;
mod tui;

use app::App;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging()?;

    let mut app = App::new().await?;
    app.run().await?;
    Ok(())
}

/// The terminal belongs to the TUI, so diagnostics go to a log file instead
/// of stderr. Opt in with RUST_LOG.
fn init_logging() -> std::io::Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        let file = std::fs::File::create("paydash.log")?;
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }
    Ok(())
}
