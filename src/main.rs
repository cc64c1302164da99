use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use gopass_launcher::activate::clipboard::GopassClipboard;
use gopass_launcher::config::{Args, Settings};
use gopass_launcher::engine::Session;
use gopass_launcher::logging;
use gopass_launcher::search::gopass::GopassSearch;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::resolve(args, |key| std::env::var_os(key))?;
    logging::init(&settings.log)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(settings));
    // The stdin reader may still be parked in a blocking read that nothing
    // will ever complete; don't wait for it.
    runtime.shutdown_background();

    if let Err(e) = &result {
        error!("session ended with error: {e:#}");
    }
    result
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    info!(
        user = %std::env::var("USER").unwrap_or_default(),
        home = %std::env::var("HOME").unwrap_or_default(),
        gopass = %settings.search.gopass.display(),
        "gopass plugin started"
    );

    let provider = GopassSearch::load(settings.search).await;
    let handler = GopassClipboard::new(settings.clipboard);

    Session::new(Arc::new(provider), Arc::new(handler))
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await
}
