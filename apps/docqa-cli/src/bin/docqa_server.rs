use anyhow::Result;

use docqa_cli::app::{build_pipeline, init_tracing};
use docqa_cli::server::serve;
use docqa_core::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(0);
    let config = Config::load()?;
    let settings = config.settings()?;
    let pipeline = build_pipeline(&settings).await?;
    serve(pipeline, &settings.server.bind).await
}
