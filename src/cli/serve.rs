//! tracker serve command implementation

use crate::error::Result;
use crate::http;
use crate::output::HumanOutput;
use crate::service::Tracker;

use super::Context;

pub(crate) fn run(ctx: &Context, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(file) = &ctx.file {
        config.storage.path = Some(file.clone());
    }

    let tracker = Tracker::from_config(&config)?;

    let mut human = HumanOutput::new(format!("tracker serving on {}", config.server.bind_addr()));
    match &config.storage.path {
        Some(path) => human.push_summary("data file", path.display().to_string()),
        None => human.push_warning("no storage.path configured; changes stay in memory"),
    }
    ctx.emit(
        "serve",
        &serde_json::json!({
            "addr": config.server.bind_addr(),
            "file": config.storage.path,
        }),
        &human,
    )?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(http::serve(&config.server, tracker))
}
