use crate::EXIT_INTERRUPTED;
use crate::output;
use anyhow::Context;
use cloudmirror_pipeline::{Mirror, MirrorReport};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn handle(mirror: &Mirror, report_path: Option<&Path>) -> anyhow::Result<i32> {
    output::info(&format!(
        "Processing image list: {}",
        mirror.config().image_list_file.display()
    ));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        output::warning("Interrupted, waiting for running copies to finish (Ctrl-C again to abort)...");
        on_interrupt.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            output::error("Aborted");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let outcome = mirror.run(cancel).await;
    signal.abort();
    let report = outcome?;

    output::summary(&report.result);

    if let Some(path) = report_path {
        write_report(path, &report)?;
        output::info(&format!("Report written to {}", path.display()));
    }

    if report.cancelled {
        output::info("Cleaning up...");
        return Ok(EXIT_INTERRUPTED);
    }

    if report.result.failed_images > 0 {
        output::error(&format!(
            "Mirroring completed with {} failures",
            report.result.failed_images
        ));
        return Ok(1);
    }

    output::success("Multi-cloud mirroring complete!");
    Ok(0)
}

fn write_report(path: &Path, report: &MirrorReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
