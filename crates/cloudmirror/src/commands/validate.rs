use crate::output;
use cloudmirror_pipeline::Mirror;

pub async fn handle(mirror: &Mirror) -> anyhow::Result<i32> {
    let result = mirror.validate_setup().await;

    if result.success {
        output::success("Validation passed!");
        Ok(0)
    } else {
        output::error(&format!(
            "Validation failed: {}",
            result.message_or_default()
        ));
        Ok(1)
    }
}
