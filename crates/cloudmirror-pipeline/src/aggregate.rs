//! Fold task outcomes into a [`MirrorResult`]

use crate::scheduler::TaskReport;
use cloudmirror_core::{FailedImage, MirrorResult};

/// Single post-join reduction over every task report
///
/// Anything other than success counts as a failure, so
/// `successful_images + failed_images == total_images` always holds.
pub fn aggregate(reports: &[TaskReport]) -> MirrorResult {
    let mut failed_image_details: Vec<FailedImage> = reports
        .iter()
        .filter_map(|report| {
            report.outcome.reason().map(|reason| FailedImage {
                source: report.task.source.clone(),
                line_number: report.task.line_number,
                reason,
            })
        })
        .collect();
    failed_image_details.sort_by_key(|f| f.line_number);

    let failed_images = failed_image_details.len();
    MirrorResult {
        total_images: reports.len(),
        successful_images: reports.len() - failed_images,
        failed_images,
        failed_image_details,
    }
}
