//! Console output

use cloudmirror_core::MirrorResult;
use colored::Colorize;

pub fn banner() {
    println!("{}", "Multi-Cloud Container Mirror".blue().bold());
    println!("{}", "============================".blue());
}

pub fn info(message: &str) {
    println!("{} {}", "[INFO]".blue(), message);
}

pub fn success(message: &str) {
    println!("{} {}", "[SUCCESS]".green(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "[WARNING]".yellow(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red(), message);
}

pub fn summary(result: &MirrorResult) {
    println!();
    println!("{}", "Mirroring Summary".blue().bold());
    println!("{}", "=================".blue());
    println!(
        "  {} {}",
        "Successful:".green(),
        result.successful_images
    );
    if result.failed_images > 0 {
        println!("  {} {}", "Failed:".red(), result.failed_images);
    } else {
        println!("  {} {}", "Failed:".green(), result.failed_images);
    }
    println!("  Total: {}", result.total_images);

    for failed in &result.failed_image_details {
        println!(
            "    {} line {}: {} ({})",
            "✗".red(),
            failed.line_number,
            failed.source.cyan(),
            failed.reason
        );
    }
}
