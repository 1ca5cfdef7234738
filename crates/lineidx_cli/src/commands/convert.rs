//! Convert command implementation.

use lineidx_coco::{CocoIndex, ConvertConfig, ConvertSummary, Converter, FsImageSource};
use std::path::Path;

/// Runs the convert command.
pub fn run(
    annotations: &Path,
    config: ConvertConfig,
) -> Result<ConvertSummary, Box<dyn std::error::Error>> {
    let converter = Converter::new(config)?;
    let index = CocoIndex::from_path(annotations)?;
    let images = FsImageSource::new(&converter.config().image_root);

    println!(
        "Converting {} images from {:?}",
        index.image_count(),
        annotations
    );
    let summary = converter.run(&index, &images)?;

    let outputs = converter.outputs();
    println!();
    println!("Images seen:   {}", summary.images_seen);
    println!("Rows written:  {}", summary.rows_written);
    println!("Skipped:       {}", summary.skipped);
    println!("Selected:      {}", summary.selected);
    println!();
    println!("Tables:");
    for paths in [
        &outputs.payload,
        &outputs.labels,
        &outputs.sizes,
        &outputs.linelist,
    ] {
        println!("  {}", paths.data().display());
    }
    Ok(summary)
}
