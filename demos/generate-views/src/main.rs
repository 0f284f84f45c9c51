use anyhow::{bail, Context, Result};
use genview_rs::core::{
    run_view_batch, ImageSource, InferenceGateway, PricingTable, RetryPolicy, SamplingParams,
    ViewBatchRequest,
};
use genview_rs::providers::google::{build_google_image_model, GoogleImageSettings};
use std::path::PathBuf;

// Run with:
//   GEMINI_API_KEY=... cargo run -p generate-views -- "<prompt>" person.png garment.png
// Optional:
//   GENVIEW_MODEL=gemini-2.5-flash-image   (default)
//   GENVIEW_VIEWS=front,back               (default)
//   GENVIEW_PER_VIEW=1                     (images per view)
//   GENVIEW_OUT=out                        (output directory)

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(prompt) = args.next() else {
        bail!("usage: generate-views <prompt> [image paths...]");
    };
    let sources: Vec<ImageSource> = args.map(ImageSource::from_path).collect();

    let labels = std::env::var("GENVIEW_VIEWS").unwrap_or_else(|_| "front,back".to_string());
    let labels: Vec<&str> = labels.split(',').map(str::trim).collect();
    let per_view: usize = std::env::var("GENVIEW_PER_VIEW")
        .ok()
        .map(|v| v.parse())
        .transpose()
        .context("GENVIEW_PER_VIEW must be a number")?
        .unwrap_or(1);
    let out_dir = PathBuf::from(std::env::var("GENVIEW_OUT").unwrap_or_else(|_| "out".into()));

    let settings = GoogleImageSettings::from_env();
    let model = build_google_image_model(&settings)?;
    let gateway = InferenceGateway::from_pricing(
        model,
        &PricingTable::default(),
        "virtual_tryon",
        RetryPolicy::default(),
    )?;

    let request =
        ViewBatchRequest::uniform(prompt, sources, SamplingParams::default(), per_view, &labels);
    let result = run_view_batch(&gateway, &request, labels.len() * per_view).await?;

    tokio::fs::create_dir_all(&out_dir).await?;
    for view in result.views() {
        for (i, image) in view.images.iter().enumerate() {
            let path = out_dir.join(format!("{}-{}.png", view.label, i));
            tokio::fs::write(&path, image).await?;
            eprintln!("wrote {}", path.display());
        }
    }

    let stats = result.stats();
    eprintln!(
        "{} of {} images generated ({} failed)",
        stats.succeeded, stats.requested, stats.failed
    );
    println!("{}", serde_json::to_string_pretty(result.total_usage())?);
    Ok(())
}
