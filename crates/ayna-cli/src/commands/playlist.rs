use std::path::{Path, PathBuf};

use anyhow::Result;
use ayna_core::catalog::{
    channels_from_categories, load_categories_file, load_channel_file, merge_unique, save_raw,
};
use ayna_core::models::CategoriesResponse;
use ayna_core::{CategoryPage, GenerationReport, PlaylistGenerator};
use tracing::{info, warn};

use super::{load_config, token_cache};

fn print_report(report: &GenerationReport) {
    println!(
        "{} channels: {} resolved, {} without stream, {} failed, {} dead",
        report.total, report.resolved, report.missing, report.failed, report.dead
    );
}

pub async fn categories(
    config_path: Option<&Path>,
    output: &Path,
    page: u32,
    per_page: u32,
) -> Result<()> {
    let config = load_config(config_path)?;
    let (mut tokens, api) = token_cache(&config, None)?;

    let bearer = tokens.bearer_header().await?;
    let page = CategoryPage {
        page,
        per_page,
        ..CategoryPage::default()
    };
    let raw = api.fetch_categories(&bearer, page).await?;
    save_raw(output, &raw)?;

    match serde_json::from_value::<CategoriesResponse>(raw) {
        Ok(parsed) => println!(
            "Saved {} ({} channels)",
            output.display(),
            channels_from_categories(&parsed).len()
        ),
        Err(e) => {
            warn!(error = %e, "Saved response does not look like a category listing");
            println!("Saved {}", output.display());
        }
    }
    Ok(())
}

pub async fn playlist(
    config_path: Option<&Path>,
    input: &Path,
    output: &Path,
    group: &str,
) -> Result<()> {
    let config = load_config(config_path)?;
    let channels = channels_from_categories(&load_categories_file(input)?);
    info!(channels = channels.len(), "Channels found");

    let (mut tokens, api) = token_cache(&config, None)?;
    let (playlist, report) = PlaylistGenerator::new(&mut tokens, &api)
        .generate(&channels, group)
        .await?;
    playlist.write_to(output)?;

    print_report(&report);
    println!("Wrote {}", output.display());
    Ok(())
}

pub async fn merge(
    config_path: Option<&Path>,
    files: &[PathBuf],
    output: &Path,
    bad_output: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let channels = merge_unique(files.iter().map(|f| load_channel_file(f)));
    info!(channels = channels.len(), "Unique channels after merge");

    let (mut tokens, api) = token_cache(&config, None)?;
    let out = PlaylistGenerator::new(&mut tokens, &api)
        .generate_checked(&channels)
        .await?;
    out.valid.write_to(output)?;
    out.bad.write_to(bad_output)?;

    print_report(&out.report);
    println!("Wrote {} ({} valid links)", output.display(), out.valid.len());
    println!("Wrote {} ({} bad links)", bad_output.display(), out.bad.len());
    Ok(())
}
