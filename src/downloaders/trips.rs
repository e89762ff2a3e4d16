use crate::archive::TripArchiveExtractor;
use crate::config::DownloadTripsContext;
use crate::downloaders::client::DownloadClient;
use crate::error::{ProcessingError, Result};
use crate::utils::dates::month_range;
use crate::utils::logging::log_banner;
use crate::utils::progress::ProgressReporter;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadSummary {
    pub fn record(&mut self, status: DownloadStatus) {
        self.total += 1;
        match status {
            DownloadStatus::Success => self.successful += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Failed => self.failed += 1,
        }
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Download Summary:")?;
        writeln!(f, "  Total files: {}", self.total)?;
        writeln!(f, "  Successful: {}", self.successful)?;
        writeln!(f, "  Skipped (already exist): {}", self.skipped)?;
        write!(f, "  Failed: {}", self.failed)
    }
}

/// A failed month is logged and counted, never fatal.
pub async fn download_trips(ctx: &DownloadTripsContext, silent: bool) -> Result<DownloadSummary> {
    let raw_trips_dir = ctx.raw_trips_dir();
    info!("Starting Bluebikes trip data download");
    info!("Output directory: {}", raw_trips_dir.display());
    fs::create_dir_all(&raw_trips_dir)?;

    let months = month_range(ctx.start_month, ctx.end_month);
    info!(
        "Generated date range: {} months from {} to {}",
        months.len(),
        ctx.start_month.format("%Y%m"),
        ctx.end_month.format("%Y%m")
    );

    let client = DownloadClient::new()?;
    let extractor = TripArchiveExtractor::new();
    let mut summary = DownloadSummary::default();

    for year_month in &months {
        let status = download_month(ctx, &client, &extractor, year_month, silent).await;
        summary.record(status);
    }

    for line in summary.to_string().lines() {
        info!("{}", line);
    }
    info!("✓ Download process completed");

    Ok(summary)
}

async fn download_month(
    ctx: &DownloadTripsContext,
    client: &DownloadClient,
    extractor: &TripArchiveExtractor,
    year_month: &str,
    silent: bool,
) -> DownloadStatus {
    log_banner(&format!("Processing: {}", year_month));

    let expected_csv = ctx.expected_csv_path(year_month);
    if expected_csv.exists() {
        info!(
            "✓ CSV already exists, skipping: {}",
            expected_csv.display()
        );
        return DownloadStatus::Skipped;
    }

    let url = resolve_url(ctx, client, year_month).await;
    let zip_path = ctx
        .raw_trips_dir()
        .join(format!("{}.zip", ctx.file_stem(year_month)));

    if let Err(e) = fetch_to_file(client, &url, &zip_path, silent).await {
        report_download_error(&url, &e);
        let _ = fs::remove_file(&zip_path);
        warn!("Skipping {} due to download failure", year_month);
        return DownloadStatus::Failed;
    }

    match extractor.extract(&zip_path, &ctx.raw_trips_dir()) {
        Ok(_) => DownloadStatus::Success,
        Err(e) => {
            error!("Failed to extract {}: {}", zip_path.display(), e);
            DownloadStatus::Failed
        }
    }
}

/// First candidate URL answering HEAD 200, else the preferred pattern.
async fn resolve_url(ctx: &DownloadTripsContext, client: &DownloadClient, year_month: &str) -> String {
    let [standard, csv_zip] = ctx.candidate_urls(year_month);

    if client.exists(&standard).await {
        info!("Using URL pattern: standard");
        return standard;
    }
    if client.exists(&csv_zip).await {
        info!("Using URL pattern: csv");
        return csv_zip;
    }

    info!("Using URL pattern: standard");
    standard
}

async fn fetch_to_file(
    client: &DownloadClient,
    url: &str,
    destination: &Path,
    silent: bool,
) -> Result<()> {
    info!("Downloading: {}", url);
    let mut response = client.open_stream(url).await?;
    let total_size = response.content_length().unwrap_or(0);

    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let progress = ProgressReporter::new_download(total_size, &file_name, silent);

    let mut file = std::io::BufWriter::new(fs::File::create(destination)?);
    while let Some(chunk) = client.next_chunk(url, &mut response).await? {
        file.write_all(&chunk)?;
        progress.increment(chunk.len() as u64);
    }
    file.flush()?;

    progress.finish_with_message(&format!("✓ Downloaded: {}", file_name));
    info!("✓ Downloaded: {}", file_name);
    Ok(())
}

fn report_download_error(url: &str, err: &ProcessingError) {
    match err {
        ProcessingError::Http(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND) => {
            warn!("File not found (404): {}", url);
        }
        ProcessingError::Http(e) if e.status().is_some() => {
            error!("HTTP error downloading {}: {}", url, e);
        }
        other => error!("Failed to download {}: {}", url, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataLayout, StorageMode};
    use tempfile::TempDir;

    #[test]
    fn test_summary_counts() {
        let mut summary = DownloadSummary::default();
        summary.record(DownloadStatus::Success);
        summary.record(DownloadStatus::Skipped);
        summary.record(DownloadStatus::Failed);
        summary.record(DownloadStatus::Success);

        assert_eq!(
            summary,
            DownloadSummary {
                total: 4,
                successful: 2,
                skipped: 1,
                failed: 1,
            }
        );
        assert!(summary.to_string().contains("Skipped (already exist): 1"));
    }

    #[tokio::test]
    async fn test_existing_months_are_skipped_without_network() {
        let temp = TempDir::new().unwrap();
        let ctx = DownloadTripsContext::new(
            "http://127.0.0.1:9/",
            "bluebikes",
            "202304",
            "202305",
            DataLayout::new(temp.path()),
            StorageMode::Local,
        )
        .unwrap();

        fs::create_dir_all(ctx.raw_trips_dir()).unwrap();
        fs::write(ctx.expected_csv_path("202304"), "started_at\n").unwrap();
        fs::write(ctx.expected_csv_path("202305"), "started_at\n").unwrap();

        let summary = download_trips(&ctx, true).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 0);
    }
}
