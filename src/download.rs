//! Streams ERDDAP responses to disk.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Error, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

/// Downloads the response body from the specified URL and saves it to the
/// specified file path.
pub async fn download_csv(url: &str, file_path: &Path) -> Result<(), Error> {
    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Request failed with status {}: {}",
            response.status(),
            url
        ));
    }

    let mut file = File::create(file_path)?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| anyhow!("Error reading chunk: {}", e))?;
        file.write_all(&chunk)?;
    }

    Ok(())
}

/// Downloads with a progress bar sized from the content length, when the
/// server reports one.
pub async fn download_csv_with_progress(
    url: &str,
    file_path: PathBuf,
    progress_bar: ProgressBar,
) -> Result<(), Error> {
    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Request failed with status {}: {}",
            response.status(),
            url
        ));
    }

    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 {
        progress_bar.set_length(total_size);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
    }

    let mut file = File::create(file_path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| anyhow!("Error reading chunk: {}", e))?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use indicatif::ProgressBar;

    #[test]
    fn should_track_progress_positions() {
        let pb = ProgressBar::new(0);
        pb.set_length(1000);
        pb.set_position(500);

        assert_eq!(pb.length().unwrap(), 1000);
        assert_eq!(pb.position(), 500);
    }
}
