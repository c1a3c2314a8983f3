//! Local file extraction command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::ocr::TextExtractor;
use crate::speech::SpeechNotifier;

/// Extract text from a file on disk, optionally reading it aloud.
pub async fn cmd_extract(
    settings: &Settings,
    file: &Path,
    language: &str,
    speak: bool,
) -> anyhow::Result<()> {
    let metadata = tokio::fs::metadata(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    if metadata.len() == 0 {
        anyhow::bail!("{} is empty", file.display());
    }

    let engine_language = settings.languages.resolve(Some(language)).to_string();

    eprintln!(
        "{} Extracting {} (language {})",
        style("→").cyan(),
        file.display(),
        engine_language
    );

    let extractor = TextExtractor::from_settings(&settings.ocr);
    let path = file.to_path_buf();
    let ocr_language = engine_language.clone();
    let extraction =
        tokio::task::spawn_blocking(move || extractor.extract_file(&path, &ocr_language))
            .await?
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    if extraction.is_failure() {
        eprintln!("  {} {}", style("✗").red(), extraction);
    }
    let text = extraction.into_text();
    println!("{}", text);

    if speak {
        let (notifier, worker) =
            SpeechNotifier::from_settings(&settings.speech, settings.languages.clone());
        if notifier.notify(&text, &engine_language) {
            eprintln!("{} Reading aloud...", style("→").cyan());
        }
        drop(notifier);
        if let Some(worker) = worker {
            worker.join().await;
        }
    }

    Ok(())
}
