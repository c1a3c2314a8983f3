//! Tool availability check.

use console::style;

use crate::config::Settings;
use crate::ocr::TextExtractor;
use crate::speech::{AudioPlayer, CommandPlayer, EspeakSynthesizer, SpeechSynthesizer};

/// Report which external tools are installed.
pub fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("OCR Tools").bold());
    println!("{}", "-".repeat(50));

    let extractor = TextExtractor::from_settings(&settings.ocr);
    let mut ocr_ready = true;

    let ocr_tools = [
        (
            extractor.engine().name(),
            extractor.engine().is_available(),
            extractor.engine().availability_hint(),
        ),
        (
            extractor.rasterizer().name(),
            extractor.rasterizer().is_available(),
            extractor.rasterizer().availability_hint(),
        ),
    ];
    for (tool, available, hint) in ocr_tools {
        print_status(tool, available);
        if !available {
            ocr_ready = false;
            println!("                  {}", style(hint).dim());
        }
    }

    println!("\n{}", style("Languages").bold());
    println!("{}", "-".repeat(50));
    for code in settings.languages.client_codes() {
        println!(
            "  {:<15} {}",
            code,
            settings.languages.resolve(Some(code))
        );
    }
    println!(
        "  {:<15} {}",
        style("(default)").dim(),
        settings.languages.default_code()
    );

    println!("\n{}", style("Speech Tools").bold());
    println!("{}", "-".repeat(50));
    if settings.speech.enabled {
        let synthesizer = EspeakSynthesizer::new(&settings.speech.espeak_cmd);
        let player = CommandPlayer::new(
            &settings.speech.player_cmd,
            settings.speech.player_args.clone(),
        );
        print_status(synthesizer.name(), synthesizer.is_available());
        print_status(
            &settings.speech.player_cmd.display().to_string(),
            player.is_available(),
        );
    } else {
        println!("  {}", style("disabled").dim());
    }
    println!();

    if !ocr_ready {
        anyhow::bail!("required OCR tools are missing");
    }
    Ok(())
}

fn print_status(tool: &str, available: bool) {
    let status = if available {
        style("✓ found").green()
    } else {
        style("✗ not found").red()
    };
    println!("  {:<15} {}", tool, status);
}
