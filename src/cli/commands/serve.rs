//! Web server command.

use console::style;

use crate::config::{Settings, DEFAULT_PORT};

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind);

    println!(
        "{} Starting readaloud server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  POST /extract-text (multipart: file, language)");
    if !settings.speech.enabled {
        println!("  {}", style("Speech read-back disabled").dim());
    }
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Split `serve`'s bind argument into host and port.
///
/// A bare number is a port on loopback and a bare host listens on
/// [`DEFAULT_PORT`]. IPv6 hosts keep their brackets; `serve` strips them.
fn parse_bind_address(bind: &str) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return ("127.0.0.1".to_string(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), DEFAULT_PORT)
}
