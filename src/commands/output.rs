use inline_colorization::*;

use super::{Outcome, Report};

/// Render a report for a terminal.
///
/// Backend data goes to stdout as pretty JSON so it can be piped; everything
/// meant for a human goes to stderr.
pub fn print_report(report: &Report) {
    match &report.outcome {
        Outcome::Data(body) => match serde_json::to_string_pretty(body) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => eprintln!("{color_red}✗ could not render response: {}{color_reset}", e),
        },
        Outcome::Message(message) => eprintln!("{color_green}✓{color_reset} {}", message),
        Outcome::Redirected(to) => {
            eprintln!("{color_yellow}→ redirected to {style_bold}{}{style_reset}{color_reset}", to)
        }
        Outcome::Loading => eprintln!("{color_yellow}… still resolving the session{color_reset}"),
        Outcome::Failed(message) => {
            eprintln!("{color_red}✗ {style_bold}{}{style_reset}{color_reset}: {}", report.command, message)
        }
    }
    eprintln!("  at {color_cyan}{}{color_reset}", report.location);
}
