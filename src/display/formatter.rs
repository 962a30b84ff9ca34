//! Markdown terminal formatting using termimad

use log::warn;
use termimad::MadSkin;

use super::terminal::{should_use_colors, ColorChoice};

/// Print release notes to the terminal, styled when colors are enabled
pub fn print_markdown(markdown: &str, color: ColorChoice) {
    if should_use_colors(color) {
        if let Err(e) = print_rich(markdown) {
            warn!("Terminal rendering failed ({}), using plain output", e);
            print_plain(markdown);
        }
    } else {
        print_plain(markdown);
    }
}

/// Print with termimad styling
fn print_rich(markdown: &str) -> Result<(), termimad::Error> {
    let mut skin = MadSkin::default();
    customize_skin(&mut skin);
    skin.print_text(markdown);
    Ok(())
}

/// Section headings stand out, categories less so; emphasised title prefixes are bold
fn customize_skin(skin: &mut MadSkin) {
    use termimad::crossterm::style::{Attribute, Color::*};

    // ## Section
    skin.headers[1].set_fg(Cyan);
    skin.headers[1].add_attr(Attribute::Bold);
    skin.headers[1].add_attr(Attribute::Underlined);

    // ### Category
    skin.headers[2].set_fg(Blue);
    skin.headers[2].add_attr(Attribute::Bold);

    // **[scope]** title prefixes
    skin.bold.set_fg(Yellow);
    skin.bold.add_attr(Attribute::Bold);

    skin.bullet.set_fg(Cyan);
}

/// Print plain markdown without formatting
fn print_plain(markdown: &str) {
    println!("{}", markdown);
}
