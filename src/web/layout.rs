//! Server-rendered page shell.

use crate::app_config::AppConfig;
use crate::battle::{ControlBarView, BATTLE_TITLE};

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Keep a value from closing the surrounding `<style>` element.
fn css_value(value: &str) -> String {
    value.replace('<', "\\3c ")
}

fn primary_block(selector: &str, color: &str) -> String {
    let color = css_value(color);
    format!(
        "{selector} {{ --primary: {color}; --primary-hover: color-mix(in srgb, {color} 80%, #000); }}"
    )
}

/// Theme overrides for the accent colors.
///
/// A block is emitted when its color differs from the default, or always in
/// development builds. Returns an empty string when there is nothing to emit.
pub fn theme_styles(config: &AppConfig, dev_mode: bool) -> String {
    let defaults = AppConfig::defaults();
    let mut blocks = Vec::new();

    if dev_mode || config.accent() != defaults.accent() {
        blocks.push(primary_block(":root", config.accent()));
    }
    if dev_mode || config.accent_dark() != defaults.accent_dark() {
        blocks.push(primary_block(".dark", config.accent_dark()));
    }

    blocks.join("\n")
}

/// Render the full HTML document around `body`.
pub fn render_document(config: &AppConfig, dev_mode: bool, body: &str) -> String {
    let styles = theme_styles(config, dev_mode);
    let style_tag = if styles.is_empty() {
        String::new()
    } else {
        format!("<style>{styles}</style>\n")
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\" class=\"dark scroll-smooth\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         {style_tag}\
         <title>{title}</title>\n\
         <meta name=\"description\" content=\"{description}\">\n\
         </head>\n\
         <body class=\"overflow-x-hidden antialiased\">\n\
         {body}\n\
         </body>\n\
         </html>\n",
        title = escape_html(config.page_title()),
        description = escape_html(config.page_description()),
    )
}

/// Markup for the battle control bar in the given state.
pub fn render_control_bar(view: &ControlBarView, max_words: usize) -> String {
    let mut html = String::from(
        "<div aria-label=\"Battle mode controls\" class=\"battle-control-bar\">\n",
    );

    if view.show_instructions {
        html.push_str(&format!(
            "<label for=\"instructions\">Compliment Instructions (max {max_words} words)</label>\n\
             <input id=\"instructions\" type=\"text\" value=\"{value}\" \
             placeholder=\"Enter your compliment style or theme...\">\n\
             <p class=\"word-count\">{label}</p>\n",
            value = escape_html(&view.instructions),
            label = escape_html(&view.word_count_label),
        ));
    }

    if view.show_battle_buttons {
        html.push_str(&button("attack", "COMPLIMENT", view.attack_enabled));
        html.push_str(&button("protect", "RESPOND", view.protect_enabled));
    }
    html.push_str(&button("shutdown", "SHUTDOWN", view.shutdown_enabled));

    html.push_str("</div>");
    html
}

fn button(action: &str, label: &str, enabled: bool) -> String {
    let disabled = if enabled { "" } else { " disabled" };
    format!("<button data-action=\"{action}\"{disabled}>{label}</button>\n")
}

/// Body of the battle page before any session exists.
pub fn render_battle_page(config: &AppConfig, max_words: usize) -> String {
    let start_label = config
        .get_str(crate::app_config::keys::START_BUTTON_TEXT)
        .unwrap_or("Start call");
    let control_bar = render_control_bar(&ControlBarView::initial(max_words), max_words);

    format!(
        "<main id=\"app\">\n\
         <button data-action=\"start\">{start}</button>\n\
         <section id=\"battle-session\" inert>\n\
         <h1>{BATTLE_TITLE}</h1>\n\
         <div id=\"media-tiles\"></div>\n\
         {control_bar}\n\
         </section>\n\
         </main>",
        start = escape_html(start_label),
    )
}
