use pamstack::{Directive, DirectiveList, Phase, ResolveResultVerbose};
use std::path::Path;

/// Roles in the report, each mapped to one SGR sequence.
#[derive(Clone, Copy)]
enum Style {
    Heading,
    Rule,
    Muted,
    Action,
    Module,
    Number,
    Good,
    Warn,
}

impl Style {
    fn sgr(self) -> &'static str {
        match self {
            Style::Heading => "1;36",
            Style::Rule => "90",
            Style::Muted => "2",
            Style::Action => "34",
            Style::Module => "1",
            Style::Number => "36",
            Style::Good => "32",
            Style::Warn => "33",
        }
    }
}

/// Applies [`Style`]s when color is on, passes text through otherwise.
struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Palette { enabled }
    }

    fn paint(&self, text: impl AsRef<str>, style: Style) -> String {
        let text = text.as_ref();
        if self.enabled { format!("\x1b[{}m{}\x1b[0m", style.sgr(), text) } else { text.to_string() }
    }
}

pub fn print_stack(root: &Path, res: &ResolveResultVerbose, color: bool) {
    let palette = Palette::new(color);
    println!("\n{}", palette.paint(format!("⚙  Resolving: {}", root.display()), Style::Heading));

    for metrics in &res.metrics.phases {
        println!(
            "\n{} {}",
            palette.paint(format!("━━━ {} ━━━", metrics.phase), Style::Rule),
            palette.paint(format!("{} directives", metrics.directives), Style::Muted)
        );
        print_phase(&res.stack, metrics.phase, &palette);
    }

    // Timing
    println!("\n{}", palette.paint("━━━ Timing ━━━", Style::Rule));
    println!(
        "  Total: {}  │  Reads: {} ({} bytes)  │  Delegations: {}",
        palette.paint(format!("{:?}", res.metrics.total), Style::Good),
        palette.paint(res.metrics.files_read.to_string(), Style::Number),
        palette.paint(res.metrics.bytes_read.to_string(), Style::Muted),
        palette.paint(res.metrics.delegations_expanded.to_string(), Style::Number),
    );
    println!();
}

fn print_phase(stack: &DirectiveList, phase: Phase, palette: &Palette) {
    let mut any = false;
    for (idx, directive) in stack.phase(phase).enumerate() {
        any = true;
        println!("  {} {}", palette.paint(format!("[{}]", idx), Style::Rule), fmt_directive(directive, palette));
    }

    if !any {
        println!("{}", palette.paint("  No directives", Style::Muted));
    }
}

/// Print the result of a `--find` lookup. Returns whether a match was found.
pub fn print_lookup(stack: &DirectiveList, phase: Phase, module: &str, color: bool) -> bool {
    let palette = Palette::new(color);
    println!("{}", palette.paint("━━━ Lookup ━━━", Style::Rule));

    match stack.find(phase, module) {
        Some(directive) => {
            println!("  {} {}", palette.paint("found:", Style::Good), fmt_directive(directive, &palette));
            println!(
                "      {} {}",
                palette.paint("parameters:", Style::Muted),
                if directive.parameters().is_empty() {
                    palette.paint("(none)", Style::Muted)
                } else {
                    palette.paint(directive.parameters(), Style::Warn)
                }
            );
            true
        }
        None => {
            println!("  {} {} {}", palette.paint("not found:", Style::Warn), phase, module);
            false
        }
    }
}

fn fmt_directive(directive: &Directive, palette: &Palette) -> String {
    format!(
        "{}{} {} {}",
        if directive.silent() { palette.paint("-", Style::Muted) } else { String::new() },
        palette.paint(directive.action().as_str(), Style::Action),
        palette.paint(directive.module_name(), Style::Module),
        palette.paint(directive.parameters(), Style::Muted)
    )
}
