use console::{style, StyledObject};

/// Styling helpers for terminal output. Every helper owns its text so
/// callers can pass anything displayable.
fn styled(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string())
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).bright()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).bright().red()
}

pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).bright().yellow()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    styled(text).magenta().bold()
}
