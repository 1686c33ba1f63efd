pub mod app;
pub mod cli;
pub mod commands;

pub use app::Gitdocs;

/// Default log filter for the given `-v` count and `-q` flag. `RUST_LOG`
/// takes precedence over this when set.
pub fn default_log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(default_log_filter(3, true), "error");
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_log_filter(0, false), "warn");
        assert_eq!(default_log_filter(1, false), "info");
        assert_eq!(default_log_filter(2, false), "debug");
        assert_eq!(default_log_filter(7, false), "trace");
    }
}
