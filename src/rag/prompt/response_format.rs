//! Display formatting for raw model output.

use regex::{Captures, Regex};

/// Markup wrapped around a reasoning block.
const DETAILS_OPEN: &str = "<details><summary>Thinking Process (Click to expand)</summary>\n\n";
const DETAILS_CLOSE: &str = "\n\n</details>";

/// Reasoning region, across newlines, shortest match.
const THINK_BLOCK: &str = r"(?s)<think>(.*?)</think>";

/// Rewrites `<think>` regions of a completion into collapsible blocks.
///
/// Emphasis markup and everything outside reasoning regions pass through unchanged.
#[derive(Clone, Debug)]
pub struct ResponseFormatter {
    think_block: Regex,
}

impl ResponseFormatter {
    /// Compile the reasoning-block pattern.
    ///
    /// # Errors
    /// Returns an error if the pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            think_block: Regex::new(THINK_BLOCK)?,
        })
    }

    /// Format a raw completion for display.
    #[must_use]
    pub fn format(&self, raw: &str) -> String {
        self.think_block
            .replace_all(raw, |caps: &Captures<'_>| {
                format!("{DETAILS_OPEN}{}{DETAILS_CLOSE}", &caps[1])
            })
            .into_owned()
    }
}
