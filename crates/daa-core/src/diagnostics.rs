//! Diagnostics context threaded through the engine.

use tracing::Span;

/// Component label and verbosity, built once per process and handed to the
/// engine. Verbose mode adds per-intruder and per-level trace events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    label: String,
    verbose: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::quiet("daa")
    }
}

impl Diagnostics {
    pub fn new(label: impl Into<String>, verbose: bool) -> Self {
        Self {
            label: label.into(),
            verbose,
        }
    }

    pub fn quiet(label: impl Into<String>) -> Self {
        Self::new(label, false)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Span covering one monitoring cycle.
    pub fn cycle_span(&self, cycle: u64) -> Span {
        tracing::debug_span!("daa_cycle", component = %self.label, cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet() {
        let diag = Diagnostics::default();
        assert_eq!(diag.label(), "daa");
        assert!(!diag.is_verbose());
        assert!(Diagnostics::new("ownship", true).is_verbose());
    }
}
