//! Compilation options.

/// Knobs for one [`crate::Compiler`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompileOptions {
    /// Stop with [`crate::CompileError::SweepLimit`] after this many sweeps.
    /// `None` runs until the fixed point.
    pub max_sweeps: Option<usize>,
    /// Apply the deviations of registered modules.
    pub apply_deviations: bool,
    /// Mark a module implemented when an augment targets it, and schedule
    /// that module's own augments.
    pub promote_augment_targets: bool,
    /// Schedule `must`/`when` checks through the XPath evaluator.
    pub check_xpath: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_sweeps: None,
            apply_deviations: true,
            promote_augment_targets: true,
            check_xpath: true,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_sweeps(mut self, limit: usize) -> Self {
        self.max_sweeps = Some(limit);
        self
    }

    pub fn apply_deviations(mut self, apply: bool) -> Self {
        self.apply_deviations = apply;
        self
    }

    pub fn promote_augment_targets(mut self, promote: bool) -> Self {
        self.promote_augment_targets = promote;
        self
    }

    pub fn check_xpath(mut self, check: bool) -> Self {
        self.check_xpath = check;
        self
    }

    /// Load options from JSON; missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
