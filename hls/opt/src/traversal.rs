//! Traits shared by every synthesis pass.

/// Trait that describes named things. Strategies are selected by name on the
/// command line and listed in the help text through this trait.
pub trait Named {
    /// The name of a strategy. Is used for identifying strategies.
    fn name() -> &'static str;
    /// A short description of the strategy.
    fn description() -> &'static str;
}

/// Help line of a strategy, in the format used by [crate::strategy_help].
pub fn help_line<N: Named>() -> String {
    format!("- {}: {}", N::name(), N::description())
}
