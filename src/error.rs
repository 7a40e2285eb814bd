//! Error types
//!
//! None of these are fatal to a frame. Resolution errors are caught per pair
//! by the engine, logged, and counted.

/// A capability hook (chain, ricochet, explode) failed
#[derive(thiserror::Error, Debug)]
pub enum EffectError {
    /// The hook ran but could not complete
    #[error("{effect} failed: {reason}")]
    Hook { effect: &'static str, reason: String },

    /// The hook was handed a slot that holds no projectile
    #[error("slot {0} does not hold a projectile")]
    NotAProjectile(usize),
}

/// Resolving one colliding pair failed
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// A grid slot no longer indexes the entity slice
    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Loading or validating an engine configuration failed
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values parsed but are unusable
    #[error("Invalid config: {0}")]
    Invalid(String),
}
