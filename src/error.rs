//! Simulation-specific error types.
//!
//! Errors are reserved for load-time problems: unknown definitions, malformed
//! tables, an exhausted registry.  Tick-time code never aborts on them; it logs
//! through `warn!` and skips the offending effect.
//!
//! ## Usage
//!
//! ```rust
//! use salvo::error::{SimError, SimResult};
//!
//! fn find_weapon(name: &str) -> SimResult<()> {
//!     Err(SimError::UnknownWeaponDefinition { name: name.to_string() })
//! }
//! assert!(find_weapon("Plasma").is_err());
//! ```

use std::fmt;

/// Top-level error enum for the simulation core.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// An actor was requested by a definition name that was never loaded.
    UnknownActorDefinition {
        /// The requested name.
        name: String,
    },

    /// A weapon was requested by a definition name that was never loaded.
    UnknownWeaponDefinition {
        /// The requested name.
        name: String,
    },

    /// A tile definition was referenced but never loaded.
    UnknownTileDefinition {
        /// The requested name.
        name: String,
    },

    /// A map was requested by a name that was never loaded.
    UnknownMapDefinition {
        /// The requested name.
        name: String,
    },

    /// A map layout row uses a character with no legend entry.
    UnknownTileSymbol {
        /// Name of the map being built.
        map: String,
        /// The unmapped character.
        symbol: char,
    },

    /// A map layout has rows of differing lengths.
    RaggedTileRows {
        /// Name of the map being built.
        map: String,
        /// Zero-based row that did not match the first row.
        row: usize,
    },

    /// Every actor slot is occupied.
    RegistryFull {
        /// Slot capacity that was exhausted.
        capacity: usize,
    },

    /// A definition file could not be read or parsed.
    DefinitionParse {
        /// Where the text came from (a path or `"<inline>"`).
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// A tunable is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownActorDefinition { name } => {
                write!(f, "unknown actor definition '{}'", name)
            }
            SimError::UnknownWeaponDefinition { name } => {
                write!(f, "unknown weapon definition '{}'", name)
            }
            SimError::UnknownTileDefinition { name } => {
                write!(f, "unknown tile definition '{}'", name)
            }
            SimError::UnknownMapDefinition { name } => {
                write!(f, "unknown map definition '{}'", name)
            }
            SimError::UnknownTileSymbol { map, symbol } => {
                write!(f, "map '{}' uses tile symbol '{}' with no legend entry", map, symbol)
            }
            SimError::RaggedTileRows { map, row } => write!(
                f,
                "map '{}' row {} has a different width than row 0",
                map, row
            ),
            SimError::RegistryFull { capacity } => {
                write!(f, "actor registry is full ({} slots)", capacity)
            }
            SimError::DefinitionParse {
                source_name,
                message,
            } => write!(f, "failed to parse definitions from {}: {}", source_name, message),
            SimError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `gravity` is negative or not finite.
pub fn validate_gravity(value: f32) -> SimResult<()> {
    if !value.is_finite() || value < 0.0 {
        Err(SimError::UnsafeConstant {
            name: "gravity",
            value,
            safe_range: "[0.0, ∞)",
        })
    } else {
        Ok(())
    }
}

/// Returns an error if `ceiling_height` is not strictly positive.
pub fn validate_ceiling_height(value: f32) -> SimResult<()> {
    if !value.is_finite() || value <= 0.0 {
        Err(SimError::UnsafeConstant {
            name: "ceiling_height",
            value,
            safe_range: "(0.0, ∞)",
        })
    } else {
        Ok(())
    }
}
