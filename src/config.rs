//! Tunable parameters for the tree algebra
//!
//! There's a single, process-wide [`Config`], accessed with [`get`] and replaced with [`set`]. It's
//! stored behind an [`ArcSwap`], so the hot paths in the tree algebra can read it without taking a
//! lock. Replacing the configuration only affects operations that start afterwards; any trees
//! built with a different `nmax` remain valid, if not perfectly balanced under the new value.
//!
//! Configuration files are YAML, with every field optional:
//! ```yaml
//! nmax: 15
//! max_run: 1024
//! debug_checks: false
//! default_style:
//!   family: monospace
//!   fontsize: 10
//! ```

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::style::StyleMap;
use crate::{Error, Result};

/// Generates the configuration struct alongside its all-optional builder
///
/// Each field is given with its default value; fields missing from the builder take the default
/// when it's converted with `build`.
macro_rules! static_config {
    (
        $builder_vis:vis struct $builder:ident;
        $(#[$attr:meta])*
        $config_vis:vis struct $config:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field:ident: $field_ty:ty = $value:expr,
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        $config_vis struct $config {
            $(
                $(#[$field_attr])*
                $field_vis $field: $field_ty,
            )*
        }

        /// The partial form of the configuration, as it's deserialized
        ///
        /// Any field left as `None` takes its default value.
        #[derive(Debug, Default, Clone, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        $builder_vis struct $builder {
            $(
                #[serde(default)]
                pub $field: Option<$field_ty>,
            )*
        }

        impl $builder {
            /// Fills in the missing fields with their defaults, without validating
            fn fill(self) -> $config {
                $config {
                    $($field: self.$field.unwrap_or_else(|| $value),)*
                }
            }

            /// Overrides the fields of `config` with any that are set in the builder
            pub fn apply_to(self, config: &mut $config) {
                $(if let Some(v) = self.$field {
                    config.$field = v;
                })*
            }
        }

        impl Default for $config {
            fn default() -> Self {
                Self {
                    $($field: $value,)*
                }
            }
        }
    };
}

static_config! {
    pub struct Builder;

    /// The full set of tunables
    pub struct Config {
        /// The maximum number of children in a [`Group`](crate::Group)
        ///
        /// Every group other than the root has between `ceil(nmax/2)` and `nmax` children.
        pub nmax: usize = 15,

        /// The maximum length of a text run produced by fusing two neighboring leaves
        pub max_run: usize = 1024,

        /// Whether documents validate their trees after every edit
        ///
        /// This is only respected in builds with debug assertions enabled.
        pub debug_checks: bool = false,

        /// The style used for text inserted into a document without any neighboring style
        pub default_style: StyleMap = StyleMap::new(),
    }
}

impl Builder {
    /// Converts the builder into a full configuration, validating the values
    pub fn build(self) -> Result<Config> {
        let config = self.fill();
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Parses a configuration from the contents of a YAML file
    pub fn from_yaml(s: &str) -> Result<Config> {
        let builder: Builder = serde_yaml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        builder.build()
    }

    /// Checks that the values are usable by the tree algebra
    pub fn validate(&self) -> Result<()> {
        if self.nmax < 2 {
            return Err(Error::Config(format!(
                "nmax must be at least 2, found {}",
                self.nmax
            )));
        } else if self.max_run == 0 {
            return Err(Error::Config("max_run must be at least 1".into()));
        }

        Ok(())
    }

    /// Returns the minimum number of children for any non-root group
    pub fn nmin(&self) -> usize {
        (self.nmax + 1) / 2
    }
}

lazy_static! {
    static ref CONFIG: ArcSwap<Config> = ArcSwap::from_pointee(Config::default());
}

/// Returns the current global configuration
pub fn get() -> Arc<Config> {
    CONFIG.load_full()
}

/// Replaces the global configuration, returning the previous one
///
/// ## Errors
///
/// Returns an error without changing anything if the configuration is invalid.
pub fn set(config: Config) -> Result<Arc<Config>> {
    config.validate()?;
    log::debug!(
        "config: nmax = {}, max_run = {}",
        config.nmax,
        config.max_run
    );
    Ok(CONFIG.swap(Arc::new(config)))
}

/// Loads a YAML configuration file and makes it the global configuration
pub fn load_file(path: impl AsRef<Path>) -> Result<Arc<Config>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    set(Config::from_yaml(&content)?)
}

/// (*Internal*) Returns the current `nmax`
pub(crate) fn nmax() -> usize {
    CONFIG.load().nmax
}

/// (*Internal*) Returns the current `max_run`
pub(crate) fn max_run() -> usize {
    CONFIG.load().max_run
}

/// (*Internal*) Returns whether expensive tree validation should run after edits
pub(crate) fn debug_checks() -> bool {
    cfg!(debug_assertions) && CONFIG.load().debug_checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleValue;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.nmax, 15);
        assert_eq!(config.nmin(), 8);
        assert_eq!(config.max_run, 1024);
        assert!(!config.debug_checks);
        assert!(config.default_style.is_empty());
    }

    #[test]
    fn partial_yaml() {
        let config = Config::from_yaml(
            "
nmax: 4
default_style:
  bold: true
  family: serif
  fontsize: 12
",
        )
        .unwrap();

        assert_eq!(config.nmax, 4);
        assert_eq!(config.nmin(), 2);
        assert_eq!(config.max_run, 1024);
        assert_eq!(config.default_style.get("bold"), Some(&StyleValue::Bool(true)));
        assert_eq!(config.default_style.get("fontsize"), Some(&StyleValue::Int(12)));
        assert_eq!(
            config.default_style.get("family"),
            Some(&StyleValue::Str("serif".into()))
        );
    }

    #[test]
    fn rejects_invalid() {
        assert!(matches!(Config::from_yaml("nmax: 1"), Err(Error::Config(_))));
        assert!(matches!(Config::from_yaml("max_run: 0"), Err(Error::Config(_))));
        assert!(matches!(Config::from_yaml("colour: red"), Err(Error::Config(_))));
    }

    #[test]
    fn builder_overrides() {
        let mut config = Config::default();
        let builder = Builder {
            max_run: Some(8),
            ..Builder::default()
        };
        builder.apply_to(&mut config);
        assert_eq!(config.max_run, 8);
        assert_eq!(config.nmax, 15);
    }

    #[test]
    fn set_rejects_invalid() {
        let bad = Config {
            nmax: 0,
            ..Config::default()
        };
        assert!(set(bad).is_err());
        assert_eq!(get().nmax, 15);
    }
}
