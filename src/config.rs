use std::env::var;

/// The environment variable holding the colon separated module search path.
pub const PATH_VARIABLE: &str = "CAIRN_PATH";

/// The extension of cairn source files, added to module names that lack it.
pub const SOURCE_EXTENSION: &str = "crn";

/// Where the standard library lives, relative to a search path directory.
pub const STD_LIBRARY: &str = "lib/std.crn";

/// The copy of the standard library built into the binary.  Used when no standard library file
/// is found on the search path.
pub const BUNDLED_STD: &str = include_str!("../lib/std.crn");

pub const DEFAULT_SEARCH_PATH: &str = ".";

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1_000;

/// Settings for an interpreter session.
#[derive(Clone, Debug)]
pub struct Config {
    /// Colon separated directories searched for modules and the standard library.
    pub search_path: String,

    pub extension: String,

    pub std_library: String,

    /// Compile the standard library into the session before any user code.
    pub load_std: bool,

    /// The deepest word calls may nest before evaluation is aborted.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            extension: SOURCE_EXTENSION.to_string(),
            std_library: STD_LIBRARY.to_string(),
            load_std: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    /// The defaults, with the search path taken from `CAIRN_PATH` when it's set.
    pub fn from_env() -> Config {
        let mut config = Config::default();

        if let Ok(search_path) = var(PATH_VARIABLE)
            && !search_path.is_empty()
        {
            config.search_path = search_path;
        }

        config
    }

    pub fn with_search_path(mut self, search_path: &str) -> Config {
        self.search_path = search_path.to_string();
        self
    }

    pub fn with_std(mut self, load_std: bool) -> Config {
        self.load_std = load_std;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Config {
        self.max_call_depth = max_call_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.search_path, ".");
        assert_eq!(config.max_call_depth, 1_000);
        assert!(config.load_std);
        assert!(BUNDLED_STD.contains("func"));
    }

    #[test]
    fn builders_override_defaults() {
        let config = Config::default()
            .with_search_path("a:b")
            .with_std(false)
            .with_max_call_depth(10);

        assert_eq!(config.search_path, "a:b");
        assert!(!config.load_std);
        assert_eq!(config.max_call_depth, 10);
    }
}
