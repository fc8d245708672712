//! Supported submission languages and their execution specs.
//!
//! The registry is a static table: each language declares its source file
//! name, an optional build command, a run command, and a wall-clock run
//! timeout. Lookup is pure; unknown identifiers are rejected rather than
//! silently defaulted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// All runtimes the sandbox knows how to drive.
/// Serialized/deserialized in `lowercase` for config and wire JSON.
/// Common aliases are accepted (e.g., "py", "js", "c++").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "py")]
    Python,
    #[serde(alias = "js", alias = "node")]
    JavaScript,
    Java,
    #[serde(alias = "c++", alias = "cc")]
    Cpp,
    C,
}

/// A single command line, program plus arguments.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Immutable per-language execution spec, loaded once at startup.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSpec {
    pub language: Language,
    /// File the submitted source is written to inside the scratch directory.
    pub source_file: &'static str,
    /// Compile step, absent for interpreted languages.
    pub build: Option<CommandSpec>,
    pub run: CommandSpec,
    /// Wall-clock limit for the run step. Compiled languages get more.
    pub run_timeout: Duration,
}

static PYTHON: LanguageSpec = LanguageSpec {
    language: Language::Python,
    source_file: "main.py",
    build: None,
    run: CommandSpec {
        program: "python3",
        args: &["main.py"],
    },
    run_timeout: Duration::from_secs(8),
};

static JAVASCRIPT: LanguageSpec = LanguageSpec {
    language: Language::JavaScript,
    source_file: "main.js",
    build: None,
    run: CommandSpec {
        program: "node",
        args: &["main.js"],
    },
    run_timeout: Duration::from_secs(8),
};

static JAVA: LanguageSpec = LanguageSpec {
    language: Language::Java,
    source_file: "Main.java",
    build: Some(CommandSpec {
        program: "javac",
        args: &["Main.java"],
    }),
    run: CommandSpec {
        program: "java",
        args: &["Main"],
    },
    run_timeout: Duration::from_secs(12),
};

static CPP: LanguageSpec = LanguageSpec {
    language: Language::Cpp,
    source_file: "main.cpp",
    build: Some(CommandSpec {
        program: "g++",
        args: &["-std=c++17", "-O2", "-o", "main", "main.cpp"],
    }),
    run: CommandSpec {
        program: "./main",
        args: &[],
    },
    run_timeout: Duration::from_secs(15),
};

static C: LanguageSpec = LanguageSpec {
    language: Language::C,
    source_file: "main.c",
    build: Some(CommandSpec {
        program: "gcc",
        args: &["-std=c11", "-O2", "-o", "main", "main.c"],
    }),
    run: CommandSpec {
        program: "./main",
        args: &[],
    },
    run_timeout: Duration::from_secs(15),
};

/// Error returned when a language identifier is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl Language {
    /// Resolves a client-supplied identifier to a `Language`.
    /// Accepts the same aliases as the serde representation.
    pub fn resolve(id: &str) -> Result<Language, UnsupportedLanguage> {
        match id.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "cpp" | "c++" | "cc" => Ok(Language::Cpp),
            "c" => Ok(Language::C),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }

    /// The static execution spec for this language.
    pub fn spec(&self) -> &'static LanguageSpec {
        match self {
            Language::Python => &PYTHON,
            Language::JavaScript => &JAVASCRIPT,
            Language::Java => &JAVA,
            Language::Cpp => &CPP,
            Language::C => &C,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }

    /// Whether grading this language requires a separate build step.
    pub fn requires_build(&self) -> bool {
        self.spec().build.is_some()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_names() {
        assert_eq!(Language::resolve("python").unwrap(), Language::Python);
        assert_eq!(Language::resolve("javascript").unwrap(), Language::JavaScript);
        assert_eq!(Language::resolve("java").unwrap(), Language::Java);
        assert_eq!(Language::resolve("cpp").unwrap(), Language::Cpp);
        assert_eq!(Language::resolve("c").unwrap(), Language::C);
    }

    #[test]
    fn resolves_aliases_and_case() {
        assert_eq!(Language::resolve("PY").unwrap(), Language::Python);
        assert_eq!(Language::resolve("node").unwrap(), Language::JavaScript);
        assert_eq!(Language::resolve(" C++ ").unwrap(), Language::Cpp);
    }

    #[test]
    fn rejects_unknown_identifier() {
        let err = Language::resolve("brainfudge").unwrap_err();
        assert_eq!(err, UnsupportedLanguage("brainfudge".to_string()));
    }

    #[test]
    fn compiled_languages_declare_a_build_step() {
        assert!(!Language::Python.requires_build());
        assert!(!Language::JavaScript.requires_build());
        assert!(Language::Java.requires_build());
        assert!(Language::Cpp.requires_build());
        assert!(Language::C.requires_build());
    }

    #[test]
    fn run_timeouts_are_within_the_allowed_band() {
        for lang in [
            Language::Python,
            Language::JavaScript,
            Language::Java,
            Language::Cpp,
            Language::C,
        ] {
            let t = lang.spec().run_timeout;
            assert!(t >= Duration::from_secs(8) && t <= Duration::from_secs(15));
        }
    }

    #[test]
    fn serde_roundtrip_uses_lowercase() {
        let json = serde_json::to_string(&Language::Cpp).unwrap();
        assert_eq!(json, "\"cpp\"");
        let parsed: Language = serde_json::from_str("\"js\"").unwrap();
        assert_eq!(parsed, Language::JavaScript);
    }
}
