//! Command-line definition.

use std::path::PathBuf;

use clap::Parser;

use crate::sources::Language;

/// Top-level CLI entry point for dmake.
///
/// Positional arguments are interpreted after parsing: an optional module
/// type (`exe`, `lib`, `dll`, `plugin`), an optional action (`build`,
/// `clean`, `install`), directory names, `name=value` environment
/// assignments, or `init` followed by init keywords.
#[derive(Parser, Debug)]
#[command(
    name = "dmake",
    about = "Build C, C++ and Objective-C modules with dcc",
    version = option_env!("DMAKE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
    override_usage = "dmake [options] [{exe|lib|dll|plugin}] [build|clean|install]\n       \
                      dmake [options] [build|clean|install] path...\n       \
                      dmake [options] init [keywords...]"
)]
pub struct Cli {
    /// Change to this directory before doing anything
    #[arg(short = 'C', value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Output file name
    #[arg(short = 'o', value_name = "NAME")]
    pub output: Option<String>,

    /// Build a dynamic library when no main() is found
    #[arg(long)]
    pub dll: bool,

    /// Build a plugin when no main() is found
    #[arg(long)]
    pub plugin: bool,

    /// Keep going after errors in sub-directories
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Report what is being done
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output, passed on to dcc
    #[arg(long)]
    pub debug: bool,

    /// Ask dcc to be quiet
    #[arg(long)]
    pub quiet: bool,

    /// Installation prefix
    #[arg(long, env = "PREFIX", value_name = "PATH")]
    pub prefix: Option<String>,

    /// Language of the sources to look for
    #[arg(long, value_enum, value_name = "LANG")]
    pub lang: Option<Language>,

    /// Module type, action, directories, NAME=VALUE or init keywords
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_is_stamped() {
        let cmd = Cli::command();
        let version = cmd.get_version().expect("version is set");
        assert!(!version.is_empty());
    }

    #[test]
    fn parse_no_arguments() {
        let cli = Cli::parse_from(["dmake"]);
        assert!(cli.args.is_empty());
        assert!(!cli.keep_going);
        assert_eq!(cli.lang, None);
    }

    #[test]
    fn parse_directory_and_output() {
        let cli = Cli::parse_from(["dmake", "-C", "src", "-o", "fred", "exe"]);
        assert_eq!(cli.directory, Some(PathBuf::from("src")));
        assert_eq!(cli.output.as_deref(), Some("fred"));
        assert_eq!(cli.args, ["exe"]);
    }

    #[test]
    fn parse_keep_going_short() {
        let cli = Cli::parse_from(["dmake", "-k", "lib", "app"]);
        assert!(cli.keep_going);
        assert_eq!(cli.args, ["lib", "app"]);
    }

    #[test]
    fn parse_lang() {
        let cli = Cli::parse_from(["dmake", "--lang", "objc++"]);
        assert_eq!(cli.lang, Some(Language::ObjCxx));
    }

    #[test]
    fn parse_unknown_lang_fails() {
        assert!(Cli::try_parse_from(["dmake", "--lang", "rust"]).is_err());
    }

    #[test]
    fn parse_prefix() {
        let cli = Cli::parse_from(["dmake", "--prefix", "/opt", "install"]);
        assert_eq!(cli.prefix.as_deref(), Some("/opt"));
        assert_eq!(cli.args, ["install"]);
    }

    #[test]
    fn parse_init_keywords() {
        let cli = Cli::parse_from(["dmake", "init", "c++", "c++17", "release"]);
        assert_eq!(cli.args, ["init", "c++", "c++17", "release"]);
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::parse_from(["dmake", "--dll", "--plugin", "-v", "--debug", "--quiet"]);
        assert!(cli.dll && cli.plugin && cli.verbose && cli.debug && cli.quiet);
    }
}
