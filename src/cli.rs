use clap::Parser;

use crate::generator::{RuleMode, Variant};
use crate::parser::detection::split_link_param;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Convert proxy share links into a Mihomo config",
    long_about = None
)]
pub struct Args {
    #[arg(value_name = "LINK", help = "Share links (vless://, trojan://, ss://, ...)")]
    pub positional: Vec<String>,

    #[arg(short, long, help = "Links file (plain or Base64 list), or - for stdin")]
    pub input: Option<String>,

    #[arg(
        short = 'l',
        long = "links",
        value_name = "A|B|C",
        help = "Links separated by |, may be repeated"
    )]
    pub link_params: Vec<String>,

    #[arg(short, long, help = "Config output path, stdout if omitted")]
    pub output: Option<String>,

    #[arg(short, long, help = "Generator settings TOML")]
    pub config: Option<String>,

    #[arg(long, value_enum, help = "Override the settings file variant")]
    pub variant: Option<Variant>,

    #[arg(long, value_enum, help = "Override the settings file rule mode")]
    pub mode: Option<RuleMode>,

    #[arg(short, long, help = "Emit trace log")]
    pub verbose: bool,
}

impl Args {
    /// Links given on the command line, positional first
    pub fn inline_links(&self) -> Vec<String> {
        self.positional
            .iter()
            .cloned()
            .chain(self.link_params.iter().flat_map(|param| split_link_param(param)))
            .collect()
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some() || !self.positional.is_empty() || !self.link_params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::parse_from([
            "linkforge",
            "trojan://pw@h:443",
            "-l",
            "ss://a@b:1|hy2://c@d:2",
            "--links",
            "tuic://u:p@e:3",
            "-o",
            "~/out.yaml",
            "--variant",
            "simple",
            "--mode",
            "blacklist",
            "-v",
        ]);
        assert_eq!(
            args.inline_links(),
            vec![
                "trojan://pw@h:443",
                "ss://a@b:1",
                "hy2://c@d:2",
                "tuic://u:p@e:3"
            ]
        );
        assert_eq!(args.output.as_deref(), Some("~/out.yaml"));
        assert_eq!(args.variant, Some(Variant::Minimal));
        assert_eq!(args.mode, Some(RuleMode::DenyList));
        assert!(args.verbose);
        assert!(args.has_input());
    }

    #[test]
    fn test_no_input() {
        let args = Args::parse_from(["linkforge", "-c", "settings.toml"]);
        assert!(!args.has_input());
        assert_eq!(args.config.as_deref(), Some("settings.toml"));
        assert_eq!(args.variant, None);
    }

    #[test]
    fn test_stdin_input() {
        let args = Args::parse_from(["linkforge", "-i", "-"]);
        assert_eq!(args.input.as_deref(), Some("-"));
        assert!(args.has_input());
    }
}
