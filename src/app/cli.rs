use crate::service::{FIELD_MODE, FIELD_RESOLUTION, FIELD_SAMPLE_PLACES, FLAG_FIELDS};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Run,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "run" => CliVerb::Run,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: dcimport run --mode <lint|genmcf> --resolution <none|local|full> [flags] <files...>"
            .to_string(),
        String::new(),
        "Commands:".to_string(),
        "  run                                  Run the import tool on local files and publish results"
            .to_string(),
        "  help                                 Show this help".to_string(),
        String::new(),
        "Run options:".to_string(),
        "  --config <path>                      Settings file (default: $DCIMPORT_CONFIG or ~/.dcimport/config.yaml)"
            .to_string(),
        "  --mode <lint|genmcf>                 Tool operating mode (required)".to_string(),
        "  --resolution <none|local|full>       Entity resolution strictness (required)"
            .to_string(),
        "  --sample-places <value>              Places to sample; needs --stat-checks".to_string(),
        "  --existence-checks                   Enable existence checks".to_string(),
        "  --existence-checks-place             Enable place existence checks".to_string(),
        "  --stat-checks                        Enable stat checks".to_string(),
        "  --allow-non-numeric-obs-values       Allow non-numeric observation values".to_string(),
        "  --check-measurement-result           Check measurement results".to_string(),
        "  --summary-report                     Produce a summary report".to_string(),
        "  --verbose                            Verbose tool output".to_string(),
    ]
}

pub fn help_text() -> String {
    cli_help_lines().join("\n")
}

/// Parsed `run` arguments. Flag fields are kept as form-style values so
/// they flow through the same presence rule as any other transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub fields: Vec<(String, String)>,
    pub input_files: Vec<PathBuf>,
}

pub fn parse_run_args(args: &[String]) -> Result<RunArgs, String> {
    let mut parsed = RunArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(option) = arg.strip_prefix("--") else {
            parsed.input_files.push(PathBuf::from(arg));
            continue;
        };
        let (name, inline_value) = match option.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (option, None),
        };

        if FLAG_FIELDS.contains(&name) {
            parsed
                .fields
                .push((name.to_string(), inline_value.unwrap_or_default()));
            continue;
        }

        let takes_value = matches!(name, "config")
            || [FIELD_MODE, FIELD_RESOLUTION, FIELD_SAMPLE_PLACES].contains(&name);
        if !takes_value {
            return Err(format!("unknown option `--{name}`"));
        }
        let value = match inline_value {
            Some(value) => value,
            None => iter
                .next()
                .cloned()
                .ok_or_else(|| format!("option `--{name}` requires a value"))?,
        };
        if name == "config" {
            parsed.config = Some(PathBuf::from(value));
        } else {
            parsed.fields.push((name.to_string(), value));
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_values_flags_and_positional_files() {
        let parsed = parse_run_args(&args(&[
            "--mode",
            "lint",
            "--resolution=local",
            "--stat-checks",
            "--config",
            "/etc/dcimport.yaml",
            "a.csv",
            "b.tmcf",
        ]))
        .expect("parse");

        assert_eq!(parsed.config, Some(PathBuf::from("/etc/dcimport.yaml")));
        assert_eq!(
            parsed.fields,
            vec![
                ("mode".to_string(), "lint".to_string()),
                ("resolution".to_string(), "local".to_string()),
                ("stat-checks".to_string(), String::new()),
            ]
        );
        assert_eq!(
            parsed.input_files,
            vec![PathBuf::from("a.csv"), PathBuf::from("b.tmcf")]
        );
    }

    #[test]
    fn rejects_unknown_options_and_missing_values() {
        assert!(parse_run_args(&args(&["--bogus"])).is_err());
        let err = parse_run_args(&args(&["--mode"])).expect_err("missing value");
        assert!(err.contains("requires a value"));
    }

    #[test]
    fn verbs_and_help() {
        assert_eq!(parse_cli_verb("run"), CliVerb::Run);
        assert_eq!(parse_cli_verb("--help"), CliVerb::Help);
        assert_eq!(parse_cli_verb("serve"), CliVerb::Unknown);
        assert!(help_text().contains("--sample-places"));
    }
}
