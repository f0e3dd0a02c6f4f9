use crate::run_config::RunConfiguration;
use crate::settings::ToolSettings;
use crate::tool::ToolCommand;

/// Renders the tool command line. Token order is fixed: settings prefix
/// args, mode, boolean flags, string flags, then input paths as supplied.
pub fn build_command(cfg: &RunConfiguration, tool: &ToolSettings) -> ToolCommand {
    let mut args: Vec<String> = tool
        .args
        .iter()
        .filter(|arg| !arg.is_empty())
        .cloned()
        .collect();
    args.push(cfg.mode().as_str().to_string());

    let bool_flags = [
        ("existence-checks", cfg.existence_checks()),
        ("existence-checks-place", cfg.existence_checks_place()),
        ("stat-checks", cfg.stat_checks()),
        (
            "allow-non-numeric-obs-values",
            cfg.allow_non_numeric_obs_values(),
        ),
        ("check-measurement-result", cfg.check_measurement_result()),
        ("summary-report", cfg.summary_report()),
        ("verbose", cfg.verbose()),
    ];
    for (name, enabled) in bool_flags {
        args.push(bool_arg(name, enabled));
    }

    let output_dir = cfg.output_dir().map(|p| p.display().to_string());
    let string_flags = [
        ("output-dir", output_dir.as_deref()),
        ("sample-places", cfg.sample_places()),
        ("resolution", Some(cfg.resolution().as_str())),
    ];
    for (name, value) in string_flags {
        if let Some(arg) = string_arg(name, value) {
            args.push(arg);
        }
    }

    args.extend(
        cfg.input_file_paths()
            .iter()
            .map(|p| p.display().to_string()),
    );

    ToolCommand {
        program: tool.program.clone(),
        args,
    }
}

fn bool_arg(name: &str, enabled: bool) -> String {
    format!("--{name}={enabled}")
}

fn string_arg(name: &str, value: Option<&str>) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(format!("--{name}={value}")),
        _ => None,
    }
}
