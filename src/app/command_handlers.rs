use crate::app::cli::{help_text, parse_cli_verb, parse_run_args, CliVerb};
use crate::service::{ImportService, RequestFields};
use crate::settings::resolve_settings;
use std::fs;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Run => cmd_run(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}

pub fn cmd_run(args: &[String]) -> Result<String, String> {
    let run_args = parse_run_args(args)?;
    let settings = resolve_settings(run_args.config.as_deref()).map_err(|e| e.to_string())?;

    let mut fields = RequestFields::default();
    for (name, value) in &run_args.fields {
        fields.set_field(name, value.as_str());
    }
    for path in &run_args.input_files {
        let file_name = path
            .file_name()
            .and_then(|v| v.to_str())
            .ok_or_else(|| format!("input path {} has no file name", path.display()))?;
        let data = fs::read(path)
            .map_err(|err| format!("failed to read input file {}: {err}", path.display()))?;
        fields.add_input_file(file_name, data);
    }

    let service = ImportService::from_settings(&settings).map_err(|e| e.to_string())?;
    service.handle(fields).map_err(|e| e.to_string())
}
