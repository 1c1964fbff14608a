//! `ledgermatch reconcile | profile | validate`.

use std::path::{Path, PathBuf};

use log::debug;

use ledgermatch_recon::load::load_csv_file;
use ledgermatch_recon::profile::{detect_profile, ColumnProfile};
use ledgermatch_recon::{
    Dataset, FieldMapping, FieldPair, LogicalField, ModeName, ReconError, ReconRequest,
    ReconSummary, Rules, SessionStore, Side,
};

use crate::exit_codes::EXIT_DIFFERENCES;
use crate::{CliError, ColumnArgs, ReconcileArgs, RuleArgs};

// ============================================================================
// reconcile
// ============================================================================

pub fn cmd_reconcile(args: ReconcileArgs) -> Result<(), CliError> {
    let a = load_input(&args.a)?;
    let b = load_input(&args.b)?;

    let request = build_request(&args, &a, &b)?;

    let store = SessionStore::new();
    let id = store.create(a, b);
    let run = store.reconcile(&id, &request)?;
    let output = &run.output;

    if args.json || args.output.is_some() {
        let json_str = serde_json::to_string_pretty(output)
            .map_err(|e| CliError::usage(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::usage(format!("cannot write output: {e}")))?;
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }

        if args.json {
            println!("{json_str}");
        }
    }

    if let Some(ref path) = args.export {
        let csv = store.export(&id, args.status)?;
        std::fs::write(path, csv)
            .map_err(|e| CliError::usage(format!("cannot write export: {e}")))?;
        if !args.quiet {
            eprintln!("exported {}", path.display());
        }
    }

    if !args.quiet {
        eprintln!("{}", summary_line(request.mode, &output.summary));
    }

    let summary = &output.summary;
    if summary.is_reconciled() {
        Ok(())
    } else {
        Err(CliError::new(
            EXIT_DIFFERENCES,
            format!("{} of {} record(s) not matched", summary.total - summary.matched, summary.total),
        ))
    }
}

fn load_input(path: &Path) -> Result<Dataset, CliError> {
    load_csv_file(path).map_err(|e| match e {
        ReconError::Io(_) => CliError::from(e).with_hint("check that the input file exists and is readable"),
        other => CliError::from(other),
    })
}

/// Config file first, then flags, then detection for whatever is still unmapped.
fn build_request(args: &ReconcileArgs, a: &Dataset, b: &Dataset) -> Result<ReconRequest, CliError> {
    let mut request = match args.config {
        Some(ref path) => ReconRequest::parse_file(path)?,
        None => ReconRequest::default(),
    };

    if let Some(mode) = args.mode {
        request.mode = mode.into();
    }

    request.mapping.merge(&flag_mapping(&args.columns));

    if !args.rules.is_empty() {
        apply_rule_flags(request.rules.get_or_insert_with(Rules::default), &args.rules);
    }

    if args.detect {
        let (pa, pb) = (detect_profile(a), detect_profile(b));
        debug!("detected profile A: {pa:?}");
        debug!("detected profile B: {pb:?}");
        pa.fill_mapping(&mut request.mapping, Side::A);
        pb.fill_mapping(&mut request.mapping, Side::B);
    }

    request.validate()?;
    Ok(request)
}

fn flag_mapping(cols: &ColumnArgs) -> FieldMapping {
    FieldMapping {
        id: FieldPair::new(cols.id_a.as_deref(), cols.id_b.as_deref()),
        amount: FieldPair::new(cols.amount_a.as_deref(), cols.amount_b.as_deref()),
        date: FieldPair::new(cols.date_a.as_deref(), cols.date_b.as_deref()),
        description: FieldPair::new(cols.description_a.as_deref(), cols.description_b.as_deref()),
    }
}

fn apply_rule_flags(rules: &mut Rules, flags: &RuleArgs) {
    if let Some(tol) = flags.amount_tolerance {
        rules.amount_tolerance = tol;
    }
    if let Some(days) = flags.date_tolerance_days {
        rules.date_tolerance_days = days;
    }
    if !flags.keys_a.is_empty() {
        rules.composite_keys_a = flags.keys_a.clone();
    }
    if !flags.keys_b.is_empty() {
        rules.composite_keys_b = flags.keys_b.clone();
    }
    for (column, field_type) in &flags.field_types {
        rules.field_types.insert(column.clone(), *field_type);
    }
}

fn summary_line(mode: ModeName, s: &ReconSummary) -> String {
    format!(
        "{mode} recon: {} record(s), {} matched, {} mismatched, {} missing in A, {} missing in B",
        s.total, s.matched, s.mismatch, s.missing_in_a, s.missing_in_b,
    )
}

// ============================================================================
// profile
// ============================================================================

pub fn cmd_profile(file: PathBuf, json: bool) -> Result<(), CliError> {
    let dataset = load_input(&file)?;
    let profile = detect_profile(&dataset);

    if json {
        let json_str = serde_json::to_string_pretty(&profile)
            .map_err(|e| CliError::usage(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", render_profile(&profile));
    }
    Ok(())
}

fn render_profile(profile: &ColumnProfile) -> String {
    LogicalField::ALL
        .iter()
        .map(|&field| {
            let column = profile.get(field).unwrap_or("(not detected)");
            format!("{:<12} {}\n", field.to_string(), column)
        })
        .collect()
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let request = ReconRequest::from_file(&config)?;
    match (request.mode, &request.rules) {
        (ModeName::Custom, Some(rules)) => eprintln!(
            "valid: custom mode, {} key column(s), amount tolerance {}, date tolerance {} day(s)",
            rules.composite_keys_a.len(),
            rules.tolerances().amount,
            rules.tolerances().date_days,
        ),
        _ => eprintln!("valid: auto mode"),
    }
    Ok(())
}
