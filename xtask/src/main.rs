//! Developer tasks (schema generation, fixture conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use posture_source::{ControlsInputsGetter, ExceptionsGetter, LocalSource, PolicyGetter};
use posture_types::{PolicySetEnvelope, SCHEMA_POLICY_SET_V1, ids};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Get the project root (parent of xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("Cannot determine current directory")?,
    };

    // If we're in the xtask directory, go up one level
    if manifest_dir.ends_with("xtask")
        && let Some(parent) = manifest_dir.parent()
    {
        return Ok(parent.to_path_buf());
    }
    Ok(manifest_dir)
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

fn fixtures_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("tests").join("fixtures"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_policy_set_schema() -> schemars::Schema {
    schema_for!(posture_types::PolicySetEnvelope)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(posture_settings::PostureConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "posture.policy-set.v1.json",
            generate: generate_policy_set_schema,
        },
        SchemaSpec {
            filename: "posture.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        // Compared as JSON values so key order and whitespace do not matter.
        let expected = serde_json::to_value((spec.generate)())
            .with_context(|| format!("Failed to convert {} to JSON", spec.filename))?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let actual: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Check that fixture policies load and fixture policy sets validate");
}

/// Check fixture conformance.
///
/// - every `*.json` under a `policies/` directory loads through the local policy source
/// - every `*.json` under a `policy-sets/` directory validates against the generated
///   policy-set schema and parses as a policy-set envelope
fn conform() -> anyhow::Result<()> {
    let root = fixtures_dir()?;
    if !root.exists() {
        bail!("tests/fixtures/ not found at {}", root.display());
    }

    let schema_value = serde_json::to_value(generate_policy_set_schema())
        .context("Failed to convert policy-set schema to JSON")?;
    let validator = jsonschema::validator_for(&schema_value)
        .map_err(|e| anyhow::anyhow!("Failed to compile policy-set schema: {}", e))?;
    println!("✓ {} schema compiles", SCHEMA_POLICY_SET_V1);

    let mut fixture_count = 0;
    let mut errors = Vec::new();

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.context("Failed to walk tests/fixtures/")?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let label = path
            .strip_prefix(&root)
            .unwrap_or(path)
            .display()
            .to_string();

        let parent = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str());
        let result = match parent {
            Some("policies") => check_policy_file(path),
            Some("policy-sets") => check_policy_set_file(path, &validator),
            _ => continue,
        };

        match result {
            Ok(()) => println!("  ✓ {} conforms", label),
            Err(problems) => {
                errors.extend(problems.into_iter().map(|p| format!("{}: {}", label, p)));
            }
        }
        fixture_count += 1;
    }

    if fixture_count == 0 {
        bail!("No JSON fixtures found in {}", root.display());
    }

    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} fixtures pass conformance checks!", fixture_count);
    Ok(())
}

/// Load one file of a policy directory the way `posture --use-from` would.
fn check_policy_file(path: &Path) -> Result<(), Vec<String>> {
    let fail = |msg: String| vec![msg];
    let dir = path
        .parent()
        .and_then(|p| camino::Utf8Path::from_path(p))
        .ok_or_else(|| fail("path is not UTF-8".to_string()))?;
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default();
    let source = LocalSource::new(dir.to_path_buf());

    if file_name == ids::EXCEPTIONS_FILE {
        return source
            .get_exceptions("")
            .map(|_| ())
            .map_err(|e| fail(e.to_string()));
    }
    if file_name == ids::CONTROLS_INPUTS_FILE {
        return source
            .get_controls_inputs("")
            .map(|_| ())
            .map_err(|e| fail(e.to_string()));
    }

    let text = fs::read_to_string(path).map_err(|e| fail(format!("read failed: {}", e)))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| fail(format!("invalid JSON: {}", e)))?;

    let found = if value.get("controlID").is_some() {
        source.get_control(stem).map(|c| c.is_some())
    } else {
        source.get_framework(stem).map(|f| f.is_some())
    };
    match found {
        Ok(true) => Ok(()),
        Ok(false) => Err(fail(format!("{} was not found by the local source", stem))),
        Err(e) => Err(fail(e.to_string())),
    }
}

fn check_policy_set_file(path: &Path, validator: &jsonschema::Validator) -> Result<(), Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| vec![format!("read failed: {}", e)])?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| vec![format!("invalid JSON: {}", e)])?;

    let problems: Vec<String> = validator
        .iter_errors(&value)
        .map(|err| format!("schema validation: {}", err))
        .collect();
    if !problems.is_empty() {
        return Err(problems);
    }

    let envelope: PolicySetEnvelope =
        serde_json::from_value(value).map_err(|e| vec![format!("parse failed: {}", e)])?;
    if envelope.schema != SCHEMA_POLICY_SET_V1 {
        return Err(vec![format!(
            "schema '{}' is not {}",
            envelope.schema, SCHEMA_POLICY_SET_V1
        )]);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
