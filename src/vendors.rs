//! Vendor-specific output formats.
//!
//! Each supported coding assistant expects its rules in a different file and
//! shape. The registry maps a vendor key to a small record of (name, output
//! filename, formatting function); adding a vendor means adding one row.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

/// Error from vendor export.
#[derive(Error, Debug)]
pub enum VendorError {
    /// The requested key isn't in the registry. There is no sensible
    /// fallback, so this surfaces to the caller.
    #[error("unknown vendor '{0}' (available: cursor, continue, aider)")]
    UnknownVendor(String),

    /// The vendor file couldn't be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Answered profile fields, keyed by field name.
pub type ProfileFields = BTreeMap<String, String>;

type FormatFn = fn(&str, &ProfileFields) -> String;

/// One supported coding assistant.
pub struct Vendor {
    pub key: &'static str,
    pub name: &'static str,
    pub filename: &'static str,
    format: FormatFn,
}

/// Registry of supported tools.
pub const VENDORS: [Vendor; 3] = [
    Vendor {
        key: "cursor",
        name: "Cursor AI",
        filename: ".cursorrules",
        format: format_cursor,
    },
    Vendor {
        key: "continue",
        name: "Continue",
        filename: ".continuerules",
        format: format_continue,
    },
    Vendor {
        key: "aider",
        name: "Aider",
        filename: ".aider.conf.yml",
        format: format_aider,
    },
];

/// Vendor keys, for the CLI value parser.
pub const KEYS: [&str; 3] = ["cursor", "continue", "aider"];

pub fn lookup(key: &str) -> Option<&'static Vendor> {
    VENDORS.iter().find(|v| v.key == key)
}

/// Write the prompt in the vendor's format, returning the file path.
///
/// An unknown key writes nothing. Exactly one file is produced otherwise.
pub fn export(
    vendor_key: &str,
    prompt: &str,
    profile: &ProfileFields,
    output_dir: &std::path::Path,
) -> Result<PathBuf, VendorError> {
    let vendor = lookup(vendor_key)
        .ok_or_else(|| VendorError::UnknownVendor(vendor_key.to_string()))?;

    let contents = (vendor.format)(prompt, profile);
    let path = output_dir.join(vendor.filename);

    std::fs::write(&path, contents).map_err(|source| VendorError::Write {
        path: path.display().to_string(),
        source,
    })?;

    info!(vendor = vendor.key, path = %path.display(), "vendor_export_written");
    Ok(path)
}

fn field<'a>(profile: &'a ProfileFields, name: &str, default: &'a str) -> &'a str {
    profile.get(name).map(String::as_str).unwrap_or(default)
}

/// Cursor reads plain text rules with a commented header.
fn format_cursor(prompt: &str, profile: &ProfileFields) -> String {
    format!(
        "# Generated with DevPrompt - Adaptive Developer Prompt Generation\n\
         # Profile: {experience} {languages}\n\
         # Generated on: {date}\n\
         # Intended use: {intended_use}\n\
         \n\
         {prompt}",
        experience = field(profile, "experience_level", "Developer"),
        languages = field(profile, "primary_languages", ""),
        date = chrono::Local::now().format("%Y-%m-%d"),
        intended_use = field(profile, "intended_use", "Coding assistance"),
    )
}

/// Continue takes a JSON document with the rules as `systemMessage`.
fn format_continue(prompt: &str, profile: &ProfileFields) -> String {
    let document = serde_json::json!({
        "systemMessage": prompt,
        "generatedBy": "DevPrompt",
        "profile": {
            "languages": field(profile, "primary_languages", ""),
            "experience": field(profile, "experience_level", ""),
            "project": field(profile, "current_project", ""),
        },
    });
    serde_json::to_string_pretty(&document).unwrap_or_else(|_| document.to_string())
}

/// Aider reads a YAML config; the prompt goes in a block scalar.
fn format_aider(prompt: &str, profile: &ProfileFields) -> String {
    let indented: String = prompt
        .lines()
        .map(|line| format!("  {}\n", line))
        .collect();

    format!(
        "# Generated with DevPrompt\n\
         # Profile: {experience}\n\
         # Languages: {languages}\n\
         \n\
         system-message: |\n\
         {indented}\
         \n\
         auto-commits: false\n\
         dirty-commits: true\n",
        experience = field(profile, "experience_level", "Developer"),
        languages = field(profile, "primary_languages", ""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> ProfileFields {
        let mut profile = ProfileFields::new();
        profile.insert("experience_level".to_string(), "Senior (8+ years)".to_string());
        profile.insert("primary_languages".to_string(), "Rust, Go".to_string());
        profile.insert("intended_use".to_string(), "Daily coding".to_string());
        profile.insert("current_project".to_string(), "a CLI tool".to_string());
        profile
    }

    #[test]
    fn test_lookup_known_and_unknown() {
        assert_eq!(lookup("cursor").unwrap().filename, ".cursorrules");
        assert_eq!(lookup("aider").unwrap().name, "Aider");
        assert!(lookup("foobar").is_none());
    }

    #[test]
    fn test_export_cursor_contains_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = export("cursor", "X", &sample_profile(), dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), ".cursorrules");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("X"));
        assert!(contents.contains("# Profile: Senior (8+ years) Rust, Go"));
    }

    #[test]
    fn test_export_unknown_vendor_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = export("foobar", "X", &sample_profile(), dir.path());

        assert!(matches!(result, Err(VendorError::UnknownVendor(ref k)) if k == "foobar"));
        // No file appeared in the output directory.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_write_failure_surfaces() {
        let result = export(
            "cursor",
            "X",
            &sample_profile(),
            std::path::Path::new("/nonexistent-devprompt-dir"),
        );
        assert!(matches!(result, Err(VendorError::Write { .. })));
    }

    #[test]
    fn test_continue_format_is_valid_json() {
        let mut profile = sample_profile();
        // Quotes and newlines in fields must not break the document.
        profile.insert(
            "current_project".to_string(),
            "the \"big\" rewrite".to_string(),
        );
        let contents = format_continue("line one\nline two", &profile);

        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["systemMessage"], "line one\nline two");
        assert_eq!(parsed["generatedBy"], "DevPrompt");
        assert_eq!(parsed["profile"]["project"], "the \"big\" rewrite");
    }

    #[test]
    fn test_aider_format_indents_block_scalar() {
        let contents = format_aider("first line\nsecond line", &sample_profile());

        assert!(contents.contains("system-message: |\n  first line\n  second line\n"));
        assert!(contents.contains("auto-commits: false"));
        assert!(contents.contains("dirty-commits: true"));
    }

    #[test]
    fn test_missing_profile_fields_use_defaults() {
        let contents = format_cursor("the prompt", &ProfileFields::new());
        assert!(contents.contains("# Profile: Developer"));
        assert!(contents.contains("# Intended use: Coding assistance"));
    }

    #[test]
    fn test_registry_keys_match_lookup() {
        for key in KEYS {
            assert!(lookup(key).is_some(), "{} missing from registry", key);
        }
        assert_eq!(VENDORS.len(), KEYS.len());
    }
}
