//! Output formatting for CLI commands
//!
//! Tables for humans, pretty JSON of the canonical model with `--json`.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::secrets::{EnvironmentListing, Secret, SecretListing};

/// Print data as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a table header followed by a separator
pub fn print_table_header(columns: &[(&str, usize)]) {
    println!();
    let mut header = String::new();
    for (name, width) in columns {
        header.push_str(&format!("{:<width$} ", name, width = width));
    }
    println!("{}", header.trim_end());

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    println!("{}", "-".repeat(total_width.saturating_sub(1)));
}

/// Source marker shown next to each secret
pub fn source_label(secret: &Secret) -> String {
    if secret.readonly {
        "imported".yellow().to_string()
    } else {
        "native".green().to_string()
    }
}

/// Print secrets (values omitted) and folders of a listing
pub fn print_listing(listing: &SecretListing) {
    if listing.secrets.is_empty() {
        println!("No secrets found");
    } else {
        print_table_header(&[
            ("KEY", 32),
            ("TYPE", 10),
            ("VERSION", 8),
            ("SOURCE", 10),
            ("COMMENT", 30),
        ]);
        for secret in &listing.secrets {
            println!(
                "{:<32} {:<10} {:<8} {:<10} {}",
                truncate(&secret.key, 32),
                secret.secret_type.as_deref().unwrap_or("-"),
                secret.version.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                source_label(secret),
                truncate(secret.comment.as_deref().unwrap_or(""), 30),
            );
        }
    }

    if !listing.folders.is_empty() {
        print_table_header(&[("FOLDER", 32), ("ID", 36)]);
        for folder in &listing.folders {
            println!("{:<32} {}", truncate(&format!("{}/", folder.name), 32), folder.id);
        }
    }
    println!();
}

/// Print a single secret including its value
pub fn print_secret(secret: &Secret) {
    println!("{:<10} {}", "Key:".bold(), secret.key);
    println!("{:<10} {}", "Value:".bold(), secret.value);
    println!("{:<10} {}", "ID:".bold(), secret.id);
    if let Some(secret_type) = &secret.secret_type {
        println!("{:<10} {}", "Type:".bold(), secret_type);
    }
    if let Some(version) = secret.version {
        println!("{:<10} {}", "Version:".bold(), version);
    }
    if let Some(comment) = &secret.comment {
        println!("{:<10} {}", "Comment:".bold(), comment);
    }
    if let Some(updated_at) = secret.updated_at {
        println!("{:<10} {}", "Updated:".bold(), updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

/// Print the environments of a workspace, marking the default one
pub fn print_environments(listing: &EnvironmentListing, pinned: Option<&str>) {
    println!("Workspace: {}", listing.workspace_name.bold());
    if listing.environments.is_empty() {
        println!("No environments found");
        return;
    }

    let default_slug = listing.default_environment(pinned).map(|env| env.slug.as_str());
    print_table_header(&[("SLUG", 20), ("NAME", 30), ("ID", 36)]);
    for env in &listing.environments {
        let marker = if Some(env.slug.as_str()) == default_slug {
            " (default)".cyan().to_string()
        } else {
            String::new()
        };
        println!(
            "{:<20} {:<30} {}{}",
            truncate(&env.slug, 20),
            truncate(&env.name, 30),
            env.id,
            marker
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a_very_long_secret_key", 10), "a_very_...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_source_label() {
        let secret: Secret = serde_json::from_value(serde_json::json!({
            "id": "1", "key": "K", "value": "v", "readonly": true
        }))
        .unwrap();
        assert!(source_label(&secret).contains("imported"));
        assert!(source_label(&Secret { readonly: false, ..secret }).contains("native"));
    }

    #[test]
    fn test_print_json() {
        let listing = SecretListing::default();
        assert!(print_json(&listing).is_ok());
    }
}
