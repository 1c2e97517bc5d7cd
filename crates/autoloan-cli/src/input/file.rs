use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file (by extension) and deserialise into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse(&canonical, &contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

fn parse<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T, Box<dyn std::error::Error>> {
    if is_yaml(path) {
        Ok(serde_yaml::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoloan_core::quote::QuoteSettings;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yaml_and_json_parse_the_same() {
        let yaml: QuoteSettings =
            parse(Path::new("dealer.yaml"), "provision_rate_pct: 3.5\nadditional_admin_fee: 0\n").unwrap();
        let json: QuoteSettings = parse(
            Path::new("dealer.json"),
            r#"{"provision_rate_pct": "3.5", "additional_admin_fee": 0}"#,
        )
        .unwrap();
        assert_eq!(yaml, json);
        assert_eq!(yaml.provision_rate_pct, dec!(3.5));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = read_input::<QuoteSettings>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
