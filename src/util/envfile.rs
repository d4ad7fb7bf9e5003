use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse `KEY=value` lines; blank lines and `#` comments are skipped, surrounding quotes removed.
pub fn parse_env_content(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, val)) = s.split_once('=') else {
            log::warn!("Ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let val = val.trim();
        let val = if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            &val[1..val.len() - 1]
        } else {
            val
        };
        map.insert(key.trim().to_string(), val.to_string());
    }
    map
}

/// Load a .env file into the process environment without overriding existing variables.
pub fn load_env_file_from(path: &str) -> Result<HashMap<String, String>> {
    let p = Path::new(path);
    if !p.exists() {
        return Ok(HashMap::new());
    }
    let map = parse_env_content(&fs::read_to_string(p)?);
    for (k, v) in &map {
        if std::env::var_os(k).is_none() {
            // called once at startup, before any worker threads exist
            unsafe {
                std::env::set_var(k, v);
            }
        }
    }
    Ok(map)
}

pub fn load_dotenv_if_present() -> Result<()> {
    load_env_file_from(".env")?;
    Ok(())
}

/// Generate a .env.template file with placeholder values and comments.
pub fn write_env_template(path: &str) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# fuzzy_merge environment configuration template
# Copy this file to .env and fill in your values.
# Any of these variables can also be provided via the system environment
# or overridden on the command line.

# Primary file (every row is kept in the output)
FUZZY_MERGE_PRIMARY=primary.csv
FUZZY_MERGE_PRIMARY_ID=gvkey
FUZZY_MERGE_PRIMARY_NAME=conm
#FUZZY_MERGE_PRIMARY_YEAR=fyear
#FUZZY_MERGE_PRIMARY_QUARTER=fqtr

# Secondary file (searched for the best match)
FUZZY_MERGE_SECONDARY=secondary.csv
FUZZY_MERGE_SECONDARY_ID=id
FUZZY_MERGE_SECONDARY_NAME=name
#FUZZY_MERGE_SECONDARY_YEAR=year
#FUZZY_MERGE_SECONDARY_QUARTER=qtr

# Matching: entity type person | firm-us | firm-int; scorer indel | levenshtein | jaro-winkler
FUZZY_MERGE_ENTITY=firm-us
#FUZZY_MERGE_SCORER=indel
#FUZZY_MERGE_MIN_SCORE=0
#FUZZY_MERGE_JOIN_DUPLICATES=false

# Output
FUZZY_MERGE_OUT=merge.csv
#FUZZY_MERGE_DELIMITER=;
#FUZZY_MERGE_KEEP_COLUMNS=false
#FUZZY_MERGE_SUMMARY=false

# Performance (optional)
#FUZZY_MERGE_SEQUENTIAL=false
#FUZZY_MERGE_BATCH_SIZE=256
#FUZZY_MERGE_PROGRESS_EVERY=1000
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_comments_and_blank_lines() {
        let m = parse_env_content(
            "# comment\n\nFUZZY_MERGE_PRIMARY=\"a b.csv\"\nFUZZY_MERGE_ENTITY = 'person'\nbogus line\nFUZZY_MERGE_OUT=x=y.csv\n",
        );
        assert_eq!(m.get("FUZZY_MERGE_PRIMARY").map(String::as_str), Some("a b.csv"));
        assert_eq!(m.get("FUZZY_MERGE_ENTITY").map(String::as_str), Some("person"));
        assert_eq!(m.get("FUZZY_MERGE_OUT").map(String::as_str), Some("x=y.csv"));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn template_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.template");
        write_env_template(path.to_str().unwrap()).unwrap();
        let m = parse_env_content(&fs::read_to_string(&path).unwrap());
        assert_eq!(m.get("FUZZY_MERGE_ENTITY").map(String::as_str), Some("firm-us"));
        assert!(m.contains_key("FUZZY_MERGE_PRIMARY_NAME"));
        assert!(!m.contains_key("FUZZY_MERGE_SCORER"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let m = load_env_file_from("/nonexistent/.env").unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn quoted_single_char_value_is_kept() {
        let m = parse_env_content("FUZZY_MERGE_DELIMITER=\"\nOTHER='\n");
        assert_eq!(m.get("FUZZY_MERGE_DELIMITER").map(String::as_str), Some("\""));
        assert_eq!(m.get("OTHER").map(String::as_str), Some("'"));
    }
}
