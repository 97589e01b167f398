//! `rpcp config-hash` — compute the layered config hash and print the
//! canonical JSON, for diffing what a deployment actually resolved to
//! against what the operator intended.

use anyhow::Result;

pub fn run(paths: &[String]) -> Result<()> {
    let loaded = rpcp_config::layering::load_layered_yaml(paths)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn prints_the_same_hash_for_the_same_layered_config() {
        let mut base = tempfile::NamedTempFile::new().unwrap();
        writeln!(base, "risk:\n  max_drawdown_pct: 20").unwrap();
        let mut overlay = tempfile::NamedTempFile::new().unwrap();
        writeln!(overlay, "risk:\n  max_drawdown_pct: 15").unwrap();

        let paths = vec![
            base.path().to_string_lossy().to_string(),
            overlay.path().to_string_lossy().to_string(),
        ];

        assert!(run(&paths).is_ok());
    }
}
