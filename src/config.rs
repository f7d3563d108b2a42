//! Runtime configuration loaded from the environment.
//!
//! A `.env` file in the working directory is honoured through `dotenvy`.
//! Every variable has a default so the server starts with no setup.

use std::env;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// School identity printed on letters, certificates and reports.
#[derive(Debug, Clone, Serialize)]
pub struct InstitutionProfile {
    /// Upper-case name used in headers, e.g. `SMK KRIAN 1`.
    pub name: String,
    /// Mixed-case name used in running text and signature roles.
    pub display_name: String,
    pub address: String,
    pub phone: String,
    pub city: String,
    pub headmaster_name: String,
    pub pokja_chair_name: String,
    pub assignment_letter_number: String,
}

impl Default for InstitutionProfile {
    fn default() -> Self {
        Self {
            name: "SMK KRIAN 1".to_string(),
            display_name: "SMK Krian 1".to_string(),
            address: "Jl. Kyai Mojo, Krian, Sidoarjo".to_string(),
            phone: "Telp. (031) 8961234".to_string(),
            city: "Sidoarjo".to_string(),
            headmaster_name: "Dian Maharani, S.Pd., M.MPd".to_string(),
            pokja_chair_name: "Ahmad Ridho, S.Kom".to_string(),
            assignment_letter_number: "463.2/76 (N)/404.3.9/SMK KRIAN 1/R".to_string(),
        }
    }
}

impl InstitutionProfile {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: var_or("SCHOOL_NAME", defaults.name),
            display_name: var_or("SCHOOL_DISPLAY_NAME", defaults.display_name),
            address: var_or("SCHOOL_ADDRESS", defaults.address),
            phone: var_or("SCHOOL_PHONE", defaults.phone),
            city: var_or("SCHOOL_CITY", defaults.city),
            headmaster_name: var_or("HEADMASTER_NAME", defaults.headmaster_name),
            pokja_chair_name: var_or("POKJA_CHAIR_NAME", defaults.pokja_chair_name),
            assignment_letter_number: var_or(
                "ASSIGNMENT_LETTER_NUMBER",
                defaults.assignment_letter_number,
            ),
        }
    }

    /// `SMK KRIAN 1 SIDOARJO`
    pub fn full_title(&self) -> String {
        format!("{} {}", self.name, self.city.to_uppercase())
    }

    /// `Kepala SMK Krian 1`
    pub fn headmaster_role(&self) -> String {
        format!("Kepala {}", self.display_name)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub template_dir: PathBuf,
    pub max_template_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub institution: InstitutionProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            template_dir: PathBuf::from("./data/templates"),
            max_template_bytes: 10 * 1024 * 1024,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            institution: InstitutionProfile::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(list) => parse_origins(&list),
            Err(_) => defaults.cors_allowed_origins,
        };

        Ok(Self {
            host: var_or("HOST", defaults.host),
            port: parse_var("PORT", defaults.port)?,
            template_dir: env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            max_template_bytes: parse_var("MAX_TEMPLATE_BYTES", defaults.max_template_bytes)?,
            cors_allowed_origins,
            institution: InstitutionProfile::from_env(),
        })
    }
}

fn var_or(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default)
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value })
        }
        _ => Ok(default),
    }
}

/// Split a comma list, dropping blanks.
pub fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://a.test ,, http://b.test"),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_profile_derived_lines() {
        let profile = InstitutionProfile::default();
        assert_eq!(profile.full_title(), "SMK KRIAN 1 SIDOARJO");
        assert_eq!(profile.headmaster_role(), "Kepala SMK Krian 1");
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("PKL_TEST_BAD_PORT", "delapan");
        let result: Result<u16, _> = parse_var("PKL_TEST_BAD_PORT", 8080);
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
        env::remove_var("PKL_TEST_BAD_PORT");

        let fallback: u16 = parse_var("PKL_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(fallback, 8080);
    }
}
