//! Run configuration
//!
//! Configuration is a single JSON file compatible with the original demo
//! format: an `oura_api_tokens` object mapping patient ids to provider
//! tokens, and a `qualtrics` block for the survey provider. A missing file
//! is not an error; the loader substitutes a placeholder skeleton so the
//! pipeline still runs offline in sample/dry-run mode. A file that exists
//! but cannot be read or parsed is fatal to the whole run.

use crate::error::PipelineError;
use crate::types::Credential;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Patient id used by the placeholder skeleton when no config file exists.
pub const SAMPLE_PATIENT_ID: &str = "sample";

/// One configured patient and the credential used to fetch their data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientCredential {
    pub patient_id: String,
    pub credential: Credential,
}

/// Survey provider configuration block.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyConfig {
    /// Provider API token; `Unset` forces dry-run dispatch
    #[serde(default)]
    pub api_token: Credential,
    /// Mailing list the invitations are addressed through
    #[serde(default)]
    pub mailinglist_id: String,
    /// Survey the invitations link to
    #[serde(default)]
    pub survey_id: String,
    /// Provider contact id per patient id
    #[serde(default)]
    pub contacts: HashMap<String, String>,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_email")]
    pub reply_to_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_from_email() -> String {
    "research@example.edu".to_string()
}

fn default_from_name() -> String {
    "Research Team".to_string()
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            api_token: Credential::Unset,
            mailinglist_id: String::new(),
            survey_id: String::new(),
            contacts: HashMap::new(),
            from_email: default_from_email(),
            reply_to_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

impl SurveyConfig {
    /// Contact id for a patient, empty when none is configured.
    pub fn contact_id(&self, patient_id: &str) -> String {
        self.contacts.get(patient_id).cloned().unwrap_or_default()
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Patients in the order the configuration file lists them
    #[serde(
        rename = "oura_api_tokens",
        default,
        deserialize_with = "deserialize_patients"
    )]
    pub patients: Vec<PatientCredential>,
    #[serde(rename = "qualtrics", default)]
    pub survey: SurveyConfig,
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the sample skeleton; an unreadable or corrupt
    /// file is a fatal [`PipelineError`].
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            info!(path = %path.display(), "no config file found, running in sample mode");
            return Ok(Self::sample_skeleton());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;

        if config.patients.is_empty() {
            info!("config lists no patients, falling back to the sample patient");
            config.patients = Self::sample_skeleton().patients;
        }

        Ok(config)
    }

    /// Minimal placeholder configuration: one offline sample patient and an
    /// unset survey token, so every external boundary degrades safely.
    pub fn sample_skeleton() -> Self {
        Self {
            patients: vec![PatientCredential {
                patient_id: SAMPLE_PATIENT_ID.to_string(),
                credential: Credential::Unset,
            }],
            survey: SurveyConfig::default(),
        }
    }
}

/// Deserialize a JSON object of `patient_id: token` pairs into a vector,
/// preserving the order the file supplies them in. A plain map type would
/// lose that order, and the run controller iterates patients in it.
fn deserialize_patients<'de, D>(deserializer: D) -> Result<Vec<PatientCredential>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PatientsVisitor;

    impl<'de> Visitor<'de> for PatientsVisitor {
        type Value = Vec<PatientCredential>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of patient ids to provider tokens")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut patients = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((patient_id, credential)) = map.next_entry::<String, Credential>()? {
                patients.push(PatientCredential {
                    patient_id,
                    credential,
                });
            }
            Ok(patients)
        }
    }

    deserializer.deserialize_map(PatientsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sleepwatch-config-{}.json",
            uuid::Uuid::new_v4()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_missing_file_yields_sample_skeleton() {
        let path = std::env::temp_dir().join("sleepwatch-does-not-exist.json");
        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.patients.len(), 1);
        assert_eq!(config.patients[0].patient_id, SAMPLE_PATIENT_ID);
        assert!(config.patients[0].credential.is_unset());
        assert!(config.survey.api_token.is_unset());
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let path = write_temp_config("{ this is not json");
        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.is_fatal());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_patient_order_is_preserved() {
        let path = write_temp_config(
            r#"{
                "oura_api_tokens": {
                    "p-charlie": "PAT.c",
                    "p-alpha": "PAT.a",
                    "p-bravo": "xxx"
                },
                "qualtrics": { "api_token": "xxx" }
            }"#,
        );

        let config = AppConfig::load(&path).unwrap();
        let order: Vec<&str> = config
            .patients
            .iter()
            .map(|p| p.patient_id.as_str())
            .collect();
        assert_eq!(order, vec!["p-charlie", "p-alpha", "p-bravo"]);
        assert!(config.patients[2].credential.is_unset());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_survey_block_with_contacts() {
        let path = write_temp_config(
            r#"{
                "oura_api_tokens": { "p001": "xxx" },
                "qualtrics": {
                    "api_token": "real-key",
                    "mailinglist_id": "ML_123",
                    "survey_id": "SV_456",
                    "contacts": { "p001": "CID_789" },
                    "from_email": "team@lab.org",
                    "from_name": "Sleep Lab"
                }
            }"#,
        );

        let config = AppConfig::load(&path).unwrap();
        assert!(!config.survey.api_token.is_unset());
        assert_eq!(config.survey.contact_id("p001"), "CID_789");
        assert_eq!(config.survey.contact_id("p999"), "");
        assert_eq!(config.survey.from_name, "Sleep Lab");
        // reply-to falls back to its default when not configured
        assert_eq!(config.survey.reply_to_email, "research@example.edu");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_empty_config_object_still_runs() {
        let path = write_temp_config("{}");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.patients[0].patient_id, SAMPLE_PATIENT_ID);
        std::fs::remove_file(&path).ok();
    }
}
