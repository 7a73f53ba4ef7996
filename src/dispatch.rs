//! Survey invitation dispatch
//!
//! Builds the email and SMS distribution payloads for a triggered patient
//! and sends them to the survey provider, or simulates the send in dry-run
//! mode. Dry-run is forced whenever the configured provider token is a
//! placeholder, regardless of what the caller asked for, so fake
//! credentials can never produce a real API call.

use crate::config::SurveyConfig;
use crate::error::PipelineError;
use crate::providers::REQUEST_TIMEOUT_SECS;
use crate::types::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

const DISTRIBUTION_URL: &str = "https://iad1.qualtrics.com/API/v3/distributions";
const SMS_DISTRIBUTION_URL: &str = "https://iad1.qualtrics.com/API/v3/distributions/sms";

/// Invitation text; the provider expands the survey-link placeholder.
const INVITE_TEXT: &str = "Please fill out this survey: ${l://SurveyURL}";

const SEND_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationMessage {
    #[serde(rename = "messageText")]
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRecipients {
    #[serde(rename = "mailingListId")]
    pub mailing_list_id: String,
    #[serde(rename = "contactId")]
    pub contact_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailHeader {
    #[serde(rename = "fromEmail")]
    pub from_email: String,
    #[serde(rename = "replyToEmail")]
    pub reply_to_email: String,
    #[serde(rename = "fromName")]
    pub from_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyLink {
    #[serde(rename = "surveyId")]
    pub survey_id: String,
    #[serde(rename = "type")]
    pub link_type: String,
}

/// Email-style invitation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInvitation {
    pub message: InvitationMessage,
    pub recipients: InvitationRecipients,
    pub header: EmailHeader,
    #[serde(rename = "surveyLink")]
    pub survey_link: SurveyLink,
    #[serde(rename = "sendDate")]
    pub send_date: String,
}

/// SMS-style invitation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsInvitation {
    pub message: InvitationMessage,
    pub recipients: InvitationRecipients,
    #[serde(rename = "surveyId")]
    pub survey_id: String,
    #[serde(rename = "sendDate")]
    pub send_date: String,
    pub method: String,
    pub name: String,
}

/// What dispatch did (or would have done) for one patient in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// True when the payloads were only simulated, never sent
    pub dry_run: bool,
    pub email: EmailInvitation,
    pub sms: SmsInvitation,
}

/// Dispatcher for survey invitations
pub struct SurveyDispatcher {
    client: reqwest::blocking::Client,
    config: SurveyConfig,
}

impl SurveyDispatcher {
    pub fn new(config: SurveyConfig) -> Result<Self, PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    /// Build and dispatch both invitation payloads for `patient_id`.
    ///
    /// One attempt per payload, sent sequentially; a provider failure
    /// surfaces as a [`PipelineError::Dispatch`] for this patient only.
    pub fn dispatch(
        &self,
        patient_id: &str,
        dry_run: bool,
    ) -> Result<DispatchOutcome, PipelineError> {
        // A placeholder token always forces dry-run, whatever the caller
        // requested.
        let dry_run = dry_run || self.config.api_token.is_unset();

        let now = Utc::now();
        let email = self.build_email_invitation(patient_id, now);
        let sms = self.build_sms_invitation(patient_id, now);

        if dry_run {
            info!(patient_id, url = DISTRIBUTION_URL, "dry-run: would POST email invite");
            info!(patient_id, url = SMS_DISTRIBUTION_URL, "dry-run: would POST SMS invite");
            return Ok(DispatchOutcome {
                dry_run: true,
                email,
                sms,
            });
        }

        let token = match &self.config.api_token {
            Credential::Real(token) => token.clone(),
            // Unreachable given the forcing above.
            Credential::Unset => {
                return Err(PipelineError::Dispatch(
                    "refusing to dispatch with an unset provider token".to_string(),
                ))
            }
        };

        info!(patient_id, "sending email invite");
        self.post_invitation(DISTRIBUTION_URL, &token, &email)?;
        info!(patient_id, "sending SMS invite");
        self.post_invitation(SMS_DISTRIBUTION_URL, &token, &sms)?;

        Ok(DispatchOutcome {
            dry_run: false,
            email,
            sms,
        })
    }

    fn build_email_invitation(&self, patient_id: &str, now: DateTime<Utc>) -> EmailInvitation {
        EmailInvitation {
            message: InvitationMessage {
                message_text: INVITE_TEXT.to_string(),
            },
            recipients: self.recipients_for(patient_id),
            header: EmailHeader {
                from_email: self.config.from_email.clone(),
                reply_to_email: self.config.reply_to_email.clone(),
                from_name: self.config.from_name.clone(),
                subject: format!("Survey - {}", now.format("%Y-%m-%d %H:%M")),
            },
            survey_link: SurveyLink {
                survey_id: self.config.survey_id.clone(),
                link_type: "Individual".to_string(),
            },
            send_date: now.format(SEND_DATE_FORMAT).to_string(),
        }
    }

    fn build_sms_invitation(&self, patient_id: &str, now: DateTime<Utc>) -> SmsInvitation {
        SmsInvitation {
            message: InvitationMessage {
                message_text: INVITE_TEXT.to_string(),
            },
            recipients: self.recipients_for(patient_id),
            survey_id: self.config.survey_id.clone(),
            send_date: now.format(SEND_DATE_FORMAT).to_string(),
            method: "Invite".to_string(),
            name: "SMS API Trigger".to_string(),
        }
    }

    fn recipients_for(&self, patient_id: &str) -> InvitationRecipients {
        InvitationRecipients {
            mailing_list_id: self.config.mailinglist_id.clone(),
            contact_id: self.config.contact_id(patient_id),
        }
    }

    fn post_invitation<T: Serialize>(
        &self,
        url: &str,
        token: &str,
        payload: &T,
    ) -> Result<(), PipelineError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-API-TOKEN", token)
            .json(payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Dispatch(format!(
                "{url} returned {status}"
            )));
        }
        Ok(())
    }
}
