use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier wrapper for enrolled participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

/// Identifier wrapper for intervention plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub String);

/// Identifier wrapper for hearing follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowUpId(pub String);

macro_rules! display_id {
    ($($id:ty),+) => {
        $(impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_id!(ParticipantId, PlanId, FollowUpId);

/// Vulnerabilities recognised by the program. At least one is required for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityType {
    MentalHealthDisorder,
    IntellectualDisability,
    AutismSpectrumDisorder,
    SubstanceUseDisorder,
    TraumaticBrainInjury,
}

impl VulnerabilityType {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::MentalHealthDisorder,
            Self::IntellectualDisability,
            Self::AutismSpectrumDisorder,
            Self::SubstanceUseDisorder,
            Self::TraumaticBrainInjury,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::MentalHealthDisorder => "mental_health_disorder",
            Self::IntellectualDisability => "intellectual_disability",
            Self::AutismSpectrumDisorder => "autism_spectrum_disorder",
            Self::SubstanceUseDisorder => "substance_use_disorder",
            Self::TraumaticBrainInjury => "traumatic_brain_injury",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MentalHealthDisorder => "Mental health disorder",
            Self::IntellectualDisability => "Intellectual disability",
            Self::AutismSpectrumDisorder => "Autism spectrum disorder",
            Self::SubstanceUseDisorder => "Substance use disorder",
            Self::TraumaticBrainInjury => "Traumatic brain injury",
        }
    }

    /// Resolve a declared key. Unknown keys are not an error, they simply do not qualify.
    pub fn from_key(raw: &str) -> Option<Self> {
        let key = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|candidate| candidate.key().eq_ignore_ascii_case(key))
    }
}

/// Reference entry returned to intake forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VulnerabilityTypeView {
    pub key: &'static str,
    pub label: &'static str,
}

impl From<VulnerabilityType> for VulnerabilityTypeView {
    fn from(value: VulnerabilityType) -> Self {
        Self {
            key: value.key(),
            label: value.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProsecutionMode {
    Summary,
    Indictment,
}

impl ProsecutionMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Indictment => "indictment",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        let key = raw.trim();
        [Self::Summary, Self::Indictment]
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(key))
    }
}

/// Facts declared by a candidate at intake.
///
/// Decoding never rejects a field: a missing, null or mistyped value lands as the failing
/// value for its check (`false`, `None`, empty) so the evaluator can report it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EligibilityInput {
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub vulnerabilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub offence_category: String,
    #[serde(default, deserialize_with = "lenient_prosecution_mode")]
    pub prosecution_mode: Option<ProsecutionMode>,
    /// Only a JSON `true` or `false` is kept; anything else reads as not given.
    #[serde(default, deserialize_with = "lenient_optional_flag")]
    pub victim_consent: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub accepts_responsibility: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_voluntary: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub waives_delay: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub criminally_fit: bool,
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

fn lenient_prosecution_mode<'de, D>(deserializer: D) -> Result<Option<ProsecutionMode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_str()
        .and_then(ProsecutionMode::from_key))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) => raw,
        _ => String::new(),
    })
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(raw) => Some(raw),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Request to enroll a candidate: identity fields plus the facts to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub referral_id: Option<String>,
    #[serde(default)]
    pub eligibility: EligibilityInput,
}

/// Fixed program stages, in the only order a participant may traverse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Referral,
    ProsecutorEvaluation,
    ClinicalEligibility,
    InterventionPlan,
    HearingFollowups,
    ProgramOutcome,
}

impl Stage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Referral,
            Self::ProsecutorEvaluation,
            Self::ClinicalEligibility,
            Self::InterventionPlan,
            Self::HearingFollowups,
            Self::ProgramOutcome,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Referral => "referral",
            Self::ProsecutorEvaluation => "prosecutor_evaluation",
            Self::ClinicalEligibility => "clinical_eligibility",
            Self::InterventionPlan => "intervention_plan",
            Self::HearingFollowups => "hearing_followups",
            Self::ProgramOutcome => "program_outcome",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Referral => "Referral",
            Self::ProsecutorEvaluation => "Prosecutor Evaluation",
            Self::ClinicalEligibility => "Clinical Eligibility",
            Self::InterventionPlan => "Intervention Plan",
            Self::HearingFollowups => "Hearing Follow-ups",
            Self::ProgramOutcome => "Program Outcome",
        }
    }

    /// Zero-based position in the stage sequence.
    pub fn position(self) -> usize {
        Self::ordered()
            .iter()
            .position(|stage| *stage == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered().get(self.position() + 1).copied()
    }
}

/// Terminal outcomes. Once recorded, a participant's stage is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramOutcome {
    Completed,
    Withdrawn,
    ReturnedToCourt,
}

impl ProgramOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Withdrawn => "withdrawn",
            Self::ReturnedToCourt => "returned_to_court",
        }
    }
}

/// Enrolled participant. Created only from an eligible verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub district: String,
    pub referral_id: Option<String>,
    /// Snapshot of the facts that qualified the participant. Only consent revocation touches it.
    pub eligibility: EligibilityInput,
    pub stage: Stage,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Option<ProgramOutcome>,
    pub withdrawal_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn status_view(&self) -> ParticipantStatusView {
        ParticipantStatusView {
            participant_id: self.id.clone(),
            name: self.name.clone(),
            district: self.district.clone(),
            stage: self.stage,
            stage_label: self.stage.label(),
            stage_position: format!("{}/{}", self.stage.position() + 1, Stage::ordered().len()),
            outcome: self.outcome.map(ProgramOutcome::label),
            enrolled_at: self.enrolled_at,
            completed_at: self.completed_at,
        }
    }
}

/// Public projection of a participant used by API responses and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantStatusView {
    pub participant_id: ParticipantId,
    pub name: String,
    pub district: String,
    pub stage: Stage,
    pub stage_label: &'static str,
    pub stage_position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Clinician-supplied content of an intervention plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetails {
    pub clinician: String,
    pub objectives: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub review_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionPlan {
    pub id: PlanId,
    pub participant_id: ParticipantId,
    pub details: PlanDetails,
    pub created_at: DateTime<Utc>,
}

/// Tribunal assessment of how the participant is keeping to the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCompliance {
    Compliant,
    PartiallyCompliant,
    NonCompliant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpDetails {
    pub hearing_on: NaiveDate,
    pub compliance: PlanCompliance,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub next_hearing_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: FollowUpId,
    pub participant_id: ParticipantId,
    pub details: FollowUpDetails,
    pub created_at: DateTime<Utc>,
}
