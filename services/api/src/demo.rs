use crate::infra::{parse_prosecution_mode, InMemoryParticipantRepository};
use chrono::{Duration, Utc};
use clap::Args;
use paj_diversion::config::parse_list;
use paj_diversion::error::AppError;
use paj_diversion::workflows::diversion::{
    DiversionService, EligibilityEvaluator, EligibilityInput, EligibilityRules, EnrollmentRequest,
    FollowUpDetails, PlanCompliance, PlanDetails, ProsecutionMode, Stage,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct EligibilityCheckArgs {
    /// Comma-separated vulnerability keys (e.g. mental_health_disorder,substance_use_disorder)
    #[arg(long, default_value = "")]
    pub(crate) vulnerabilities: String,
    /// Offence category as recorded on the referral
    #[arg(long)]
    pub(crate) offence_category: String,
    /// Prosecution mode chosen by the prosecutor (summary or indictment)
    #[arg(long, value_parser = parse_prosecution_mode)]
    pub(crate) prosecution_mode: Option<ProsecutionMode>,
    /// Whether the victim consents to diversion
    #[arg(long)]
    pub(crate) victim_consent: Option<bool>,
    #[arg(long)]
    pub(crate) accepts_responsibility: bool,
    #[arg(long)]
    pub(crate) voluntary: bool,
    #[arg(long)]
    pub(crate) waives_delay: bool,
    #[arg(long)]
    pub(crate) criminally_fit: bool,
}

impl EligibilityCheckArgs {
    fn into_input(self) -> EligibilityInput {
        EligibilityInput {
            vulnerabilities: parse_list(&self.vulnerabilities),
            offence_category: self.offence_category,
            prosecution_mode: self.prosecution_mode,
            victim_consent: self.victim_consent,
            accepts_responsibility: self.accepts_responsibility,
            is_voluntary: self.voluntary,
            waives_delay: self.waives_delay,
            criminally_fit: self.criminally_fit,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Offence category for the sample participant. Defaults to mischief.
    #[arg(long)]
    pub(crate) offence_category: Option<String>,
    /// Revoke victim consent once the participant reaches clinical eligibility.
    #[arg(long)]
    pub(crate) revoke_consent: bool,
}

pub(crate) fn run_eligibility_check(args: EligibilityCheckArgs) -> Result<(), AppError> {
    let evaluator = EligibilityEvaluator::default();
    let input = args.into_input();
    let verdict = evaluator.evaluate(&input);

    println!("Eligibility check");
    println!(
        "  Offence category: {} ({})",
        input.offence_category,
        input
            .prosecution_mode
            .map(ProsecutionMode::label)
            .unwrap_or("mode not set")
    );
    println!(
        "  Declared vulnerabilities: {}",
        if input.vulnerabilities.is_empty() {
            "none".to_string()
        } else {
            input.vulnerabilities.join(", ")
        }
    );

    if verdict.eligible {
        println!("  Verdict: eligible");
    } else {
        println!("  Verdict: not eligible");
        for reason in &verdict.reasons {
            println!("    - {}", reason);
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = DiversionService::new(
        Arc::new(InMemoryParticipantRepository::default()),
        EligibilityRules::standard(),
    );
    let offence_category = args
        .offence_category
        .unwrap_or_else(|| "mischief".to_string());

    println!("Diversion program demo");
    let request = demo_enrollment(&offence_category);
    let record = match service.enroll(request) {
        Ok(record) => record,
        Err(err) => {
            println!("  Enrollment refused: {}", err);
            return Ok(());
        }
    };
    let id = record.participant.id.clone();
    println!(
        "  Enrolled {} as {} at stage {}",
        record.participant.name,
        id,
        record.participant.stage.label()
    );

    let today = Utc::now().date_naive();
    loop {
        let current = service.get(&id)?.participant;
        if current.is_closed() {
            break;
        }

        match current.stage {
            Stage::InterventionPlan => {
                let plan = service.create_intervention_plan(
                    &id,
                    PlanDetails {
                        clinician: "Dr. Martine Tremblay".to_string(),
                        objectives: vec![
                            "Attend weekly outpatient counselling".to_string(),
                            "Maintain stable housing".to_string(),
                        ],
                        services: vec!["CLSC mental health team".to_string()],
                        review_on: Some(today + Duration::days(30)),
                    },
                )?;
                println!("  Intervention plan {} recorded", plan.id);
            }
            Stage::HearingFollowups => {
                let follow_up = service.add_follow_up(
                    &id,
                    FollowUpDetails {
                        hearing_on: today + Duration::days(45),
                        compliance: PlanCompliance::Compliant,
                        notes: "Participant attended every scheduled session".to_string(),
                        next_hearing_on: None,
                    },
                )?;
                println!("  Follow-up hearing {} recorded", follow_up.id);
            }
            Stage::ClinicalEligibility if args.revoke_consent => {
                let returned = service.revoke_victim_consent(&id)?;
                println!(
                    "  Victim consent revoked at {}; case returned to court",
                    returned.participant.stage.label()
                );
                continue;
            }
            _ => {}
        }

        let advanced = service.advance_stage(&id)?;
        println!(
            "  Advanced to {} (version {})",
            advanced.participant.stage.label(),
            advanced.version
        );
    }

    let final_view = service.get(&id)?.participant.status_view();
    match serde_json::to_string_pretty(&final_view) {
        Ok(json) => println!("\nParticipant status payload:\n{}", json),
        Err(err) => println!("\nParticipant status payload unavailable: {}", err),
    }
    Ok(())
}

fn demo_enrollment(offence_category: &str) -> EnrollmentRequest {
    EnrollmentRequest {
        name: "Jordan Lefebvre".to_string(),
        district: "Montréal".to_string(),
        referral_id: Some("REF-2024-0042".to_string()),
        eligibility: EligibilityInput {
            vulnerabilities: vec![
                "mental_health_disorder".to_string(),
                "substance_use_disorder".to_string(),
            ],
            offence_category: offence_category.to_string(),
            prosecution_mode: Some(ProsecutionMode::Summary),
            victim_consent: Some(true),
            accepts_responsibility: true,
            is_voluntary: true,
            waives_delay: true,
            criminally_fit: true,
        },
    }
}
