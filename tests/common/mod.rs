use chrono::NaiveDate;
use pactpress::{
    ContractDocument, Milestone, Party, PaymentScheduleEntry, Terms,
};

#[allow(dead_code)]
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn party(name: &str, org: &str) -> Party {
    Party {
        name: name.to_string(),
        organization: org.to_string(),
        address: "1 Harbor Way, Oslo".to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "+47 555 0100".to_string(),
    }
}

pub fn milestone(n: usize) -> Milestone {
    Milestone {
        title: format!("Milestone {n}"),
        description: format!(
            "Phase {n} of the engagement: design, implementation and review of the \
             agreed deliverables, including a walkthrough session with the client \
             team and incorporation of one round of consolidated feedback."
        ),
        due_date: NaiveDate::from_ymd_opt(2025, 3, (n % 27 + 1) as u32),
        amount: Some(1000.0 + n as f64 * 250.0),
    }
}

/// A fully-populated contract that paginates onto several pages.
pub fn large_document(milestones: usize) -> ContractDocument {
    let mut doc = ContractDocument::new("c-100", "Master Services Agreement");
    doc.subtitle = "Between the parties named below".to_string();
    doc.provider = party("Ada Contractor", "Northwind Studio AS");
    doc.counterparty = party("Grace Client", "Harborview Media");
    doc.services_description =
        "The provider will design, build and deliver the software described in the \
         milestones below, working in close collaboration with the client's staff."
            .to_string();
    doc.deliverables =
        "Source code, deployment scripts, and written handover documentation.".to_string();
    doc.milestones = (1..=milestones).map(milestone).collect();
    doc.start_date = NaiveDate::from_ymd_opt(2025, 1, 6);
    doc.end_date = NaiveDate::from_ymd_opt(2025, 6, 30);
    doc.payment.total_amount = Some(24_000.0);
    doc.payment.schedule = vec![
        PaymentScheduleEntry {
            description: "Deposit on signing".to_string(),
            percentage: 30.0,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 6),
        },
        PaymentScheduleEntry {
            description: "Midpoint delivery".to_string(),
            percentage: 40.0,
            due_date: NaiveDate::from_ymd_opt(2025, 4, 1),
        },
        PaymentScheduleEntry {
            description: "Final acceptance".to_string(),
            percentage: 30.0,
            due_date: NaiveDate::from_ymd_opt(2025, 6, 30),
        },
    ];
    doc.terms = Terms {
        confidentiality: true,
        termination: "Either party may terminate for material breach not cured within \
                      fourteen days of written notice."
            .to_string(),
        notice_period_days: 30,
        jurisdiction: "Norway".to_string(),
        ..Terms::default()
    };
    doc
}
