//! Synthetic deal flow rows for demo and load testing

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{
    DealFlowInsert, CALL_RESULT_NOT_SUBMITTED, CALL_RESULT_SUBMITTED, CALL_RESULT_UNDERWRITING,
    STATUS_PENDING_APPROVAL,
};

pub const STATUS_OPTIONS: &[&str] = &[
    "Needs BPO Callback",
    "Returned To Center - DQ",
    STATUS_PENDING_APPROVAL,
    "Fulfilled carrier requirements",
    "GI - Currently DQ",
    "Incomplete Transfer",
    "Pending Failed Payment Fix",
    "DQ'd Can't be sold",
    "Application Withdrawn",
];

pub const CARRIER_OPTIONS: &[&str] = &[
    "Liberty", "SBLI", "Corebridge", "MOH", "Transamerica", "RNA", "AMAM", "GTL", "Aetna", "Americo", "CICA", "N/A",
];

pub const PRODUCT_TYPE_OPTIONS: &[&str] =
    &["Preferred", "Standard", "Graded", "Modified", "GI", "Immediate", "Level", "ROP", "N/A"];

pub const BUFFER_AGENT_OPTIONS: &[&str] = &[
    "Justine", "Nicole Mejia", "Laiza Batain", "Aqib Afridi", "Qasim Raja", "Molli Reynolds", "Noah Akins",
    "Hussain Khan", "N/A",
];

pub const AGENT_OPTIONS: &[&str] = &[
    "Claudia", "Lydia", "Zack", "Tatumn", "Benjamin", "N/A", "Kaye", "Isaac", "Abdul", "Nicole Mejia", "Precy Lou",
    "Laiza Batain",
];

pub const LICENSED_ACCOUNT_OPTIONS: &[&str] =
    &["Claudia", "Lydia", "Isaac", "Abdul", "Trinity", "Benjamin", "Tatumn", "Noah", "N/A"];

pub const LEAD_VENDOR_OPTIONS: &[&str] = &[
    "Ark Tech", "GrowthOnics BPO", "Maverick", "Omnitalk BPO", "Vize BPO", "Corebiz", "Digicon", "Ambition",
    "Benchmark", "Poshenee", "Plexi", "Gigabite", "Everline solution", "Progressive BPO", "Cerberus BPO", "NanoTech",
    "Optimum BPO", "Ethos BPO", "Trust Link", "Crown Connect BPO", "Quotes BPO", "Zupax Marketing", "Argon Comm",
    "Care Solutions", "Cutting Edge", "Next Era", "Rock BPO", "Avenue Consultancy", "AJ BPO", "Pro Solutions BPO",
    "Emperor BPO", "Networkize", "LightVerse BPO", "Leads BPO", "Helix BPO", "CrossNotch", "StratiX BPO",
    "Exito BPO", "Lumenix BPO", "All-Star BPO", "DownTown BPO", "TechPlanet", "Livik BPO", "NexGen BPO",
    "Quoted-Leads BPO", "SellerZ BPO", "Venom BPO", "Core Marketing", "WinBPO",
];

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Michael", "Emily", "David", "Sarah", "Robert", "Lisa", "William", "Jennifer", "James", "Linda",
    "Richard", "Patricia", "Thomas", "Barbara", "Charles", "Elizabeth", "Daniel", "Susan", "Matthew", "Jessica",
    "Anthony", "Karen", "Mark", "Nancy", "Donald", "Betty", "Steven", "Helen",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez", "Martinez",
    "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee",
    "Perez", "Thompson", "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson",
];

const FROM_CALLBACK_PROBABILITY: f64 = 0.1;
const IS_CALLBACK_PROBABILITY: f64 = 0.15;

/// How much data to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// Days back from today, today included
    pub days: u32,
    pub min_per_day: u32,
    pub max_per_day: u32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            days: 7,
            min_per_day: 5,
            max_per_day: 15,
        }
    }
}

impl SeedOptions {
    /// Zero values fall back to the defaults; a minimum above the maximum is clamped.
    pub fn new(days: u32, min_per_day: u32, max_per_day: u32) -> Self {
        let defaults = Self::default();
        let days = if days == 0 { defaults.days } else { days };
        let min_per_day = if min_per_day == 0 { defaults.min_per_day } else { min_per_day };
        let max_per_day = if max_per_day == 0 { defaults.max_per_day } else { max_per_day };

        Self {
            days,
            min_per_day: min_per_day.min(max_per_day),
            max_per_day,
        }
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or("N/A").to_string()
}

fn random_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "({}) {}-{}",
        rng.gen_range(200..=999),
        rng.gen_range(200..=999),
        rng.gen_range(1000..=9999)
    )
}

fn random_submission_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(1_000_000_000_000_000u64..=9_999_999_999_999_999).to_string()
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// One row for `date`.
pub fn generate_entry<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> DealFlowInsert {
    let status = pick(rng, STATUS_OPTIONS);
    let submission_id = random_submission_id(rng);
    let client_phone_number = random_phone(rng);
    let lead_vendor = pick(rng, LEAD_VENDOR_OPTIONS);
    let insured_name = format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES));
    let buffer_agent = pick(rng, BUFFER_AGENT_OPTIONS);
    let agent = pick(rng, AGENT_OPTIONS);
    let licensed_agent_account = pick(rng, LICENSED_ACCOUNT_OPTIONS);

    let mut entry = DealFlowInsert {
        submission_id,
        client_phone_number: Some(client_phone_number),
        lead_vendor: Some(lead_vendor),
        date: Some(date),
        insured_name: Some(insured_name),
        buffer_agent: Some(buffer_agent),
        agent: Some(agent),
        licensed_agent_account: Some(licensed_agent_account),
        from_callback: Some(rng.gen_bool(FROM_CALLBACK_PROBABILITY)),
        is_callback: Some(rng.gen_bool(IS_CALLBACK_PROBABILITY)),
        ..DealFlowInsert::default()
    };

    if status == STATUS_PENDING_APPROVAL {
        let call_result = pick(rng, &[CALL_RESULT_UNDERWRITING, CALL_RESULT_SUBMITTED]);
        let carrier = pick(rng, CARRIER_OPTIONS);
        let product_type = pick(rng, PRODUCT_TYPE_OPTIONS);
        let premium: u32 = rng.gen_range(50..=500);
        let face_amount: u64 = rng.gen_range(10_000..=1_000_000);
        let draft_date = date + Duration::days(rng.gen_range(7..=60));

        entry.notes = Some(format!(
            "Application submitted for {} {} policy. Premium: ${}/mo, Coverage: ${}",
            carrier,
            product_type,
            premium,
            group_thousands(face_amount)
        ));
        entry.call_result = Some(call_result);
        entry.carrier = Some(carrier);
        entry.product_type = Some(product_type);
        entry.monthly_premium = Some(f64::from(premium));
        entry.face_amount = Some(face_amount as f64);
        entry.draft_date = Some(draft_date);
    } else {
        entry.notes = Some(format!("Status: {}. {}.", status, CALL_RESULT_NOT_SUBMITTED));
        entry.call_result = Some(CALL_RESULT_NOT_SUBMITTED.to_string());
    }

    entry.status = Some(status);
    entry
}

/// Rows for each of the `options.days` days ending at `today`.
pub fn generate_entries<R: Rng + ?Sized>(today: NaiveDate, options: SeedOptions, rng: &mut R) -> Vec<DealFlowInsert> {
    let mut entries = Vec::new();

    for offset in 0..options.days {
        let day = today - Duration::days(i64::from(offset));
        let count = rng.gen_range(options.min_per_day..=options.max_per_day);
        entries.extend((0..count).map(|_| generate_entry(day, rng)));
    }

    entries
}
